//! Geometric quantities derived from the case, the instrument location and
//! the support parameters, before any solid is built.

use case_types::{Case, MaterialSpec, Orientation, SupportSpec, Vec3};

/// Clearance added to slot and flange extents around the washer.
const WASHER_CLEARANCE: f64 = 0.002;
/// Inset of the X-axis slots from the flange rim.
const SLOT_RIM_INSET: f64 = 0.005;
/// Allowance for the L-section thickness when sizing the flange.
const L_SEC_ALLOWANCE: f64 = 0.001;

/// Where a support sits relative to the instrument and the case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Case plane the support stands on.
    pub base: f64,
    /// Distance from the instrument axis to `base`.
    pub axis_to_base_z: f64,
    pub support_loc_x: f64,
    /// Centre of the support block.
    pub support_location: Vec3,
    /// Centre of the pad, on the instrument axis.
    pub pad_location: Vec3,
}

impl Placement {
    pub fn derive(
        instrument: Vec3,
        case: &Case,
        spec: &SupportSpec,
        orientation: Orientation,
    ) -> Self {
        // lid supports are built below the axis at the lid's distance, then flipped
        let base = match orientation {
            Orientation::Base => case.base_z,
            Orientation::Lid => instrument.z - (case.lid_z - instrument.z).abs(),
        };
        let axis_to_base_z = (instrument.z - base).abs();
        let support_loc_x = instrument.x + spec.position;
        Self {
            base,
            axis_to_base_z,
            support_loc_x,
            support_location: Vec3::new(
                support_loc_x,
                instrument.y,
                instrument.z - axis_to_base_z / 2.0,
            ),
            pad_location: Vec3::new(support_loc_x, instrument.y, instrument.z),
        }
    }
}

/// Flange thickness: the requested minimum, raised so the screw reaches through
/// the L-section, washer and internal ply.
pub fn flange_dim_z(spec: &SupportSpec, material: &MaterialSpec) -> f64 {
    let t = spec.screw_length
        - (material.l_sec_thickness - L_SEC_ALLOWANCE)
        - spec.washer_depth
        - material.int_ply_thickness;
    if t < spec.flange_dim_z {
        spec.flange_dim_z
    } else {
        t
    }
}

/// One screw position: the slot through the flange and the nut recess below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastenerSite {
    pub slot: Vec3,
    pub nut: Vec3,
}

/// Flange disc, nut plate and fastener positions for one support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlangeLayout {
    pub ext_x: f64,
    pub ext_y: f64,
    pub dim_x: f64,
    pub dim_y: f64,
    pub dim_z: f64,
    pub radius: f64,
    pub location: Vec3,
    pub nut_plate_location: Vec3,
    pub support_dim_y: f64,
    pub slot_dim_x: f64,
}

impl FlangeLayout {
    pub fn derive(
        placement: &Placement,
        instrument: Vec3,
        support_dim_y: f64,
        spec: &SupportSpec,
        material: &MaterialSpec,
    ) -> Self {
        let ext_y = spec.flange_extension.max(spec.washer_diam * 2.0);
        let ext_x = spec.slot_length + spec.screw_diam + spec.washer_diam + WASHER_CLEARANCE;
        let dim_x = spec.support_dim_x + 2.0 * ext_x;
        let dim_y = support_dim_y + 2.0 * ext_y;
        let dim_z = flange_dim_z(spec, material);
        let location = Vec3::new(
            placement.support_loc_x,
            instrument.y,
            placement.base + dim_z / 2.0,
        );
        let nut_plate_z = location.z - dim_z - material.int_ply_thickness;
        Self {
            ext_x,
            ext_y,
            dim_x,
            dim_y,
            dim_z,
            radius: dim_x.max(dim_y) / 2.0,
            location,
            nut_plate_location: Vec3::new(location.x, location.y, nut_plate_z),
            support_dim_y,
            slot_dim_x: spec.slot_length + spec.washer_diam + WASHER_CLEARANCE,
        }
    }

    /// The four screw positions: +X, +Y, −X, −Y.
    pub fn fastener_sites(&self, spec: &SupportSpec) -> [FastenerSite; 4] {
        let loc = self.location;
        let nut_z = self.nut_plate_location.z;
        let site = |x: f64, y: f64| FastenerSite {
            slot: Vec3::new(x, y, loc.z),
            nut: Vec3::new(x, y, nut_z),
        };
        let along_x = |pos: f64| {
            loc.x - pos * self.radius + pos * (self.slot_dim_x / 2.0 + SLOT_RIM_INSET)
        };
        let along_y = |pos: f64| loc.y + pos * (self.support_dim_y / 2.0 + spec.washer_diam);
        [
            site(along_x(1.0), loc.y),
            site(loc.x, along_y(1.0)),
            site(along_x(-1.0), loc.y),
            site(loc.x, along_y(-1.0)),
        ]
    }
}
