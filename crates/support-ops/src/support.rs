use std::f64::consts::PI;

use case_types::{Axis, Case, MaterialSpec, Orientation, SupportSpec, Vec3};
use geom_engine::{BooleanOp, GeometryEngine, SolidHandle};
use tracing::{debug, info, instrument, warn};

use crate::bevel::{bevel_pad, bevel_support, SupportEdgeRefs};
use crate::features::{build_nut_washer, build_slot};
use crate::layout::{FlangeLayout, Placement};
use crate::scope::{run_scoped, Scratch};
use crate::types::{OpError, SupportSolids};

/// Vertices closer than this are merged after each boolean stage.
pub const MERGE_TOLERANCE: f64 = 0.001;
const FLANGE_SIDES: u32 = 64;

/// Split `solid` into its two loose parts and name them by size.
///
/// The part with the larger bounding-box volume becomes `large_name`. On equal
/// volumes the second part wins. Any other part count is an error; extra parts
/// are deleted and `solid` is left in place.
pub fn separate_parts(
    engine: &mut dyn GeometryEngine,
    solid: SolidHandle,
    large_name: &str,
    small_name: &str,
) -> Result<(SolidHandle, SolidHandle), OpError> {
    let parts = engine.split_by_connectivity(solid)?;
    if parts.len() != 2 {
        for &extra in parts.iter().filter(|&&p| p != solid) {
            engine.delete(extra)?;
        }
        return Err(OpError::PartCount { found: parts.len() });
    }
    let v0 = engine.dimensions(parts[0])?.product();
    let v1 = engine.dimensions(parts[1])?.product();
    if v0 == v1 {
        warn!(volume = v0, "loose parts have equal bounding volume; picking the second as the support");
    }
    let (large, small) = if v0 > v1 {
        (parts[0], parts[1])
    } else {
        (parts[1], parts[0])
    };
    engine.rename(large, large_name)?;
    engine.rename(small, small_name)?;
    Ok((large, small))
}

/// Build the support, pad, clamp and nut plate for one support entry.
///
/// The instrument must have unit scale and zero rotation. Temporary solids are
/// deleted on every exit path; on error the partially built outputs are too.
#[instrument(skip(engine, case, spec, material))]
pub fn build_support(
    engine: &mut dyn GeometryEngine,
    instrument: SolidHandle,
    case: &Case,
    spec: &SupportSpec,
    material: &MaterialSpec,
    orientation: Orientation,
    name: &str,
) -> Result<SupportSolids, OpError> {
    spec.validate()?;
    material.validate()?;
    if !engine.contains(instrument) {
        return Err(OpError::Precondition {
            reason: format!("instrument {instrument} is not in the engine"),
        });
    }
    let transform = engine.transform(instrument)?;
    if !transform.is_normalized() {
        return Err(OpError::Precondition {
            reason: "instrument scale and rotation must be applied first".to_string(),
        });
    }
    let inst = transform.location;
    let placement = Placement::derive(inst, case, spec, orientation);
    debug!(
        base = placement.base,
        axis_to_base_z = placement.axis_to_base_z,
        support_loc_x = placement.support_loc_x,
        "support placement"
    );
    if placement.axis_to_base_z <= 0.0 {
        return Err(OpError::Precondition {
            reason: "instrument axis lies on the case boundary".to_string(),
        });
    }

    let solids = run_scoped(engine, |engine, scratch| {
        let solids =
            build_parts(engine, scratch, instrument, inst, &placement, spec, material, name)?;
        if orientation == Orientation::Lid {
            for handle in solids.handles() {
                engine.rotate_about(handle, inst, Axis::X, PI)?;
            }
        }
        Ok::<_, OpError>(solids)
    })?;
    info!(
        support = %solids.support,
        pad = %solids.pad,
        clamp = %solids.clamp,
        nut_plate = %solids.nut_plate,
        ?orientation,
        "support built"
    );
    Ok(solids)
}

#[allow(clippy::too_many_arguments)]
fn build_parts(
    engine: &mut dyn GeometryEngine,
    scratch: &mut Scratch,
    instrument: SolidHandle,
    inst: Vec3,
    placement: &Placement,
    spec: &SupportSpec,
    material: &MaterialSpec,
    name: &str,
) -> Result<SupportSolids, OpError> {
    // pad: a slice of the instrument, thickened, then hollowed
    let pad = scratch.output(engine.create_block(
        &format!("{name}P"),
        placement.pad_location,
        Vec3::new(spec.support_dim_x, 1.0, 1.0),
    )?);
    engine.boolean_combine(pad, BooleanOp::Intersect, instrument, false)?;
    let section = engine.dimensions(pad)?;
    let min_section = section.y.min(section.z);
    if min_section <= 0.0 {
        return Err(OpError::Precondition {
            reason: format!(
                "support at x = {} does not cross the instrument",
                placement.support_loc_x
            ),
        });
    }
    let pad_scale = 1.0 + 2.0 * spec.thickness / min_section;
    engine.scale(pad, Vec3::new(1.0, pad_scale, pad_scale))?;
    engine.boolean_combine(pad, BooleanOp::Difference, instrument, false)?;

    // support block, trimmed against the pad and split by the gap
    let support_dim_y = engine.dimensions(pad)?.y + 2.0 * (spec.thickness + spec.extension);
    debug!(pad_scale, support_dim_y, "pad section");
    let block = scratch.output(engine.create_block(
        &format!("{name}_block"),
        placement.support_location,
        Vec3::new(spec.support_dim_x, support_dim_y, placement.axis_to_base_z),
    )?);
    engine.boolean_combine(pad, BooleanOp::Intersect, block, false)?;
    engine.boolean_combine(block, BooleanOp::Difference, pad, false)?;

    let gap = scratch.temp(engine.create_block(
        &format!("{name}_gap"),
        placement.pad_location,
        Vec3::new(1.0, 1.0, spec.separation),
    )?);
    engine.boolean_combine(block, BooleanOp::Difference, gap, false)?;
    engine.boolean_combine(pad, BooleanOp::Difference, gap, true)?;

    engine.merge_nearby_vertices(block, MERGE_TOLERANCE)?;
    engine.merge_nearby_vertices(pad, MERGE_TOLERANCE)?;
    let (support, clamp) =
        separate_parts(engine, block, &format!("{name}H"), &format!("{name}C"))?;
    // either part may come back under a new handle
    scratch.output(support);
    scratch.output(clamp);
    engine.merge_nearby_vertices(support, MERGE_TOLERANCE)?;
    engine.merge_nearby_vertices(clamp, MERGE_TOLERANCE)?;

    // flange disc fused under the support
    let flange = FlangeLayout::derive(placement, inst, support_dim_y, spec, material);
    debug!(
        radius = flange.radius,
        dim_z = flange.dim_z,
        z = flange.location.z,
        "flange layout"
    );
    let disc = scratch.temp(engine.create_cylinder(
        &format!("{name}_flange"),
        flange.location,
        flange.radius,
        flange.dim_z,
        FLANGE_SIDES,
    )?);
    engine.boolean_combine(support, BooleanOp::Union, disc, true)?;
    engine.merge_nearby_vertices(support, MERGE_TOLERANCE)?;

    let refs = SupportEdgeRefs {
        support_dim_x: spec.support_dim_x,
        support_dim_y,
        axis_to_base_z: placement.axis_to_base_z,
        separation: spec.separation,
        flange_dim_z: flange.dim_z,
    };
    let support_bevels = bevel_support(engine, support, &refs)?;
    let pad_bevels = bevel_pad(engine, pad, spec.separation)?;
    debug!(support_bevels, pad_bevels, "bevels applied");

    let nut_plate = scratch.output(engine.create_cylinder(
        &format!("{name}N"),
        flange.nut_plate_location,
        flange.radius,
        material.l_sec_thickness,
        FLANGE_SIDES,
    )?);
    for site in flange.fastener_sites(spec) {
        let slot = scratch.temp(build_slot(engine, site.slot, spec, flange.dim_z)?);
        engine.boolean_combine(support, BooleanOp::Difference, slot, true)?;
        let nut = scratch.temp(build_nut_washer(engine, site.nut, spec, material)?);
        engine.boolean_combine(nut_plate, BooleanOp::Difference, nut, true)?;
    }

    Ok(SupportSolids {
        support,
        pad,
        clamp,
        nut_plate,
    })
}
