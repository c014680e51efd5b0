use case_types::{MaterialSpec, SupportSpec, Vec3};
use geom_engine::{BooleanOp, GeometryEngine, SolidHandle};

use crate::scope::run_scoped;
use crate::types::OpError;

/// Slot and recess tools are cut 10% oversize.
const FIT_ALLOWANCE: f64 = 1.1;
/// Slot tools overshoot the flange by this much in Z.
const SLOT_OVERSHOOT: f64 = 0.01;
const SLOT_END_SIDES: u32 = 32;
const NUT_SIDES: u32 = 6;
const WASHER_SIDES: u32 = 64;

/// Screw slot with rounded ends centred on `center`, elongated along X.
/// Returns a removal tool; the caller subtracts it.
pub fn build_slot(
    engine: &mut dyn GeometryEngine,
    center: Vec3,
    spec: &SupportSpec,
    flange_dim_z: f64,
) -> Result<SolidHandle, OpError> {
    let width = spec.screw_diam * FIT_ALLOWANCE;
    let depth = flange_dim_z + SLOT_OVERSHOOT;
    run_scoped(engine, |engine, scratch| {
        let slot = scratch.output(engine.create_block(
            "SLOT",
            center,
            Vec3::new(spec.slot_length, width, depth),
        )?);
        for (name, dx) in [("SLOT_END_1", -spec.slot_length / 2.0), ("SLOT_END_2", spec.slot_length / 2.0)] {
            let end = scratch.temp(engine.create_cylinder(
                name,
                center + Vec3::new(dx, 0.0, 0.0),
                width / 2.0,
                depth,
                SLOT_END_SIDES,
            )?);
            engine.boolean_combine(slot, BooleanOp::Union, end, true)?;
        }
        Ok(slot)
    })
}

/// Hex nut recess with a washer counterbore on its upper face, centred on `loc`.
/// Returns a removal tool; the caller subtracts it.
pub fn build_nut_washer(
    engine: &mut dyn GeometryEngine,
    loc: Vec3,
    spec: &SupportSpec,
    material: &MaterialSpec,
) -> Result<SolidHandle, OpError> {
    let top = loc.z + material.l_sec_thickness / 2.0;
    let washer_loc = Vec3::new(loc.x, loc.y, top - spec.washer_depth / 2.0);
    run_scoped(engine, |engine, scratch| {
        let nut = scratch.output(engine.create_cylinder(
            "NUT",
            loc,
            spec.nut_diam * FIT_ALLOWANCE / 2.0,
            material.l_sec_thickness * FIT_ALLOWANCE,
            NUT_SIDES,
        )?);
        let washer = scratch.temp(engine.create_cylinder(
            "WASHER",
            washer_loc,
            spec.washer_diam * FIT_ALLOWANCE / 2.0,
            spec.washer_depth + 0.0001,
            WASHER_SIDES,
        )?);
        engine.boolean_combine(nut, BooleanOp::Union, washer, true)?;
        Ok(nut)
    })
}
