use case_types::{check_clearance, Aabb, Case, Vec3};
use geom_engine::{BooleanOp, GeometryEngine, SolidHandle};
use tracing::{info, instrument};

use crate::scope::run_scoped;
use crate::types::OpError;

/// Thickness of the probe slice used by [`instrument_radii`].
const PROBE_THICKNESS: f64 = 0.0001;

/// Case enclosing every instrument with `clearance` on all sides.
/// An empty instrument list gives the degenerate all-zero case.
#[instrument(skip(engine, instruments), fields(count = instruments.len()))]
pub fn recompute_case(
    engine: &mut dyn GeometryEngine,
    instruments: &[SolidHandle],
    clearance: f64,
) -> Result<Case, OpError> {
    check_clearance(clearance)?;
    if instruments.is_empty() {
        info!("no instruments, case reset");
        return Ok(Case::empty());
    }
    run_scoped(engine, |engine, scratch| {
        let joined =
            scratch.temp(engine.duplicate_and_merge("TEMP_JOINED_INSTRUMENTS", instruments)?);
        let location = engine.location(joined)?;
        let corners = engine.bound_box(joined)?.map(|c| c + location);
        let bounds = Aabb::from_points(corners).ok_or_else(|| OpError::Precondition {
            reason: "joined instruments have no bounding box".to_string(),
        })?;
        let case = Case::from_bounds(&bounds, clearance);
        info!(size = ?case.size, base_z = case.base_z, lid_z = case.lid_z, "case recomputed");
        Ok(case)
    })
}

/// Half-extents (Y, Z) of the instrument's cross-section at `position`.
pub fn instrument_radii(
    engine: &mut dyn GeometryEngine,
    instrument: SolidHandle,
    position: Vec3,
) -> Result<(f64, f64), OpError> {
    run_scoped(engine, |engine, scratch| {
        let probe = scratch.temp(engine.create_block(
            "b1",
            position,
            Vec3::new(PROBE_THICKNESS, 1.0, 1.0),
        )?);
        engine.boolean_combine(probe, BooleanOp::Intersect, instrument, false)?;
        let dims = engine.dimensions(probe)?;
        Ok((dims.y / 2.0, dims.z / 2.0))
    })
}
