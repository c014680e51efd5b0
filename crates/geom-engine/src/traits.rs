use crate::types::*;

/// Solid modeling facilities the support pipeline is written against.
/// Implemented by TruckEngine (B-rep on truck) and MockEngine (deterministic test double).
///
/// Every solid is an object with a name, a location and geometry stored relative
/// to that location. Handles stay valid until [`GeometryEngine::delete`].
pub trait GeometryEngine {
    /// Axis-aligned block of extent `size` centred on `location`.
    fn create_block(
        &mut self,
        name: &str,
        location: Vec3,
        size: Vec3,
    ) -> Result<SolidHandle, EngineError>;

    /// Regular `sides`-gon prism along Z, centred on `location`.
    fn create_cylinder(
        &mut self,
        name: &str,
        location: Vec3,
        radius: f64,
        depth: f64,
        sides: u32,
    ) -> Result<SolidHandle, EngineError>;

    /// Combine `tool` into `target` in place. The tool is deleted when
    /// `consume_tool` is set. Returns the target handle.
    fn boolean_combine(
        &mut self,
        target: SolidHandle,
        op: BooleanOp,
        tool: SolidHandle,
        consume_tool: bool,
    ) -> Result<SolidHandle, EngineError>;

    /// Merge vertices closer than `tolerance`. Returns how many were merged.
    fn merge_nearby_vertices(
        &mut self,
        solid: SolidHandle,
        tolerance: f64,
    ) -> Result<usize, EngineError>;

    /// Split into loose parts. The first part keeps `solid`'s handle and name;
    /// the rest are new objects at the same location.
    fn split_by_connectivity(&mut self, solid: SolidHandle) -> Result<Vec<SolidHandle>, EngineError>;

    /// Edge graph in object-local coordinates.
    fn edge_mesh(&self, solid: SolidHandle) -> Result<EdgeMesh, EngineError>;

    /// Bevel the given edges of the current [`EdgeMesh`]. An empty selection is a no-op.
    /// Backends without a bevel return [`EngineError::NotSupported`].
    fn bevel_edges(
        &mut self,
        solid: SolidHandle,
        edges: &[usize],
        offset: f64,
        segments: u32,
    ) -> Result<(), EngineError>;

    /// Copy `objects` and join the copies into one new object without a boolean.
    /// The new object takes the location of the first input.
    fn duplicate_and_merge(
        &mut self,
        name: &str,
        objects: &[SolidHandle],
    ) -> Result<SolidHandle, EngineError>;

    fn delete(&mut self, solid: SolidHandle) -> Result<(), EngineError>;

    fn contains(&self, solid: SolidHandle) -> bool;

    fn name(&self, solid: SolidHandle) -> Result<String, EngineError>;

    fn rename(&mut self, solid: SolidHandle, name: &str) -> Result<(), EngineError>;

    fn transform(&self, solid: SolidHandle) -> Result<ObjectTransform, EngineError>;

    /// Bake the pending scale and/or rotation into the geometry.
    fn normalize_transform(
        &mut self,
        solid: SolidHandle,
        scale: bool,
        rotation: bool,
    ) -> Result<(), EngineError>;

    /// Scale the geometry by `factors` about the object location and bake it.
    fn scale(&mut self, solid: SolidHandle, factors: Vec3) -> Result<(), EngineError>;

    /// Rotate geometry and location about an axis through `pivot`.
    fn rotate_about(
        &mut self,
        solid: SolidHandle,
        pivot: Vec3,
        axis: Axis,
        angle: f64,
    ) -> Result<(), EngineError>;

    /// Corners of the local bounding box, bottom face first. All zero for empty geometry.
    fn bound_box(&self, solid: SolidHandle) -> Result<[Vec3; 8], EngineError>;

    fn location(&self, solid: SolidHandle) -> Result<Vec3, EngineError> {
        Ok(self.transform(solid)?.location)
    }

    /// Extent of the local bounding box.
    fn dimensions(&self, solid: SolidHandle) -> Result<Vec3, EngineError> {
        let corners = self.bound_box(solid)?;
        Ok(Aabb::from_points(corners)
            .map(|b| b.size())
            .unwrap_or(Vec3::ZERO))
    }
}
