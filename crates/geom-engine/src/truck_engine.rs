//! TruckEngine: geometry engine backed by the truck B-rep library.
//!
//! Geometry is kept in world space; the object location is bookkeeping used
//! for local coordinates. Empty results (e.g. a disjoint intersection) are
//! stored as objects without a solid.

use std::collections::HashMap;

use tracing::debug;
use truck_modeling::builder;
use truck_modeling::topology::{Shell, Solid};
use truck_modeling::{Rad, Vector3};

use crate::primitives::{self, point, vector};
use crate::traits::GeometryEngine;
use crate::types::*;

/// Tolerance handed to truck's boolean operations. Models are in metres and
/// the thinnest feature (the radius slice) is 1e-4 thick.
const BOOLEAN_TOLERANCE: f64 = 1e-5;

struct TruckObject {
    name: String,
    transform: ObjectTransform,
    solid: Option<Solid>,
}

/// Real geometry engine backed by truck-modeling and truck-shapeops.
pub struct TruckEngine {
    next_handle: u64,
    objects: HashMap<u64, TruckObject>,
}

impl TruckEngine {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            objects: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> SolidHandle {
        let h = SolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, name: &str, transform: ObjectTransform, solid: Option<Solid>) -> SolidHandle {
        let handle = self.alloc_handle();
        self.objects.insert(
            handle.id(),
            TruckObject {
                name: name.to_string(),
                transform,
                solid,
            },
        );
        handle
    }

    fn get(&self, handle: SolidHandle) -> Result<&TruckObject, EngineError> {
        self.objects
            .get(&handle.id())
            .ok_or(EngineError::SolidNotFound { handle })
    }

    fn get_mut(&mut self, handle: SolidHandle) -> Result<&mut TruckObject, EngineError> {
        self.objects
            .get_mut(&handle.id())
            .ok_or(EngineError::SolidNotFound { handle })
    }

    /// The underlying truck solid, `None` when the object is empty or unknown.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn solid(&self, handle: SolidHandle) -> Option<&Solid> {
        self.objects.get(&handle.id()).and_then(|o| o.solid.as_ref())
    }

    /// Bounding box of all vertices in world space.
    pub fn world_bounds(&self, handle: SolidHandle) -> Option<Aabb> {
        let solid = self.solid(handle)?;
        Aabb::from_points(
            solid
                .boundaries()
                .iter()
                .flat_map(|shell| shell.vertex_iter())
                .map(|v| {
                    let p = v.point();
                    Vec3::new(p.x, p.y, p.z)
                }),
        )
    }
}

impl Default for TruckEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn axis_vector(axis: Axis) -> Vector3 {
    match axis {
        Axis::X => Vector3::unit_x(),
        Axis::Y => Vector3::unit_y(),
        Axis::Z => Vector3::unit_z(),
    }
}

fn solid_from_shells(shells: Vec<Shell>) -> Result<Option<Solid>, EngineError> {
    if shells.is_empty() {
        return Ok(None);
    }
    Solid::try_new(shells).map(Some).map_err(|e| EngineError::Other {
        message: format!("invalid shell set: {e}"),
    })
}

fn non_empty(solid: Solid) -> Option<Solid> {
    if solid.boundaries().is_empty() {
        None
    } else {
        Some(solid)
    }
}

fn combine(target: Option<Solid>, op: BooleanOp, tool: Option<Solid>) -> Result<Option<Solid>, EngineError> {
    let failed = |what: &str| EngineError::BooleanFailed {
        reason: format!("truck {what} returned None"),
    };
    Ok(match (op, target, tool) {
        (BooleanOp::Union, None, tool) => tool,
        (BooleanOp::Union, target, None) => target,
        (BooleanOp::Union, Some(a), Some(b)) => {
            non_empty(truck_shapeops::or(&a, &b, BOOLEAN_TOLERANCE).ok_or_else(|| failed("or()"))?)
        }
        (BooleanOp::Difference, target, None) => target,
        (BooleanOp::Difference, None, _) => None,
        (BooleanOp::Difference, Some(a), Some(mut b)) => {
            // a − b = a ∩ ¬b
            b.not();
            non_empty(truck_shapeops::and(&a, &b, BOOLEAN_TOLERANCE).ok_or_else(|| failed("and()"))?)
        }
        (BooleanOp::Intersect, Some(a), Some(b)) => {
            non_empty(truck_shapeops::and(&a, &b, BOOLEAN_TOLERANCE).ok_or_else(|| failed("and()"))?)
        }
        (BooleanOp::Intersect, _, _) => None,
    })
}

impl GeometryEngine for TruckEngine {
    fn create_block(
        &mut self,
        name: &str,
        location: Vec3,
        size: Vec3,
    ) -> Result<SolidHandle, EngineError> {
        if Axis::ALL
            .iter()
            .any(|&a| !(size.get(a).is_finite() && size.get(a) > 0.0))
        {
            return Err(EngineError::InvalidParameter {
                reason: format!("block size must be positive, got {size:?}"),
            });
        }
        let solid = primitives::make_block(location, size);
        Ok(self.store(name, ObjectTransform::at(location), Some(solid)))
    }

    fn create_cylinder(
        &mut self,
        name: &str,
        location: Vec3,
        radius: f64,
        depth: f64,
        sides: u32,
    ) -> Result<SolidHandle, EngineError> {
        if !(radius.is_finite() && radius > 0.0 && depth.is_finite() && depth > 0.0) {
            return Err(EngineError::InvalidParameter {
                reason: format!("cylinder radius and depth must be positive, got {radius}, {depth}"),
            });
        }
        let solid = primitives::make_prism(location, radius, depth, sides)?;
        Ok(self.store(name, ObjectTransform::at(location), Some(solid)))
    }

    fn boolean_combine(
        &mut self,
        target: SolidHandle,
        op: BooleanOp,
        tool: SolidHandle,
        consume_tool: bool,
    ) -> Result<SolidHandle, EngineError> {
        if target == tool {
            return Err(EngineError::InvalidParameter {
                reason: "boolean target and tool are the same solid".to_string(),
            });
        }
        let tool_solid = self.get(tool)?.solid.clone();
        let target_solid = self.get(target)?.solid.clone();
        let result = combine(target_solid, op, tool_solid)?;
        debug!(%target, %tool, ?op, empty = result.is_none(), "boolean combine");
        self.get_mut(target)?.solid = result;
        if consume_tool {
            self.objects.remove(&tool.id());
        }
        Ok(target)
    }

    fn merge_nearby_vertices(
        &mut self,
        solid: SolidHandle,
        tolerance: f64,
    ) -> Result<usize, EngineError> {
        // B-rep topology shares vertices exactly; there is nothing to weld.
        self.get(solid)?;
        debug!(%solid, tolerance, "vertex merge skipped on exact topology");
        Ok(0)
    }

    fn split_by_connectivity(&mut self, solid: SolidHandle) -> Result<Vec<SolidHandle>, EngineError> {
        let obj = self.get_mut(solid)?;
        let shells: Vec<Shell> = match &obj.solid {
            Some(s) if s.boundaries().len() > 1 => s.boundaries().clone(),
            _ => return Ok(vec![solid]),
        };
        let (name, transform) = (obj.name.clone(), obj.transform);
        let mut iter = shells.into_iter();
        let first = solid_from_shells(iter.next().into_iter().collect())?;
        let rest = iter
            .map(|shell| solid_from_shells(vec![shell]))
            .collect::<Result<Vec<_>, _>>()?;
        self.get_mut(solid)?.solid = first;

        let mut parts = vec![solid];
        for (i, part) in rest.into_iter().enumerate() {
            parts.push(self.store(&format!("{}.{:03}", name, i + 1), transform, part));
        }
        debug!(%solid, parts = parts.len(), "split into loose parts");
        Ok(parts)
    }

    fn edge_mesh(&self, solid: SolidHandle) -> Result<EdgeMesh, EngineError> {
        let obj = self.get(solid)?;
        let mut mesh = EdgeMesh::default();
        let Some(s) = &obj.solid else {
            return Ok(mesh);
        };
        let loc = obj.transform.location;
        let mut vertex_index = HashMap::new();
        let mut seen_edges = std::collections::HashSet::new();
        for shell in s.boundaries() {
            for v in shell.vertex_iter() {
                vertex_index.entry(v.id()).or_insert_with(|| {
                    let p = v.point();
                    mesh.vertices.push(Vec3::new(p.x, p.y, p.z) - loc);
                    mesh.vertices.len() - 1
                });
            }
            for e in shell.edge_iter() {
                if !seen_edges.insert(e.id()) {
                    continue;
                }
                let (a, b) = (e.front().id(), e.back().id());
                if let (Some(&ia), Some(&ib)) = (vertex_index.get(&a), vertex_index.get(&b)) {
                    mesh.edges.push([ia, ib]);
                }
            }
        }
        Ok(mesh)
    }

    fn bevel_edges(
        &mut self,
        solid: SolidHandle,
        edges: &[usize],
        offset: f64,
        segments: u32,
    ) -> Result<(), EngineError> {
        let edge_count = self.edge_mesh(solid)?.len();
        if let Some(&index) = edges.iter().find(|&&e| e >= edge_count) {
            return Err(EngineError::InvalidEdge { index });
        }
        if edges.is_empty() {
            return Ok(());
        }
        debug!(%solid, edges = edges.len(), offset, segments, "bevel requested");
        Err(EngineError::NotSupported {
            operation: "bevel_edges".to_string(),
        })
    }

    fn duplicate_and_merge(
        &mut self,
        name: &str,
        objects: &[SolidHandle],
    ) -> Result<SolidHandle, EngineError> {
        let Some(&first) = objects.first() else {
            return Err(EngineError::InvalidParameter {
                reason: "nothing to duplicate".to_string(),
            });
        };
        let transform = self.get(first)?.transform;
        let mut shells = Vec::new();
        for &h in objects {
            if let Some(s) = &self.get(h)?.solid {
                shells.extend(s.boundaries().iter().cloned());
            }
        }
        let merged = solid_from_shells(shells)?;
        Ok(self.store(name, transform, merged))
    }

    fn delete(&mut self, solid: SolidHandle) -> Result<(), EngineError> {
        self.objects
            .remove(&solid.id())
            .map(|_| ())
            .ok_or(EngineError::SolidNotFound { handle: solid })
    }

    fn contains(&self, solid: SolidHandle) -> bool {
        self.objects.contains_key(&solid.id())
    }

    fn name(&self, solid: SolidHandle) -> Result<String, EngineError> {
        Ok(self.get(solid)?.name.clone())
    }

    fn rename(&mut self, solid: SolidHandle, name: &str) -> Result<(), EngineError> {
        self.get_mut(solid)?.name = name.to_string();
        Ok(())
    }

    fn transform(&self, solid: SolidHandle) -> Result<ObjectTransform, EngineError> {
        Ok(self.get(solid)?.transform)
    }

    fn normalize_transform(
        &mut self,
        solid: SolidHandle,
        scale: bool,
        rotation: bool,
    ) -> Result<(), EngineError> {
        let obj = self.get_mut(solid)?;
        let origin = point(obj.transform.location);
        if scale {
            let factors = obj.transform.scale;
            obj.solid = obj
                .solid
                .as_ref()
                .map(|s| builder::scaled(s, origin, vector(factors)));
            obj.transform.scale = Vec3::ONE;
        }
        if rotation {
            let r = obj.transform.rotation;
            for axis in Axis::ALL {
                let angle = r.get(axis);
                if angle != 0.0 {
                    obj.solid = obj
                        .solid
                        .as_ref()
                        .map(|s| builder::rotated(s, origin, axis_vector(axis), Rad(angle)));
                }
            }
            obj.transform.rotation = Vec3::ZERO;
        }
        Ok(())
    }

    fn scale(&mut self, solid: SolidHandle, factors: Vec3) -> Result<(), EngineError> {
        let obj = self.get_mut(solid)?;
        let origin = point(obj.transform.location);
        obj.solid = obj
            .solid
            .as_ref()
            .map(|s| builder::scaled(s, origin, vector(factors)));
        Ok(())
    }

    fn rotate_about(
        &mut self,
        solid: SolidHandle,
        pivot: Vec3,
        axis: Axis,
        angle: f64,
    ) -> Result<(), EngineError> {
        let obj = self.get_mut(solid)?;
        obj.solid = obj
            .solid
            .as_ref()
            .map(|s| builder::rotated(s, point(pivot), axis_vector(axis), Rad(angle)));
        obj.transform.location = rotate_point(obj.transform.location, pivot, axis, angle);
        Ok(())
    }

    fn bound_box(&self, solid: SolidHandle) -> Result<[Vec3; 8], EngineError> {
        let loc = self.get(solid)?.transform.location;
        Ok(match self.world_bounds(solid) {
            Some(b) => b.translated(-loc).corners(),
            None => [Vec3::ZERO; 8],
        })
    }
}
