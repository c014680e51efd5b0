//! MockEngine: deterministic test double implementing GeometryEngine.
//!
//! Every solid is a union of disjoint axis-aligned cells stored in world space,
//! so booleans, loose-part splits and bounding boxes are exact and the support
//! pipeline can be checked numerically without a host modeler.
//! Cylinders are represented by the bounding prism of their polygon.

use std::collections::{HashMap, HashSet};
use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use crate::traits::GeometryEngine;
use crate::types::*;

/// Slivers thinner than this are dropped from boolean results.
const CELL_EPS: f64 = 1e-12;
/// Cells closer than this count as touching for loose-part detection.
const CONTACT_EPS: f64 = 1e-9;
/// Edge-mesh vertices are deduplicated on a 1e-9 grid.
const VERTEX_KEY_SCALE: f64 = 1e9;

/// A bevel applied through [`GeometryEngine::bevel_edges`].
#[derive(Debug, Clone, PartialEq)]
pub struct BevelRecord {
    pub edges: Vec<usize>,
    pub offset: f64,
    pub segments: u32,
}

/// A one-shot failure for the next matching [`MockEngine`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The next boolean with this op fails with `BooleanFailed`.
    Boolean(BooleanOp),
    /// The next delete of this solid fails and leaves it in place.
    Delete(SolidHandle),
    /// The next non-empty bevel reports `NotSupported`.
    Bevel,
}

#[derive(Debug, Clone)]
struct MockObject {
    name: String,
    transform: ObjectTransform,
    cells: Vec<Aabb>,
    bevels: Vec<BevelRecord>,
}

impl MockObject {
    fn new(name: &str, location: Vec3, cells: Vec<Aabb>) -> Self {
        Self {
            name: name.to_string(),
            transform: ObjectTransform::at(location),
            cells,
            bevels: Vec::new(),
        }
    }

    fn world_bounds(&self) -> Option<Aabb> {
        self.cells.iter().copied().reduce(|a, b| a.union(&b))
    }
}

/// Deterministic in-memory geometry engine.
pub struct MockEngine {
    next_handle: u64,
    objects: HashMap<u64, MockObject>,
    faults: Vec<Fault>,
    split_keeps_last: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            objects: HashMap::new(),
            faults: Vec::new(),
            split_keeps_last: false,
        }
    }

    /// Queue a failure. Each queued fault fires once.
    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// When set, a split leaves the last loose part on the original handle
    /// instead of the first.
    pub fn set_split_keeps_last(&mut self, keeps_last: bool) {
        self.split_keeps_last = keeps_last;
    }

    fn take_fault(&mut self, fault: Fault) -> bool {
        match self.faults.iter().position(|f| *f == fault) {
            Some(i) => {
                self.faults.remove(i);
                true
            }
            None => false,
        }
    }

    fn alloc_handle(&mut self) -> SolidHandle {
        let h = SolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, object: MockObject) -> SolidHandle {
        let handle = self.alloc_handle();
        self.objects.insert(handle.id(), object);
        handle
    }

    fn get(&self, handle: SolidHandle) -> Result<&MockObject, EngineError> {
        self.objects
            .get(&handle.id())
            .ok_or(EngineError::SolidNotFound { handle })
    }

    fn get_mut(&mut self, handle: SolidHandle) -> Result<&mut MockObject, EngineError> {
        self.objects
            .get_mut(&handle.id())
            .ok_or(EngineError::SolidNotFound { handle })
    }

    /// Insert a solid made of arbitrary world-space cells.
    /// Overlapping cells are merged so the stored set stays disjoint.
    pub fn insert_cells(&mut self, name: &str, location: Vec3, cells: Vec<Aabb>) -> SolidHandle {
        let disjoint = cells
            .into_iter()
            .filter(|c| !is_degenerate(c))
            .fold(Vec::new(), |acc, c| union_cells(acc, &[c]));
        self.store(MockObject::new(name, location, disjoint))
    }

    /// World-space cells of a solid.
    pub fn cells(&self, handle: SolidHandle) -> Option<&[Aabb]> {
        self.objects.get(&handle.id()).map(|o| o.cells.as_slice())
    }

    pub fn volume(&self, handle: SolidHandle) -> Option<f64> {
        self.cells(handle)
            .map(|cells| cells.iter().map(Aabb::volume).sum())
    }

    pub fn world_bounds(&self, handle: SolidHandle) -> Option<Aabb> {
        self.objects.get(&handle.id()).and_then(MockObject::world_bounds)
    }

    pub fn bevels(&self, handle: SolidHandle) -> Option<&[BevelRecord]> {
        self.objects.get(&handle.id()).map(|o| o.bevels.as_slice())
    }

    /// Set a pending rotation and scale without touching the geometry.
    pub fn set_transform(
        &mut self,
        handle: SolidHandle,
        rotation: Vec3,
        scale: Vec3,
    ) -> Result<(), EngineError> {
        let obj = self.get_mut(handle)?;
        obj.transform.rotation = rotation;
        obj.transform.scale = scale;
        Ok(())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Oldest live object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<SolidHandle> {
        self.objects
            .iter()
            .filter(|(_, o)| o.name == name)
            .map(|(&id, _)| id)
            .min()
            .map(SolidHandle)
    }

    /// Names of all live objects, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.values().map(|o| o.name.clone()).collect();
        names.sort();
        names
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_degenerate(cell: &Aabb) -> bool {
    Axis::ALL
        .iter()
        .any(|&a| cell.max.get(a) - cell.min.get(a) <= CELL_EPS)
}

fn check_positive(what: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter {
            reason: format!("{what} must be positive, got {value}"),
        })
    }
}

/// `a` minus `b` as up to six disjoint slabs.
fn subtract_cell(a: &Aabb, b: &Aabb) -> Vec<Aabb> {
    let Some(inter) = a.intersection(b, CELL_EPS) else {
        return vec![*a];
    };
    let mut out = Vec::new();
    let mut rest = *a;
    for axis in Axis::ALL {
        let (lo, hi) = (rest.min.get(axis), rest.max.get(axis));
        let (cut_lo, cut_hi) = (inter.min.get(axis), inter.max.get(axis));
        if cut_lo - lo > CELL_EPS {
            let mut piece = rest;
            piece.max.set(axis, cut_lo);
            out.push(piece);
        }
        if hi - cut_hi > CELL_EPS {
            let mut piece = rest;
            piece.min.set(axis, cut_hi);
            out.push(piece);
        }
        rest.min.set(axis, cut_lo);
        rest.max.set(axis, cut_hi);
    }
    out
}

fn subtract_cells(cells: Vec<Aabb>, tool: &[Aabb]) -> Vec<Aabb> {
    tool.iter().fold(cells, |acc, t| {
        acc.iter().flat_map(|c| subtract_cell(c, t)).collect()
    })
}

fn intersect_cells(cells: &[Aabb], tool: &[Aabb]) -> Vec<Aabb> {
    cells
        .iter()
        .flat_map(|a| tool.iter().filter_map(move |b| a.intersection(b, CELL_EPS)))
        .collect()
}

fn union_cells(mut cells: Vec<Aabb>, tool: &[Aabb]) -> Vec<Aabb> {
    let added = subtract_cells(tool.to_vec(), &cells);
    cells.extend(added);
    cells
}

/// Face contact: ranges meet on every axis and overlap with positive extent on at least two.
fn cells_touch(a: &Aabb, b: &Aabb) -> bool {
    let mut overlapping = 0;
    for axis in Axis::ALL {
        let lo = a.min.get(axis).max(b.min.get(axis));
        let hi = a.max.get(axis).min(b.max.get(axis));
        if hi < lo - CONTACT_EPS {
            return false;
        }
        if hi - lo > CONTACT_EPS {
            overlapping += 1;
        }
    }
    overlapping >= 2
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Group cells into face-connected components, ordered by their first cell.
fn connected_components(cells: &[Aabb]) -> Vec<Vec<Aabb>> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();
    for i in 0..cells.len() {
        for j in (i + 1)..cells.len() {
            if cells_touch(&cells[i], &cells[j]) {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = ri.min(rj);
                }
            }
        }
    }
    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<Aabb>> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find_root(&mut parent, i);
        groups
            .entry(root)
            .or_insert_with(|| {
                order.push(root);
                Vec::new()
            })
            .push(*cell);
    }
    order
        .into_iter()
        .filter_map(|root| groups.remove(&root))
        .collect()
}

/// Snap values to the first value of their cluster. Returns sorted unique
/// values paired with their representatives.
fn snap_table(mut values: Vec<f64>, tolerance: f64) -> Vec<(f64, f64)> {
    values.sort_by(f64::total_cmp);
    values.dedup();
    let mut table = Vec::with_capacity(values.len());
    let mut rep = f64::NEG_INFINITY;
    for v in values {
        if v - rep >= tolerance {
            rep = v;
        }
        table.push((v, rep));
    }
    table
}

fn snapped(table: &[(f64, f64)], v: f64) -> f64 {
    table
        .binary_search_by(|(k, _)| k.total_cmp(&v))
        .map(|i| table[i].1)
        .unwrap_or(v)
}

/// Exact cosine and sine for quarter-turn angles.
fn quarter_turn(angle: f64) -> Result<(f64, f64), EngineError> {
    let k = (angle / FRAC_PI_2).round();
    if (angle - k * FRAC_PI_2).abs() > 1e-6 {
        return Err(EngineError::NotSupported {
            operation: format!("rotation by {angle} rad (mock engine handles quarter turns only)"),
        });
    }
    Ok(match (k as i64).rem_euclid(4) {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    })
}

fn rotate_cell(cell: &Aabb, pivot: Vec3, axis: Axis, c: f64, s: f64) -> Aabb {
    Aabb::new(
        rotate_point_cs(cell.min, pivot, axis, c, s),
        rotate_point_cs(cell.max, pivot, axis, c, s),
    )
}

fn scale_cell(cell: &Aabb, origin: Vec3, factors: Vec3) -> Aabb {
    Aabb::new(
        origin + (cell.min - origin).scaled(factors),
        origin + (cell.max - origin).scaled(factors),
    )
}

fn vertex_key(p: Vec3) -> (i64, i64, i64) {
    (
        (p.x * VERTEX_KEY_SCALE).round() as i64,
        (p.y * VERTEX_KEY_SCALE).round() as i64,
        (p.z * VERTEX_KEY_SCALE).round() as i64,
    )
}

/// Corner index pairs of a box's 12 edges: bottom ring, top ring, verticals.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

impl GeometryEngine for MockEngine {
    fn create_block(
        &mut self,
        name: &str,
        location: Vec3,
        size: Vec3,
    ) -> Result<SolidHandle, EngineError> {
        check_positive("block size x", size.x)?;
        check_positive("block size y", size.y)?;
        check_positive("block size z", size.z)?;
        let cell = Aabb::from_center_size(location, size);
        Ok(self.store(MockObject::new(name, location, vec![cell])))
    }

    fn create_cylinder(
        &mut self,
        name: &str,
        location: Vec3,
        radius: f64,
        depth: f64,
        sides: u32,
    ) -> Result<SolidHandle, EngineError> {
        check_positive("cylinder radius", radius)?;
        check_positive("cylinder depth", depth)?;
        if sides < 3 {
            return Err(EngineError::InvalidParameter {
                reason: format!("cylinder needs at least 3 sides, got {sides}"),
            });
        }
        let (mut lo, mut hi) = ((f64::MAX, f64::MAX), (f64::MIN, f64::MIN));
        for k in 0..sides {
            let (x, y) = polygon_vertex(radius, sides, k);
            lo = (lo.0.min(x), lo.1.min(y));
            hi = (hi.0.max(x), hi.1.max(y));
        }
        let half = depth / 2.0;
        let cell = Aabb::new(
            location + Vec3::new(lo.0, lo.1, -half),
            location + Vec3::new(hi.0, hi.1, half),
        );
        Ok(self.store(MockObject::new(name, location, vec![cell])))
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
        let tool_cells = self.get(tool)?.cells.clone();
        self.get(target)?;
        if self.take_fault(Fault::Boolean(op)) {
            return Err(EngineError::BooleanFailed {
                reason: format!("injected {op:?} failure"),
            });
        }
        let obj = self.get_mut(target)?;
        let cells = std::mem::take(&mut obj.cells);
        obj.cells = match op {
            BooleanOp::Union => union_cells(cells, &tool_cells),
            BooleanOp::Difference => subtract_cells(cells, &tool_cells),
            BooleanOp::Intersect => intersect_cells(&cells, &tool_cells),
        };
        debug!(%target, %tool, ?op, cells = obj.cells.len(), "boolean combine");
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
        check_positive("merge tolerance", tolerance)?;
        let obj = self.get_mut(solid)?;
        let mut merged = 0;
        let mut tables = Vec::with_capacity(3);
        for axis in Axis::ALL {
            let values = obj
                .cells
                .iter()
                .flat_map(|c| [c.min.get(axis), c.max.get(axis)])
                .collect();
            let table = snap_table(values, tolerance);
            merged += table.iter().filter(|(v, rep)| v != rep).count();
            tables.push((axis, table));
        }
        for cell in &mut obj.cells {
            for (axis, table) in &tables {
                cell.min.set(*axis, snapped(table, cell.min.get(*axis)));
                cell.max.set(*axis, snapped(table, cell.max.get(*axis)));
            }
        }
        obj.cells.retain(|c| !is_degenerate(c));
        Ok(merged)
    }

    fn split_by_connectivity(&mut self, solid: SolidHandle) -> Result<Vec<SolidHandle>, EngineError> {
        let keeps_last = self.split_keeps_last;
        let obj = self.get_mut(solid)?;
        let mut components = connected_components(&obj.cells);
        if components.len() <= 1 {
            return Ok(vec![solid]);
        }
        if keeps_last {
            components.rotate_right(1);
        }
        let rest = components.split_off(1);
        obj.cells = components.remove(0);
        let (name, transform) = (obj.name.clone(), obj.transform);

        let mut parts = vec![solid];
        for (i, cells) in rest.into_iter().enumerate() {
            let mut part = MockObject::new(&format!("{}.{:03}", name, i + 1), transform.location, cells);
            part.transform = transform;
            parts.push(self.store(part));
        }
        debug!(%solid, parts = parts.len(), "split into loose parts");
        Ok(parts)
    }

    fn edge_mesh(&self, solid: SolidHandle) -> Result<EdgeMesh, EngineError> {
        let obj = self.get(solid)?;
        let loc = obj.transform.location;
        let mut mesh = EdgeMesh::default();
        let mut index: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for cell in &obj.cells {
            let ids: Vec<usize> = cell
                .corners()
                .iter()
                .map(|&p| {
                    let local = p - loc;
                    *index.entry(vertex_key(local)).or_insert_with(|| {
                        mesh.vertices.push(local);
                        mesh.vertices.len() - 1
                    })
                })
                .collect();
            for (a, b) in BOX_EDGES {
                let (va, vb) = (ids[a], ids[b]);
                if seen.insert((va.min(vb), va.max(vb))) {
                    mesh.edges.push([va, vb]);
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
        check_positive("bevel offset", offset)?;
        if segments == 0 {
            return Err(EngineError::InvalidParameter {
                reason: "bevel needs at least one segment".to_string(),
            });
        }
        let edge_count = self.edge_mesh(solid)?.len();
        if let Some(&index) = edges.iter().find(|&&e| e >= edge_count) {
            return Err(EngineError::InvalidEdge { index });
        }
        if edges.is_empty() {
            return Ok(());
        }
        if self.take_fault(Fault::Bevel) {
            return Err(EngineError::NotSupported {
                operation: "bevel_edges".to_string(),
            });
        }
        self.get_mut(solid)?.bevels.push(BevelRecord {
            edges: edges.to_vec(),
            offset,
            segments,
        });
        Ok(())
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
        let mut cells = Vec::new();
        for &h in objects {
            cells.extend(self.get(h)?.cells.iter().copied());
        }
        let mut merged = MockObject::new(name, transform.location, cells);
        merged.transform = transform;
        Ok(self.store(merged))
    }

    fn delete(&mut self, solid: SolidHandle) -> Result<(), EngineError> {
        if self.contains(solid) && self.take_fault(Fault::Delete(solid)) {
            return Err(EngineError::Other {
                message: format!("injected delete failure for {solid}"),
            });
        }
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
        let loc = obj.transform.location;
        let turns = if rotation {
            let r = obj.transform.rotation;
            Axis::ALL
                .iter()
                .map(|&a| quarter_turn(r.get(a)).map(|cs| (a, cs)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };
        if scale {
            let factors = obj.transform.scale;
            obj.cells = obj
                .cells
                .iter()
                .map(|c| scale_cell(c, loc, factors))
                .filter(|c| !is_degenerate(c))
                .collect();
            obj.transform.scale = Vec3::ONE;
        }
        for (axis, (c, s)) in turns {
            obj.cells = obj
                .cells
                .iter()
                .map(|cell| rotate_cell(cell, loc, axis, c, s))
                .collect();
        }
        if rotation {
            obj.transform.rotation = Vec3::ZERO;
        }
        Ok(())
    }

    fn scale(&mut self, solid: SolidHandle, factors: Vec3) -> Result<(), EngineError> {
        let obj = self.get_mut(solid)?;
        let loc = obj.transform.location;
        obj.cells = obj
            .cells
            .iter()
            .map(|c| scale_cell(c, loc, factors))
            .filter(|c| !is_degenerate(c))
            .collect();
        Ok(())
    }

    fn rotate_about(
        &mut self,
        solid: SolidHandle,
        pivot: Vec3,
        axis: Axis,
        angle: f64,
    ) -> Result<(), EngineError> {
        let (c, s) = quarter_turn(angle)?;
        let obj = self.get_mut(solid)?;
        obj.cells = obj
            .cells
            .iter()
            .map(|cell| rotate_cell(cell, pivot, axis, c, s))
            .collect();
        obj.transform.location = rotate_point_cs(obj.transform.location, pivot, axis, c, s);
        Ok(())
    }

    fn bound_box(&self, solid: SolidHandle) -> Result<[Vec3; 8], EngineError> {
        let obj = self.get(solid)?;
        Ok(match obj.world_bounds() {
            Some(b) => b.translated(-obj.transform.location).corners(),
            None => [Vec3::ZERO; 8],
        })
    }
}
