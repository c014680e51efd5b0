//! Edge selection for the support and pad bevels.
//!
//! Edges are picked by matching object-local coordinates and lengths after
//! rounding to 4 decimals, so sub-0.05 mm noise from the booleans does not
//! change the selection. A selection that matches nothing bevels nothing.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geom_engine::{EdgeMesh, EngineError, GeometryEngine, SolidHandle};
use tracing::{debug, warn};

use crate::types::OpError;

pub const BEVEL_OFFSET: f64 = 0.002;
pub const BEVEL_SEGMENTS: u32 = 4;

/// Value rounded to 4 decimals, as an exact integer key.
fn key(v: f64) -> i64 {
    (v * 1e4).round() as i64
}

fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}

/// Reference dimensions of a support body, all in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportEdgeRefs {
    pub support_dim_x: f64,
    pub support_dim_y: f64,
    pub axis_to_base_z: f64,
    pub separation: f64,
    pub flange_dim_z: f64,
}

/// Edges touching the top corners of the support block, plus the flange-top
/// edges that are the shortest or span the support footprint.
pub fn select_support_edges(mesh: &EdgeMesh, refs: &SupportEdgeRefs) -> Vec<usize> {
    let corner = [
        key(refs.support_dim_x / 2.0),
        key(refs.support_dim_y / 2.0),
        key(refs.axis_to_base_z / 2.0 - refs.separation / 2.0),
    ];
    let flange_top_z = -key(refs.axis_to_base_z / 2.0 - refs.flange_dim_z);

    let mut selected = vec![false; mesh.len()];
    let mut flange_top = Vec::new();
    for (i, &[a, b]) in mesh.edges.iter().enumerate() {
        for v in [mesh.vertices[a], mesh.vertices[b]] {
            if [key(v.x).abs(), key(v.y).abs(), key(v.z).abs()] == corner {
                selected[i] = true;
            }
        }
        let (za, zb) = (key(mesh.vertices[a].z), key(mesh.vertices[b].z));
        if za == zb && zb == flange_top_z {
            flange_top.push(i);
        }
    }

    // raw length against the rounded running minimum
    let mut shortest = 100.0;
    for &e in &flange_top {
        let len = mesh.length(e);
        if len < shortest {
            shortest = round4(len);
        }
    }
    let wanted = [key(shortest), key(refs.support_dim_x), key(refs.support_dim_y)];
    for &e in &flange_top {
        if wanted.contains(&key(mesh.length(e))) {
            selected[e] = true;
        }
    }

    let out: Vec<usize> = (0..mesh.len()).filter(|&i| selected[i]).collect();
    debug!(
        flange_top = flange_top.len(),
        selected = out.len(),
        "support edges selected"
    );
    out
}

/// Gap-face loops at both ends of the pad joined by shortest paths, plus the
/// inner gap edges closest to the axis.
pub fn select_pad_edges(mesh: &EdgeMesh, separation: f64) -> Vec<usize> {
    let ref_z = key(separation / 2.0);
    let mut candidates: Vec<usize> = Vec::new();
    let mut others: Vec<usize> = Vec::new();
    let (mut high_x, mut low_x) = (0_i64, 0_i64);

    for (i, &[a, b]) in mesh.edges.iter().enumerate() {
        for (v, o) in [(a, b), (b, a)] {
            let (v, o) = (mesh.vertices[v], mesh.vertices[o]);
            let vx = key(v.x);
            high_x = high_x.max(vx);
            low_x = low_x.min(vx);
            if key(v.z).abs() != ref_z || key(o.z) != key(v.z) {
                continue;
            }
            let bucket = if key(o.x) == vx {
                &mut candidates
            } else {
                &mut others
            };
            if !bucket.contains(&i) {
                bucket.push(i);
            }
        }
    }

    let first_x = |e: usize| key(mesh.vertices[mesh.edges[e][0]].x);
    let loops = [high_x, low_x].map(|x| {
        candidates
            .iter()
            .copied()
            .filter(|&e| first_x(e) == x)
            .collect::<Vec<_>>()
    });

    let low_y = others
        .iter()
        .flat_map(|&e| mesh.edges[e])
        .map(|v| key(mesh.vertices[v].y).abs())
        .fold(key(100.0), i64::min);
    let inner = others.iter().copied().filter(|&e| {
        let [a, b] = mesh.edges[e];
        key(mesh.vertices[a].y).abs() == low_y || key(mesh.vertices[b].y).abs() == low_y
    });

    let mut selected = vec![false; mesh.len()];
    for edges in &loops {
        for &e in edges {
            selected[e] = true;
        }
        for pair in edges.windows(2) {
            for e in shortest_edge_path(mesh, pair[0], pair[1]) {
                selected[e] = true;
            }
        }
    }
    for e in inner {
        selected[e] = true;
    }

    let out: Vec<usize> = (0..mesh.len()).filter(|&i| selected[i]).collect();
    debug!(
        candidates = candidates.len(),
        others = others.len(),
        selected = out.len(),
        "pad edges selected"
    );
    out
}

#[derive(Debug, PartialEq)]
struct Visit {
    cost: f64,
    vertex: usize,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed for a min-heap
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Edges of the shortest path (by length) from either end of `from` to either end of `to`.
/// Empty when the edges share a vertex or are not connected.
pub fn shortest_edge_path(mesh: &EdgeMesh, from: usize, to: usize) -> Vec<usize> {
    let n = mesh.vertices.len();
    let adjacency = mesh.vertex_edges();
    let mut dist = vec![f64::INFINITY; n];
    let mut via: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();
    for v in mesh.edges[from] {
        dist[v] = 0.0;
        heap.push(Visit { cost: 0.0, vertex: v });
    }
    let targets = mesh.edges[to];

    while let Some(Visit { cost, vertex }) = heap.pop() {
        if cost > dist[vertex] {
            continue;
        }
        if targets.contains(&vertex) {
            let mut path = Vec::new();
            let mut at = vertex;
            while let Some(e) = via[at] {
                path.push(e);
                let [a, b] = mesh.edges[e];
                at = if a == at { b } else { a };
            }
            path.reverse();
            return path;
        }
        for &e in &adjacency[vertex] {
            let [a, b] = mesh.edges[e];
            let next = if a == vertex { b } else { a };
            let c = cost + mesh.length(e);
            if c < dist[next] {
                dist[next] = c;
                via[next] = Some(e);
                heap.push(Visit { cost: c, vertex: next });
            }
        }
    }
    Vec::new()
}

/// Bevel the selected edges. An engine without bevel support leaves the
/// edges sharp and counts zero.
fn apply_bevel(
    engine: &mut dyn GeometryEngine,
    solid: SolidHandle,
    edges: &[usize],
) -> Result<usize, OpError> {
    match engine.bevel_edges(solid, edges, BEVEL_OFFSET, BEVEL_SEGMENTS) {
        Ok(()) => Ok(edges.len()),
        Err(EngineError::NotSupported { operation }) => {
            warn!(%solid, %operation, edges = edges.len(), "bevel unavailable, edges left sharp");
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

/// Bevel the support body. Returns the number of edges beveled.
pub fn bevel_support(
    engine: &mut dyn GeometryEngine,
    support: SolidHandle,
    refs: &SupportEdgeRefs,
) -> Result<usize, OpError> {
    let mesh = engine.edge_mesh(support)?;
    let edges = select_support_edges(&mesh, refs);
    apply_bevel(engine, support, &edges)
}

/// Bevel the pad. Returns the number of edges beveled.
pub fn bevel_pad(
    engine: &mut dyn GeometryEngine,
    pad: SolidHandle,
    separation: f64,
) -> Result<usize, OpError> {
    let mesh = engine.edge_mesh(pad)?;
    let edges = select_pad_edges(&mesh, separation);
    apply_bevel(engine, pad, &edges)
}
