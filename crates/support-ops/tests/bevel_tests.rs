use proptest::prelude::*;

use case_types::{Aabb, Vec3};
use geom_engine::{EdgeMesh, GeometryEngine, MockEngine};
use support_ops::bevel::shortest_edge_path;
use support_ops::{bevel_pad, bevel_support, select_pad_edges, select_support_edges, SupportEdgeRefs};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn refs() -> SupportEdgeRefs {
    SupportEdgeRefs {
        support_dim_x: 0.025,
        support_dim_y: 0.24,
        axis_to_base_z: 0.06,
        separation: 0.002,
        flange_dim_z: 0.006,
    }
}

/// Support body centred on the origin: a block topped just below the gap and a
/// wider flange slab at its foot.
fn support_mesh() -> EdgeMesh {
    let mut engine = MockEngine::new();
    let h = engine.insert_cells(
        "support",
        Vec3::ZERO,
        vec![
            Aabb::new(Vec3::new(-0.0125, -0.12, -0.03), Vec3::new(0.0125, 0.12, 0.029)),
            Aabb::new(Vec3::new(-0.05, -0.15, -0.03), Vec3::new(0.05, 0.15, -0.024)),
        ],
    );
    engine.edge_mesh(h).unwrap()
}

/// Pad half: two walls either side of the axis joined by a floor, open on top
/// at the gap plane.
fn pad_mesh() -> EdgeMesh {
    let mut engine = MockEngine::new();
    let h = engine.insert_cells(
        "pad",
        Vec3::ZERO,
        vec![
            Aabb::new(Vec3::new(-0.0125, 0.1, -0.055), Vec3::new(0.0125, 0.11, -0.001)),
            Aabb::new(Vec3::new(-0.0125, -0.11, -0.055), Vec3::new(0.0125, -0.1, -0.001)),
            Aabb::new(Vec3::new(-0.0125, -0.1, -0.055), Vec3::new(0.0125, 0.1, -0.05)),
        ],
    );
    engine.edge_mesh(h).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Support edges
// ---------------------------------------------------------------------------

#[test]
fn support_selects_top_corners_and_short_flange_edges() {
    let mesh = support_mesh();
    let selected = select_support_edges(&mesh, &refs());
    assert_eq!(selected.len(), 12);

    let (mut corner, mut flange) = (0, 0);
    for &e in &selected {
        let (a, b) = mesh.endpoints(e);
        if approx(a.z, -0.024) && approx(b.z, -0.024) {
            assert!(approx(mesh.length(e), 0.025), "flange edge {e}");
            flange += 1;
        } else {
            assert!(approx(a.z, 0.029) || approx(b.z, 0.029), "corner edge {e}");
            corner += 1;
        }
    }
    assert_eq!((corner, flange), (8, 4));
}

#[test]
fn support_selection_is_empty_on_unrelated_geometry() {
    let mut engine = MockEngine::new();
    let h = engine.create_block("cube", Vec3::ZERO, Vec3::ONE).unwrap();
    let mesh = engine.edge_mesh(h).unwrap();
    assert!(select_support_edges(&mesh, &refs()).is_empty());

    assert_eq!(bevel_support(&mut engine, h, &refs()).unwrap(), 0);
    assert!(engine.bevels(h).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Pad edges
// ---------------------------------------------------------------------------

#[test]
fn pad_selects_gap_loops_paths_and_inner_edges() {
    let mesh = pad_mesh();
    let selected = select_pad_edges(&mesh, 0.002);
    assert_eq!(selected.len(), 12);

    // the floor edge joining the two wall loops at +x is on a path
    let floor = selected.iter().any(|&e| {
        let (a, b) = mesh.endpoints(e);
        approx(a.x, 0.0125) && approx(b.x, 0.0125) && approx(a.z, -0.055) && approx(b.z, -0.055)
    });
    assert!(floor);

    // no edge on the floor's top face is picked
    assert!(selected.iter().all(|&e| {
        let (a, b) = mesh.endpoints(e);
        !(approx(a.z, -0.05) && approx(b.z, -0.05))
    }));
}

#[test]
fn pad_selection_is_empty_on_unrelated_geometry() {
    let mut engine = MockEngine::new();
    let h = engine.create_block("cube", Vec3::ZERO, Vec3::ONE).unwrap();
    let mesh = engine.edge_mesh(h).unwrap();
    assert!(select_pad_edges(&mesh, 0.002).is_empty());

    assert_eq!(bevel_pad(&mut engine, h, 0.002).unwrap(), 0);
    assert!(engine.bevels(h).unwrap().is_empty());
}

#[test]
fn bevel_pad_records_selection() {
    let mut engine = MockEngine::new();
    let h = engine.insert_cells(
        "pad",
        Vec3::ZERO,
        vec![
            Aabb::new(Vec3::new(-0.0125, 0.1, -0.055), Vec3::new(0.0125, 0.11, -0.001)),
            Aabb::new(Vec3::new(-0.0125, -0.11, -0.055), Vec3::new(0.0125, -0.1, -0.001)),
            Aabb::new(Vec3::new(-0.0125, -0.1, -0.055), Vec3::new(0.0125, 0.1, -0.05)),
        ],
    );
    assert_eq!(bevel_pad(&mut engine, h, 0.002).unwrap(), 12);
    let bevels = engine.bevels(h).unwrap();
    assert_eq!(bevels.len(), 1);
    assert_eq!(bevels[0].edges, select_pad_edges(&pad_mesh(), 0.002));
}

// ---------------------------------------------------------------------------
// Shortest paths
// ---------------------------------------------------------------------------

#[test]
fn shortest_path_follows_cheapest_route() {
    // square 0-1-2-3 with a long diagonal 0-2
    let mesh = EdgeMesh {
        vertices: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(5.0, 5.0, 0.0),
            Vec3::new(6.0, 5.0, 0.0),
        ],
        edges: vec![[0, 1], [1, 2], [2, 3], [3, 0], [4, 5], [0, 2]],
    };
    // from edge 0-1 to edge 2-3: one hop along 1-2 or 3-0
    let path = shortest_edge_path(&mesh, 0, 2);
    assert_eq!(path.len(), 1);
    assert!(path == vec![1] || path == vec![3]);
    // adjacent edges share a vertex
    assert!(shortest_edge_path(&mesh, 0, 1).is_empty());
    // disconnected
    assert!(shortest_edge_path(&mesh, 0, 4).is_empty());
}

// ---------------------------------------------------------------------------
// Jitter invariance
// ---------------------------------------------------------------------------

fn jittered(mesh: &EdgeMesh, noise: &[(f64, f64, f64)]) -> EdgeMesh {
    let vertices = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let (dx, dy, dz) = noise[i % noise.len()];
            *v + Vec3::new(dx, dy, dz)
        })
        .collect();
    EdgeMesh {
        vertices,
        edges: mesh.edges.clone(),
    }
}

fn noise() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((-2e-5..2e-5f64, -2e-5..2e-5f64, -2e-5..2e-5f64), 64)
}

proptest! {
    #[test]
    fn support_selection_ignores_sub_tolerance_noise(noise in noise()) {
        let mesh = support_mesh();
        prop_assert_eq!(
            select_support_edges(&jittered(&mesh, &noise), &refs()),
            select_support_edges(&mesh, &refs())
        );
    }

    #[test]
    fn pad_selection_ignores_sub_tolerance_noise(noise in noise()) {
        let mesh = pad_mesh();
        prop_assert_eq!(
            select_pad_edges(&jittered(&mesh, &noise), 0.002),
            select_pad_edges(&mesh, 0.002)
        );
    }
}
