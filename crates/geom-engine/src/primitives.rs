//! Block and prism builders on top of truck's sweep API.
//!
//! truck has no built-in box or cylinder; everything is successive sweeps.

use truck_modeling::builder;
use truck_modeling::geometry::{Curve, Line};
use truck_modeling::topology::{Edge, Solid, Wire};
use truck_modeling::{Point3, Vector3};

use crate::types::{polygon_vertex, EngineError, Vec3};

pub(crate) fn point(v: Vec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

pub(crate) fn vector(v: Vec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// Box of extent `size` centred on `center`.
pub fn make_block(center: Vec3, size: Vec3) -> Solid {
    let corner = center - size * 0.5;
    let v = builder::vertex(point(corner));
    let edge = builder::tsweep(&v, Vector3::new(size.x, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size.y, 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, size.z))
}

/// Regular `sides`-gon prism along Z centred on `center`.
pub fn make_prism(center: Vec3, radius: f64, depth: f64, sides: u32) -> Result<Solid, EngineError> {
    if sides < 3 {
        return Err(EngineError::InvalidParameter {
            reason: format!("prism needs at least 3 sides, got {sides}"),
        });
    }
    // polygon_vertex winds clockwise seen from +Z; reverse so the face normal points up
    let pts: Vec<Point3> = (0..sides)
        .rev()
        .map(|k| {
            let (x, y) = polygon_vertex(radius, sides, k);
            Point3::new(center.x + x, center.y + y, center.z - depth / 2.0)
        })
        .collect();
    let vertices: Vec<_> = pts.iter().map(|&p| builder::vertex(p)).collect();
    let n = vertices.len();
    let edges: Vec<Edge> = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            Edge::new(&vertices[i], &vertices[j], Curve::Line(Line(pts[i], pts[j])))
        })
        .collect();
    let wire = Wire::from_iter(edges);
    let face = builder::try_attach_plane(&[wire]).map_err(|e| EngineError::Other {
        message: format!("failed to attach plane to prism profile: {e}"),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, depth)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn vertex_bounds(solid: &Solid) -> ([f64; 3], [f64; 3]) {
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for shell in solid.boundaries() {
            for v in shell.vertex_iter() {
                let p = v.point();
                for i in 0..3 {
                    min[i] = min[i].min(p[i]);
                    max[i] = max[i].max(p[i]);
                }
            }
        }
        (min, max)
    }

    #[test]
    fn test_make_block_topology() {
        let solid = make_block(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        let boundaries = solid.boundaries();
        assert_eq!(boundaries.len(), 1, "Block should have 1 shell");

        let shell = &boundaries[0];
        let edge_ids: HashSet<_> = shell.edge_iter().map(|e| e.id()).collect();
        let vert_ids: HashSet<_> = shell.vertex_iter().map(|v| v.id()).collect();
        assert_eq!(shell.face_iter().count(), 6);
        assert_eq!(edge_ids.len(), 12);
        assert_eq!(vert_ids.len(), 8);
    }

    #[test]
    fn test_make_block_is_centred() {
        let solid = make_block(Vec3::new(1.0, 0.0, -1.0), Vec3::new(2.0, 4.0, 6.0));
        let (min, max) = vertex_bounds(&solid);
        let eps = 1e-10;
        assert!((min[0] - 0.0).abs() < eps && (max[0] - 2.0).abs() < eps);
        assert!((min[1] + 2.0).abs() < eps && (max[1] - 2.0).abs() < eps);
        assert!((min[2] + 4.0).abs() < eps && (max[2] - 2.0).abs() < eps);
    }

    #[test]
    fn test_make_hex_prism() {
        let solid = make_prism(Vec3::ZERO, 1.0, 0.5, 6).unwrap();
        let shell = &solid.boundaries()[0];
        // 6 sides + top + bottom
        assert_eq!(shell.face_iter().count(), 8);
        let (min, max) = vertex_bounds(&solid);
        assert!((max[1] - 1.0).abs() < 1e-10);
        assert!((min[2] + 0.25).abs() < 1e-10 && (max[2] - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_make_prism_rejects_degenerate_polygon() {
        assert!(make_prism(Vec3::ZERO, 1.0, 1.0, 2).is_err());
    }
}
