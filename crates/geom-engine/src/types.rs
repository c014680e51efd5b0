use serde::{Deserialize, Serialize};

pub use case_types::{Aabb, Axis, Vec3};

/// Opaque handle to a solid object owned by a geometry engine.
/// Valid only for the engine that issued it; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SolidHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Boolean combination applied to a target solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersect,
}

/// Object-level transform. Geometry is stored relative to `location`;
/// `rotation` (XYZ Euler, radians) and `scale` are pending until baked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub location: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl ObjectTransform {
    pub fn at(location: Vec3) -> Self {
        Self {
            location,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Unit scale and zero rotation.
    pub fn is_normalized(&self) -> bool {
        const EPS: f64 = 1e-9;
        Axis::ALL.iter().all(|&a| {
            self.rotation.get(a).abs() < EPS && (self.scale.get(a) - 1.0).abs() < EPS
        })
    }
}

/// Edge graph of a solid in object-local coordinates.
///
/// Edge indices are the selection currency of [`crate::GeometryEngine::bevel_edges`]
/// and stay valid until the solid is modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeMesh {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<[usize; 2]>,
}

impl EdgeMesh {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn endpoints(&self, edge: usize) -> (Vec3, Vec3) {
        let [a, b] = self.edges[edge];
        (self.vertices[a], self.vertices[b])
    }

    pub fn length(&self, edge: usize) -> f64 {
        let (a, b) = self.endpoints(edge);
        a.distance(b)
    }

    /// Edges incident on each vertex.
    pub fn vertex_edges(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.vertices.len()];
        for (i, [a, b]) in self.edges.iter().enumerate() {
            out[*a].push(i);
            out[*b].push(i);
        }
        out
    }
}

/// Errors from geometry engine operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("solid not found: {handle}")]
    SolidNotFound { handle: SolidHandle },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("edge index {index} out of range")]
    InvalidEdge { index: usize },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("engine error: {message}")]
    Other { message: String },
}

/// Vertex `k` of an `n`-sided regular polygon of `radius` centred on the origin.
/// The first vertex lies on +Y and the winding is clockwise seen from +Z.
pub fn polygon_vertex(radius: f64, sides: u32, k: u32) -> (f64, f64) {
    let phi = std::f64::consts::TAU * f64::from(k) / f64::from(sides);
    (radius * phi.sin(), radius * phi.cos())
}

/// Rotate `p` about an axis through `pivot`.
pub fn rotate_point(p: Vec3, pivot: Vec3, axis: Axis, angle: f64) -> Vec3 {
    rotate_point_cs(p, pivot, axis, angle.cos(), angle.sin())
}

pub(crate) fn rotate_point_cs(p: Vec3, pivot: Vec3, axis: Axis, c: f64, s: f64) -> Vec3 {
    let d = p - pivot;
    let r = match axis {
        Axis::X => Vec3::new(d.x, c * d.y - s * d.z, s * d.y + c * d.z),
        Axis::Y => Vec3::new(c * d.x + s * d.z, d.y, -s * d.x + c * d.z),
        Axis::Z => Vec3::new(c * d.x - s * d.y, s * d.x + c * d.y, d.z),
    };
    pivot + r
}
