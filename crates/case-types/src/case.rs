use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::vector::Vec3;

/// Which half of the case a support is mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Base,
    Lid,
}

/// Case extent derived from the registered instruments.
///
/// Recomputed from scratch whenever the instrument list or clearance changes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Case {
    pub size: Vec3,
    pub location: Vec3,
    /// Bottom plane of the case.
    pub base_z: f64,
    /// Top plane of the case.
    pub lid_z: f64,
}

impl Case {
    /// Degenerate case used when no instrument is registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Case enclosing `bounds` with `clearance` added on every side.
    pub fn from_bounds(bounds: &Aabb, clearance: f64) -> Self {
        let size = bounds.size() + Vec3::splat(clearance * 2.0);
        let location = bounds.center();
        Self {
            size,
            location,
            base_z: location.z - size.z / 2.0,
            lid_z: location.z + size.z / 2.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_bounds_adds_clearance_on_both_sides() {
        let bounds = Aabb::new(Vec3::new(-1.0, -0.5, -0.2), Vec3::new(1.0, 0.5, 0.2));
        let case = Case::from_bounds(&bounds, 0.01);
        assert_abs_diff_eq!(case.size.x, 2.02, epsilon = 1e-12);
        assert_abs_diff_eq!(case.size.y, 1.02, epsilon = 1e-12);
        assert_abs_diff_eq!(case.size.z, 0.42, epsilon = 1e-12);
        assert_abs_diff_eq!(case.base_z, -0.21, epsilon = 1e-12);
        assert_abs_diff_eq!(case.lid_z, 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_case_is_zero() {
        let case = Case::empty();
        assert!(case.is_empty());
        assert_eq!(case.location, Vec3::ZERO);
        assert_eq!(case.base_z, 0.0);
        assert_eq!(case.lid_z, 0.0);
    }
}
