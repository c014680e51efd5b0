use serde::{Deserialize, Serialize};

use crate::vector::{Axis, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning two corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box of extent `size` centred on `center`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn volume(&self) -> f64 {
        self.size().product()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlapping region, `None` unless the boxes overlap by more than `eps` on every axis.
    pub fn intersection(&self, other: &Aabb, eps: f64) -> Option<Aabb> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if Axis::ALL
            .iter()
            .all(|&a| max.get(a) - min.get(a) > eps)
        {
            Some(Aabb { min, max })
        } else {
            None
        }
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The eight corners, bottom face first (z = min), counter-clockwise.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_and_size() {
        let b = Aabb::from_points([
            Vec3::new(-1.0, 0.5, 0.0),
            Vec3::new(1.0, -0.5, 0.2),
            Vec3::new(0.0, 0.0, -0.2),
        ])
        .unwrap();
        assert_eq!(b.size(), Vec3::new(2.0, 1.0, 0.4));
        assert_eq!(b.center(), Vec3::new(0.0, 0.0, 0.0));
        assert!(Aabb::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersection(&b, 1e-12).is_none());
        let c = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let i = a.intersection(&c, 1e-12).unwrap();
        assert_eq!(i.size(), Vec3::splat(0.5));
    }
}
