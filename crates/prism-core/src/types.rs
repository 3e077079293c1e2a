//! Bounding volumes shared by meshes and the geometry handler

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// The default box is inverted (`min = +inf`, `max = -inf`) so that extending it with the
/// first point yields a degenerate box around that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(Vec3::INFINITY, Vec3::NEG_INFINITY)
    }
}

impl BoundingBox {
    pub fn new<T: Into<Vec3>>(min: T, max: T) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Accumulate a box over a set of points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::default(), |bbox, point| bbox.extend(point))
    }

    /// Grow the box to contain `point`.
    pub fn extend(self, point: Vec3) -> Self {
        Self::new(self.min.min(point), self.max.max(point))
    }

    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// True while no point has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Box enclosing the eight transformed corners.
    pub fn transform(self, transform: Mat4) -> Self {
        if self.is_empty() {
            return self;
        }
        (0..8)
            .map(|corner| {
                Vec3::new(
                    if corner & 1 == 0 { self.min.x } else { self.max.x },
                    if corner & 2 == 0 { self.min.y } else { self.max.y },
                    if corner & 4 == 0 { self.min.z } else { self.max.z },
                )
            })
            .map(|point| transform.transform_point3(point))
            .fold(Self::default(), Self::extend)
    }
}

/// Bounding sphere stored alongside the box on every mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centered on the box with radius `|center - min|`.
    ///
    /// This is half the box diagonal: it always encloses the box but is not the minimal
    /// sphere of the underlying points.
    pub fn from_box(bbox: &BoundingBox) -> Self {
        if bbox.is_empty() {
            return Self::default();
        }
        let center = bbox.center();
        Self::new(center, (center - bbox.min).length())
    }

    /// Sphere centered on the box whose radius reaches the farthest point.
    pub fn farthest_point(bbox: &BoundingBox, points: impl IntoIterator<Item = Vec3>) -> Self {
        if bbox.is_empty() {
            return Self::default();
        }
        let center = bbox.center();
        let radius = points
            .into_iter()
            .map(|point| point.distance(center))
            .fold(0.0_f32, f32::max);
        Self::new(center, radius)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius + f32::EPSILON * self.radius.max(1.0)
    }
}
