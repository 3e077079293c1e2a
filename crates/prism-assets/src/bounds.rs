use glam::Vec3;
use prism_core::{BoundingBox, BoundingSphere, MeshStream};

use crate::config::SphereFit;

fn points(positions: &MeshStream) -> impl Iterator<Item = Vec3> + '_ {
    (0..positions.element_count()).map(|i| positions.vec3(i))
}

/// Bounding box and sphere of a position stream.
///
/// An empty stream yields the inverted default box and a zero sphere.
pub fn compute_bounds(positions: &MeshStream, fit: SphereFit) -> (BoundingBox, BoundingSphere) {
    let bbox = BoundingBox::from_points(points(positions));
    let sphere = match fit {
        SphereFit::MinCorner => BoundingSphere::from_box(&bbox),
        SphereFit::FarthestPoint => BoundingSphere::farthest_point(&bbox, points(positions)),
    };
    (bbox, sphere)
}
