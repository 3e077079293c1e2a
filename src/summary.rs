use std::path::PathBuf;

use prism_core::{Mesh, Vec3};
use serde::Serialize;

/// Printable digest of one loaded mesh.
#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub source: PathBuf,
    pub vertex_count: usize,
    pub face_count: usize,
    pub streams: Vec<String>,
    pub partitions: Vec<String>,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub sphere_center: Vec3,
    pub sphere_radius: f32,
}

impl From<&Mesh> for MeshSummary {
    fn from(mesh: &Mesh) -> Self {
        Self {
            name: mesh.name().to_string(),
            source: mesh.source().to_path_buf(),
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            streams: mesh
                .streams()
                .iter()
                .map(|s| format!("{} ({})", s.name(), s.arity()))
                .collect(),
            partitions: mesh
                .partitions()
                .iter()
                .map(|p| p.identifier().to_string())
                .collect(),
            bounds_min: mesh.bounding_box().min,
            bounds_max: mesh.bounding_box().max,
            sphere_center: mesh.bounding_sphere().center,
            sphere_radius: mesh.bounding_sphere().radius,
        }
    }
}
