use serde::{Deserialize, Serialize};

/// How the bounding sphere radius is derived from the position stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SphereFit {
    /// Radius is the distance from the box center to the box minimum (half diagonal).
    #[default]
    MinCorner,
    /// Radius is the distance from the box center to the farthest position.
    FarthestPoint,
}

/// Options controlling how primitives are decoded and assembled into meshes.
///
/// The defaults reproduce the loader's established behavior; every option that departs
/// from it is opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Synthesize vertex normals when a primitive has none.
    pub generate_normals: bool,
    /// Synthesize tangents when a primitive has positions, normals and texcoords.
    pub generate_tangents: bool,
    /// Number of texture coordinate sets kept per primitive (sets beyond are discarded).
    pub texcoord_sets: u32,
    /// Store `1 - v` for texture coordinates.
    pub flip_texcoord_v: bool,
    /// Reject primitives whose index count is not a multiple of 3 instead of truncating.
    pub strict_index_count: bool,
    /// Emit sequential indices for non-indexed triangle lists instead of skipping them.
    pub generate_missing_indices: bool,
    /// Apply the node transform to normals and tangents as well as positions.
    pub transform_normals: bool,
    /// Bounding sphere fit.
    pub sphere_fit: SphereFit,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            generate_normals: true,
            generate_tangents: true,
            texcoord_sets: 1,
            flip_texcoord_v: false,
            strict_index_count: false,
            generate_missing_indices: false,
            transform_normals: false,
            sphere_fit: SphereFit::MinCorner,
        }
    }
}
