use std::path::Path;

use prism_core::MeshList;

use crate::error::LoadError;

/// A loader for one family of geometry file formats.
pub trait GeometryLoader {
    /// Lowercase file extensions this loader accepts, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Load `path`, appending its meshes to `meshes`. On error `meshes` is left unchanged.
    fn load(&self, path: &Path, meshes: &mut MeshList) -> Result<(), LoadError>;

    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().iter().any(|s| s.eq_ignore_ascii_case(ext)))
    }
}
