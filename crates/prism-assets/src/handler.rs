use std::collections::HashSet;
use std::path::{Path, PathBuf};

use prism_core::{BoundingBox, Mesh, MeshList};
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::gltf_loader::GltfLoader;
use crate::loader::GeometryLoader;

/// Owns the geometry loaded for a session. Dispatches files to loaders by extension and
/// remembers which paths have already been loaded.
pub struct GeometryHandler {
    base_path: PathBuf,
    loaders: Vec<Box<dyn GeometryLoader>>,
    meshes: MeshList,
    loaded_paths: HashSet<PathBuf>,
}

impl GeometryHandler {
    /// Create a handler with no loaders, resolving relative paths against `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("GeometryHandler created with base path: {}", base_path.display());
        Self {
            base_path,
            loaders: Vec::new(),
            meshes: MeshList::new(),
            loaded_paths: HashSet::new(),
        }
    }

    /// Create a handler with the glTF loader registered.
    pub fn with_default_loaders(base_path: impl Into<PathBuf>, config: LoaderConfig) -> Self {
        let mut handler = Self::new(base_path);
        handler.add_loader(Box::new(GltfLoader::new(config)));
        handler
    }

    /// Register a loader. Later loaders take precedence for shared extensions.
    pub fn add_loader(&mut self, loader: Box<dyn GeometryLoader>) {
        self.loaders.push(loader);
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load a geometry file and return the number of meshes it added.
    /// A path that was already loaded adds nothing and returns 0.
    pub fn load_geometry(&mut self, path: &Path) -> Result<usize, LoadError> {
        let full_path = self.resolve(path);

        if self.loaded_paths.contains(&full_path) {
            debug!("Geometry already loaded: {}", full_path.display());
            return Ok(0);
        }

        if !full_path.exists() {
            return Err(LoadError::NotFound(full_path));
        }

        let loader = self
            .loaders
            .iter()
            .rev()
            .find(|loader| loader.can_load(&full_path))
            .ok_or_else(|| LoadError::UnsupportedFormat {
                extension: full_path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: full_path.clone(),
            })?;

        let mut loaded = MeshList::new();
        loader.load(&full_path, &mut loaded)?;

        let count = loaded.len();
        info!("Loaded {} meshes from {}", count, full_path.display());
        self.meshes.extend(loaded);
        self.loaded_paths.insert(full_path);
        Ok(count)
    }

    /// True if any mesh has been loaded.
    pub fn has_geometry(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Drop all meshes and forget loaded paths.
    pub fn clear_geometry(&mut self) {
        self.meshes.clear();
        self.loaded_paths.clear();
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Union of every mesh's bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.meshes
            .iter()
            .map(|mesh| *mesh.bounding_box())
            .fold(BoundingBox::default(), BoundingBox::union)
    }

    /// The mesh owning the partition named `identifier`.
    pub fn find_parent_mesh(&self, identifier: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| {
            mesh.partitions()
                .iter()
                .any(|partition| partition.identifier() == identifier)
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
