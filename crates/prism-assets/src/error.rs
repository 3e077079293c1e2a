use std::path::PathBuf;

use crate::scene::Topology;

/// Errors that abort a whole load. The caller's mesh list is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("geometry file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unsupported geometry format '{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to parse glTF file '{0}': {1}")]
    Parse(PathBuf, #[source] gltf::Error),

    #[error("failed to load buffers for '{0}': {1}")]
    Buffers(PathBuf, #[source] gltf::Error),
}

/// Failures while decoding an accessor's byte region.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("accessor {0} does not exist")]
    MissingAccessor(usize),

    #[error("accessor {accessor} has unsupported component type {component:?} for {usage}")]
    UnsupportedComponentType {
        accessor: usize,
        component: crate::accessor::ComponentType,
        usage: &'static str,
    },

    #[error("accessor {accessor} has unsupported element type {element:?} for {usage}")]
    UnsupportedElementType {
        accessor: usize,
        element: crate::accessor::ElementType,
        usage: &'static str,
    },

    #[error("accessor {accessor} references missing buffer {buffer}")]
    MissingBuffer { accessor: usize, buffer: usize },

    #[error("accessor {accessor} reads bytes {start}..{end} past the end of its region ({limit} bytes)")]
    OutOfBounds {
        accessor: usize,
        start: usize,
        end: usize,
        limit: usize,
    },

    #[error("accessor {accessor} element {element} is out of range (count {count})")]
    ElementOutOfRange {
        accessor: usize,
        element: usize,
        count: usize,
    },

    #[error("accessor {accessor} declares {count} elements, more than can be allocated")]
    TooLarge { accessor: usize, count: usize },

    #[error("accessor {accessor} has a byte stride of {stride}, smaller than its {element_size}-byte elements")]
    StrideTooSmall {
        accessor: usize,
        stride: usize,
        element_size: usize,
    },
}

/// Recoverable failures that skip a single primitive; traversal continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrimitiveError {
    #[error("unsupported primitive topology: {0}")]
    UnsupportedTopology(Topology),

    #[error("primitive has no index accessor")]
    MissingIndices,

    #[error("primitive has no position attribute")]
    MissingPositions,

    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Mesh(#[from] prism_core::MeshError),
}
