use crate::mesh::StreamSemantic;

/// Invariant violations reported by [`crate::Mesh::verify`] and partition merging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("stream '{name}' holds {len} values, expected {expected} ({vertex_count} vertices x {arity})")]
    StreamLength {
        name: String,
        len: usize,
        expected: usize,
        vertex_count: usize,
        arity: usize,
    },

    #[error("stream '{name}' has arity {arity}, which is not valid for {semantic:?}")]
    StreamArity {
        name: String,
        semantic: StreamSemantic,
        arity: usize,
    },

    #[error("partition '{identifier}' references vertex {index} but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        identifier: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("partition '{identifier}' declares {face_count} faces but holds {len} indices")]
    FaceCount {
        identifier: String,
        face_count: usize,
        len: usize,
    },

    #[error("partition '{identifier}' cannot be offset by {base}: indices would exceed u32")]
    IndexOverflow { identifier: String, base: usize },
}
