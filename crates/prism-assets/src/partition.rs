//! Triangle partition construction from a primitive's index accessor.

use prism_core::{mesh::FACE_VERTEX_COUNT, MeshPartition};
use tracing::debug;

use crate::config::LoaderConfig;
use crate::error::{DecodeError, PrimitiveError};
use crate::scene::{PrimitiveDef, SceneGraph, Topology};

/// Reject primitives that can never produce a triangle partition, before any decoding.
pub fn check_primitive(primitive: &PrimitiveDef, config: &LoaderConfig) -> Result<(), PrimitiveError> {
    if primitive.topology != Topology::Triangles {
        return Err(PrimitiveError::UnsupportedTopology(primitive.topology));
    }
    if primitive.indices.is_none() && !config.generate_missing_indices {
        return Err(PrimitiveError::MissingIndices);
    }
    Ok(())
}

/// Build the triangle partition of `primitive` over `vertex_count` vertices.
pub fn build_partition(
    graph: &SceneGraph,
    primitive: &PrimitiveDef,
    identifier: &str,
    vertex_count: usize,
    config: &LoaderConfig,
) -> Result<MeshPartition, PrimitiveError> {
    check_primitive(primitive, config)?;

    let indices = match primitive.indices {
        Some(id) => graph
            .accessor(id)
            .ok_or(DecodeError::MissingAccessor(id))?
            .read_indices(graph.buffers())?,
        None => {
            debug!("Generating {} sequential indices for '{}'", vertex_count, identifier);
            (0..vertex_count as u32).collect()
        }
    };

    let remainder = indices.len() % FACE_VERTEX_COUNT;
    if remainder != 0 {
        if config.strict_index_count {
            return Err(PrimitiveError::IndexCount(indices.len()));
        }
        debug!(
            "Dropping {} trailing indices of '{}' ({} is not a multiple of {})",
            remainder,
            identifier,
            indices.len(),
            FACE_VERTEX_COUNT
        );
    }

    let partition = MeshPartition::new(identifier, indices);
    if let Some(index) = partition.max_index().filter(|&i| i as usize >= vertex_count) {
        return Err(PrimitiveError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }
    Ok(partition)
}
