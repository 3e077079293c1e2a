//! Prism Assets - glTF geometry ingestion
//!
//! Decodes glTF 2.0 files (.gltf or .glb) into renderer-ready meshes:
//! typed accessor decoding, scene traversal with world transforms, per-primitive
//! stream and partition building, normal/tangent synthesis and mesh assembly.

mod accessor;
mod assembler;
mod bounds;
mod config;
mod derive;
mod error;
mod gltf_loader;
mod handler;
mod loader;
mod partition;
mod scene;
mod streams;

#[cfg(test)]
mod test_support;

pub use accessor::{AccessorDesc, ByteRegion, ComponentType, ElementType, SparseDesc};
pub use assembler::MeshAssembler;
pub use bounds::compute_bounds;
pub use config::{LoaderConfig, SphereFit};
pub use derive::{derive_attributes, generate_normals, generate_tangents};
pub use error::{DecodeError, LoadError, PrimitiveError};
pub use gltf_loader::{build_meshes, load_gltf, load_gltf_slice, GltfLoader, SUPPORTED_EXTENSIONS};
pub use handler::GeometryHandler;
pub use loader::GeometryLoader;
pub use partition::{build_partition, check_primitive};
pub use scene::{
    AccessorId, AttributeSemantic, MeshDef, MeshId, MeshInstance, MeshInstances, NodeId,
    NodeRecord, PrimitiveDef, SceneGraph, Topology,
};
pub use streams::{build_streams, PrimitiveStreams};
