//! Prism Core - Geometry data model for the Prism ingestion pipeline
//!
//! This crate provides the renderer-ready output types:
//! - Mathematical primitives (re-exported from glam)
//! - `Mesh`, its attribute streams and triangle partitions
//! - Bounding volumes

pub mod error;
pub mod mesh;
pub mod types;

pub use error::MeshError;
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
pub use mesh::{Mesh, MeshList, MeshPartition, MeshStream, StreamSemantic};
pub use types::{BoundingBox, BoundingSphere};
