//! Renderer-ready mesh representation
//!
//! A [`Mesh`] owns flat per-vertex attribute [`MeshStream`]s and triangle
//! [`MeshPartition`]s that index into them.

use std::fmt;
use std::path::{Path, PathBuf};

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::types::{BoundingBox, BoundingSphere};

/// Ordered list of meshes produced by a load.
pub type MeshList = Vec<Mesh>;

/// Vertices per face. Only triangle partitions are represented.
pub const FACE_VERTEX_COUNT: usize = 3;

/// Semantic tag of a vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StreamSemantic {
    Position,
    Normal,
    Tangent,
    Color,
    Texcoord,
}

impl StreamSemantic {
    pub const ALL: [StreamSemantic; 5] = [
        StreamSemantic::Position,
        StreamSemantic::Normal,
        StreamSemantic::Tangent,
        StreamSemantic::Color,
        StreamSemantic::Texcoord,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamSemantic::Position => "position",
            StreamSemantic::Normal => "normal",
            StreamSemantic::Tangent => "tangent",
            StreamSemantic::Color => "color",
            StreamSemantic::Texcoord => "texcoord",
        }
    }

    /// Whether `arity` is a legal vector size for this semantic.
    pub fn accepts_arity(self, arity: usize) -> bool {
        match self {
            StreamSemantic::Position | StreamSemantic::Normal | StreamSemantic::Tangent => {
                arity == 3
            }
            StreamSemantic::Color => arity == 3 || arity == 4,
            StreamSemantic::Texcoord => arity == 2 || arity == 3,
        }
    }

    /// Shader-facing stream name, e.g. `i_position` or `i_texcoord_0`.
    pub fn stream_name(self, index: u32) -> String {
        match self {
            StreamSemantic::Texcoord => format!("i_{}_{}", self.as_str(), index),
            _ if index == 0 => format!("i_{}", self.as_str()),
            _ => format!("i_{}_{}", self.as_str(), index),
        }
    }
}

impl fmt::Display for StreamSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flat, semantically tagged per-vertex attribute array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStream {
    name: String,
    semantic: StreamSemantic,
    index: u32,
    arity: usize,
    data: Vec<f32>,
}

impl MeshStream {
    /// Create an empty stream.
    pub fn new(semantic: StreamSemantic, index: u32, arity: usize) -> Self {
        Self::with_data(semantic, index, arity, Vec::new())
    }

    /// Wrap existing flat data. `data.len()` should be a multiple of `arity`.
    pub fn with_data(semantic: StreamSemantic, index: u32, arity: usize, data: Vec<f32>) -> Self {
        debug_assert!(arity > 0, "stream arity must be non-zero");
        Self {
            name: semantic.stream_name(index),
            semantic,
            index,
            arity,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semantic(&self) -> StreamSemantic {
        self.semantic
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Vec<f32> {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Number of whole vectors held.
    pub fn element_count(&self) -> usize {
        self.data.len() / self.arity
    }

    pub fn element(&self, i: usize) -> &[f32] {
        &self.data[i * self.arity..(i + 1) * self.arity]
    }

    pub fn elements(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.arity)
    }

    /// Read element `i` as a 3-vector; missing components read as zero.
    pub fn vec3(&self, i: usize) -> Vec3 {
        let e = self.element(i);
        Vec3::new(
            e[0],
            e.get(1).copied().unwrap_or(0.0),
            e.get(2).copied().unwrap_or(0.0),
        )
    }

    /// Append one vector, zero-filling or truncating it to the stream arity.
    pub fn push_element(&mut self, values: &[f32]) {
        self.data
            .extend((0..self.arity).map(|v| values.get(v).copied().unwrap_or(0.0)));
    }

    /// Append `count` zero vectors.
    pub fn pad_elements(&mut self, count: usize) {
        self.data.resize(self.data.len() + count * self.arity, 0.0);
    }

    /// Append every element of `other`, converted to this stream's arity.
    pub fn extend_from(&mut self, other: &MeshStream) {
        if other.arity == self.arity {
            self.data.extend_from_slice(&other.data);
            return;
        }
        self.data.reserve(other.element_count() * self.arity);
        for element in other.elements() {
            self.push_element(element);
        }
    }

    /// Re-pack the stream to a new arity, zero-filling or truncating each element.
    pub fn set_arity(&mut self, arity: usize) {
        if arity == self.arity {
            return;
        }
        let mut repacked = MeshStream::new(self.semantic, self.index, arity);
        repacked.extend_from(self);
        self.arity = arity;
        self.data = repacked.data;
    }

    /// Transform every element as a point (`w = 1`). Requires arity 3.
    pub fn transform_points(&mut self, transform: &Mat4) {
        debug_assert_eq!(self.arity, 3);
        for element in self.data.chunks_exact_mut(3) {
            let p = transform.transform_point3(Vec3::from_slice(element));
            element.copy_from_slice(&p.to_array());
        }
    }

    /// Transform every element as a direction and renormalize. Requires arity 3.
    pub fn transform_directions(&mut self, transform: &Mat3) {
        debug_assert_eq!(self.arity, 3);
        for element in self.data.chunks_exact_mut(3) {
            let d = (*transform * Vec3::from_slice(element)).normalize_or_zero();
            element.copy_from_slice(&d.to_array());
        }
    }
}

/// A triangle index buffer over the owning mesh's vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPartition {
    identifier: String,
    face_count: usize,
    indices: Vec<u32>,
}

impl MeshPartition {
    /// Build a partition from flat triangle indices. A trailing partial face is dropped.
    pub fn new(identifier: impl Into<String>, mut indices: Vec<u32>) -> Self {
        let face_count = indices.len() / FACE_VERTEX_COUNT;
        indices.truncate(face_count * FACE_VERTEX_COUNT);
        Self {
            identifier: identifier.into(),
            face_count,
            indices,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Shift every index by `base`, used when primitives are concatenated.
    /// Fails, leaving the indices untouched, if any shifted index would not fit in `u32`.
    pub fn offset(&mut self, base: u32) -> Result<(), MeshError> {
        if base == 0 {
            return Ok(());
        }
        let shifted = self
            .indices
            .iter()
            .map(|&index| index.checked_add(base))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| MeshError::IndexOverflow {
                identifier: self.identifier.clone(),
                base: base as usize,
            })?;
        self.indices = shifted;
        Ok(())
    }

    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }
}

/// A renderer-ready mesh assembled from one source mesh definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    name: String,
    source: PathBuf,
    vertex_count: usize,
    streams: Vec<MeshStream>,
    partitions: Vec<MeshPartition>,
    bounding_box: BoundingBox,
    bounding_sphere: BoundingSphere,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: PathBuf::new(),
            vertex_count: 0,
            streams: Vec::new(),
            partitions: Vec::new(),
            bounding_box: BoundingBox::default(),
            bounding_sphere: BoundingSphere::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the file this mesh was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        self.source = source.into();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn set_vertex_count(&mut self, vertex_count: usize) {
        self.vertex_count = vertex_count;
    }

    /// Add a stream, replacing any stream with the same semantic and index.
    pub fn add_stream(&mut self, stream: MeshStream) {
        match self
            .streams
            .iter_mut()
            .find(|s| s.semantic == stream.semantic && s.index == stream.index)
        {
            Some(existing) => *existing = stream,
            None => self.streams.push(stream),
        }
    }

    pub fn stream(&self, semantic: StreamSemantic, index: u32) -> Option<&MeshStream> {
        self.streams
            .iter()
            .find(|s| s.semantic == semantic && s.index == index)
    }

    pub fn streams(&self) -> &[MeshStream] {
        &self.streams
    }

    pub fn add_partition(&mut self, partition: MeshPartition) {
        self.partitions.push(partition);
    }

    pub fn partitions(&self) -> &[MeshPartition] {
        &self.partitions
    }

    /// Total faces across all partitions.
    pub fn face_count(&self) -> usize {
        self.partitions.iter().map(MeshPartition::face_count).sum()
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = bounding_box;
    }

    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    pub fn set_bounding_sphere(&mut self, bounding_sphere: BoundingSphere) {
        self.bounding_sphere = bounding_sphere;
    }

    /// Check stream lengths, stream arities and partition index ranges.
    pub fn verify(&self) -> Result<(), MeshError> {
        for stream in &self.streams {
            if !stream.semantic.accepts_arity(stream.arity) {
                return Err(MeshError::StreamArity {
                    name: stream.name.clone(),
                    semantic: stream.semantic,
                    arity: stream.arity,
                });
            }
            let expected = self.vertex_count * stream.arity;
            if stream.data.len() != expected {
                return Err(MeshError::StreamLength {
                    name: stream.name.clone(),
                    len: stream.data.len(),
                    expected,
                    vertex_count: self.vertex_count,
                    arity: stream.arity,
                });
            }
        }
        for partition in &self.partitions {
            if partition.indices.len() != partition.face_count * FACE_VERTEX_COUNT {
                return Err(MeshError::FaceCount {
                    identifier: partition.identifier.clone(),
                    face_count: partition.face_count,
                    len: partition.indices.len(),
                });
            }
            if let Some(&index) = partition
                .indices
                .iter()
                .find(|&&i| i as usize >= self.vertex_count)
            {
                return Err(MeshError::IndexOutOfRange {
                    identifier: partition.identifier.clone(),
                    index,
                    vertex_count: self.vertex_count,
                });
            }
        }
        Ok(())
    }
}
