//! Fixtures shared by the unit tests: in-memory scene arenas and GLB containers.

use serde_json::{json, Value};

use crate::accessor::{AccessorDesc, ByteRegion, ComponentType, ElementType};
use crate::scene::{AccessorId, SceneGraph};

fn float_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Register a tightly packed float accessor backed by its own buffer.
pub(crate) fn push_floats(graph: &mut SceneGraph, element: ElementType, data: &[f32]) -> AccessorId {
    let bytes = float_bytes(data);
    let len = bytes.len();
    let buffer = graph.add_buffer(bytes);
    graph.add_accessor(
        AccessorDesc::new(0, ComponentType::F32, element, data.len() / element.arity())
            .with_view(ByteRegion::new(buffer, 0, len), 0),
    )
}

pub(crate) fn push_u16_indices(graph: &mut SceneGraph, indices: &[u16]) -> AccessorId {
    let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
    let len = bytes.len();
    let buffer = graph.add_buffer(bytes);
    graph.add_accessor(
        AccessorDesc::new(0, ComponentType::U16, ElementType::Scalar, indices.len())
            .with_view(ByteRegion::new(buffer, 0, len), 0),
    )
}

pub(crate) fn push_u32_indices(graph: &mut SceneGraph, indices: &[u32]) -> AccessorId {
    let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
    let len = bytes.len();
    let buffer = graph.add_buffer(bytes);
    graph.add_accessor(
        AccessorDesc::new(0, ComponentType::U32, ElementType::Scalar, indices.len())
            .with_view(ByteRegion::new(buffer, 0, len), 0),
    )
}

/// Builds a binary glTF container with a single embedded buffer.
#[derive(Default)]
pub(crate) struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GlbBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        }));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    /// POSITION accessor, with the min/max the format requires.
    pub(crate) fn positions(&mut self, points: &[[f32; 3]]) -> usize {
        let flat: Vec<f32> = points.iter().flatten().copied().collect();
        let view = self.view(&float_bytes(&flat));
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": points.len(),
            "type": "VEC3",
            "min": min,
            "max": max,
        }));
        self.accessors.len() - 1
    }

    /// Float accessor of the given type name (`VEC2`, `VEC3`, `VEC4`).
    pub(crate) fn floats(&mut self, kind: &str, arity: usize, data: &[f32]) -> usize {
        let view = self.view(&float_bytes(data));
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": data.len() / arity,
            "type": kind,
        }));
        self.accessors.len() - 1
    }

    pub(crate) fn indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": 5123,
            "count": indices.len(),
            "type": "SCALAR",
        }));
        self.accessors.len() - 1
    }

    /// Add an accessor described verbatim; returns its index.
    pub(crate) fn accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn finish(self, mut document: Value, buffer: Value) -> (Value, Vec<u8>) {
        document["asset"] = json!({ "version": "2.0" });
        document["accessors"] = Value::Array(self.accessors);
        document["bufferViews"] = Value::Array(self.views);
        document["buffers"] = json!([buffer]);
        (document, self.bin)
    }

    /// Assemble the container. `document` supplies scenes, nodes and meshes.
    pub(crate) fn build(self, document: Value) -> Vec<u8> {
        let length = self.bin.len();
        let (document, bin) = self.finish(document, json!({ "byteLength": length }));
        glb(&document, &bin)
    }

    /// Text glTF referencing its binary buffer by `uri`; returns the JSON and buffer bytes.
    pub(crate) fn build_text(self, document: Value, uri: &str) -> (Vec<u8>, Vec<u8>) {
        let length = self.bin.len();
        let (document, bin) = self.finish(document, json!({ "byteLength": length, "uri": uri }));
        (serde_json::to_vec(&document).unwrap(), bin)
    }
}

/// Wrap a JSON document and binary chunk in a GLB container.
pub(crate) fn glb(document: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = serde_json::to_vec(document).unwrap();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }

    let mut total = 12 + 8 + json_chunk.len();
    if !bin_chunk.is_empty() {
        total += 8 + bin_chunk.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    out.extend_from_slice(&json_chunk);
    if !bin_chunk.is_empty() {
        out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        out.extend_from_slice(&bin_chunk);
    }
    out
}

/// Scene with one root node instancing a single-primitive mesh.
pub(crate) fn single_mesh_document(name: &str, primitive: Value) -> Value {
    json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "name": name, "primitives": [primitive] }],
    })
}

/// Builder holding the single counter-clockwise triangle, plus its document.
pub(crate) fn triangle_builder() -> (GlbBuilder, Value) {
    let mut builder = GlbBuilder::new();
    let positions = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let indices = builder.indices(&[0, 1, 2]);
    let document = single_mesh_document(
        "triangle",
        json!({ "attributes": { "POSITION": positions }, "indices": indices }),
    );
    (builder, document)
}

/// A single counter-clockwise triangle in the XY plane, instanced by one root node.
pub(crate) fn triangle_glb() -> Vec<u8> {
    let (builder, document) = triangle_builder();
    builder.build(document)
}
