//! Scene arena and mesh traversal.
//!
//! The parsed document is flattened into a [`SceneGraph`]: nodes, meshes, accessors and raw
//! buffers addressed by integer ids, with explicit parent links. Traversal walks the node
//! hierarchy and yields every mesh-bearing node together with its world transform.

use std::fmt;

use glam::Mat4;
use prism_core::StreamSemantic;
use tracing::warn;

use crate::accessor::AccessorDesc;

pub type NodeId = usize;
pub type MeshId = usize;
pub type AccessorId = usize;

/// Primitive topology as declared by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Topology::Points => "point list",
            Topology::Lines => "line list",
            Topology::LineLoop => "line loop",
            Topology::LineStrip => "line strip",
            Topology::Triangles => "triangle list",
            Topology::TriangleStrip => "triangle strip",
            Topology::TriangleFan => "triangle fan",
        })
    }
}

impl From<gltf::mesh::Mode> for Topology {
    fn from(mode: gltf::mesh::Mode) -> Self {
        use gltf::mesh::Mode;
        match mode {
            Mode::Points => Topology::Points,
            Mode::Lines => Topology::Lines,
            Mode::LineLoop => Topology::LineLoop,
            Mode::LineStrip => Topology::LineStrip,
            Mode::Triangles => Topology::Triangles,
            Mode::TriangleStrip => Topology::TriangleStrip,
            Mode::TriangleFan => Topology::TriangleFan,
        }
    }
}

/// Semantic of a primitive attribute as declared by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSemantic {
    /// An attribute that maps onto a mesh stream, with its set index.
    Stream(StreamSemantic, u32),
    /// Anything else (joints, weights, application-specific attributes).
    Other(String),
}

impl From<&gltf::Semantic> for AttributeSemantic {
    fn from(semantic: &gltf::Semantic) -> Self {
        use gltf::Semantic;
        match semantic {
            Semantic::Positions => AttributeSemantic::Stream(StreamSemantic::Position, 0),
            Semantic::Normals => AttributeSemantic::Stream(StreamSemantic::Normal, 0),
            Semantic::Tangents => AttributeSemantic::Stream(StreamSemantic::Tangent, 0),
            Semantic::Colors(set) => AttributeSemantic::Stream(StreamSemantic::Color, *set),
            Semantic::TexCoords(set) => AttributeSemantic::Stream(StreamSemantic::Texcoord, *set),
            Semantic::Extras(name) => AttributeSemantic::Other(format!("_{name}")),
            other => AttributeSemantic::Other(format!("{other:?}")),
        }
    }
}

impl fmt::Display for AttributeSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSemantic::Stream(semantic, set) => {
                write!(f, "{}_{}", semantic.as_str().to_uppercase(), set)
            }
            AttributeSemantic::Other(name) => f.write_str(name),
        }
    }
}

/// One drawable sub-unit of a mesh definition.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveDef {
    pub topology: Topology,
    pub indices: Option<AccessorId>,
    pub attributes: Vec<(AttributeSemantic, AccessorId)>,
}

impl PrimitiveDef {
    pub fn triangles(indices: Option<AccessorId>) -> Self {
        Self {
            topology: Topology::Triangles,
            indices,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, semantic: StreamSemantic, set: u32, accessor: AccessorId) -> Self {
        self.attributes
            .push((AttributeSemantic::Stream(semantic, set), accessor));
        self
    }
}

/// A source mesh definition, possibly instanced by several nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshDef {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveDef>,
}

impl MeshDef {
    /// Declared name, or `generatedName_<id>` when absent or empty.
    pub fn display_name(&self, id: MeshId) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("generatedName_{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Mat4,
    pub mesh: Option<MeshId>,
}

/// A mesh-bearing node reached during traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    pub node: NodeId,
    pub mesh: MeshId,
    pub world: Mat4,
}

/// Read-only arena holding everything the pipeline needs from a parsed document.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<NodeRecord>,
    roots: Vec<NodeId>,
    meshes: Vec<MeshDef>,
    accessors: Vec<AccessorDesc>,
    buffers: Vec<Vec<u8>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a parsed glTF document and its loaded buffers.
    pub fn from_document(document: &gltf::Document, buffers: Vec<gltf::buffer::Data>) -> Self {
        let mut graph = Self {
            buffers: buffers.into_iter().map(|data| data.0).collect(),
            accessors: document.accessors().map(|a| AccessorDesc::from_gltf(&a)).collect(),
            ..Self::default()
        };

        for mesh in document.meshes() {
            graph.meshes.push(MeshDef {
                name: mesh.name().map(str::to_owned),
                primitives: mesh
                    .primitives()
                    .map(|primitive| PrimitiveDef {
                        topology: primitive.mode().into(),
                        indices: primitive.indices().map(|a| a.index()),
                        attributes: primitive
                            .attributes()
                            .map(|(semantic, accessor)| {
                                (AttributeSemantic::from(&semantic), accessor.index())
                            })
                            .collect(),
                    })
                    .collect(),
            });
        }

        for node in document.nodes() {
            graph.nodes.push(NodeRecord {
                name: node.name().map(str::to_owned),
                parent: None,
                children: Vec::new(),
                local: Mat4::from_cols_array_2d(&node.transform().matrix()),
                mesh: node.mesh().map(|m| m.index()),
            });
        }
        for node in document.nodes() {
            for child in node.children() {
                graph.attach(node.index(), child.index());
            }
        }

        for scene in document.scenes() {
            for node in scene.nodes() {
                graph.add_root(node.index());
            }
        }

        graph
    }

    pub fn add_buffer(&mut self, data: Vec<u8>) -> usize {
        self.buffers.push(data);
        self.buffers.len() - 1
    }

    /// Register an accessor; its diagnostic index is set to the returned id.
    pub fn add_accessor(&mut self, mut accessor: AccessorDesc) -> AccessorId {
        accessor.index = self.accessors.len();
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub fn add_mesh(&mut self, mesh: MeshDef) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_node(&mut self, local: Mat4, mesh: Option<MeshId>) -> NodeId {
        self.nodes.push(NodeRecord {
            name: None,
            parent: None,
            children: Vec::new(),
            local,
            mesh,
        });
        self.nodes.len() - 1
    }

    /// Link `child` under `parent`. A node keeps its first parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if parent >= self.nodes.len() || child >= self.nodes.len() {
            warn!("Ignoring link {} -> {}: node does not exist", parent, child);
            return;
        }
        self.nodes[parent].children.push(child);
        match self.nodes[child].parent {
            None => self.nodes[child].parent = Some(parent),
            Some(existing) => warn!(
                "Node {} has several parents ({} and {}); keeping {}",
                child, existing, parent, existing
            ),
        }
    }

    /// Add a traversal root. Repeated roots are ignored.
    pub fn add_root(&mut self, node: NodeId) {
        if !self.roots.contains(&node) {
            self.roots.push(node);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshDef> {
        self.meshes.get(id)
    }

    pub fn meshes(&self) -> &[MeshDef] {
        &self.meshes
    }

    pub fn accessor(&self, id: AccessorId) -> Option<&AccessorDesc> {
        self.accessors.get(id)
    }

    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// World transform of `node`, composed bottom-up through parent links.
    pub fn world_transform(&self, node: NodeId) -> Mat4 {
        let mut world = Mat4::IDENTITY;
        let mut current = Some(node);
        // Bounded by the node count so a malformed parent cycle cannot loop forever.
        for _ in 0..self.nodes.len() {
            let Some(record) = current.and_then(|id| self.nodes.get(id)) else {
                break;
            };
            world = record.local * world;
            current = record.parent;
        }
        world
    }

    /// Lazily walk every root depth-first, yielding mesh-bearing nodes in order.
    ///
    /// Each call starts a fresh traversal.
    pub fn mesh_instances(&self) -> MeshInstances<'_> {
        MeshInstances {
            graph: self,
            stack: self
                .roots
                .iter()
                .rev()
                .map(|&root| (root, Mat4::IDENTITY))
                .collect(),
            visited: vec![false; self.nodes.len()],
        }
    }
}

/// Depth-first iterator over `(mesh, world transform)` pairs.
pub struct MeshInstances<'a> {
    graph: &'a SceneGraph,
    stack: Vec<(NodeId, Mat4)>,
    visited: Vec<bool>,
}

impl Iterator for MeshInstances<'_> {
    type Item = MeshInstance;

    fn next(&mut self) -> Option<MeshInstance> {
        while let Some((id, parent_world)) = self.stack.pop() {
            let Some(node) = self.graph.nodes.get(id) else {
                warn!("Skipping reference to missing node {}", id);
                continue;
            };
            if std::mem::replace(&mut self.visited[id], true) {
                warn!("Node {} reached more than once; skipping", id);
                continue;
            }

            let world = parent_world * node.local;
            self.stack
                .extend(node.children.iter().rev().map(|&child| (child, world)));

            if let Some(mesh) = node.mesh {
                return Some(MeshInstance {
                    node: id,
                    mesh,
                    world,
                });
            }
        }
        None
    }
}
