//! Per-primitive attribute stream construction.

use prism_core::{MeshStream, StreamSemantic};
use tracing::{debug, warn};

use crate::accessor::AccessorDesc;
use crate::config::LoaderConfig;
use crate::error::{DecodeError, PrimitiveError};
use crate::scene::{AttributeSemantic, PrimitiveDef, SceneGraph};

/// Decoded streams of one primitive, each optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveStreams {
    pub position: Option<MeshStream>,
    pub normal: Option<MeshStream>,
    pub tangent: Option<MeshStream>,
    pub color: Option<MeshStream>,
    pub texcoords: Vec<MeshStream>,
}

impl PrimitiveStreams {
    /// Number of vertices, taken from the position stream.
    pub fn vertex_count(&self) -> usize {
        self.position.as_ref().map_or(0, MeshStream::element_count)
    }

    pub fn texcoord(&self, set: u32) -> Option<&MeshStream> {
        self.texcoords.iter().find(|s| s.index() == set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeshStream> {
        self.position
            .iter()
            .chain(&self.normal)
            .chain(&self.tangent)
            .chain(&self.color)
            .chain(&self.texcoords)
    }

    /// Consume into streams in canonical order: position, normal, tangent, color, texcoords.
    pub fn into_streams(self) -> impl Iterator<Item = MeshStream> {
        self.position
            .into_iter()
            .chain(self.normal)
            .chain(self.tangent)
            .chain(self.color)
            .chain(self.texcoords)
    }

    fn slot(&mut self, semantic: StreamSemantic, set: u32) -> Option<&mut Option<MeshStream>> {
        match (semantic, set) {
            (StreamSemantic::Position, 0) => Some(&mut self.position),
            (StreamSemantic::Normal, 0) => Some(&mut self.normal),
            (StreamSemantic::Tangent, 0) => Some(&mut self.tangent),
            (StreamSemantic::Color, 0) => Some(&mut self.color),
            _ => None,
        }
    }

    fn contains(&self, semantic: StreamSemantic, set: u32) -> bool {
        self.iter()
            .any(|s| s.semantic() == semantic && s.index() == set)
    }

    fn insert(&mut self, stream: MeshStream) {
        if stream.semantic() == StreamSemantic::Texcoord {
            self.texcoords.push(stream);
        } else if let Some(slot) = self.slot(stream.semantic(), stream.index()) {
            *slot = Some(stream);
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(&MeshStream) -> bool) {
        for slot in [&mut self.normal, &mut self.tangent, &mut self.color] {
            if slot.as_ref().is_some_and(|s| !keep(s)) {
                *slot = None;
            }
        }
        self.texcoords.retain(|s| keep(s));
    }
}

/// Stored arity for a semantic given the accessor's native arity.
fn target_arity(semantic: StreamSemantic, native: usize) -> usize {
    match semantic {
        StreamSemantic::Position | StreamSemantic::Normal | StreamSemantic::Tangent => 3,
        StreamSemantic::Color if native == 4 => 4,
        StreamSemantic::Color => 3,
        StreamSemantic::Texcoord if native == 2 => 2,
        StreamSemantic::Texcoord => 3,
    }
}

fn decode_stream(
    graph: &SceneGraph,
    accessor: &AccessorDesc,
    semantic: StreamSemantic,
    set: u32,
    config: &LoaderConfig,
) -> Result<MeshStream, DecodeError> {
    let arity = target_arity(semantic, accessor.arity());
    let mut data = accessor.read_floats(graph.buffers(), arity)?;

    if semantic == StreamSemantic::Texcoord && config.flip_texcoord_v {
        for uv in data.chunks_exact_mut(arity) {
            uv[1] = 1.0 - uv[1];
        }
    }

    debug!(
        "Read {} stream: {} elements, arity {} (native {})",
        semantic.stream_name(set),
        accessor.count,
        arity,
        accessor.arity()
    );
    Ok(MeshStream::with_data(semantic, set, arity, data))
}

/// Decode every supported attribute of `primitive` into typed streams.
///
/// A failure to decode positions fails the primitive. Any other attribute that cannot be
/// decoded, repeats an earlier semantic, or disagrees with the position count is dropped
/// with a warning.
pub fn build_streams(
    graph: &SceneGraph,
    primitive: &PrimitiveDef,
    config: &LoaderConfig,
) -> Result<PrimitiveStreams, PrimitiveError> {
    let mut streams = PrimitiveStreams::default();

    for (semantic, accessor_id) in &primitive.attributes {
        let (semantic, set) = match semantic {
            AttributeSemantic::Stream(semantic, set) => (*semantic, *set),
            AttributeSemantic::Other(name) => {
                warn!("Ignoring unsupported attribute {}", name);
                continue;
            }
        };

        let stored = match semantic {
            StreamSemantic::Texcoord => set < config.texcoord_sets,
            _ => set == 0,
        };
        if !stored {
            debug!("Discarding attribute {}_{}", semantic.as_str(), set);
            continue;
        }
        if streams.contains(semantic, set) {
            warn!("Ignoring repeated attribute {}_{}", semantic.as_str(), set);
            continue;
        }

        let decoded = graph
            .accessor(*accessor_id)
            .ok_or(DecodeError::MissingAccessor(*accessor_id))
            .and_then(|accessor| decode_stream(graph, accessor, semantic, set, config));

        match decoded {
            Ok(stream) => streams.insert(stream),
            Err(err) if semantic == StreamSemantic::Position => return Err(err.into()),
            Err(err) => warn!("Skipping attribute {}_{}: {}", semantic.as_str(), set, err),
        }
    }

    if streams.position.is_some() {
        let vertex_count = streams.vertex_count();
        streams.retain(|stream| {
            let matches = stream.element_count() == vertex_count;
            if !matches {
                warn!(
                    "Skipping stream {}: {} elements for {} vertices",
                    stream.name(),
                    stream.element_count(),
                    vertex_count
                );
            }
            matches
        });
    }

    Ok(streams)
}
