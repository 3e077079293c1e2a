use std::collections::HashSet;
use std::path::Path;

use prism_core::{MeshList, MeshPartition};
use tracing::{debug, info, warn};

use crate::assembler::MeshAssembler;
use crate::config::LoaderConfig;
use crate::derive::derive_attributes;
use crate::error::{LoadError, PrimitiveError};
use crate::loader::GeometryLoader;
use crate::partition::{build_partition, check_primitive};
use crate::scene::{PrimitiveDef, SceneGraph};
use crate::streams::{build_streams, PrimitiveStreams};

/// File extensions handled by the glTF loader, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["glb", "gltf"];

/// Load a glTF 2.0 file (.gltf or .glb) and build one mesh per instanced mesh definition.
pub fn load_gltf(path: &Path, config: &LoaderConfig) -> Result<MeshList, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(extension))
    {
        return Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    load_gltf_slice(&bytes, path.parent(), path, config)
}

/// Load glTF content already in memory. External buffer URIs resolve against `base_dir`.
pub fn load_gltf_slice(
    bytes: &[u8],
    base_dir: Option<&Path>,
    source: &Path,
    config: &LoaderConfig,
) -> Result<MeshList, LoadError> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Parse(source.to_path_buf(), e))?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)
        .map_err(|e| LoadError::Buffers(source.to_path_buf(), e))?;

    let graph = SceneGraph::from_document(&document, buffers);
    debug!(
        "Parsed '{}': {} nodes, {} meshes, {} buffers",
        source.display(),
        graph.nodes().len(),
        graph.meshes().len(),
        graph.buffers().len()
    );

    let meshes = build_meshes(&graph, source, config);
    info!("Loaded {} meshes from '{}'", meshes.len(), source.display());
    Ok(meshes)
}

/// Translate every instanced mesh definition of `graph`, in traversal order.
///
/// Only the first instance of a mesh definition is translated; its transform is baked in.
pub fn build_meshes(graph: &SceneGraph, source: &Path, config: &LoaderConfig) -> MeshList {
    let mut meshes = MeshList::new();
    let mut translated = HashSet::new();

    for instance in graph.mesh_instances() {
        if !translated.insert(instance.mesh) {
            debug!(
                "Mesh {} already translated; ignoring instance on node {}",
                instance.mesh, instance.node
            );
            continue;
        }
        let Some(definition) = graph.mesh(instance.mesh) else {
            warn!("Node {} references missing mesh {}", instance.node, instance.mesh);
            continue;
        };

        let name = definition.display_name(instance.mesh);
        info!("Translating mesh '{}'", name);

        let mut assembler = MeshAssembler::new(&name, source);
        for (index, primitive) in definition.primitives.iter().enumerate() {
            let pushed = translate_primitive(graph, primitive, &name, config).and_then(
                |(streams, partition)| Ok(assembler.push_primitive(streams, partition)?),
            );
            if let Err(err) = pushed {
                warn!("Skipping primitive {} of mesh '{}': {}", index, name, err);
            }
        }
        meshes.push(assembler.finish(&instance.world, config));
    }

    meshes
}

fn translate_primitive(
    graph: &SceneGraph,
    primitive: &PrimitiveDef,
    name: &str,
    config: &LoaderConfig,
) -> Result<(PrimitiveStreams, MeshPartition), PrimitiveError> {
    check_primitive(primitive, config)?;

    let mut streams = build_streams(graph, primitive, config)?;
    if streams.position.is_none() {
        return Err(PrimitiveError::MissingPositions);
    }
    let partition = build_partition(graph, primitive, name, streams.vertex_count(), config)?;
    debug!(
        "Partition '{}': {} faces over {} vertices",
        name,
        partition.face_count(),
        streams.vertex_count()
    );

    derive_attributes(&mut streams, &partition, config);
    Ok((streams, partition))
}

/// [`GeometryLoader`] for glTF 2.0 files.
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    config: LoaderConfig,
}

impl GltfLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

impl GeometryLoader for GltfLoader {
    fn extensions(&self) -> &[&str] {
        SUPPORTED_EXTENSIONS
    }

    fn load(&self, path: &Path, meshes: &mut MeshList) -> Result<(), LoadError> {
        let loaded = load_gltf(path, &self.config)?;
        meshes.extend(loaded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{triangle_builder, triangle_glb, GlbBuilder};
    use glam::Vec3;
    use prism_core::StreamSemantic;
    use serde_json::json;

    fn load(bytes: &[u8]) -> MeshList {
        load_gltf_slice(bytes, None, Path::new("memory.glb"), &LoaderConfig::default()).unwrap()
    }

    #[test]
    fn single_triangle() {
        let meshes = load(&triangle_glb());
        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        assert_eq!(mesh.name(), "triangle");
        assert_eq!(mesh.source(), Path::new("memory.glb"));
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.partitions().len(), 1);
        assert_eq!(mesh.partitions()[0].face_count(), 1);
        assert_eq!(mesh.partitions()[0].identifier(), "triangle");
        assert_eq!(mesh.bounding_box().min, Vec3::ZERO);
        assert_eq!(mesh.bounding_box().max, Vec3::new(1.0, 1.0, 0.0));

        let normals = mesh.stream(StreamSemantic::Normal, 0).unwrap();
        for i in 0..3 {
            assert_eq!(normals.vec3(i), Vec3::Z);
        }
        assert!(mesh.stream(StreamSemantic::Tangent, 0).is_none());
        assert!(mesh.verify().is_ok());
    }

    #[test]
    fn instanced_mesh_translated_once_with_first_transform() {
        let mut builder = GlbBuilder::new();
        let positions = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let indices = builder.indices(&[0, 1, 2]);
        let bytes = builder.build(json!({
            "scenes": [{ "nodes": [0, 1] }],
            "nodes": [
                { "mesh": 0, "translation": [10.0, 0.0, 0.0] },
                { "mesh": 0, "translation": [20.0, 0.0, 0.0] },
            ],
            "meshes": [{
                "primitives": [{ "attributes": { "POSITION": positions }, "indices": indices }],
            }],
        }));

        let meshes = load(&bytes);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name(), "generatedName_0");
        assert_eq!(meshes[0].bounding_box().min, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn nested_nodes_bake_world_transform() {
        let mut builder = GlbBuilder::new();
        let positions = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let indices = builder.indices(&[0, 1, 2]);
        let bytes = builder.build(json!({
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "children": [1], "translation": [0.0, 0.0, 5.0] },
                { "mesh": 0, "scale": [2.0, 2.0, 2.0] },
            ],
            "meshes": [{
                "name": "child",
                "primitives": [{ "attributes": { "POSITION": positions }, "indices": indices }],
            }],
        }));

        let meshes = load(&bytes);
        assert_eq!(meshes[0].bounding_box().min, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(meshes[0].bounding_box().max, Vec3::new(2.0, 2.0, 5.0));
    }

    #[test]
    fn non_triangle_primitives_are_skipped() {
        let mut builder = GlbBuilder::new();
        let positions = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let indices = builder.indices(&[0, 1, 2]);
        let bytes = builder.build(json!({
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{
                "name": "mixed",
                "primitives": [
                    { "attributes": { "POSITION": positions }, "indices": indices, "mode": 1 },
                    { "attributes": { "POSITION": positions } },
                    { "attributes": { "POSITION": positions }, "indices": indices },
                ],
            }],
        }));

        let meshes = load(&bytes);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].partitions().len(), 1);
        assert_eq!(meshes[0].vertex_count(), 3);
    }

    #[test]
    fn primitives_merge_into_one_mesh() {
        let mut builder = GlbBuilder::new();
        let a = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let b = builder.positions(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
        let uv = builder.floats("VEC2", 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let indices = builder.indices(&[0, 1, 2]);
        let bytes = builder.build(json!({
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{
                "name": "pair",
                "primitives": [
                    { "attributes": { "POSITION": a, "TEXCOORD_0": uv }, "indices": indices },
                    { "attributes": { "POSITION": b }, "indices": indices },
                ],
            }],
        }));

        let mesh = &load(&bytes)[0];
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.partitions()[1].indices(), &[3, 4, 5]);
        let texcoords = mesh.stream(StreamSemantic::Texcoord, 0).unwrap();
        assert_eq!(texcoords.arity(), 2);
        assert_eq!(texcoords.element_count(), 6);
        assert!(mesh.stream(StreamSemantic::Tangent, 0).is_some());
        assert!(mesh.verify().is_ok());
    }

    #[test]
    fn scenes_without_nodes_give_no_meshes() {
        let mut builder = GlbBuilder::new();
        let positions = builder.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let indices = builder.indices(&[0, 1, 2]);
        let bytes = builder.build(json!({
            "meshes": [{
                "primitives": [{ "attributes": { "POSITION": positions }, "indices": indices }],
            }],
        }));
        assert!(load(&bytes).is_empty());
    }

    #[test]
    fn oversized_attribute_is_skipped() {
        let (mut builder, mut document) = triangle_builder();
        let view = builder.view(&[0u8; 36]);
        let color = builder.accessor(json!({
            "bufferView": view,
            "componentType": 5126,
            "count": 1u64 << 40,
            "type": "VEC4",
        }));
        document["meshes"][0]["primitives"][0]["attributes"]["COLOR_0"] = json!(color);

        let meshes = load(&builder.build(document));
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertex_count(), 3);
        assert!(meshes[0].stream(StreamSemantic::Color, 0).is_none());
        assert!(meshes[0].verify().is_ok());
    }

    #[test]
    fn application_attributes_are_skipped() {
        let (mut builder, mut document) = triangle_builder();
        let custom = builder.floats("VEC3", 3, &[9.0; 9]);
        document["meshes"][0]["primitives"][0]["attributes"]["_CUSTOM"] = json!(custom);

        let meshes = load(&builder.build(document));
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].streams().len(), 2);
        assert_eq!(meshes[0].vertex_count(), 3);
    }

    #[test]
    fn unprefixed_unknown_attribute_fails_validation() {
        let (mut builder, mut document) = triangle_builder();
        let custom = builder.floats("VEC3", 3, &[9.0; 9]);
        document["meshes"][0]["primitives"][0]["attributes"]["FOO"] = json!(custom);

        let result = load_gltf_slice(
            &builder.build(document),
            None,
            Path::new("memory.glb"),
            &LoaderConfig::default(),
        );
        assert!(matches!(result, Err(LoadError::Parse(..))));
    }

    #[test]
    fn text_gltf_resolves_external_buffer() {
        let dir = std::env::temp_dir().join("prism_text_gltf");
        std::fs::create_dir_all(&dir).unwrap();
        let (builder, document) = triangle_builder();
        let (json_text, bin) = builder.build_text(document, "scene.bin");
        std::fs::write(dir.join("scene.gltf"), json_text).unwrap();
        std::fs::write(dir.join("scene.bin"), bin).unwrap();

        let result = load_gltf(&dir.join("scene.gltf"), &LoaderConfig::default());
        std::fs::remove_dir_all(&dir).ok();
        let meshes = result.unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertex_count(), 3);
        assert_eq!(meshes[0].bounding_box().max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn missing_external_buffer_fails_load_and_keeps_list() {
        let dir = std::env::temp_dir().join("prism_missing_bin");
        std::fs::create_dir_all(&dir).unwrap();
        let (builder, document) = triangle_builder();
        let (json_text, _) = builder.build_text(document, "missing.bin");
        let path = dir.join("scene.gltf");
        std::fs::write(&path, json_text).unwrap();

        let direct = load_gltf(&path, &LoaderConfig::default());
        let mut meshes = load(&triangle_glb());
        let through_loader = GltfLoader::default().load(&path, &mut meshes);
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(direct, Err(LoadError::Buffers(..))));
        assert!(matches!(through_loader, Err(LoadError::Buffers(..))));
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name(), "triangle");
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let result = load_gltf_slice(b"not gltf", None, Path::new("bad.glb"), &LoaderConfig::default());
        assert!(matches!(result, Err(LoadError::Parse(..))));
    }

    #[test]
    fn missing_file_and_unsupported_extension() {
        let config = LoaderConfig::default();
        assert!(matches!(
            load_gltf(Path::new("/nonexistent/model.glb"), &config),
            Err(LoadError::NotFound(_))
        ));

        let path = std::env::temp_dir().join("prism_loader_test.obj");
        std::fs::write(&path, b"o cube").unwrap();
        let result = load_gltf(&path, &config);
        std::fs::remove_file(&path).ok();
        match result {
            Err(LoadError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "obj"),
            other => panic!("expected UnsupportedFormat, got: {:?}", other),
        }
    }

    #[test]
    fn loader_appends_to_list() {
        let path = std::env::temp_dir().join("prism_loader_append.GLB");
        std::fs::write(&path, triangle_glb()).unwrap();
        let loader = GltfLoader::default();
        assert!(loader.can_load(&path));

        let mut meshes = MeshList::new();
        let result = loader.load(&path, &mut meshes);
        std::fs::remove_file(&path).ok();
        assert!(result.is_ok());
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].source(), path.as_path());
    }
}
