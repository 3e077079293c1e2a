//! Merges the primitives of one mesh definition into a single [`Mesh`].

use std::path::{Path, PathBuf};

use glam::{Mat3, Mat4};
use prism_core::{Mesh, MeshError, MeshPartition, MeshStream, StreamSemantic};
use tracing::debug;

use crate::bounds::compute_bounds;
use crate::config::LoaderConfig;
use crate::streams::PrimitiveStreams;

/// Concatenates primitive vertex data and offsets each partition into the merged range.
///
/// A stream absent from some primitives is zero-filled over their vertex ranges. The first
/// primitive to provide a stream fixes its arity; later ones are converted to it.
pub struct MeshAssembler {
    name: String,
    source: PathBuf,
    vertex_count: usize,
    streams: Vec<MeshStream>,
    partitions: Vec<MeshPartition>,
}

impl MeshAssembler {
    pub fn new(name: impl Into<String>, source: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            source: source.as_ref().to_path_buf(),
            vertex_count: 0,
            streams: Vec::new(),
            partitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Append one primitive. Fails, leaving the assembler unchanged, when the merged vertex
    /// range would no longer be addressable by `u32` indices.
    pub fn push_primitive(
        &mut self,
        streams: PrimitiveStreams,
        mut partition: MeshPartition,
    ) -> Result<(), MeshError> {
        let base = self.vertex_count;
        let added = streams.vertex_count();
        let total = base + added;
        let overflow = || MeshError::IndexOverflow {
            identifier: partition.identifier().to_string(),
            base,
        };
        if total > u32::MAX as usize + 1 {
            return Err(overflow());
        }
        let offset = u32::try_from(base).map_err(|_| overflow())?;
        partition.offset(offset)?;

        for stream in streams.into_streams() {
            let existing = self
                .streams
                .iter_mut()
                .find(|s| s.semantic() == stream.semantic() && s.index() == stream.index());
            match existing {
                Some(merged) => merged.extend_from(&stream),
                None => {
                    let mut merged = MeshStream::new(stream.semantic(), stream.index(), stream.arity());
                    merged.pad_elements(base);
                    merged.extend_from(&stream);
                    self.streams.push(merged);
                }
            }
        }

        for stream in &mut self.streams {
            let missing = total.saturating_sub(stream.element_count());
            stream.pad_elements(missing);
        }

        self.partitions.push(partition);
        self.vertex_count = total;
        Ok(())
    }

    /// Apply the instance transform, compute bounds and produce the mesh.
    pub fn finish(self, transform: &Mat4, config: &LoaderConfig) -> Mesh {
        let mut mesh = Mesh::new(self.name);
        mesh.set_source(self.source);

        let linear = Mat3::from_mat4(*transform);
        let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };

        for mut stream in self.streams {
            match stream.semantic() {
                StreamSemantic::Position => stream.transform_points(transform),
                StreamSemantic::Normal if config.transform_normals => {
                    stream.transform_directions(&normal_matrix)
                }
                StreamSemantic::Tangent if config.transform_normals => {
                    stream.transform_directions(&linear)
                }
                _ => {}
            }
            mesh.add_stream(stream);
        }

        let bounds = mesh
            .stream(StreamSemantic::Position, 0)
            .map(|positions| (compute_bounds(positions, config.sphere_fit), positions.element_count()));
        if let Some(((bbox, sphere), vertex_count)) = bounds {
            mesh.set_bounding_box(bbox);
            mesh.set_bounding_sphere(sphere);
            mesh.set_vertex_count(vertex_count);
        }

        for partition in self.partitions {
            mesh.add_partition(partition);
        }

        debug!(
            "Assembled mesh '{}': {} vertices, {} faces, {} streams",
            mesh.name(),
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.streams().len()
        );
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle(offset: f32, color: Option<Vec<f32>>) -> (PrimitiveStreams, MeshPartition) {
        let streams = PrimitiveStreams {
            position: Some(MeshStream::with_data(
                StreamSemantic::Position,
                0,
                3,
                vec![offset, 0.0, 0.0, offset + 1.0, 0.0, 0.0, offset, 1.0, 0.0],
            )),
            normal: Some(MeshStream::with_data(StreamSemantic::Normal, 0, 3, [0.0, 0.0, 1.0].repeat(3))),
            color: color.map(|c| MeshStream::with_data(StreamSemantic::Color, 0, c.len() / 3, c)),
            ..Default::default()
        };
        (streams, MeshPartition::new("mesh", vec![0, 1, 2]))
    }

    #[test]
    fn merges_primitives_with_index_offset() {
        let mut assembler = MeshAssembler::new("mesh", "scene.glb");
        let (s, p) = triangle(0.0, None);
        assembler.push_primitive(s, p).unwrap();
        let (s, p) = triangle(2.0, None);
        assembler.push_primitive(s, p).unwrap();

        let mesh = assembler.finish(&Mat4::IDENTITY, &LoaderConfig::default());
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.partitions().len(), 2);
        assert_eq!(mesh.partitions()[1].indices(), &[3, 4, 5]);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.bounding_box().max, Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(mesh.source(), Path::new("scene.glb"));
        assert!(mesh.verify().is_ok());
    }

    #[test]
    fn missing_streams_are_zero_padded() {
        let mut assembler = MeshAssembler::new("mesh", "a.gltf");
        let (s, p) = triangle(0.0, None);
        assembler.push_primitive(s, p).unwrap();
        let (s, p) = triangle(1.0, Some(vec![1.0; 12]));
        assembler.push_primitive(s, p).unwrap();
        let (s, p) = triangle(2.0, None);
        assembler.push_primitive(s, p).unwrap();

        let mesh = assembler.finish(&Mat4::IDENTITY, &LoaderConfig::default());
        let color = mesh.stream(StreamSemantic::Color, 0).unwrap();
        assert_eq!(color.arity(), 4);
        assert_eq!(color.element_count(), 9);
        assert!(color.data()[..12].iter().all(|&v| v == 0.0));
        assert!(color.data()[12..24].iter().all(|&v| v == 1.0));
        assert!(color.data()[24..].iter().all(|&v| v == 0.0));
        assert!(mesh.verify().is_ok());
    }

    #[test]
    fn first_arity_wins() {
        let mut assembler = MeshAssembler::new("mesh", "a.gltf");
        let (s, p) = triangle(0.0, Some(vec![0.5; 9]));
        assembler.push_primitive(s, p).unwrap();
        let (s, p) = triangle(1.0, Some(vec![1.0; 12]));
        assembler.push_primitive(s, p).unwrap();
        let mesh = assembler.finish(&Mat4::IDENTITY, &LoaderConfig::default());
        let color = mesh.stream(StreamSemantic::Color, 0).unwrap();
        assert_eq!(color.arity(), 3);
        assert_eq!(color.data().len(), 18);
    }

    #[test]
    fn transform_applies_to_positions_only_by_default() {
        let mut assembler = MeshAssembler::new("mesh", "a.gltf");
        let (s, p) = triangle(0.0, None);
        assembler.push_primitive(s, p).unwrap();
        let rotate = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)) * rotate;

        let mesh = assembler.finish(&transform, &LoaderConfig::default());
        let positions = mesh.stream(StreamSemantic::Position, 0).unwrap();
        assert!((positions.vec3(2) - Vec3::new(0.0, 0.0, 11.0)).length() < 1e-5);
        assert_eq!(mesh.stream(StreamSemantic::Normal, 0).unwrap().vec3(0), Vec3::Z);
        assert!((mesh.bounding_box().max.z - 11.0).abs() < 1e-5);
    }

    #[test]
    fn transform_normals_when_configured() {
        let mut assembler = MeshAssembler::new("mesh", "a.gltf");
        let (s, p) = triangle(0.0, None);
        assembler.push_primitive(s, p).unwrap();
        let config = LoaderConfig {
            transform_normals: true,
            ..Default::default()
        };
        let transform = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let mesh = assembler.finish(&transform, &config);
        let normal = mesh.stream(StreamSemantic::Normal, 0).unwrap().vec3(0);
        assert!((normal - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn index_overflow_rejects_primitive() {
        let mut assembler = MeshAssembler::new("mesh", "a.gltf");
        let (s, p) = triangle(0.0, None);
        assembler.push_primitive(s, p).unwrap();

        let (s, _) = triangle(1.0, None);
        let result = assembler.push_primitive(s, MeshPartition::new("mesh", vec![0, 1, u32::MAX]));
        assert_eq!(
            result,
            Err(MeshError::IndexOverflow {
                identifier: "mesh".into(),
                base: 3
            })
        );
        assert_eq!(assembler.vertex_count(), 3);

        let mesh = assembler.finish(&Mat4::IDENTITY, &LoaderConfig::default());
        assert_eq!(mesh.partitions().len(), 1);
        assert!(mesh.verify().is_ok());
    }

    #[test]
    fn empty_assembler_gives_empty_mesh() {
        let mesh = MeshAssembler::new("empty", "a.gltf").finish(&Mat4::IDENTITY, &LoaderConfig::default());
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.streams().is_empty());
        assert!(mesh.bounding_box().is_empty());
        assert_eq!(mesh.bounding_sphere().radius, 0.0);
    }
}
