//! Synthesis of normals and tangents for primitives that omit them.

use glam::{Vec2, Vec3};
use prism_core::{MeshPartition, MeshStream, StreamSemantic};
use tracing::debug;

use crate::config::LoaderConfig;
use crate::streams::PrimitiveStreams;

const DEGENERATE_UV_EPSILON: f32 = 1e-12;

fn valid_triangles<'a>(
    indices: &'a [u32],
    vertex_count: usize,
) -> impl Iterator<Item = [usize; 3]> + 'a {
    indices
        .chunks_exact(3)
        .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
        .filter(move |t| t.iter().all(|&i| i < vertex_count))
}

/// Area-weighted vertex normals.
///
/// Counter-clockwise triangles face their `(p1 - p0) x (p2 - p0)` side. Vertices that no
/// non-degenerate triangle references get a zero normal.
pub fn generate_normals(positions: &MeshStream, indices: &[u32]) -> MeshStream {
    let vertex_count = positions.element_count();
    let mut accumulated = vec![Vec3::ZERO; vertex_count];

    for [a, b, c] in valid_triangles(indices, vertex_count) {
        let p0 = positions.vec3(a);
        // Unnormalized cross product, so larger faces weigh more.
        let face = (positions.vec3(b) - p0).cross(positions.vec3(c) - p0);
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    let data = accumulated
        .into_iter()
        .flat_map(|n| n.normalize_or_zero().to_array())
        .collect();
    MeshStream::with_data(StreamSemantic::Normal, 0, 3, data)
}

/// Per-vertex tangents from texture coordinate gradients, orthogonalized against the normal.
///
/// Returns `None` when the normal or texcoord stream does not cover every position.
pub fn generate_tangents(
    positions: &MeshStream,
    normals: &MeshStream,
    texcoords: &MeshStream,
    indices: &[u32],
) -> Option<MeshStream> {
    let vertex_count = positions.element_count();
    if normals.element_count() != vertex_count || texcoords.element_count() != vertex_count {
        return None;
    }

    let uv = |i: usize| {
        let e = texcoords.element(i);
        Vec2::new(e[0], e[1])
    };

    let mut accumulated = vec![Vec3::ZERO; vertex_count];
    for [a, b, c] in valid_triangles(indices, vertex_count) {
        let p0 = positions.vec3(a);
        let e1 = positions.vec3(b) - p0;
        let e2 = positions.vec3(c) - p0;
        let d1 = uv(b) - uv(a);
        let d2 = uv(c) - uv(a);

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < DEGENERATE_UV_EPSILON {
            continue;
        }
        let tangent = (e1 * d2.y - e2 * d1.y) / det;
        accumulated[a] += tangent;
        accumulated[b] += tangent;
        accumulated[c] += tangent;
    }

    let data = accumulated
        .into_iter()
        .enumerate()
        .flat_map(|(i, t)| {
            let n = normals.vec3(i).normalize_or_zero();
            let orthogonal = (t - n * n.dot(t)).normalize_or_zero();
            let tangent = if orthogonal != Vec3::ZERO {
                orthogonal
            } else if n != Vec3::ZERO {
                n.any_orthonormal_vector()
            } else {
                Vec3::X
            };
            tangent.to_array()
        })
        .collect();
    Some(MeshStream::with_data(StreamSemantic::Tangent, 0, 3, data))
}

/// Fill in missing normals and tangents of one primitive, as configured.
pub fn derive_attributes(streams: &mut PrimitiveStreams, partition: &MeshPartition, config: &LoaderConfig) {
    let Some(positions) = &streams.position else {
        return;
    };

    if streams.normal.is_none() && config.generate_normals {
        debug!("Generating normals for '{}'", partition.identifier());
        streams.normal = Some(generate_normals(positions, partition.indices()));
    }

    if streams.tangent.is_none() && config.generate_tangents {
        let texcoords = streams.texcoords.iter().find(|s| s.index() == 0);
        if let (Some(normals), Some(texcoords)) = (&streams.normal, texcoords) {
            debug!("Generating tangents for '{}'", partition.identifier());
            streams.tangent = generate_tangents(positions, normals, texcoords, partition.indices());
        }
    }
}
