//! Triangle mesh assembly from sections and lateral edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tube_kernel_math::{normalize_or_z, Vec3};
use tube_kernel_section::Anchor;

use crate::tube::Tube;

/// Grid size for merging interpolated vertices.
const MERGE_EPSILON: f32 = 0.001;

/// Mesh assembly options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    /// Close the first and last sections with triangle fans.
    pub cap_ends: bool,
}

/// Indexed mesh of a tube.
///
/// Section points come first, in section order, followed by interpolated
/// lateral-edge endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Implicit section edges, then lateral edges.
    pub edges: Vec<[u32; 2]>,
    /// Triangles.
    pub faces: Vec<[u32; 3]>,
    /// First vertex of each section.
    pub section_start_indices: Vec<u32>,
    /// Point count of each section.
    pub points_per_section: Vec<u32>,
}

/// Flat buffers ready for upload or export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleBuffers {
    /// `[x0, y0, z0, x1, ...]`.
    pub vertices: Vec<f32>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
    /// Area-weighted vertex normals, same layout as `vertices`.
    pub normals: Vec<f32>,
}

impl TriangleBuffers {
    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }
}

impl TubeMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Drop all data.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.section_start_indices.clear();
        self.points_per_section.clear();
    }

    /// Flatten into position, index and normal buffers.
    pub fn to_triangle_buffers(&self) -> TriangleBuffers {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];
        for f in &self.faces {
            let [a, b, c] = f.map(|i| i as usize);
            let (Some(pa), Some(pb), Some(pc)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            else {
                continue;
            };
            let n = (pb - pa).cross(&(pc - pa));
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }

        TriangleBuffers {
            vertices: self.vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect(),
            indices: self.faces.iter().flatten().copied().collect(),
            normals: normals
                .iter()
                .flat_map(|n| {
                    let n = normalize_or_z(n);
                    [n.x, n.y, n.z]
                })
                .collect(),
        }
    }
}

/// Result of [`Tube::build_mesh`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeConstructionResult {
    /// The assembled mesh.
    pub mesh: TubeMesh,
    /// Section pairs whose segment could not be meshed, by position.
    pub problematic_sections: Vec<(usize, usize)>,
    /// Lateral quads that produced no triangles.
    pub skipped_quads: usize,
    /// At least one vertex and one edge were produced.
    pub success: bool,
}

type GridKey = (i64, i64, i64);

fn grid_key(p: &Vec3) -> GridKey {
    (
        (p.x / MERGE_EPSILON).round() as i64,
        (p.y / MERGE_EPSILON).round() as i64,
        (p.z / MERGE_EPSILON).round() as i64,
    )
}

struct Builder {
    mesh: TubeMesh,
    lookup: HashMap<GridKey, u32>,
}

impl Builder {
    fn push_vertex(&mut self, p: Vec3) -> u32 {
        let id = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(p);
        id
    }

    /// Interpolated endpoint: reuse a vertex on the same grid cell or add one.
    fn interpolated(&mut self, p: &Vec3) -> u32 {
        let key = grid_key(p);
        if let Some(&id) = self.lookup.get(&key) {
            return id;
        }
        let id = self.push_vertex(*p);
        self.lookup.insert(key, id);
        id
    }
}

/// Resolve one lateral edge endpoint to a mesh vertex.
///
/// `None` for a vertex anchor whose point is out of range.
fn resolve(builder: &mut Builder, anchor: &Anchor, position: &Vec3) -> Option<u32> {
    match *anchor {
        Anchor::Vertex { section, point } => {
            let start = *builder.mesh.section_start_indices.get(section)?;
            let count = *builder.mesh.points_per_section.get(section)?;
            let point = u32::try_from(point).ok()?;
            (point < count).then_some(start + point)
        }
        _ => Some(builder.interpolated(position)),
    }
}

pub(crate) fn build(tube: &Tube, options: &MeshOptions) -> TubeConstructionResult {
    let mut result = TubeConstructionResult::default();
    let sections = tube.sections();
    if sections.len() < 2 {
        return result;
    }

    let mut b = Builder {
        mesh: TubeMesh::default(),
        lookup: HashMap::new(),
    };

    for s in sections {
        b.mesh.section_start_indices.push(b.mesh.vertices.len() as u32);
        b.mesh.points_per_section.push(s.len() as u32);
        for p in s.points() {
            let id = b.push_vertex(*p);
            b.lookup.entry(grid_key(p)).or_insert(id);
        }
    }

    for (s, section) in sections.iter().enumerate() {
        let start = b.mesh.section_start_indices[s];
        for (i, j) in section.edge_indices() {
            b.mesh.edges.push([start + i as u32, start + j as u32]);
        }
    }

    for seg in tube.segments() {
        let pair = (seg.start_section(), seg.end_section());
        if pair.0 >= sections.len() || pair.1 >= sections.len() {
            result.problematic_sections.push(pair);
            continue;
        }

        let mut resolved: Vec<Option<[u32; 2]>> = Vec::with_capacity(seg.edge_count());
        for e in seg.edges() {
            let ends = resolve(&mut b, &e.start_anchor, &e.start)
                .zip(resolve(&mut b, &e.end_anchor, &e.end))
                .map(|(v1, v2)| [v1, v2]);
            match ends {
                Some(edge) => b.mesh.edges.push(edge),
                None => {
                    if !result.problematic_sections.contains(&pair) {
                        result.problematic_sections.push(pair);
                    }
                }
            }
            resolved.push(ends);
        }

        let n = resolved.len();
        if n < 3 {
            result.skipped_quads += n;
            continue;
        }
        for k in 0..n {
            match (resolved[k], resolved[(k + 1) % n]) {
                (Some([v1, v2]), Some([v3, v4])) => {
                    b.mesh.faces.push([v1, v3, v2]);
                    b.mesh.faces.push([v2, v3, v4]);
                }
                _ => result.skipped_quads += 1,
            }
        }
    }

    if options.cap_ends {
        let last = sections.len() - 1;
        cap(&mut b.mesh, 0, true);
        cap(&mut b.mesh, last, false);
    }

    debug!(
        vertices = b.mesh.vertex_count(),
        edges = b.mesh.edge_count(),
        faces = b.mesh.face_count(),
        skipped = result.skipped_quads,
        "tube mesh assembled"
    );

    result.success = !b.mesh.vertices.is_empty() && !b.mesh.edges.is_empty();
    result.mesh = b.mesh;
    result
}

/// Fan-triangulate a section in point order.
fn cap(mesh: &mut TubeMesh, section: usize, reversed: bool) {
    let start = mesh.section_start_indices[section];
    let count = mesh.points_per_section[section];
    if count < 3 {
        return;
    }
    for i in 1..count - 1 {
        let (a, b) = (start + i, start + i + 1);
        mesh.faces
            .push(if reversed { [start, b, a] } else { [start, a, b] });
    }
}
