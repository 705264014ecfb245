use std::collections::HashMap;

use glam::Vec2;
use slotmap::SlotMap;

use doorplan_common::math::triarea2;
use doorplan_common::utils::SVec;

pub use crate::mesh::id_types::{FaceId, HalfEdgeId, RoomId, VertexId};

/// A point in the planar domain, plus the set of half-edges that start here.
///
/// `is_fixed` distinguishes vertices that came from the input triangulation
/// (never removable) from vertices introduced by [`crate::mesh::editor`]
/// (removable by the inverse edit).
#[derive(Clone, Debug)]
pub struct Vertex {
    pub pos: Vec2,
    pub edges: SVec<HalfEdgeId>,
    pub is_fixed: bool,
    /// For a vertex introduced by [`crate::mesh::editor::split_half_edge`],
    /// the `(e, e.twin)` pair that was split to create it — the two
    /// half-edges that, on removal, get re-extended through this vertex
    /// instead of terminating at it. `None` for original-triangulation
    /// vertices.
    pub origin_edge: Option<(HalfEdgeId, HalfEdgeId)>,
}

/// A directed traversal of one side of a mesh edge.
#[derive(Clone, Copy, Debug)]
pub struct HalfEdge {
    pub ori: VertexId,
    pub to: VertexId,
    pub face: FaceId,
    pub twin: Option<HalfEdgeId>,
    pub prev: HalfEdgeId,
    pub next: HalfEdgeId,
    pub is_blocked: bool,
}

/// A triangular face, stored as one of its three half-edges; the other two
/// are reached by following `next`.
#[derive(Clone, Copy, Debug)]
pub struct Face {
    pub halfedge: HalfEdgeId,
    pub is_active: bool,
}

/// The half-edge graph over a (constrained Delaunay) triangulation.
///
/// Entities live in per-kind slotmap arenas; ids are never reused, so a
/// handle produced before a door deactivation is reliably detected as
/// invalid afterwards rather than silently resolving to an unrelated entity.
#[derive(Clone, Debug, Default)]
pub struct MeshConnectivity {
    pub vertices: SlotMap<VertexId, Vertex>,
    pub halfedges: SlotMap<HalfEdgeId, HalfEdge>,
    pub faces: SlotMap<FaceId, Face>,
}

impl MeshConnectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mesh from the triangulator's output: CCW triangle index
    /// triples and a list of constraint (wall) edges, both referring to
    /// positions by index into `positions`.
    pub fn build_from_triangulation(
        positions: &[Vec2],
        triangles: &[(usize, usize, usize)],
        fixed_edges: &[(usize, usize)],
    ) -> Self {
        let mut mesh = MeshConnectivity::new();
        let vids: Vec<VertexId> = positions
            .iter()
            .map(|&pos| {
                mesh.vertices.insert(Vertex {
                    pos,
                    edges: SVec::new(),
                    is_fixed: true,
                    origin_edge: None,
                })
            })
            .collect();

        // Keyed by the sorted pair of *input* vertex indices, per the
        // O(V+E) twin-discovery contract.
        let mut edge_map: HashMap<(usize, usize), SVec<HalfEdgeId>> = HashMap::new();

        for &(i, j, k) in triangles {
            let face = mesh.faces.insert(Face {
                halfedge: HalfEdgeId::default(),
                is_active: true,
            });

            let corners = [(i, j), (j, k), (k, i)];
            let mut hids = [HalfEdgeId::default(); 3];
            for (n, &(a, b)) in corners.iter().enumerate() {
                hids[n] = mesh.halfedges.insert(HalfEdge {
                    ori: vids[a],
                    to: vids[b],
                    face,
                    twin: None,
                    prev: HalfEdgeId::default(),
                    next: HalfEdgeId::default(),
                    is_blocked: false,
                });
            }
            for n in 0..3 {
                let next = hids[(n + 1) % 3];
                let prev = hids[(n + 2) % 3];
                let he = &mut mesh.halfedges[hids[n]];
                he.next = next;
                he.prev = prev;
            }
            mesh.faces[face].halfedge = hids[0];

            for (n, &(a, b)) in corners.iter().enumerate() {
                mesh.vertices[vids[a]].edges.push(hids[n]);
                let key = (a.min(b), a.max(b));
                edge_map.entry(key).or_default().push(hids[n]);
            }
        }

        for hids in edge_map.values() {
            match hids.as_slice() {
                [a, b] => {
                    mesh.halfedges[*a].twin = Some(*b);
                    mesh.halfedges[*b].twin = Some(*a);
                }
                [a] => {
                    mesh.halfedges[*a].is_blocked = true;
                }
                _ => unreachable!("non-manifold input: more than two half-edges share an edge"),
            }
        }

        for &(i, j) in fixed_edges {
            let key = (i.min(j), i.max(j));
            if let Some(hids) = edge_map.get(&key) {
                for &h in hids {
                    mesh.halfedges[h].is_blocked = true;
                    if let Some(t) = mesh.halfedges[h].twin {
                        mesh.halfedges[t].is_blocked = true;
                    }
                }
            }
        }

        mesh
    }

    pub fn face_halfedges(&self, face: FaceId) -> [HalfEdgeId; 3] {
        let h0 = self.faces[face].halfedge;
        let h1 = self.halfedges[h0].next;
        let h2 = self.halfedges[h1].next;
        [h0, h1, h2]
    }

    pub fn face_vertices(&self, face: FaceId) -> [VertexId; 3] {
        self.face_halfedges(face).map(|h| self.halfedges[h].ori)
    }

    pub fn face_positions(&self, face: FaceId) -> [Vec2; 3] {
        self.face_vertices(face).map(|v| self.vertices[v].pos)
    }

    pub fn signed_area2(&self, face: FaceId) -> f32 {
        let [a, b, c] = self.face_positions(face);
        triarea2(a, b, c)
    }

    pub fn centroid(&self, face: FaceId) -> Vec2 {
        let [a, b, c] = self.face_positions(face);
        (a + b + c) / 3.0
    }

    pub fn halfedge_length(&self, h: HalfEdgeId) -> f32 {
        let he = &self.halfedges[h];
        (self.vertices[he.to].pos - self.vertices[he.ori].pos).length()
    }

    pub fn halfedge_dir(&self, h: HalfEdgeId) -> Vec2 {
        let he = &self.halfedges[h];
        (self.vertices[he.to].pos - self.vertices[he.ori].pos).normalize_or_zero()
    }

    /// The "diagonal vertex" of a half-edge: the apex of its triangle, i.e.
    /// the vertex not on the edge itself.
    pub fn diagonal_vertex(&self, h: HalfEdgeId) -> VertexId {
        self.halfedges[self.halfedges[h].next].to
    }

    /// Linear scan over all active faces using a CCW barycentric
    /// inside-test; returns the first enclosing face.
    pub fn contains_point(&self, p: Vec2) -> Option<FaceId> {
        self.faces.iter().find_map(|(fid, face)| {
            if !face.is_active {
                return None;
            }
            point_in_triangle(p, self.face_positions(fid)).then_some(fid)
        })
    }

    /// Faces reachable from `face` by crossing one of its three half-edges'
    /// twins.
    pub fn neighbors(&self, face: FaceId) -> impl Iterator<Item = FaceId> + '_ {
        self.face_halfedges(face)
            .into_iter()
            .filter_map(move |h| self.halfedges[h].twin)
            .map(move |t| self.halfedges[t].face)
    }

    /// The half-edge of `face_a` whose twin lies in `face_b`, if the two
    /// faces are adjacent.
    pub fn shared_edge(&self, face_a: FaceId, face_b: FaceId) -> Option<HalfEdgeId> {
        self.face_halfedges(face_a).into_iter().find(|&h| {
            self.halfedges[h]
                .twin
                .map(|t| self.halfedges[t].face == face_b)
                .unwrap_or(false)
        })
    }

    /// Number of outgoing half-edges stored for `v`.
    pub fn outgoing_degree(&self, v: VertexId) -> usize {
        self.vertices[v].edges.len()
    }

    /// Total half-edges incident on `v`, counting both directions.
    ///
    /// For an interior vertex every outgoing edge has a twin, so this is
    /// `2 * outgoing_degree`; a vertex on the mesh boundary would undercount
    /// by its number of un-twinned outgoing edges, but door-inserted
    /// vertices are always strictly interior.
    pub fn incident_count(&self, v: VertexId) -> usize {
        self.vertices[v]
            .edges
            .iter()
            .map(|&h| if self.halfedges[h].twin.is_some() { 2 } else { 1 })
            .sum()
    }
}

/// Point-in-triangle via Crout-form barycentric coordinates, consistent with
/// the CCW convention: a point exactly on a shared edge is classified as
/// inside exactly one of the two incident triangles.
pub fn point_in_triangle(p: Vec2, [a, b, c]: [Vec2; 3]) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= f32::EPSILON {
        return false;
    }
    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    u >= 0.0 && v >= 0.0 && u + v < 1.0
}
