//! In-place topological edits: splitting a half-edge at an interior point,
//! and its exact inverse, collapsing a split-introduced vertex back out.
//!
//! Both operations touch exactly one vertex, six half-edges and two faces.
//! `split_half_edge` keeps the input half-edge's id for the *near* portion
//! (the one still starting at the original origin) and allocates new ids for
//! the far continuation and the two new diagonals; `remove_vertex` undoes
//! this by reading the vertex's stashed `origin_edge` pair and walking the
//! local structure back out.

use std::error::Error;
use std::fmt;

use glam::Vec2;

use super::connectivity::{Face, HalfEdge, MeshConnectivity, Vertex};
use super::id_types::{FaceId, HalfEdgeId, VertexId};
use doorplan_common::utils::SVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditError {
    /// `split_half_edge` was called on a half-edge with no twin (the mesh
    /// boundary); a door cannot open onto the outside of the floor plan.
    BoundaryEdge,
    /// `remove_vertex` was called on a vertex that was not introduced by a
    /// split, or whose local structure has been altered by an overlapping
    /// split since (`incident_count` exceeds the pristine value of 8).
    NotRemovable,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::BoundaryEdge => write!(f, "cannot split a boundary half-edge"),
            EditError::NotRemovable => write!(f, "vertex is not a removable split product"),
        }
    }
}

impl Error for EditError {}

/// Everything `split_half_edge` introduced, for a caller that wants to cache
/// or later tear down exactly the new geometry.
#[derive(Debug, PartialEq)]
pub struct SplitResult {
    pub vertex: VertexId,
    /// `[far_continuation, far_continuation_twin, diag_l, diag_l_twin, diag_r, diag_r_twin]`
    pub halfedges: [HalfEdgeId; 6],
    /// `[far_face_on_e_side, far_face_on_twin_side]`
    pub faces: [FaceId; 2],
}

#[derive(Debug, PartialEq)]
pub struct RemoveResult {
    pub vertex: VertexId,
    pub halfedges: [HalfEdgeId; 6],
    pub faces: [FaceId; 2],
}

/// Splits `e` (and its twin) at `p`. `e`'s id keeps representing the portion
/// from its original origin to the new vertex; a fresh continuation
/// half-edge (and twin) carries on to the original destination. The two
/// triangles adjacent to `e` each gain a diagonal to the new vertex and
/// split into two; the original face ids are kept for the half still
/// touching `e`.
pub fn split_half_edge(
    mesh: &mut MeshConnectivity,
    e: HalfEdgeId,
    p: Vec2,
) -> Result<SplitResult, EditError> {
    let e_t = mesh.halfedges[e].twin.ok_or(EditError::BoundaryEdge)?;

    let to_orig = mesh.halfedges[e].to;
    let is_blocked = mesh.halfedges[e].is_blocked;
    let face_l = mesh.halfedges[e].face;
    let face_r = mesh.halfedges[e_t].face;

    let p1 = mesh.halfedges[e].prev;
    let n1_old = mesh.halfedges[e].next;
    let apex_l = mesh.halfedges[n1_old].to;

    let n2_old = mesh.halfedges[e_t].next;
    let p2_old = mesh.halfedges[e_t].prev;
    let apex_r = mesh.halfedges[n2_old].to;

    let v_cut = mesh.vertices.insert(Vertex {
        pos: p,
        edges: SVec::new(),
        is_fixed: false,
        origin_edge: Some((e, e_t)),
    });

    let new_face_l = mesh.faces.insert(Face {
        halfedge: HalfEdgeId::default(),
        is_active: true,
    });
    let new_face_r = mesh.faces.insert(Face {
        halfedge: HalfEdgeId::default(),
        is_active: true,
    });

    let e_new = mesh.halfedges.insert(HalfEdge {
        ori: v_cut,
        to: to_orig,
        face: new_face_l,
        twin: None,
        prev: HalfEdgeId::default(),
        next: n1_old,
        is_blocked,
    });
    let e_new_t = mesh.halfedges.insert(HalfEdge {
        ori: to_orig,
        to: v_cut,
        face: new_face_r,
        twin: Some(e_new),
        prev: p2_old,
        next: HalfEdgeId::default(),
        is_blocked,
    });
    mesh.halfedges[e_new].twin = Some(e_new_t);

    let diag_l = mesh.halfedges.insert(HalfEdge {
        ori: v_cut,
        to: apex_l,
        face: face_l,
        twin: None,
        prev: e,
        next: p1,
        is_blocked: false,
    });
    let diag_l_t = mesh.halfedges.insert(HalfEdge {
        ori: apex_l,
        to: v_cut,
        face: new_face_l,
        twin: Some(diag_l),
        prev: n1_old,
        next: e_new,
        is_blocked: false,
    });
    mesh.halfedges[diag_l].twin = Some(diag_l_t);

    let diag_r = mesh.halfedges.insert(HalfEdge {
        ori: v_cut,
        to: apex_r,
        face: new_face_r,
        twin: None,
        prev: e_new_t,
        next: p2_old,
        is_blocked: false,
    });
    let diag_r_t = mesh.halfedges.insert(HalfEdge {
        ori: apex_r,
        to: v_cut,
        face: face_r,
        twin: Some(diag_r),
        prev: n2_old,
        next: e_t,
        is_blocked: false,
    });
    mesh.halfedges[diag_r].twin = Some(diag_r_t);

    // Rewire the four pre-existing half-edges around the new vertex.
    {
        let he = &mut mesh.halfedges[e];
        he.to = v_cut;
        he.next = diag_l;
    }
    {
        let he = &mut mesh.halfedges[e_t];
        he.ori = v_cut;
        he.prev = diag_r_t;
    }
    mesh.halfedges[p1].prev = diag_l;
    {
        let he = &mut mesh.halfedges[n1_old];
        he.next = diag_l_t;
        he.prev = e_new;
        he.face = new_face_l;
    }
    mesh.halfedges[n2_old].next = diag_r_t;
    {
        let he = &mut mesh.halfedges[p2_old];
        he.next = e_new_t;
        he.prev = diag_r;
        he.face = new_face_r;
    }

    mesh.faces[face_l].halfedge = e;
    mesh.faces[face_r].halfedge = e_t;
    mesh.faces[new_face_l].halfedge = e_new;
    mesh.faces[new_face_r].halfedge = e_new_t;

    mesh.vertices[v_cut].edges = SVec::from_slice(&[e_t, e_new, diag_l, diag_r]);
    replace_outgoing(mesh, to_orig, e_t, e_new_t);
    mesh.vertices[apex_l].edges.push(diag_l_t);
    mesh.vertices[apex_r].edges.push(diag_r_t);

    Ok(SplitResult {
        vertex: v_cut,
        halfedges: [e_new, e_new_t, diag_l, diag_l_t, diag_r, diag_r_t],
        faces: [new_face_l, new_face_r],
    })
}

/// Removes a vertex introduced by [`split_half_edge`], restoring the mesh to
/// its pre-split state: the two half-edges that were shortened are extended
/// back through the vertex's position, the two diagonals on either side and
/// their twins are deleted, and the two faces that grew from the split
/// collapse back into the originals.
pub fn remove_vertex(mesh: &mut MeshConnectivity, v: VertexId) -> Result<RemoveResult, EditError> {
    let (e, e_t) = mesh.vertices[v]
        .origin_edge
        .filter(|_| mesh.outgoing_degree(v) == 4 && mesh.incident_count(v) == 8)
        .ok_or(EditError::NotRemovable)?;

    let diag_l = mesh.halfedges[e].next;
    let diag_l_t = mesh.halfedges[diag_l].twin.expect("diag_l always has a twin");
    let e_new = mesh.halfedges[diag_l_t].next;
    let e_new_t = mesh.halfedges[e_new].twin.expect("e_new always has a twin");
    let n1_old = mesh.halfedges[e_new].next;

    let diag_r_t = mesh.halfedges[e_t].prev;
    let diag_r = mesh.halfedges[diag_r_t].twin.expect("diag_r_t always has a twin");
    let p2_old = mesh.halfedges[e_new_t].prev;

    let to_orig = mesh.halfedges[e_new].to;
    let apex_l = mesh.halfedges[diag_l].to;
    let apex_r = mesh.halfedges[diag_r].to;
    let face_l = mesh.halfedges[e].face;
    let face_r = mesh.halfedges[e_t].face;
    let face_far_l = mesh.halfedges[e_new].face;
    let face_far_r = mesh.halfedges[e_new_t].face;

    {
        let he = &mut mesh.halfedges[e];
        he.to = to_orig;
        he.next = n1_old;
    }
    {
        let he = &mut mesh.halfedges[e_t];
        he.ori = to_orig;
        he.prev = p2_old;
    }
    {
        let he = &mut mesh.halfedges[n1_old];
        he.prev = e;
        he.face = face_l;
    }
    {
        let he = &mut mesh.halfedges[p2_old];
        he.next = e_t;
        he.face = face_r;
    }

    mesh.faces[face_l].halfedge = e;
    mesh.faces[face_r].halfedge = e_t;

    replace_outgoing(mesh, to_orig, e_new_t, e_t);
    mesh.vertices[apex_l].edges.retain(|h| *h != diag_l_t);
    mesh.vertices[apex_r].edges.retain(|h| *h != diag_r_t);

    mesh.faces.remove(face_far_l);
    mesh.faces.remove(face_far_r);
    for h in [diag_l, diag_l_t, diag_r, diag_r_t, e_new, e_new_t] {
        mesh.halfedges.remove(h);
    }
    mesh.vertices.remove(v);

    Ok(RemoveResult {
        vertex: v,
        halfedges: [diag_l, diag_l_t, diag_r, diag_r_t, e_new, e_new_t],
        faces: [face_far_l, face_far_r],
    })
}

fn replace_outgoing(mesh: &mut MeshConnectivity, v: VertexId, old: HalfEdgeId, new: HalfEdgeId) {
    let edges = &mut mesh.vertices[v].edges;
    if let Some(slot) = edges.iter_mut().find(|h| **h == old) {
        *slot = new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::connectivity::MeshConnectivity as Mesh;

    fn two_triangle_mesh() -> (Mesh, HalfEdgeId) {
        let positions = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ];
        let triangles = vec![(0, 1, 3), (0, 3, 2)];
        let fixed = vec![(0, 1), (1, 3), (3, 2), (2, 0)];
        let mesh = Mesh::build_from_triangulation(&positions, &triangles, &fixed);
        let diag = mesh
            .halfedges
            .iter()
            .find(|(_, he)| {
                mesh.vertices[he.ori].pos == Vec2::new(0.0, 0.0)
                    && mesh.vertices[he.to].pos == Vec2::new(1.0, 1.0)
            })
            .map(|(id, _)| id)
            .unwrap();
        (mesh, diag)
    }

    #[test]
    fn split_produces_expected_counts() {
        let (mut mesh, diag) = two_triangle_mesh();
        let v_count = mesh.vertices.len();
        let h_count = mesh.halfedges.len();
        let f_count = mesh.faces.len();

        let result = split_half_edge(&mut mesh, diag, Vec2::new(0.5, 0.5)).unwrap();

        assert_eq!(mesh.vertices.len(), v_count + 1);
        assert_eq!(mesh.halfedges.len(), h_count + 6);
        assert_eq!(mesh.faces.len(), f_count + 2);
        assert_eq!(mesh.outgoing_degree(result.vertex), 4);
        assert_eq!(mesh.incident_count(result.vertex), 8);
        assert_eq!(mesh.halfedges[diag].to, result.vertex);
    }

    #[test]
    fn split_on_boundary_fails() {
        let (mut mesh, _) = two_triangle_mesh();
        let boundary = mesh
            .halfedges
            .iter()
            .find(|(_, he)| he.twin.is_none())
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(
            split_half_edge(&mut mesh, boundary, Vec2::new(0.5, 0.0)),
            Err(EditError::BoundaryEdge)
        );
    }

    #[test]
    fn split_then_remove_round_trip() {
        let (mut mesh, diag) = two_triangle_mesh();
        let v_count = mesh.vertices.len();
        let h_count = mesh.halfedges.len();
        let f_count = mesh.faces.len();
        let mut blocked_before: Vec<bool> = mesh.halfedges.values().map(|h| h.is_blocked).collect();
        blocked_before.sort();

        let split = split_half_edge(&mut mesh, diag, Vec2::new(0.5, 0.5)).unwrap();
        remove_vertex(&mut mesh, split.vertex).unwrap();

        assert_eq!(mesh.vertices.len(), v_count);
        assert_eq!(mesh.halfedges.len(), h_count);
        assert_eq!(mesh.faces.len(), f_count);
        let mut blocked_after: Vec<bool> = mesh.halfedges.values().map(|h| h.is_blocked).collect();
        blocked_after.sort();
        assert_eq!(blocked_before, blocked_after);
    }

    #[test]
    fn remove_fixed_vertex_fails() {
        let (mut mesh, _) = two_triangle_mesh();
        let fixed_vertex = mesh
            .vertices
            .iter()
            .find(|(_, v)| v.is_fixed)
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(
            remove_vertex(&mut mesh, fixed_vertex),
            Err(EditError::NotRemovable)
        );
    }

    /// Mirrors a door's double split of the same edge id: cutting the far
    /// point first must leave the edge's remaining span still containing
    /// the near point, so the second split operates on live geometry.
    #[test]
    fn second_split_on_same_edge_id_reaches_remaining_span() {
        let (mut mesh, diag) = two_triangle_mesh();
        let ori = mesh.halfedges[diag].ori;
        let far = Vec2::new(0.7, 0.7);
        let near = Vec2::new(0.3, 0.3);

        split_half_edge(&mut mesh, diag, far).unwrap();
        let second = split_half_edge(&mut mesh, diag, near).unwrap();

        assert_eq!(mesh.halfedges[diag].ori, ori);
        assert_eq!(mesh.halfedges[diag].to, second.vertex);
    }
}
