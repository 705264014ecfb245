//! Triangle-level A* over the mesh dual graph, tightened into a straight
//! polyline by the funnel (string-pulling) algorithm.

use std::collections::{BinaryHeap, HashMap};

use float_ord::FloatOrd;
use glam::Vec2;

use crate::mesh::{FaceId, MeshConnectivity};
use doorplan_common::math::triarea2;

/// A candidate in the A* open set. `Ord` compares by f-score first, then by
/// a monotonic push sequence, so that a plain `BinaryHeap` ties-breaks on
/// insertion order rather than on `FaceId`, matching the requirement that
/// the search be reproducible independent of the arena's internal layout.
struct Candidate {
    f_score: FloatOrd<f32>,
    seq: u64,
    face: FaceId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.seq == other.seq
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest f-score,
        // with the lowest sequence number breaking ties.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Shortest sequence of faces from `start` to `goal` on the triangle dual
/// graph, where an edge is traversable iff its shared half-edge is not
/// blocked. Returns `None` if no such sequence exists.
pub fn find_face_path(mesh: &MeshConnectivity, start: FaceId, goal: FaceId) -> Option<Vec<FaceId>> {
    if start == goal {
        return Some(vec![start]);
    }

    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut g_score: HashMap<FaceId, f32> = HashMap::new();
    let mut came_from: HashMap<FaceId, FaceId> = HashMap::new();
    let mut closed: std::collections::HashSet<FaceId> = std::collections::HashSet::new();

    g_score.insert(start, 0.0);
    open.push(Candidate {
        f_score: FloatOrd(heuristic(mesh, start, goal)),
        seq,
        face: start,
    });

    while let Some(Candidate { face: current, .. }) = open.pop() {
        if current == goal {
            return Some(reconstruct_path(&came_from, current));
        }
        if !closed.insert(current) {
            continue;
        }
        let g_current = g_score[&current];
        for h in mesh.face_halfedges(current) {
            let he = mesh.halfedges[h];
            if he.is_blocked {
                continue;
            }
            let Some(t) = he.twin else { continue };
            let neighbor = mesh.halfedges[t].face;
            if !mesh.faces[neighbor].is_active {
                continue;
            }
            let step = (mesh.centroid(current) - mesh.centroid(neighbor)).length();
            let tentative = g_current + step;
            if tentative < *g_score.get(&neighbor).unwrap_or(&f32::INFINITY) {
                g_score.insert(neighbor, tentative);
                came_from.insert(neighbor, current);
                seq += 1;
                open.push(Candidate {
                    f_score: FloatOrd(tentative + heuristic(mesh, neighbor, goal)),
                    seq,
                    face: neighbor,
                });
            }
        }
    }

    None
}

fn heuristic(mesh: &MeshConnectivity, a: FaceId, b: FaceId) -> f32 {
    (mesh.centroid(a) - mesh.centroid(b)).length()
}

fn reconstruct_path(came_from: &HashMap<FaceId, FaceId>, mut current: FaceId) -> Vec<FaceId> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Tightens a triangle-sequence path into the shortest polyline from `s` to
/// `e` that stays within the sequence of portals (the shared edges between
/// consecutive triangles). Returns `None` if `path` is empty.
pub fn funnel(mesh: &MeshConnectivity, path: &[FaceId], s: Vec2, e: Vec2) -> Option<Vec<Vec2>> {
    if path.is_empty() {
        return None;
    }
    if path.len() == 1 {
        return Some(vec![s, e]);
    }

    let mut portals: Vec<(Vec2, Vec2)> = Vec::with_capacity(path.len());
    for w in path.windows(2) {
        let h = mesh.shared_edge(w[0], w[1])?;
        let he = mesh.halfedges[h];
        portals.push((mesh.vertices[he.ori].pos, mesh.vertices[he.to].pos));
    }
    portals.push((e, e));

    let mut result = vec![s];
    let mut apex = s;
    let mut left = portals[0].0;
    let mut right = portals[0].1;
    let mut left_idx = 0usize;
    let mut right_idx = 0usize;

    let mut i = 1;
    while i < portals.len() {
        let (pl, pr) = portals[i];

        if triarea2(apex, right, pr) <= 0.0 {
            if apex == right || triarea2(apex, left, pr) > 0.0 {
                right = pr;
                right_idx = i;
            } else {
                result.push(left);
                apex = left;
                left = apex;
                right = apex;
                i = left_idx;
                left_idx = i;
                right_idx = i;
                i += 1;
                continue;
            }
        }

        if triarea2(apex, left, pl) >= 0.0 {
            if apex == left || triarea2(apex, right, pl) < 0.0 {
                left = pl;
                left_idx = i;
            } else {
                result.push(right);
                apex = right;
                left = apex;
                right = apex;
                i = right_idx;
                left_idx = i;
                right_idx = i;
                i += 1;
                continue;
            }
        }

        i += 1;
    }

    result.push(e);
    Some(result)
}

/// Total Euclidean length of a polyline.
pub fn path_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
}

/// Finds a path from `s` to `e` through the mesh: locates the enclosing
/// faces, runs A* on the dual graph, then tightens with the funnel. Returns
/// `None` if either point is outside the mesh or no face path connects them.
pub fn find_path(mesh: &MeshConnectivity, s: Vec2, e: Vec2) -> Option<Vec<Vec2>> {
    let face_s = mesh.contains_point(s)?;
    let face_e = mesh.contains_point(e)?;
    let face_path = find_face_path(mesh, face_s, face_e)?;
    funnel(mesh, &face_path, s, e)
}
