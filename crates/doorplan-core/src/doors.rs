//! Door state machine: a door binds to a wall half-edge shared by its two
//! rooms, cuts a fixed-width gap into it, and can slide along the edge or
//! hop onto a neighboring shared edge when it reaches the end of its run.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use slotmap::SlotMap;

use crate::mesh::{
    remove_vertex, split_half_edge, EditError, FaceId, HalfEdgeId, MeshConnectivity, RoomId,
    VertexId,
};
use crate::rooms::RoomModel;
use doorplan_common::utils::SVec;
use glam::Vec2;

slotmap::new_key_type! { pub struct DoorId; }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorError {
    AlreadyActive,
    NoSharedEdge,
    StructuralImpossibility,
    Edit(EditError),
}

impl fmt::Display for DoorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorError::AlreadyActive => write!(f, "door is already active"),
            DoorError::NoSharedEdge => write!(f, "the two rooms share no wall edge"),
            DoorError::StructuralImpossibility => {
                write!(f, "cannot clear space for this door without breaking another")
            }
            DoorError::Edit(e) => write!(f, "{e}"),
        }
    }
}

impl Error for DoorError {}

impl From<EditError> for DoorError {
    fn from(e: EditError) -> Self {
        DoorError::Edit(e)
    }
}

/// Geometry introduced by the two `split_half_edge` calls of the last
/// activation: `vertices[0]`/`halfedges[0]`/`faces[0]` belong to the first
/// (far) cut, `[1]` to the second (near) cut. `remove_vertex` must undo them
/// in reverse, most-recent first, since the second cut reused the first
/// cut's half-edge id and overwrote the pointers the first cut's removal
/// depends on.
#[derive(Clone, Debug)]
struct ActivationGeometry {
    vertices: [VertexId; 2],
    faces: [[FaceId; 2]; 2],
}

#[derive(Clone, Copy, Debug, Default)]
struct DoorHistory {
    bind_edge: Option<HalfEdgeId>,
    ratio: f32,
}

#[derive(Clone, Debug)]
pub struct DoorComponent {
    pub room_a: RoomId,
    pub room_b: RoomId,
    pub d_len: f32,
    pub need_optimization: bool,
    pub bind_edge: Option<HalfEdgeId>,
    pub e_len: f32,
    pub ratio: f32,
    pub is_active: bool,
    cached: Option<ActivationGeometry>,
    shared_edges: SVec<(HalfEdgeId, HalfEdgeId)>,
    visited: HashSet<HalfEdgeId>,
    history: DoorHistory,
}

impl DoorComponent {
    pub fn new(
        room_a: RoomId,
        room_b: RoomId,
        d_len: f32,
        need_optimization: bool,
    ) -> Self {
        Self {
            room_a,
            room_b,
            d_len,
            need_optimization,
            bind_edge: None,
            e_len: 0.0,
            ratio: 0.5,
            is_active: false,
            cached: None,
            shared_edges: SVec::new(),
            visited: HashSet::new(),
            history: DoorHistory::default(),
        }
    }

    pub fn move_limits(&self) -> (f32, f32) {
        let half = self.d_len / 2.0 / self.e_len;
        (half, 1.0 - half)
    }

    /// Current door center, usable as the entrance-loss path endpoint even
    /// when the door has never been activated.
    pub fn center(&self, mesh: &MeshConnectivity) -> Option<Vec2> {
        let e = self.bind_edge?;
        let ori = mesh.vertices[mesh.halfedges[e].ori].pos;
        let dir = mesh.halfedge_dir(e);
        Some(ori + dir * self.ratio * self.e_len)
    }
}

/// Picks which of a split's two new faces goes to `room_a` vs `room_b` by
/// inheriting from the pre-existing face each one borders across its open
/// (non-wall) diagonal. Falls back to a canonical assignment if neither
/// bordering face has a recorded room yet.
fn assign_split_faces(
    rooms: &mut RoomModel,
    room_a: RoomId,
    room_b: RoomId,
    kept_l: FaceId,
    kept_r: FaceId,
    new_l: FaceId,
    new_r: FaceId,
) {
    let room_l = rooms.face_room.get(&kept_l).copied();
    let room_r = rooms.face_room.get(&kept_r).copied();
    if room_l == Some(room_a) || room_r == Some(room_b) {
        rooms.add_face(room_a, new_l);
        rooms.add_face(room_b, new_r);
    } else if room_l == Some(room_b) || room_r == Some(room_a) {
        rooms.add_face(room_b, new_l);
        rooms.add_face(room_a, new_r);
    } else {
        rooms.add_face(room_b, new_l);
        rooms.add_face(room_a, new_r);
    }
}

fn search_next_shared_edge(
    mesh: &MeshConnectivity,
    shared: &[(HalfEdgeId, HalfEdgeId)],
    bind_edge: HalfEdgeId,
    bind_twin: HalfEdgeId,
    visited: &HashSet<HalfEdgeId>,
    v: VertexId,
) -> Option<HalfEdgeId> {
    for &(h, _) in shared {
        if h == bind_edge || h == bind_twin {
            continue;
        }
        let he = mesh.halfedges[h];
        if he.ori == v || he.to == v {
            return Some(h);
        }
    }
    shared
        .iter()
        .map(|&(h, _)| h)
        .find(|h| !visited.contains(h))
}

/// Owns every door on a plan and performs the topological edits that bring
/// them on and off the mesh.
#[derive(Clone, Debug, Default)]
pub struct DoorSystem {
    pub doors: SlotMap<DoorId, DoorComponent>,
}

impl DoorSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, door: DoorComponent) -> DoorId {
        self.doors.insert(door)
    }

    pub fn activate_all(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
    ) -> Result<(), DoorError> {
        let ids: Vec<DoorId> = self.doors.keys().collect();
        for id in ids {
            self.activate(mesh, rooms, id)?;
        }
        Ok(())
    }

    pub fn activate(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        door: DoorId,
    ) -> Result<(), DoorError> {
        if self.doors[door].is_active {
            return Err(DoorError::AlreadyActive);
        }

        let room_a = self.doors[door].room_a;
        let room_b = self.doors[door].room_b;

        let shared = rooms.shared_edges(mesh, room_a, room_b);
        if shared.is_empty() {
            return Err(DoorError::NoSharedEdge);
        }
        let bind_edge = self.doors[door].bind_edge.unwrap_or(shared[0].0);
        let bind_twin = mesh.halfedges[bind_edge]
            .twin
            .expect("a shared wall edge always has a twin");

        let e_len = mesh.halfedge_length(bind_edge);
        let d_len = self.doors[door].d_len;
        let ratio = self.doors[door].ratio;

        let ori_pos = mesh.vertices[mesh.halfedges[bind_edge].ori].pos;
        let dir = mesh.halfedge_dir(bind_edge);
        let half_width = d_len / 2.0 * 0.95;
        let center = ori_pos + dir * ratio * e_len;
        let cut_far = center + dir * half_width;
        let cut_near = center - dir * half_width;

        let split_far = split_half_edge(mesh, bind_edge, cut_far)?;
        let kept_l_far = mesh.halfedges[bind_edge].face;
        let kept_r_far = mesh.halfedges[bind_twin].face;
        assign_split_faces(
            rooms,
            room_a,
            room_b,
            kept_l_far,
            kept_r_far,
            split_far.faces[0],
            split_far.faces[1],
        );

        let split_near = split_half_edge(mesh, bind_edge, cut_near)?;
        let kept_l_near = mesh.halfedges[bind_edge].face;
        let kept_r_near = mesh.halfedges[bind_twin].face;
        assign_split_faces(
            rooms,
            room_a,
            room_b,
            kept_l_near,
            kept_r_near,
            split_near.faces[0],
            split_near.faces[1],
        );

        // The gap is the near split's far continuation: it spans from the
        // near vertex back out to the far vertex, i.e. exactly the span
        // between the two cuts.
        let gap = split_near.halfedges[0];
        let gap_twin = split_near.halfedges[1];
        mesh.halfedges[gap].is_blocked = false;
        mesh.halfedges[gap_twin].is_blocked = false;

        rooms.refresh_adjacency(mesh);

        let new_shared = rooms.shared_edges(mesh, room_a, room_b);
        let d = &mut self.doors[door];
        d.bind_edge = Some(bind_edge);
        d.e_len = e_len;
        d.cached = Some(ActivationGeometry {
            vertices: [split_far.vertex, split_near.vertex],
            faces: [split_far.faces, split_near.faces],
        });
        d.shared_edges = new_shared;
        d.is_active = true;

        Ok(())
    }

    fn door_owning_vertex(&self, v: VertexId, exclude: DoorId) -> Option<DoorId> {
        self.doors.iter().find_map(|(id, d)| {
            if id == exclude || !d.is_active {
                return None;
            }
            let cached = d.cached.as_ref()?;
            cached.vertices.contains(&v).then_some(id)
        })
    }

    pub fn deactivate(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        door: DoorId,
    ) -> Result<(), DoorError> {
        if !self.doors[door].is_active {
            return Ok(());
        }

        let mut reactivate_stack = Vec::new();
        loop {
            let verts = self.doors[door]
                .cached
                .as_ref()
                .expect("active door has cached geometry")
                .vertices;
            let mut progressed = false;
            for &v in &verts {
                if mesh.outgoing_degree(v) == 4 && mesh.incident_count(v) == 8 {
                    continue;
                }
                match self.door_owning_vertex(v, door) {
                    Some(blocker) => {
                        self.deactivate(mesh, rooms, blocker)?;
                        reactivate_stack.push(blocker);
                        progressed = true;
                        break;
                    }
                    None => return Err(DoorError::StructuralImpossibility),
                }
            }
            if !progressed {
                break;
            }
        }

        let cached = self.doors[door]
            .cached
            .take()
            .expect("active door has cached geometry");
        remove_vertex(mesh, cached.vertices[1])?;
        remove_vertex(mesh, cached.vertices[0])?;

        rooms.remove_faces(&cached.faces[1]);
        rooms.remove_faces(&cached.faces[0]);
        rooms.refresh_adjacency(mesh);

        let d = &mut self.doors[door];
        d.is_active = false;

        while let Some(blocker) = reactivate_stack.pop() {
            self.activate(mesh, rooms, blocker)?;
        }

        Ok(())
    }

    /// Slides an active door by `delta` along its edge direction, or hops it
    /// onto a neighboring shared edge if that would cross a move limit.
    pub fn step(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        door: DoorId,
        delta: f32,
    ) -> Result<(), DoorError> {
        let d = &self.doors[door];
        if !d.is_active {
            return Ok(());
        }
        let ratio_next = d.ratio + delta / d.e_len;
        let (lower, upper) = d.move_limits();

        self.doors[door].history = DoorHistory {
            bind_edge: self.doors[door].bind_edge,
            ratio: self.doors[door].ratio,
        };

        if ratio_next >= lower && ratio_next <= upper {
            let d = &mut self.doors[door];
            let bind_edge = d.bind_edge.expect("active door has a bind edge");
            let dir = mesh.halfedge_dir(bind_edge);
            let translate = dir * delta;
            let cached = d.cached.as_ref().expect("active door has cached geometry");
            for &v in &cached.vertices {
                mesh.vertices[v].pos += translate;
            }
            d.ratio = ratio_next;
            Ok(())
        } else {
            self.deactivate(mesh, rooms, door)?;
            self.edge_hop(mesh, door, ratio_next, upper);
            self.activate(mesh, rooms, door)
        }
    }

    /// Attempts to rebind the door onto a neighboring shared edge at the end
    /// it overshot. On success, updates `bind_edge`/`ratio`/`e_len` in
    /// place; on failure, leaves them untouched so the caller's subsequent
    /// `activate` reopens the door exactly where it was.
    fn edge_hop(&mut self, mesh: &MeshConnectivity, door: DoorId, ratio_next: f32, upper: f32) {
        let d = &self.doors[door];
        let bind_edge = d.bind_edge.expect("active door has a bind edge");
        let bind_twin = mesh.halfedges[bind_edge]
            .twin
            .expect("a shared wall edge always has a twin");
        let at_upper = ratio_next >= upper;
        let v = if at_upper {
            mesh.halfedges[bind_edge].to
        } else {
            mesh.halfedges[bind_edge].ori
        };

        let Some(candidate) =
            search_next_shared_edge(mesh, &d.shared_edges, bind_edge, bind_twin, &d.visited, v)
        else {
            return;
        };

        let candidate_he = mesh.halfedges[candidate];
        let oriented = if at_upper {
            if candidate_he.ori == v {
                candidate
            } else {
                mesh.halfedges[candidate].twin.expect("shared edges are interior")
            }
        } else if candidate_he.to == v {
            candidate
        } else {
            mesh.halfedges[candidate].twin.expect("shared edges are interior")
        };

        let new_e_len = mesh.halfedge_length(oriented);
        let new_d_len = d.d_len;
        let new_lower = new_d_len / 2.0 / new_e_len;
        let new_upper = 1.0 - new_lower;

        let door_mut = &mut self.doors[door];
        door_mut.visited.insert(candidate);
        door_mut.bind_edge = Some(oriented);
        door_mut.e_len = new_e_len;
        door_mut.ratio = if at_upper { new_lower } else { new_upper };
    }

    /// Sets both inserted vertices to the positions implied by `ratio` on
    /// the door's current edge, without touching connectivity. Used to
    /// restore a checkpoint on the same edge.
    pub fn move_to(&mut self, mesh: &mut MeshConnectivity, door: DoorId, ratio: f32) {
        let d = &mut self.doors[door];
        let bind_edge = d.bind_edge.expect("move_to requires an active door");
        let ori_pos = mesh.vertices[mesh.halfedges[bind_edge].ori].pos;
        let dir = mesh.halfedge_dir(bind_edge);
        let half_width = d.d_len / 2.0 * 0.95;
        let center = ori_pos + dir * ratio * d.e_len;
        let cached = d.cached.as_ref().expect("active door has cached geometry");
        mesh.vertices[cached.vertices[0]].pos = center + dir * half_width;
        mesh.vertices[cached.vertices[1]].pos = center - dir * half_width;
        d.ratio = ratio;
    }

    /// Undoes the effect of the last `step`, returning the door to exactly
    /// the geometry, connectivity and room membership it had before that
    /// step — on the same edge this is a pure position restore, across a
    /// hop it is a full deactivate/reactivate on the old edge.
    pub fn rollback(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        door: DoorId,
    ) -> Result<(), DoorError> {
        let history = self.doors[door].history;
        if self.doors[door].bind_edge == history.bind_edge {
            self.move_to(mesh, door, history.ratio);
            Ok(())
        } else {
            self.deactivate(mesh, rooms, door)?;
            self.doors[door].bind_edge = history.bind_edge;
            self.doors[door].ratio = history.ratio;
            self.activate(mesh, rooms, door)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit-ish rooms sharing a vertical wall at x=1, split into two
    /// collinear wall segments by a vertex at (1, 0.5) so edge-hop has
    /// somewhere to hop to.
    fn two_room_mesh() -> MeshConnectivity {
        let positions = vec![
            Vec2::new(0.0, 0.0), // 0
            Vec2::new(1.0, 0.0), // 1
            Vec2::new(1.0, 0.5), // 2
            Vec2::new(1.0, 1.0), // 3
            Vec2::new(0.0, 1.0), // 4
            Vec2::new(2.0, 0.0), // 5
            Vec2::new(2.0, 0.5), // 6
            Vec2::new(2.0, 1.0), // 7
        ];
        let triangles = vec![
            (0, 1, 2),
            (0, 2, 3),
            (0, 3, 4),
            (6, 7, 3),
            (6, 3, 2),
            (6, 2, 1),
            (6, 1, 5),
        ];
        let fixed = vec![
            (0, 1),
            (1, 5),
            (5, 6),
            (6, 7),
            (7, 3),
            (3, 4),
            (4, 0),
            (1, 2),
            (2, 3),
        ];
        MeshConnectivity::build_from_triangulation(&positions, &triangles, &fixed)
    }

    fn setup() -> (MeshConnectivity, RoomModel, RoomId, RoomId) {
        let mesh = two_room_mesh();
        let rooms = RoomModel::build(&mesh);
        let room_a = rooms.face_room[&mesh.contains_point(Vec2::new(0.3, 0.3)).unwrap()];
        let room_b = rooms.face_room[&mesh.contains_point(Vec2::new(1.7, 0.3)).unwrap()];
        (mesh, rooms, room_a, room_b)
    }

    #[test]
    fn activate_cuts_gap_and_assigns_new_faces() {
        let (mut mesh, mut rooms, room_a, room_b) = setup();
        let vcount_before = mesh.vertices.len();
        let mut system = DoorSystem::new();
        let door = system.spawn(DoorComponent::new(room_a, room_b, 0.1, true));

        system.activate(&mut mesh, &mut rooms, door).unwrap();

        assert!(system.doors[door].is_active);
        assert_eq!(mesh.vertices.len(), vcount_before + 2);

        let cached = system.doors[door].cached.as_ref().unwrap();
        for faces in &cached.faces {
            for &f in faces {
                assert!(rooms.face_room.contains_key(&f));
            }
        }
    }

    #[test]
    fn deactivate_restores_original_vertex_count() {
        let (mut mesh, mut rooms, room_a, room_b) = setup();
        let vcount_before = mesh.vertices.len();
        let fcount_before = mesh.faces.iter().filter(|(_, f)| f.is_active).count();
        let mut system = DoorSystem::new();
        let door = system.spawn(DoorComponent::new(room_a, room_b, 0.1, true));

        system.activate(&mut mesh, &mut rooms, door).unwrap();
        system.deactivate(&mut mesh, &mut rooms, door).unwrap();

        assert!(!system.doors[door].is_active);
        assert_eq!(mesh.vertices.len(), vcount_before);
        let fcount_after = mesh.faces.iter().filter(|(_, f)| f.is_active).count();
        assert_eq!(fcount_after, fcount_before);
        assert!(system.doors[door].bind_edge.is_some());
    }

    #[test]
    fn step_within_limits_slides_in_place() {
        let (mut mesh, mut rooms, room_a, room_b) = setup();
        let mut system = DoorSystem::new();
        let door = system.spawn(DoorComponent::new(room_a, room_b, 0.1, true));
        system.activate(&mut mesh, &mut rooms, door).unwrap();
        let bind_before = system.doors[door].bind_edge;

        system.step(&mut mesh, &mut rooms, door, 0.05).unwrap();

        assert_eq!(system.doors[door].bind_edge, bind_before);
        assert!(system.doors[door].ratio > 0.5);
    }

    #[test]
    fn step_past_limit_hops_to_neighboring_shared_edge() {
        let (mut mesh, mut rooms, room_a, room_b) = setup();
        let mut system = DoorSystem::new();
        let door = system.spawn(DoorComponent::new(room_a, room_b, 0.1, true));
        system.activate(&mut mesh, &mut rooms, door).unwrap();
        let bind_before = system.doors[door].bind_edge.unwrap();

        // Edge length is 0.5, ratio starts at 0.5 (the midpoint); a large
        // enough delta pushes past the upper move limit.
        system.step(&mut mesh, &mut rooms, door, 0.3).unwrap();

        assert!(system.doors[door].is_active);
        let bind_after = system.doors[door].bind_edge.unwrap();
        assert_ne!(bind_after, bind_before);
        assert_ne!(Some(bind_after), mesh.halfedges[bind_before].twin);
    }

    #[test]
    fn rollback_restores_exact_ratio_after_in_place_step() {
        let (mut mesh, mut rooms, room_a, room_b) = setup();
        let mut system = DoorSystem::new();
        let door = system.spawn(DoorComponent::new(room_a, room_b, 0.1, true));
        system.activate(&mut mesh, &mut rooms, door).unwrap();
        let ratio_before = system.doors[door].ratio;

        system.step(&mut mesh, &mut rooms, door, 0.05).unwrap();
        assert_ne!(system.doors[door].ratio, ratio_before);

        system.rollback(&mut mesh, &mut rooms, door).unwrap();
        assert_eq!(system.doors[door].ratio, ratio_before);
    }
}
