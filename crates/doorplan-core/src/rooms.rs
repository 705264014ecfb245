//! Grouping of mesh faces into rooms and the adjacency derived from shared
//! walls, kept in sync as doors splice new faces into the mesh.

use std::collections::{HashMap, HashSet};

use crate::mesh::{FaceId, HalfEdgeId, MeshConnectivity, RoomId};
use doorplan_common::utils::{OptionExt, SVec};

#[derive(Clone, Debug, Default)]
pub struct Room {
    pub faces: HashSet<FaceId>,
}

/// The room partition over a mesh, plus the symmetric adjacency relation
/// (two rooms are adjacent iff they share a blocked half-edge) and a
/// face-to-room index kept current by the mutation hooks below.
#[derive(Clone, Debug, Default)]
pub struct RoomModel {
    pub rooms: slotmap::SlotMap<RoomId, Room>,
    pub face_room: HashMap<FaceId, RoomId>,
    adjacency: HashMap<RoomId, HashSet<RoomId>>,
}

impl RoomModel {
    /// Derives rooms by flood-filling faces across non-blocked edges, using
    /// an explicit work stack so a large floor plan cannot overflow the call
    /// stack.
    pub fn build(mesh: &MeshConnectivity) -> Self {
        let mut model = RoomModel::default();
        let mut visited: HashSet<FaceId> = HashSet::new();

        let all_faces: Vec<FaceId> = mesh
            .faces
            .iter()
            .filter(|(_, f)| f.is_active)
            .map(|(id, _)| id)
            .collect();

        for start in all_faces {
            if visited.contains(&start) {
                continue;
            }
            let room = model.rooms.insert(Room::default());
            let mut stack = vec![start];
            visited.insert(start);
            while let Some(face) = stack.pop() {
                model.rooms[room].faces.insert(face);
                model.face_room.insert(face, room);
                for h in mesh.face_halfedges(face) {
                    let he = mesh.halfedges[h];
                    if he.is_blocked {
                        continue;
                    }
                    if let Some(t) = he.twin {
                        let neighbor = mesh.halfedges[t].face;
                        if mesh.faces[neighbor].is_active && visited.insert(neighbor) {
                            stack.push(neighbor);
                        }
                    }
                }
            }
        }

        model.rebuild_adjacency(mesh);
        model
    }

    fn rebuild_adjacency(&mut self, mesh: &MeshConnectivity) {
        self.adjacency.clear();
        for (_, he) in mesh.halfedges.iter() {
            if !he.is_blocked {
                continue;
            }
            let Some(t) = he.twin else { continue };
            let face_a = he.face;
            let face_b = mesh.halfedges[t].face;
            let (Some(&room_a), Some(&room_b)) =
                (self.face_room.get(&face_a), self.face_room.get(&face_b))
            else {
                continue;
            };
            if room_a == room_b {
                continue;
            }
            self.adjacency.entry(room_a).or_default().insert(room_b);
            self.adjacency.entry(room_b).or_default().insert(room_a);
        }
    }

    pub fn is_adjacent(&self, a: RoomId, b: RoomId) -> bool {
        self.adjacency.get(&a).is_some_and_(|s| s.contains(&b))
    }

    pub fn neighbors(&self, room: RoomId) -> impl Iterator<Item = RoomId> + '_ {
        self.adjacency.get(&room).into_iter().flatten().copied()
    }

    /// Every wall half-edge of `a` whose twin is a wall half-edge of `b`,
    /// paired with its twin so both orientations appear, in the
    /// deterministic order the faces were visited in.
    pub fn shared_edges(
        &self,
        mesh: &MeshConnectivity,
        a: RoomId,
        b: RoomId,
    ) -> SVec<(HalfEdgeId, HalfEdgeId)> {
        let mut out = SVec::new();
        let Some(room_a) = self.rooms.get(a) else {
            return out;
        };
        for &face in &room_a.faces {
            for h in mesh.face_halfedges(face) {
                let he = mesh.halfedges[h];
                if !he.is_blocked {
                    continue;
                }
                let Some(t) = he.twin else { continue };
                if self.face_room.get(&mesh.halfedges[t].face) == Some(&b) {
                    out.push((h, t));
                }
            }
        }
        out
    }

    pub fn add_face(&mut self, room: RoomId, face: FaceId) {
        self.rooms[room].faces.insert(face);
        self.face_room.insert(face, room);
    }

    pub fn remove_faces(&mut self, faces: &[FaceId]) {
        for &f in faces {
            if let Some(room) = self.face_room.remove(&f) {
                self.rooms[room].faces.remove(&f);
            }
        }
    }

    pub fn replace_face(&mut self, old: FaceId, new: FaceId, room: RoomId) {
        self.rooms[room].faces.remove(&old);
        self.face_room.remove(&old);
        self.add_face(room, new);
    }

    pub fn refresh_adjacency(&mut self, mesh: &MeshConnectivity) {
        self.rebuild_adjacency(mesh);
    }
}
