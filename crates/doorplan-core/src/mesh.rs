// Copyright (C) 2022 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Never-recycled entity ids for vertices, half-edges, faces and rooms.
pub mod id_types;

/// The half-edge arenas and their read-only query surface.
pub mod connectivity;

/// `Index`/`IndexMut` boilerplate tying the id types to their arenas.
pub mod index_impls;

/// The two topological edits doors perform on the mesh.
pub mod editor;

pub use connectivity::{point_in_triangle, Face, HalfEdge, MeshConnectivity, Vertex};
pub use editor::{split_half_edge, remove_vertex, EditError, RemoveResult, SplitResult};
pub use id_types::{FaceId, HalfEdgeId, RoomId, VertexId};
