// Copyright (C) 2022 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Some useful re-exports
pub mod prelude;

/// The halfedge graph data structure and the topological edit operations
/// doors use to cut and heal themselves into a wall.
pub mod mesh;

/// Derives the room partition from the mesh's fixed-edge skeleton and keeps
/// the room adjacency graph in sync with door activation/deactivation.
pub mod rooms;

/// Triangle-mesh A* and funnel string-pulling, used both to measure path
/// length for the objective function and to answer interactive queries.
pub mod nav;

/// The door state machine: activation, deactivation, incremental movement
/// and edge-hopping, plus the door system that owns every door on a plan.
pub mod doors;

/// The Metropolis-Hastings door-placement optimizer.
pub mod optimizer;

/// Wavefront OBJ loading and bounding-box normalization.
pub mod obj_io;

/// TOML case/optimizer configuration.
pub mod config;
