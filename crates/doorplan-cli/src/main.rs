// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Argument parsing for the `doorplan` binary.
pub mod cli_args;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use doorplan_core::config::Config;
use doorplan_core::doors::{DoorComponent, DoorSystem};
use doorplan_core::mesh::MeshConnectivity;
use doorplan_core::obj_io::load_obj;
use doorplan_core::optimizer::{sample_points, MhOptimizer};
use doorplan_core::rooms::RoomModel;

/// Door width assumed when a case's door entry doesn't override it.
const DEFAULT_DOOR_LENGTH: f32 = 0.1;

fn main() {
    env_logger::init();

    let args = cli_args::Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e:?}");
        std::process::exit(1);
    }
}

fn run(args: cli_args::Args) -> Result<()> {
    let config = Config::load(&args.config)?;
    let case = config.case(args.case)?;

    log::info!("loading case \"{}\"", case.file_name);
    let geometry = load_obj(&PathBuf::from(case.obj_file_path()))?;
    let mut mesh =
        MeshConnectivity::build_from_triangulation(&geometry.positions, &geometry.triangles, &geometry.edges);
    let mut rooms = RoomModel::build(&mesh);
    let room_ids: Vec<_> = rooms.rooms.iter().map(|(id, _)| id).collect();

    let mut doors = DoorSystem::new();
    let mut spawned = Vec::with_capacity(case.doors.len());
    for spec in &case.doors {
        let room_a = *room_ids
            .get(spec.room_i)
            .with_context(|| format!("door room_i {} out of range (mesh has {} rooms)", spec.room_i, room_ids.len()))?;
        let room_b = *room_ids
            .get(spec.room_j)
            .with_context(|| format!("door room_j {} out of range (mesh has {} rooms)", spec.room_j, room_ids.len()))?;
        let d_len = spec.door_length.unwrap_or(DEFAULT_DOOR_LENGTH);
        spawned.push(doors.spawn(DoorComponent::new(room_a, room_b, d_len, true)));
    }

    let front_idx = config.case(args.case)?.front_door.edge_id;
    let front_door = *spawned
        .get(front_idx)
        .with_context(|| format!("front_door.edge_id {front_idx} does not name a configured door"))?;
    doors.doors[front_door].need_optimization = false;
    doors.doors[front_door].ratio = case.front_door.ratio;

    doors.activate_all(&mut mesh, &mut rooms)?;

    let mut rng = StdRng::seed_from_u64(config.optimizer.random_seed);
    let samples = sample_points(&mesh, config.optimizer.sample_size, &mut rng);

    let mut optimizer = MhOptimizer::with_rng(rng, config.optimizer.temperature, config.optimizer.sigma, front_door);
    optimizer.init(&mesh, &doors, &samples);
    log::info!("starting score: {}", optimizer.best_score());

    for i in 0..config.optimizer.iterations {
        optimizer.step(&mut mesh, &mut rooms, &mut doors, &samples);
        if i % 50 == 0 {
            log::info!("iteration {i}/{}: best score {}", config.optimizer.iterations, optimizer.best_score());
        }
    }
    optimizer.end(&mut mesh, &mut rooms, &mut doors);

    log::info!("final best score: {}", optimizer.best_score());
    println!("case: {}", case.file_name);
    println!("best score: {:.6}", optimizer.best_score());
    for &id in &spawned {
        let door = &doors.doors[id];
        let center = door.center(&mesh);
        match (door.bind_edge, center) {
            (Some(edge), Some(pos)) => {
                println!(
                    "door {:?}: edge={edge:?} ratio={:.4} pos=({:.4}, {:.4})",
                    id, door.ratio, pos.x, pos.y
                );
            }
            _ => println!("door {:?}: inactive", id),
        }
    }

    Ok(())
}
