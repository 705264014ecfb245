//! Metropolis-Hastings optimizer over door placements: proposes a small
//! slide for every non-pinned door, scores the resulting layout, and
//! accepts or rejects with simulated-annealing tolerance for uphill moves.

use std::collections::HashMap;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::doors::{DoorId, DoorSystem};
use crate::mesh::{HalfEdgeId, MeshConnectivity};
use crate::nav::{find_path, path_length};
use crate::rooms::RoomModel;

/// Sum of traffic loss over consecutive sample pairs and (2x) entrance loss
/// from the pinned front door to every other door's center.
pub fn objective(mesh: &MeshConnectivity, doors: &DoorSystem, front_door: DoorId, samples: &[Vec2]) -> f32 {
    traffic_loss(mesh, samples) + entrance_loss(mesh, doors, front_door)
}

fn traffic_loss(mesh: &MeshConnectivity, samples: &[Vec2]) -> f32 {
    let mut total = 0.0;
    let mut any_path = false;
    for w in samples.windows(2) {
        if let Some(path) = find_path(mesh, w[0], w[1]) {
            total += path_length(&path);
            any_path = true;
        }
    }
    if !any_path {
        return f32::INFINITY;
    }
    total / (samples.len() as f32 / 2.0)
}

fn entrance_loss(mesh: &MeshConnectivity, doors: &DoorSystem, front_door: DoorId) -> f32 {
    let Some(front_center) = doors.doors[front_door].center(mesh) else {
        return 0.0;
    };
    // Unexplained in the reference behavior but preserved as-is.
    let s_e = front_center - Vec2::new(0.0, 0.01);

    let mut total = 0.0;
    let mut count = 0usize;
    for (id, d) in doors.doors.iter() {
        if id == front_door || !d.need_optimization {
            continue;
        }
        let Some(p_d) = d.center(mesh) else { continue };
        let dist = match find_path(mesh, s_e, p_d) {
            Some(path) => path_length(&path),
            None => (p_d - s_e).length(),
        };
        total += dist;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    2.0 * (total / count as f32)
}

/// Draws `count` points uniformly inside the mesh's rooms by rejection
/// sampling over `[0,1]^2`.
pub fn sample_points(mesh: &MeshConnectivity, count: usize, rng: &mut StdRng) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let p = Vec2::new(rng.random::<f32>(), rng.random::<f32>());
        if mesh.contains_point(p).is_some() {
            out.push(p);
        }
    }
    out
}

/// A standard-normal sample via Box-Muller, scaled by `sigma`. `rand` has no
/// bundled normal distribution in this crate's dependency set, so the
/// transform is applied directly over two uniform draws.
fn gaussian(rng: &mut StdRng, sigma: f32) -> f32 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z as f32 * sigma
}

#[derive(Clone, Copy, Debug)]
struct DoorState {
    bind_edge: Option<HalfEdgeId>,
    ratio: f32,
}

/// Drives the accept/reject loop of §4.7: each `step` proposes a slide for
/// every door with `need_optimization`, scores the layout, and either keeps
/// or rolls back the move. `end` restores the best-so-far placement found
/// over the run.
pub struct MhOptimizer {
    rng: StdRng,
    temperature: f32,
    sigma: f32,
    front_door: DoorId,
    prev_score: f32,
    best_score: f32,
    best_states: HashMap<DoorId, DoorState>,
    started: bool,
}

impl MhOptimizer {
    pub fn new(seed: u64, temperature: f32, sigma: f32, front_door: DoorId) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), temperature, sigma, front_door)
    }

    /// Builds the optimizer around an already-seeded generator, so the
    /// caller can draw the objective's sample points from the same stream
    /// before handing it off — determinism follows from a single RNG
    /// stream driving the whole run, not just the MH proposals.
    pub fn with_rng(rng: StdRng, temperature: f32, sigma: f32, front_door: DoorId) -> Self {
        Self {
            rng,
            temperature,
            sigma,
            front_door,
            prev_score: f32::INFINITY,
            best_score: f32::INFINITY,
            best_states: HashMap::new(),
            started: false,
        }
    }

    pub fn init(&mut self, mesh: &MeshConnectivity, doors: &DoorSystem, samples: &[Vec2]) {
        self.prev_score = objective(mesh, doors, self.front_door, samples);
        self.best_score = self.prev_score;
        self.snapshot_bests(doors);
        self.started = true;
    }

    fn snapshot_bests(&mut self, doors: &DoorSystem) {
        self.best_states = doors
            .doors
            .iter()
            .map(|(id, d)| (id, DoorState { bind_edge: d.bind_edge, ratio: d.ratio }))
            .collect();
    }

    /// One MH iteration. Errors from `DoorSystem` are local to the proposal:
    /// a failed move is treated as an aborted (rejected) step rather than
    /// propagated, per the door system's own structural-impossibility
    /// handling.
    pub fn step(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        doors: &mut DoorSystem,
        samples: &[Vec2],
    ) {
        if !self.started {
            self.init(mesh, doors, samples);
        }

        let proposing: Vec<DoorId> = doors
            .doors
            .iter()
            .filter(|(_, d)| d.need_optimization)
            .map(|(id, _)| id)
            .collect();

        let mut moved = Vec::with_capacity(proposing.len());
        for &id in &proposing {
            let delta = gaussian(&mut self.rng, self.sigma);
            match doors.step(mesh, rooms, id, delta) {
                Ok(()) => moved.push(id),
                Err(e) => {
                    log::warn!("door step failed during MH proposal, aborting step: {e}");
                    for &done in moved.iter().rev() {
                        if let Err(e) = doors.rollback(mesh, rooms, done) {
                            log::warn!("rollback after aborted step failed: {e}");
                        }
                    }
                    self.temperature *= 0.99;
                    return;
                }
            }
        }

        let new_score = objective(mesh, doors, self.front_door, samples);
        let df = new_score - self.prev_score;
        let alpha = (-(df as f64) / self.temperature as f64).exp();
        let u: f64 = self.rng.random();

        if u < alpha {
            log::debug!("MH accept: {} -> {}", self.prev_score, new_score);
            self.prev_score = new_score;
            if new_score < self.best_score {
                self.best_score = new_score;
                self.snapshot_bests(doors);
            }
        } else {
            log::debug!("MH reject: staying at {} (proposed {})", self.prev_score, new_score);
            for &id in &proposing {
                if let Err(e) = doors.rollback(mesh, rooms, id) {
                    log::warn!("rollback after rejected step failed: {e}");
                }
            }
        }

        self.temperature *= 0.99;
    }

    pub fn run(
        &mut self,
        mesh: &mut MeshConnectivity,
        rooms: &mut RoomModel,
        doors: &mut DoorSystem,
        samples: &[Vec2],
        iterations: usize,
    ) {
        for _ in 0..iterations {
            self.step(mesh, rooms, doors, samples);
        }
        self.end(mesh, rooms, doors);
    }

    /// Restores every door to its best-so-far `(edge, ratio)` via a
    /// deactivate/reactivate, discarding whatever the last proposal left in
    /// place.
    pub fn end(&mut self, mesh: &mut MeshConnectivity, rooms: &mut RoomModel, doors: &mut DoorSystem) {
        let bests = self.best_states.clone();
        for (id, state) in bests {
            if !doors.doors.contains_key(id) {
                continue;
            }
            if doors.doors[id].is_active {
                if let Err(e) = doors.deactivate(mesh, rooms, id) {
                    log::warn!("could not deactivate door while restoring best state: {e}");
                    continue;
                }
            }
            doors.doors[id].bind_edge = state.bind_edge;
            doors.doors[id].ratio = state.ratio;
            if let Err(e) = doors.activate(mesh, rooms, id) {
                log::warn!("could not reactivate door at its best-so-far placement: {e}");
            }
        }
        self.started = false;
    }

    pub fn best_score(&self) -> f32 {
        self.best_score
    }
}
