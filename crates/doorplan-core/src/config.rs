//! TOML configuration: a shared `[optimizer]` table plus a `[[cases]]`
//! array-of-tables, one entry per floor plan to run the optimizer on.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct OptimizerConfig {
    pub random_seed: u64,
    pub sample_size: usize,
    pub iterations: usize,
    pub temperature: f32,
    pub sigma: f32,
}

/// One door to spawn for a case: the two rooms it connects (by mesh-local
/// room index, resolved against room build order) and an optional width
/// overriding the case's default.
#[derive(Clone, Debug, Deserialize)]
pub struct DoorSpec {
    pub room_i: usize,
    pub room_j: usize,
    pub door_length: Option<f32>,
}

/// `(edge_id, ratio)`: the pinned front door's bind edge, addressed by its
/// position among the room pair's shared edges, and its ratio along it.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct FrontDoorSpec {
    pub edge_id: usize,
    pub ratio: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CaseConfig {
    pub file_name: String,
    pub obj_path: String,
    pub doors: Vec<DoorSpec>,
    pub front_door: FrontDoorSpec,
}

impl CaseConfig {
    pub fn obj_file_path(&self) -> String {
        format!("{}{}.obj", self.obj_path, self.file_name)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub cases: Vec<CaseConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file at {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file at {}", path.display()))
    }

    pub fn case(&self, index: usize) -> Result<&CaseConfig> {
        self.cases
            .get(index)
            .with_context(|| format!("case index {index} out of range (have {} cases)", self.cases.len()))
    }
}
