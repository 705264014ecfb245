//! Wavefront OBJ loading: collects the `v`/`l`/`f` stream, deduplicates
//! coincident vertices, and normalizes the bounding box into `[0,1]^2`.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;
use wavefront_rs::obj::entity::Entity;
use wavefront_rs::obj::read_lexer::ReadLexer;

use doorplan_common::math::{round6, ToVec};

/// The raw 2D geometry extracted from an OBJ file, before mesh construction:
/// deduplicated vertex positions plus 0-based constraint-edge and triangle
/// index lists.
#[derive(Clone, Debug, Default)]
pub struct LoadedGeometry {
    pub positions: Vec<Vec2>,
    pub edges: Vec<(usize, usize)>,
    pub triangles: Vec<(usize, usize, usize)>,
}

/// Loads and normalizes the OBJ file at `path`. `z` is discarded on read;
/// the surviving `x`/`y` are independently rescaled so each axis' own
/// extrema map to `[0, 1]`, then `y` is flipped (`y' = 1 - y`).
pub fn load_obj(path: &Path) -> Result<LoadedGeometry> {
    let file = File::open(path).with_context(|| format!("opening OBJ file at {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut raw_positions: Vec<Vec2> = Vec::new();
    let mut raw_edges: Vec<(usize, usize)> = Vec::new();
    let mut raw_triangles: Vec<(usize, usize, usize)> = Vec::new();

    ReadLexer::read_to_end(&mut reader, |entity| match entity {
        Entity::Vertex { x, y, z: _z, w: _w } => {
            raw_positions.push(Vec2::new(x as f32, y as f32));
        }
        Entity::Line { vertices } => {
            let idx: Vec<usize> = vertices.iter().map(|&v| (v - 1) as usize).collect();
            for w in idx.windows(2) {
                raw_edges.push((w[0], w[1]));
            }
        }
        Entity::Face { vertices } => {
            if vertices.len() >= 3 {
                let a = (vertices[0].vertex - 1) as usize;
                let b = (vertices[1].vertex - 1) as usize;
                let c = (vertices[2].vertex - 1) as usize;
                raw_triangles.push((a, b, c));
            }
        }
        _ => {}
    })
    .with_context(|| format!("parsing OBJ file at {}", path.display()))?;

    let (positions, remap) = dedup_vertices(&raw_positions);
    let edges = raw_edges
        .into_iter()
        .map(|(a, b)| (remap[a], remap[b]))
        .collect();
    let triangles = raw_triangles
        .into_iter()
        .map(|(a, b, c)| (remap[a], remap[b], remap[c]))
        .collect();

    let positions = normalize(positions);

    Ok(LoadedGeometry { positions, edges, triangles })
}

/// Merges vertices whose positions round to the same 6 decimals, returning
/// the deduplicated positions plus a remap from raw index to deduplicated
/// index.
fn dedup_vertices(raw: &[Vec2]) -> (Vec<Vec2>, Vec<usize>) {
    let mut seen = HashMap::new();
    let mut unique = Vec::new();
    let mut remap = Vec::with_capacity(raw.len());

    for &p in raw {
        let key = round6(p);
        let idx = *seen.entry(key).or_insert_with(|| {
            unique.push(key.to_vec());
            unique.len() - 1
        });
        remap.push(idx);
    }

    (unique, remap)
}

fn normalize(positions: Vec<Vec2>) -> Vec<Vec2> {
    if positions.is_empty() {
        return positions;
    }
    let (mut min, mut max) = (positions[0], positions[0]);
    for &p in &positions {
        min = min.min(p);
        max = max.max(p);
    }
    let span = Vec2::new(
        if max.x > min.x { max.x - min.x } else { 1.0 },
        if max.y > min.y { max.y - min.y } else { 1.0 },
    );
    positions
        .into_iter()
        .map(|p| {
            let n = (p - min) / span;
            Vec2::new(n.x, 1.0 - n.y)
        })
        .collect()
}
