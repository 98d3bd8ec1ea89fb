// src/plots/decoration.rs
//! Ground decoration (deterministic per seed and plot).
//!
//! Phase A scatters paired pebble chunks on normal/abandoned plots, with a
//! scan fallback so such plots always end up with at least one pair.
//! Phase B sprinkles solitary rocks over whatever is left.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::core::{CellCoord, DecorationClass, Ownership, PlotId, WorldSeed};
use super::grid::Grid;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationParams {
    /// Pebble chunks on the local player's plot.
    pub owned_chunk_count: u32,
    /// Inclusive range for every other plot.
    pub min_chunks: u32,
    pub max_chunks: u32,
    /// Random attempts allowed per wanted chunk before giving up.
    pub attempts_per_chunk: u32,
    /// Per-cell rock probability in phase B.
    pub rock_chance: f64,
    pub small_rock_weight: f64,
    pub high_rock_weight: f64,
}

impl Default for DecorationParams {
    fn default() -> Self {
        Self {
            owned_chunk_count: 2,
            min_chunks: 1,
            max_chunks: 4,
            attempts_per_chunk: 10,
            rock_chance: 0.10,
            small_rock_weight: 0.35,
            high_rock_weight: 0.30,
        }
    }
}

impl DecorationParams {
    /// Share of rocks that come out small (~0.538 with the default weights).
    pub fn small_rock_ratio(&self) -> f64 {
        let total = self.small_rock_weight + self.high_rock_weight;
        if total > 0.0 { self.small_rock_weight / total } else { 1.0 }
    }
}

/// What one generation pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecorationReport {
    pub target_chunks: u32,
    pub pebble_chunks: u32,
    pub attempts: u32,
    pub used_fallback: bool,
    pub small_rocks: u32,
    pub high_rocks: u32,
}

#[derive(Clone, Debug, Default)]
pub struct DecorationGenerator {
    params: DecorationParams,
}

impl DecorationGenerator {
    pub fn new(params: DecorationParams) -> Self {
        Self { params }
    }

    /// Stable per (seed, plot).
    #[inline]
    pub fn rng_for(seed: WorldSeed, plot: PlotId) -> ChaCha8Rng {
        let mix = (seed.0)
            ^ ((plot.row as u64) << 16)
            ^ ((plot.col as u64) << 40)
            ^ 0x5EB1_E5D0_C0FF_EE11u64;
        ChaCha8Rng::seed_from_u64(mix)
    }

    /// Mutates only `decoration` of tileable cells.
    pub fn generate<R: Rng>(&self, grid: &mut Grid, ownership: Ownership, rng: &mut R) -> DecorationReport {
        let mut report = DecorationReport::default();
        if grid.kind().grows_pebbles() {
            self.place_pebble_chunks(grid, ownership, rng, &mut report);
        }
        self.scatter_rocks(grid, rng, &mut report);
        report
    }

    fn place_pebble_chunks<R: Rng>(
        &self,
        grid: &mut Grid,
        ownership: Ownership,
        rng: &mut R,
        report: &mut DecorationReport,
    ) {
        let p = &self.params;
        let target = match ownership {
            Ownership::Yours => p.owned_chunk_count,
            _ => {
                let hi = p.max_chunks.max(p.min_chunks);
                rng.random_range(p.min_chunks..=hi)
            }
        };
        report.target_chunks = target;

        let n = grid.size() as i32;
        let max_attempts = target.saturating_mul(p.attempts_per_chunk);
        while report.pebble_chunks < target && report.attempts < max_attempts {
            report.attempts += 1;
            let cell = CellCoord::new(rng.random_range(0..n), rng.random_range(0..n));
            if !is_bare(grid, cell) {
                continue;
            }
            let candidates = bare_neighbors(grid, cell);
            if candidates.is_empty() {
                continue;
            }
            let mate = candidates[rng.random_range(0..candidates.len())];
            grid.set_decoration(cell, DecorationClass::Pebble);
            grid.set_decoration(mate, DecorationClass::Pebble);
            report.pebble_chunks += 1;
        }

        if report.pebble_chunks > 0 {
            return;
        }

        // Fallback: first viable pair in scan order.
        'scan: for x in 0..n {
            for z in 0..n {
                let cell = CellCoord::new(x, z);
                if !is_bare(grid, cell) {
                    continue;
                }
                if let Some(&mate) = bare_neighbors(grid, cell).first() {
                    grid.set_decoration(cell, DecorationClass::Pebble);
                    grid.set_decoration(mate, DecorationClass::Pebble);
                    report.pebble_chunks = 1;
                    report.used_fallback = true;
                    break 'scan;
                }
            }
        }

        if report.pebble_chunks == 0 {
            warn!("Decoration: no adjacent free cells for a pebble pair on a {}x{} grid", n, n);
        }
    }

    fn scatter_rocks<R: Rng>(&self, grid: &mut Grid, rng: &mut R, report: &mut DecorationReport) {
        let chance = self.params.rock_chance.clamp(0.0, 1.0);
        let small_ratio = self.params.small_rock_ratio();
        let n = grid.size() as i32;
        for x in 0..n {
            for z in 0..n {
                let cell = CellCoord::new(x, z);
                if !is_bare(grid, cell) {
                    continue;
                }
                if rng.random::<f64>() >= chance {
                    continue;
                }
                if rng.random::<f64>() < small_ratio {
                    grid.set_decoration(cell, DecorationClass::SmallRock);
                    report.small_rocks += 1;
                } else {
                    grid.set_decoration(cell, DecorationClass::HighRock);
                    report.high_rocks += 1;
                }
            }
        }
    }
}

/// Tileable and not yet decorated.
#[inline]
fn is_bare(grid: &Grid, c: CellCoord) -> bool {
    grid.is_tileable(c) && grid.decoration_at(c) == DecorationClass::None
}

fn bare_neighbors(grid: &Grid, c: CellCoord) -> Vec<CellCoord> {
    c.neighbors4().into_iter().filter(|&n| is_bare(grid, n)).collect()
}
