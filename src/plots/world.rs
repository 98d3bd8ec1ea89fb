// src/plots/world.rs
//! World layout: a `rows x cols` lattice of plots with seeded kinds and ownership.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::coordinator::Plot;
use super::core::{Ownership, PlotId, PlotKind, WorldSeed};
use super::grid::GridError;

/// Upper bound on `rows * cols`.
pub const MAX_PLOTS: usize = 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    pub rows: u32,
    pub cols: u32,
    /// Cells per plot side.
    pub grid_size: u32,
    /// Gap between neighbouring plots (world units).
    pub plot_spacing: f32,
    pub abandoned_plots: u32,
    pub void_plots: u32,
    pub mountain_plots: u32,
    pub opponent_plots: u32,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            grid_size: 7,
            plot_spacing: 0.5,
            abandoned_plots: 1,
            void_plots: 1,
            mountain_plots: 0,
            opponent_plots: 3,
        }
    }
}

impl WorldLayout {
    pub fn plot_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Distance between neighbouring plot origins.
    pub fn step(&self) -> f32 {
        self.grid_size as f32 + self.plot_spacing
    }

    /// Lattice centered on the world origin.
    pub fn plot_origin(&self, id: PlotId) -> Vec3 {
        let step = self.step();
        let x = (id.col as f32 - (self.cols as f32 - 1.0) * 0.5) * step;
        let z = (id.row as f32 - (self.rows as f32 - 1.0) * 0.5) * step;
        Vec3::new(x, 0.0, z)
    }
}

/// Separate stream from decorations so changing one never reshuffles the other.
#[inline]
pub fn layout_rng(seed: WorldSeed) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.0 ^ 0xA11C_0DE5_9E37_79B9u64)
}

/// Build every plot (first construction phase only; grids are not decorated yet).
pub fn generate_plots(layout: &WorldLayout, seed: WorldSeed) -> Result<Vec<Plot>, GridError> {
    let count = layout.plot_count();
    if count > MAX_PLOTS {
        return Err(GridError::TooManyPlots { rows: layout.rows, cols: layout.cols, max: MAX_PLOTS });
    }
    let mut rng = layout_rng(seed);

    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(&mut rng);

    let mut kinds = vec![PlotKind::Normal; count];
    let special = std::iter::repeat_n(PlotKind::Abandoned, layout.abandoned_plots as usize)
        .chain(std::iter::repeat_n(PlotKind::Void, layout.void_plots as usize))
        .chain(std::iter::repeat_n(PlotKind::Mountain, layout.mountain_plots as usize));
    for (&slot, kind) in order.iter().zip(special) {
        kinds[slot] = kind;
    }

    let mut ownership = vec![Ownership::Unclaimed; count];
    let mut normal: Vec<usize> = (0..count).filter(|&i| kinds[i] == PlotKind::Normal).collect();
    normal.shuffle(&mut rng);
    match normal.split_first() {
        Some((&yours, rest)) => {
            ownership[yours] = Ownership::Yours;
            for &i in rest.iter().take(layout.opponent_plots as usize) {
                ownership[i] = Ownership::Opponent;
            }
        }
        None => warn!("World: no normal plot available, nobody owns a plot"),
    }

    let mut plots = Vec::with_capacity(count);
    for i in 0..count {
        let id = PlotId::new(i as u32 / layout.cols, i as u32 % layout.cols);
        plots.push(Plot::create(id, ownership[i], kinds[i], layout.plot_origin(id), layout.grid_size)?);
    }

    if let Some(yours) = plots.iter().find(|p| p.ownership() == Ownership::Yours) {
        info!(
            "World: generated {} plots ({}x{}), yours is {}",
            plots.len(),
            layout.rows,
            layout.cols,
            yours.id()
        );
    }
    Ok(plots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_kind(plots: &[Plot], kind: PlotKind) -> usize {
        plots.iter().filter(|p| p.kind() == kind).count()
    }

    fn count_owner(plots: &[Plot], owner: Ownership) -> usize {
        plots.iter().filter(|p| p.ownership() == owner).count()
    }

    #[test]
    fn default_layout_counts() {
        let plots = generate_plots(&WorldLayout::default(), WorldSeed(1337)).unwrap();
        assert_eq!(plots.len(), 9);
        assert_eq!(count_kind(&plots, PlotKind::Abandoned), 1);
        assert_eq!(count_kind(&plots, PlotKind::Void), 1);
        assert_eq!(count_kind(&plots, PlotKind::Normal), 7);
        assert_eq!(count_owner(&plots, Ownership::Yours), 1);
        assert_eq!(count_owner(&plots, Ownership::Opponent), 3);
        for p in plots.iter().filter(|p| p.ownership() != Ownership::Unclaimed) {
            assert_eq!(p.kind(), PlotKind::Normal);
        }
    }

    #[test]
    fn same_seed_same_world() {
        let layout = WorldLayout::default();
        let a = generate_plots(&layout, WorldSeed(7)).unwrap();
        let b = generate_plots(&layout, WorldSeed(7)).unwrap();
        let key = |p: &Plot| (p.id(), p.kind(), p.ownership());
        assert_eq!(a.iter().map(key).collect::<Vec<_>>(), b.iter().map(key).collect::<Vec<_>>());
    }

    #[test]
    fn grids_do_not_overlap() {
        let layout = WorldLayout::default();
        let plots = generate_plots(&layout, WorldSeed(3)).unwrap();
        let center = layout.plot_origin(PlotId::new(1, 1));
        assert_eq!(center, Vec3::ZERO);
        let right = layout.plot_origin(PlotId::new(1, 2));
        assert_eq!(right.x, 7.5);
        for p in &plots {
            let origin = p.grid().origin();
            let hits = plots.iter().filter(|q| q.grid().cell_at_world(origin).is_ok()).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn all_special_leaves_no_owner() {
        let layout = WorldLayout { rows: 1, cols: 2, void_plots: 1, mountain_plots: 1, abandoned_plots: 0, ..Default::default() };
        let plots = generate_plots(&layout, WorldSeed(1)).unwrap();
        assert_eq!(count_owner(&plots, Ownership::Yours), 0);
    }

    #[test]
    fn opponents_capped_by_normal_plots() {
        let layout = WorldLayout { rows: 2, cols: 2, abandoned_plots: 0, void_plots: 0, opponent_plots: 10, ..Default::default() };
        let plots = generate_plots(&layout, WorldSeed(5)).unwrap();
        assert_eq!(count_owner(&plots, Ownership::Yours), 1);
        assert_eq!(count_owner(&plots, Ownership::Opponent), 3);
    }

    #[test]
    fn zero_grid_size_is_an_error() {
        let layout = WorldLayout { grid_size: 0, ..Default::default() };
        assert_eq!(generate_plots(&layout, WorldSeed(1)).unwrap_err(), GridError::EmptyGrid);
    }

    #[test]
    fn oversized_layouts_are_errors() {
        let wide = WorldLayout { rows: u32::MAX, cols: u32::MAX, ..Default::default() };
        assert_eq!(wide.plot_count(), u32::MAX as usize * u32::MAX as usize);
        assert!(matches!(generate_plots(&wide, WorldSeed(1)), Err(GridError::TooManyPlots { .. })));

        let big_grid = WorldLayout { rows: 1, cols: 1, grid_size: 70_000, ..Default::default() };
        assert_eq!(
            generate_plots(&big_grid, WorldSeed(1)).unwrap_err(),
            GridError::TooLarge { size: 70_000, max: crate::plots::grid::MAX_GRID_SIZE }
        );
    }
}
