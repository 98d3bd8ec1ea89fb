// src/plots/validator.rs
//! Footprint legality: grid bounds, cell occupancy, then 3D volume overlap.
//! Side-effect free; safe to call every frame.

use super::bounds::{overlaps_any, Body, WorldBox};
use super::coords::covered_cells;
use super::core::{CellCoord, Footprint, Rotation};
use super::error::PlotError;
use super::grid::Grid;
use super::occupancy::OccupancyMap;

/// Result of one validation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementCheck {
    /// `Ok` when every check passed, otherwise the first failing reason.
    pub verdict: Result<(), PlotError>,
    /// Every cell the footprint covers, including ones off the grid. A
    /// footprint wider than the grid itself only reports its on-grid part.
    pub cells: Vec<CellCoord>,
    /// Candidate world volume.
    pub bounds: WorldBox,
}

impl PlacementCheck {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_ok()
    }

    pub fn reason(&self) -> Option<PlotError> {
        self.verdict.err()
    }
}

/// Borrowed view of one plot's placement state.
pub struct PlacementValidator<'a, I> {
    pub grid: &'a Grid,
    pub occupancy: &'a OccupancyMap,
    pub bodies: I,
}

impl<'a, I> PlacementValidator<'a, I>
where
    I: IntoIterator<Item = &'a Body> + Clone,
{
    pub fn new(grid: &'a Grid, occupancy: &'a OccupancyMap, bodies: I) -> Self {
        Self { grid, occupancy, bodies }
    }

    pub fn check(&self, footprint: Footprint, rotation: Rotation, anchor: CellCoord) -> PlacementCheck {
        let bounds = WorldBox::from_footprint(self.grid.origin(), self.grid.size(), anchor, footprint, rotation);
        if !self.spans_fit(footprint, rotation, anchor) {
            // Never enumerate a span the grid cannot hold.
            let cells = clipped_cells(self.grid.size(), anchor, footprint, rotation);
            return PlacementCheck { verdict: Err(PlotError::OutOfBounds), cells, bounds };
        }
        let cells = covered_cells(anchor, footprint, rotation);
        let verdict = self.verdict(&cells, &bounds);
        PlacementCheck { verdict, cells, bounds }
    }

    /// Each side no longer than the grid, and the far corner representable.
    fn spans_fit(&self, footprint: Footprint, rotation: Rotation, anchor: CellCoord) -> bool {
        let (len, wid) = footprint.effective(rotation);
        let n = self.grid.size();
        len <= n
            && wid <= n
            && anchor.x as i64 + len as i64 <= i32::MAX as i64
            && anchor.z as i64 + wid as i64 <= i32::MAX as i64
    }

    fn verdict(&self, cells: &[CellCoord], bounds: &WorldBox) -> Result<(), PlotError> {
        if cells.iter().any(|&c| !self.grid.in_range(c)) {
            return Err(PlotError::OutOfBounds);
        }
        // Reserved (untiled) cells are never placeable.
        if let Some(&cell) = cells
            .iter()
            .find(|&&c| !self.occupancy.is_free(c) || !self.grid.is_tileable(c))
        {
            return Err(PlotError::OccupancyConflict { cell });
        }
        if overlaps_any(bounds, self.bodies.clone()) {
            return Err(PlotError::GeometricOverlap);
        }
        Ok(())
    }
}

/// On-grid part of a footprint, computed in `i64` so any `u32` span is safe.
fn clipped_cells(size: u32, anchor: CellCoord, footprint: Footprint, rotation: Rotation) -> Vec<CellCoord> {
    let (len, wid) = footprint.effective(rotation);
    let n = size as i64;
    let x0 = (anchor.x as i64).clamp(0, n);
    let z0 = (anchor.z as i64).clamp(0, n);
    let x1 = (anchor.x as i64 + len as i64).clamp(0, n);
    let z1 = (anchor.z as i64 + wid as i64).clamp(0, n);
    let mut out = Vec::new();
    for x in x0..x1 {
        for z in z0..z1 {
            out.push(CellCoord::new(x as i32, z as i32));
        }
    }
    out
}
