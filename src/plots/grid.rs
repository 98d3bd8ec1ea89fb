// src/plots/grid.rs
//! Fixed-size square cell grid for one plot.
//!
//! Construction is two-phase: [`Grid::new`] lays out the cells, then
//! [`Grid::decorate`] runs the decoration generator exactly once. Placement
//! never touches decorations.

use bevy::prelude::*;
use rand::Rng;

use super::coords::{cell_to_world, world_to_cell, OutOfRange};
use super::core::{CellCoord, DecorationClass, Ownership, PlotKind};
use super::decoration::{DecorationGenerator, DecorationReport};

/// Largest accepted cells-per-side.
pub const MAX_GRID_SIZE: u32 = 256;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("grid size {size} exceeds {max}")]
    TooLarge { size: u32, max: u32 },
    #[error("{rows}x{cols} plots exceed the limit of {max}")]
    TooManyPlots { rows: u32, cols: u32, max: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub coord: CellCoord,
    pub decoration: DecorationClass,
    /// False for the reserved pit interior of void plots.
    pub tileable: bool,
}

#[derive(Clone, Debug)]
pub struct Grid {
    size: u32,
    origin: Vec3,
    kind: PlotKind,
    /// Row-major by x, then z.
    cells: Vec<Cell>,
    decorated: bool,
}

impl Grid {
    pub fn new(size: u32, origin: Vec3, kind: PlotKind) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::EmptyGrid);
        }
        if size > MAX_GRID_SIZE {
            return Err(GridError::TooLarge { size, max: MAX_GRID_SIZE });
        }
        let mut cells = Vec::with_capacity(size as usize * size as usize);
        for x in 0..size as i32 {
            for z in 0..size as i32 {
                let coord = CellCoord::new(x, z);
                cells.push(Cell {
                    coord,
                    decoration: DecorationClass::None,
                    tileable: is_tileable(kind, size, coord),
                });
            }
        }
        Ok(Self { size, origin, kind, cells, decorated: false })
    }

    pub fn size(&self) -> u32 { self.size }
    pub fn origin(&self) -> Vec3 { self.origin }
    pub fn kind(&self) -> PlotKind { self.kind }
    pub fn is_decorated(&self) -> bool { self.decorated }

    #[inline]
    pub fn in_range(&self, c: CellCoord) -> bool {
        c.x >= 0 && c.z >= 0 && (c.x as u32) < self.size && (c.z as u32) < self.size
    }

    #[inline]
    fn index(&self, c: CellCoord) -> Option<usize> {
        self.in_range(c).then(|| c.x as usize * self.size as usize + c.z as usize)
    }

    pub fn cell(&self, c: CellCoord) -> Option<&Cell> {
        self.index(c).map(|i| &self.cells[i])
    }

    /// In range and not part of a reserved interior.
    pub fn is_tileable(&self, c: CellCoord) -> bool {
        self.cell(c).is_some_and(|cell| cell.tileable)
    }

    /// `None` for out-of-range cells.
    pub fn decoration_at(&self, c: CellCoord) -> DecorationClass {
        self.cell(c).map_or(DecorationClass::None, |cell| cell.decoration)
    }

    pub(crate) fn set_decoration(&mut self, c: CellCoord, deco: DecorationClass) {
        if let Some(i) = self.index(c) {
            self.cells[i].decoration = deco;
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells that get a floor tile (and may be decorated).
    pub fn tileable_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.tileable)
    }

    pub fn cell_center(&self, c: CellCoord) -> Vec3 {
        cell_to_world(self.origin, self.size, c)
    }

    pub fn cell_at_world(&self, pos: Vec3) -> Result<CellCoord, OutOfRange> {
        world_to_cell(self.origin, self.size, pos)
    }

    /// Second construction phase. Returns `None` if the grid was already decorated.
    pub fn decorate<R: Rng>(
        &mut self,
        generator: &DecorationGenerator,
        ownership: Ownership,
        rng: &mut R,
    ) -> Option<DecorationReport> {
        if self.decorated {
            return None;
        }
        let report = generator.generate(self, ownership, rng);
        self.decorated = true;
        Some(report)
    }
}

/// Void plots keep only their border ring; the interior is reserved for the pit.
pub fn is_tileable(kind: PlotKind, size: u32, c: CellCoord) -> bool {
    if kind != PlotKind::Void {
        return true;
    }
    let last = size as i32 - 1;
    !(c.x > 0 && c.x < last && c.z > 0 && c.z < last)
}
