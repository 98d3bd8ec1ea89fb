// src/plots/error.rs
//! Outcome taxonomy for placement queries and plot mutations.
//! Every variant is an expected, recoverable result; none abort.

use super::core::{CellCoord, PlotId, StructureTypeId};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotError {
    #[error("footprint runs past the grid edge")]
    OutOfBounds,
    #[error("cell {cell} is already covered")]
    OccupancyConflict { cell: CellCoord },
    #[error("structure volume overlaps an existing structure")]
    GeometricOverlap,
    #[error("this plot cannot be edited from here")]
    ModeNotPermitted,
    #[error("no structure type selected")]
    NoSelection,
    #[error("unknown plot {0}")]
    UnknownPlot(PlotId),
    #[error("unknown structure type {0}")]
    UnknownStructureType(StructureTypeId),
}

impl PlotError {
    /// True for the three geometric rejection reasons a preview can show.
    pub fn is_placement_rejection(&self) -> bool {
        matches!(
            self,
            PlotError::OutOfBounds | PlotError::OccupancyConflict { .. } | PlotError::GeometricOverlap
        )
    }
}
