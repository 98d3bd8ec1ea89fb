// src/plots/core.rs
//! Core ids and small value types shared by every plot component.
//! Keep this file dependency-light; everything else in `plots` builds on it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ---------- World, plots, ids ----------

/// Global world seed; changing this reshuffles plot kinds, ownership and decorations.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSeed(pub u64);

/// Identity of a plot on the world lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlotId {
    pub row: u32,
    pub col: u32,
}

impl PlotId {
    pub const fn new(row: u32, col: u32) -> Self { Self { row, col } }
}

impl std::fmt::Display for PlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}|{:02}", self.row, self.col)
    }
}

/// Integer cell coordinate inside a plot grid.
/// Signed so that pointer picks and footprints may run off the grid and be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    pub const fn new(x: i32, z: i32) -> Self { Self { x, z } }

    /// The four edge-adjacent neighbours, N/E/S/W.
    pub fn neighbors4(self) -> [CellCoord; 4] {
        [
            CellCoord::new(self.x, self.z + 1),
            CellCoord::new(self.x + 1, self.z),
            CellCoord::new(self.x, self.z - 1),
            CellCoord::new(self.x - 1, self.z),
        ]
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

// ---------- Plot state ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Ownership {
    #[default]
    Unclaimed,
    Yours,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotKind {
    #[default]
    Normal,
    Abandoned,
    Void,
    Mountain,
}

impl PlotKind {
    /// Mountains and voids never take structures.
    pub fn accepts_structures(self) -> bool {
        !matches!(self, PlotKind::Mountain | PlotKind::Void)
    }

    /// Paired pebble chunks only grow on ordinary ground.
    pub fn grows_pebbles(self) -> bool {
        matches!(self, PlotKind::Normal | PlotKind::Abandoned)
    }
}

/// Ground decoration assigned once per cell at plot creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DecorationClass {
    #[default]
    None,
    Pebble,
    SmallRock,
    HighRock,
}

impl DecorationClass {
    pub fn is_rock(self) -> bool {
        matches!(self, DecorationClass::SmallRock | DecorationClass::HighRock)
    }
}

// ---------- Structures ----------

/// Index of a structure type in the catalog (stable during a session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureTypeId(pub u32);

impl std::fmt::Display for StructureTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-plot identity of a committed structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub u32);

/// Quarter-turn placement rotation around +Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
}

impl Rotation {
    pub fn is_rotated(self) -> bool { self == Rotation::Deg90 }

    pub fn toggled(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg0,
        }
    }
}

/// Cuboid footprint in cell units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Extent along grid X before rotation.
    pub length: u32,
    /// Extent along grid Z before rotation.
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(length: u32, width: u32, height: u32) -> Self {
        Self { length, width, height }
    }

    /// (x-extent, z-extent) after applying `rotation`.
    pub fn effective(self, rotation: Rotation) -> (u32, u32) {
        super::coords::effective_footprint(self.length, self.width, rotation.is_rotated())
    }
}
