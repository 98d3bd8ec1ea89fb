// src/plots/occupancy.rs
//! Per-plot boolean cover map. Mutated only by a fully validated commit.

use super::core::CellCoord;

#[derive(Clone, Debug)]
pub struct OccupancyMap {
    size: u32,
    occupied: Vec<bool>,
}

impl OccupancyMap {
    pub fn new(size: u32) -> Self {
        Self { size, occupied: vec![false; size as usize * size as usize] }
    }

    #[inline]
    fn index(&self, c: CellCoord) -> Option<usize> {
        let in_range = c.x >= 0 && c.z >= 0 && (c.x as u32) < self.size && (c.z as u32) < self.size;
        in_range.then(|| c.x as usize * self.size as usize + c.z as usize)
    }

    /// False when out of range.
    pub fn is_free(&self, c: CellCoord) -> bool {
        self.index(c).is_some_and(|i| !self.occupied[i])
    }

    /// Caller has already validated the whole footprint; out-of-range cells are ignored.
    pub fn mark_occupied(&mut self, cells: &[CellCoord]) {
        for &c in cells {
            if let Some(i) = self.index(c) {
                debug_assert!(!self.occupied[i], "cell {c} marked twice");
                self.occupied[i] = true;
            }
        }
    }

    /// Plot reset only.
    pub fn clear(&mut self) {
        self.occupied.fill(false);
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// For map/debug overlays.
    pub fn occupied_cells(&self) -> Vec<CellCoord> {
        let n = self.size as usize;
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, o)| **o)
            .map(|(i, _)| CellCoord::new((i / n) as i32, (i % n) as i32))
            .collect()
    }
}
