// src/plots/coords.rs
//! Cell <-> world mapping for a grid centered on its plot origin.
//! Pure functions only.

use bevy::prelude::*;

use super::core::{CellCoord, Footprint, Rotation};

/// World position fell outside the grid.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("world position ({x:.2}, {z:.2}) is outside the grid")]
pub struct OutOfRange {
    pub x: f32,
    pub z: f32,
}

/// Distance from the origin to the center of cell 0 along each axis.
#[inline]
pub fn grid_offset(size: u32) -> f32 {
    size as f32 / 2.0 - 0.5
}

/// Center of `cell` in world space.
pub fn cell_to_world(origin: Vec3, size: u32, cell: CellCoord) -> Vec3 {
    let off = grid_offset(size);
    origin + Vec3::new(cell.x as f32 - off, 0.0, cell.z as f32 - off)
}

/// Cell containing `pos` (Y ignored). Each cell spans ±0.5 around its center.
pub fn world_to_cell(origin: Vec3, size: u32, pos: Vec3) -> Result<CellCoord, OutOfRange> {
    let off = grid_offset(size);
    let fx = (pos.x - origin.x + off + 0.5).floor();
    let fz = (pos.z - origin.z + off + 0.5).floor();
    let n = size as f32;
    if fx < 0.0 || fz < 0.0 || fx >= n || fz >= n {
        return Err(OutOfRange { x: pos.x, z: pos.z });
    }
    Ok(CellCoord::new(fx as i32, fz as i32))
}

/// Swap the horizontal axes for a quarter turn.
#[inline]
pub fn effective_footprint(length: u32, width: u32, rotated: bool) -> (u32, u32) {
    if rotated { (width, length) } else { (length, width) }
}

/// Every cell a footprint anchored at `anchor` covers, x-major.
/// Callers bound the span first; the validator never passes one wider than its grid.
pub fn covered_cells(anchor: CellCoord, footprint: Footprint, rotation: Rotation) -> Vec<CellCoord> {
    let (len, wid) = footprint.effective(rotation);
    let mut out = Vec::with_capacity(len as usize * wid as usize);
    for x in anchor.x..anchor.x + len as i32 {
        for z in anchor.z..anchor.z + wid as i32 {
            out.push(CellCoord::new(x, z));
        }
    }
    out
}

/// World-space center of the structure volume (Y at half height above the plot floor).
pub fn footprint_center(
    origin: Vec3,
    size: u32,
    anchor: CellCoord,
    footprint: Footprint,
    rotation: Rotation,
) -> Vec3 {
    let (len, wid) = footprint.effective(rotation);
    let off = grid_offset(size);
    origin
        + Vec3::new(
            anchor.x as f32 + len as f32 * 0.5 - 0.5 - off,
            footprint.height as f32 * 0.5,
            anchor.z as f32 + wid as f32 * 0.5 - 0.5 - off,
        )
}

/// Half extents of the post-rotation, axis-aligned volume.
pub fn footprint_half_extents(footprint: Footprint, rotation: Rotation) -> Vec3 {
    let (len, wid) = footprint.effective(rotation);
    Vec3::new(len as f32 * 0.5, footprint.height as f32 * 0.5, wid as f32 * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_world_roundtrip() {
        let origin = Vec3::new(7.5, 0.0, -7.5);
        for x in 0..7 {
            for z in 0..7 {
                let c = CellCoord::new(x, z);
                let w = cell_to_world(origin, 7, c);
                assert_eq!(world_to_cell(origin, 7, w), Ok(c));
                // anywhere inside the cell maps back to it
                let nudged = w + Vec3::new(0.45, 3.0, -0.45);
                assert_eq!(world_to_cell(origin, 7, nudged), Ok(c));
            }
        }
    }

    #[test]
    fn grid_is_centered_on_origin() {
        let center = cell_to_world(Vec3::ZERO, 7, CellCoord::new(3, 3));
        assert_eq!(center, Vec3::ZERO);
        let corner = cell_to_world(Vec3::ZERO, 7, CellCoord::new(0, 0));
        assert_eq!(corner, Vec3::new(-3.0, 0.0, -3.0));
    }

    #[test]
    fn outside_positions_are_rejected() {
        assert!(world_to_cell(Vec3::ZERO, 7, Vec3::new(3.6, 0.0, 0.0)).is_err());
        assert!(world_to_cell(Vec3::ZERO, 7, Vec3::new(0.0, 0.0, -3.6)).is_err());
        assert!(world_to_cell(Vec3::ZERO, 7, Vec3::new(3.4, 0.0, -3.4)).is_ok());
    }

    #[test]
    fn rotation_law() {
        for len in 1..5 {
            for wid in 1..5 {
                assert_eq!(effective_footprint(len, wid, true), (wid, len));
                assert_eq!(effective_footprint(len, wid, false), (len, wid));
            }
        }
    }

    #[test]
    fn rotated_cells_run_along_z() {
        let fp = Footprint::new(3, 1, 1);
        let plain = covered_cells(CellCoord::new(2, 2), fp, Rotation::Deg0);
        let turned = covered_cells(CellCoord::new(2, 2), fp, Rotation::Deg90);
        assert_eq!(plain, vec![CellCoord::new(2, 2), CellCoord::new(3, 2), CellCoord::new(4, 2)]);
        assert_eq!(turned, vec![CellCoord::new(2, 2), CellCoord::new(2, 3), CellCoord::new(2, 4)]);
    }

    #[test]
    fn center_of_single_cell_matches_cell_center() {
        let fp = Footprint::new(1, 1, 2);
        let c = footprint_center(Vec3::ZERO, 7, CellCoord::new(1, 5), fp, Rotation::Deg0);
        let cell = cell_to_world(Vec3::ZERO, 7, CellCoord::new(1, 5));
        assert_eq!(c, cell + Vec3::Y);
        let he = footprint_half_extents(Footprint::new(2, 3, 1), Rotation::Deg90);
        assert_eq!(he, Vec3::new(1.5, 0.5, 1.0));
    }
}
