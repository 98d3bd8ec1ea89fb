// src/plots/bounds.rs
//! World-space bounding volumes for the 3D overlap test.
//!
//! Structures only turn in quarter steps, so a post-rotation box is always
//! axis aligned. Every box carries a [`BodyClass`]; only `Placed` bodies
//! block placement.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::coords::{footprint_center, footprint_half_extents};
use super::core::{CellCoord, Footprint, Rotation};

/// Faces that merely touch do not count as overlap.
pub const OVERLAP_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyClass {
    /// Committed structure; blocks placement.
    Placed,
    /// Preview ghost; never collides.
    Ghost,
    /// Ground decoration; never collides.
    Decoration,
}

impl BodyClass {
    pub fn blocks_placement(self) -> bool {
        self == BodyClass::Placed
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl WorldBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self { center, half_extents }
    }

    pub fn from_footprint(
        origin: Vec3,
        grid_size: u32,
        anchor: CellCoord,
        footprint: Footprint,
        rotation: Rotation,
    ) -> Self {
        Self {
            center: footprint_center(origin, grid_size, anchor, footprint, rotation),
            half_extents: footprint_half_extents(footprint, rotation),
        }
    }

    pub fn min(&self) -> Vec3 { self.center - self.half_extents }
    pub fn max(&self) -> Vec3 { self.center + self.half_extents }

    /// Strict interpenetration on all three axes.
    pub fn overlaps(&self, other: &WorldBox) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents - Vec3::splat(OVERLAP_EPSILON);
        d.x < reach.x && d.y < reach.y && d.z < reach.z
    }
}

/// A box plus its collision classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub class: BodyClass,
    pub bounds: WorldBox,
}

/// True if `candidate` interpenetrates any blocking body.
pub fn overlaps_any<'a>(candidate: &WorldBox, bodies: impl IntoIterator<Item = &'a Body>) -> bool {
    bodies
        .into_iter()
        .any(|b| b.class.blocks_placement() && b.bounds.overlaps(candidate))
}
