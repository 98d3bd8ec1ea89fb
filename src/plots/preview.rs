// src/plots/preview.rs
//! Ghost preview controller.
//!
//! `Idle` until placement is active, a structure type is selected and the
//! pointer resolves to a cell of the active grid; then `Previewing` and
//! re-validated on every tick. Validation is pure, so ticking often is safe.
//! Rotation is remembered across idle periods.

use super::core::{CellCoord, Rotation, StructureTypeId};
use super::validator::PlacementCheck;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Idle,
    Previewing { cell: CellCoord, rotation: Rotation },
}

/// Visual feedback consumed by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GhostSignal {
    #[default]
    Hidden,
    Valid,
    Invalid,
}

/// What one tick sees.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreviewInputs {
    pub placement_active: bool,
    pub selection: Option<StructureTypeId>,
    /// In-range cell of the active grid under the pointer.
    pub pick: Option<CellCoord>,
}

/// Latest evaluated ghost placement.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostFrame {
    pub structure: StructureTypeId,
    pub cell: CellCoord,
    pub rotation: Rotation,
    pub check: PlacementCheck,
    /// Anchor or rotation differs from the previous frame; the ghost transform needs an update.
    pub moved: bool,
}

impl GhostFrame {
    pub fn signal(&self) -> GhostSignal {
        if self.check.is_valid() { GhostSignal::Valid } else { GhostSignal::Invalid }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GhostPreview {
    state: PreviewState,
    rotation: Rotation,
    frame: Option<GhostFrame>,
}

impl GhostPreview {
    pub fn state(&self) -> PreviewState { self.state }
    pub fn rotation(&self) -> Rotation { self.rotation }
    pub fn frame(&self) -> Option<&GhostFrame> { self.frame.as_ref() }

    pub fn is_previewing(&self) -> bool {
        matches!(self.state, PreviewState::Previewing { .. })
    }

    pub fn signal(&self) -> GhostSignal {
        self.frame.as_ref().map_or(GhostSignal::Hidden, GhostFrame::signal)
    }

    /// Anchor and rotation a confirm would commit, if the ghost currently shows valid.
    pub fn confirm_target(&self) -> Option<(StructureTypeId, CellCoord, Rotation)> {
        self.frame
            .as_ref()
            .filter(|f| f.check.is_valid())
            .map(|f| (f.structure, f.cell, f.rotation))
    }

    /// Advance one step. `validate` returns `None` for a structure type it cannot resolve.
    pub fn tick<F>(&mut self, inputs: PreviewInputs, mut validate: F) -> GhostSignal
    where
        F: FnMut(StructureTypeId, CellCoord, Rotation) -> Option<PlacementCheck>,
    {
        let target = match (inputs.placement_active, inputs.selection, inputs.pick) {
            (true, Some(structure), Some(cell)) => Some((structure, cell)),
            _ => None,
        };
        let Some((structure, cell)) = target else {
            self.cancel();
            return GhostSignal::Hidden;
        };
        let Some(check) = validate(structure, cell, self.rotation) else {
            self.cancel();
            return GhostSignal::Hidden;
        };

        let moved = self.frame.as_ref().is_none_or(|f| {
            f.cell != cell || f.rotation != self.rotation || f.structure != structure
        });
        self.state = PreviewState::Previewing { cell, rotation: self.rotation };
        let frame = GhostFrame { structure, cell, rotation: self.rotation, check, moved };
        let signal = frame.signal();
        self.frame = Some(frame);
        signal
    }

    /// Flip 0°/90° and re-validate in place. The anchor cell does not change.
    pub fn toggle_rotation<F>(&mut self, mut validate: F) -> GhostSignal
    where
        F: FnMut(StructureTypeId, CellCoord, Rotation) -> Option<PlacementCheck>,
    {
        self.rotation = self.rotation.toggled();
        let Some((structure, cell)) = self.frame.as_ref().map(|f| (f.structure, f.cell)) else {
            return GhostSignal::Hidden;
        };
        match validate(structure, cell, self.rotation) {
            Some(check) => {
                self.state = PreviewState::Previewing { cell, rotation: self.rotation };
                let frame = GhostFrame { structure, cell, rotation: self.rotation, check, moved: true };
                let signal = frame.signal();
                self.frame = Some(frame);
                signal
            }
            None => {
                self.cancel();
                GhostSignal::Hidden
            }
        }
    }

    /// Back to `Idle`. Nothing else is touched.
    pub fn cancel(&mut self) {
        self.state = PreviewState::Idle;
        self.frame = None;
    }
}
