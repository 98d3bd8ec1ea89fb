// src/actions.rs
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// Number of structure slots reachable from the digit row.
pub const SELECT_SLOTS: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    StartPlacement,
    ToggleEdit,
    Rotate,
    /// Left click: commit the ghost, or activate the plot under the pointer.
    Confirm,
    Cancel,
    /// Zero-based catalog index.
    SelectSlot(u8),
}

/// Held state for continuous actions, edge state for discrete ones.
#[derive(Default, Resource)]
pub struct ActionState {
    pressed: HashMap<PlayerAction, bool>,
    just_pressed: HashSet<PlayerAction>,
}

impl ActionState {
    pub fn set(&mut self, action: PlayerAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: PlayerAction) -> bool {
        *self.pressed.get(&action).unwrap_or(&false)
    }

    /// Record a discrete press for this frame.
    pub fn trigger(&mut self, action: PlayerAction) {
        self.just_pressed.insert(action);
    }

    pub fn just_pressed(&self, action: PlayerAction) -> bool {
        self.just_pressed.contains(&action)
    }

    pub fn any_just_pressed(&self) -> bool {
        !self.just_pressed.is_empty()
    }

    /// First digit slot pressed this frame.
    pub fn selected_slot(&self) -> Option<u8> {
        (0..SELECT_SLOTS).find(|&i| self.just_pressed(PlayerAction::SelectSlot(i)))
    }

    /// Called once per frame before new presses are recorded.
    pub fn clear_just_pressed(&mut self) {
        self.just_pressed.clear();
    }
}
