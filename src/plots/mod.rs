// src/plots/mod.rs
pub mod core;
pub mod coords;
pub mod error;
pub mod grid;
pub mod occupancy;
pub mod bounds;
pub mod validator;
pub mod decoration;
pub mod preview;
pub mod coordinator;
pub mod world;
pub mod catalog;
pub mod plugin;
pub mod render;

// re-export what hosts actually need
pub use coordinator::{InteractionMode, Plot, PlotCoordinator, PlotEvent};
pub use error::PlotError;
pub use plugin::{PlotEventMsg, PlotsPlugin, PlotsSet, PointerGround};
