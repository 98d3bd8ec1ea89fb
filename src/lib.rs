// src/lib.rs
//! Plot grids with validated multi-cell structure placement, ghost previews
//! and seeded ground decoration.

pub mod actions;
pub mod plots;
pub mod settings;
