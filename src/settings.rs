// src/settings.rs
//! Tunables for world generation and decoration, read from an optional RON file.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::plots::decoration::DecorationParams;
use crate::plots::world::WorldLayout;

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotsSettings {
    pub world_seed: u64,
    /// Asset path of the `.structures.ron` catalog.
    pub catalog_path: String,
    pub layout: WorldLayout,
    pub decoration: DecorationParams,
}

impl Default for PlotsSettings {
    fn default() -> Self {
        Self {
            world_seed: 1337,
            catalog_path: "structures/default.structures.ron".to_string(),
            layout: WorldLayout::default(),
            decoration: DecorationParams::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("I/O while reading settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
}

impl PlotsSettings {
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        ron::from_str(text).map_err(|e| SettingsError::Ron(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Never fails: unreadable or malformed files fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(path) {
            Ok(s) => {
                info!("Settings: loaded '{}' (world_seed={})", path.display(), s.world_seed);
                s
            }
            Err(e) => {
                warn!("Settings: '{}' not used ({}), falling back to defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
