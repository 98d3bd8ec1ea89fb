// src/plots/catalog.rs
//! Data-driven structure types + loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::core::{Footprint, StructureTypeId};

// ---------- Public plugin to register asset+loader ----------

pub struct StructureCatalogAssetPlugin;

impl Plugin for StructureCatalogAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<StructureCatalog>()
            .register_asset_loader(StructureCatalogLoader);
    }
}

// ---------- Structure type (data form) ----------

/// Largest accepted side, in cells, for any footprint axis.
pub const MAX_FOOTPRINT_SIDE: u32 = 64;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructureTypeDef {
    /// Unique human-readable name (used for lookup).
    pub name: String,

    #[serde(default = "default_dim")]
    pub length: u32,
    #[serde(default = "default_dim")]
    pub width: u32,
    #[serde(default = "default_dim")]
    pub height: u32,

    /// Optional scene asset (e.g. `models/hut.glb#Scene0`) drawn instead of
    /// the tinted box, floor-anchored. Opaque to placement.
    #[serde(default)]
    pub scene: Option<String>,

    /// Flat tint used when no scene is given (linear RGB 0..1).
    #[serde(default)]
    pub color: Option<[f32; 3]>,
}

fn default_dim() -> u32 {
    1
}

impl StructureTypeDef {
    pub fn new(name: impl Into<String>, length: u32, width: u32, height: u32) -> Self {
        Self { name: name.into(), length, width, height, scene: None, color: None }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.length, self.width, self.height)
    }
}

// ---------- Runtime catalog asset ----------

#[derive(Asset, TypePath, Clone, Debug)]
pub struct StructureCatalog {
    /// Ordered list; index in this vector is the `StructureTypeId.0`.
    pub types: Vec<StructureTypeDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl StructureCatalog {
    /// Validate and index a list of definitions.
    pub fn from_defs(defs: Vec<StructureTypeDef>) -> Result<Self, CatalogLoadError> {
        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if def.length == 0 || def.width == 0 || def.height == 0 {
                return Err(CatalogLoadError::ZeroFootprint { name: def.name.clone() });
            }
            if def.length.max(def.width).max(def.height) > MAX_FOOTPRINT_SIDE {
                return Err(CatalogLoadError::OversizedFootprint {
                    name: def.name.clone(),
                    max: MAX_FOOTPRINT_SIDE,
                });
            }
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(CatalogLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }
        Ok(Self { types: defs, name_to_index })
    }

    pub fn from_ron_bytes(bytes: &[u8]) -> Result<Self, CatalogLoadError> {
        let defs: Vec<StructureTypeDef> =
            ron::de::from_bytes(bytes).map_err(|e| CatalogLoadError::Ron(e.to_string()))?;
        Self::from_defs(defs)
    }

    pub fn index_of(&self, name: &str) -> Option<StructureTypeId> {
        self.name_to_index.get(name).map(|&i| StructureTypeId(i))
    }

    pub fn get(&self, id: StructureTypeId) -> Option<&StructureTypeDef> {
        self.types.get(id.0 as usize)
    }

    pub fn len(&self) -> usize { self.types.len() }
    pub fn is_empty(&self) -> bool { self.types.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (StructureTypeId, &StructureTypeDef)> {
        self.types.iter().enumerate().map(|(i, d)| (StructureTypeId(i as u32), d))
    }
}

// ---------- Asset loader for `.structures.ron` ----------

#[derive(Default)]
pub struct StructureCatalogLoader;

impl AssetLoader for StructureCatalogLoader {
    type Asset = StructureCatalog;
    type Settings = ();
    type Error = CatalogLoadError;

    fn extensions(&self) -> &[&str] {
        &["structures.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        StructureCatalog::from_ron_bytes(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum CatalogLoadError {
    #[error("I/O while reading structure catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate structure name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("Structure '{name}' has a zero-sized footprint")]
    ZeroFootprint { name: String },
    #[error("Structure '{name}' exceeds {max} cells on some axis")]
    OversizedFootprint { name: String, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        (name: "Drill", length: 2, width: 2, height: 2, color: Some((0.8, 0.5, 0.2))),
        (name: "Pylon", height: 3),
        (name: "Warehouse", length: 3, width: 2, scene: Some("models/warehouse.glb#Scene0")),
    ]"#;

    #[test]
    fn parses_ron_with_defaults() {
        let cat = StructureCatalog::from_ron_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cat.len(), 3);
        let pylon = cat.get(cat.index_of("Pylon").unwrap()).unwrap();
        assert_eq!(pylon.footprint(), Footprint::new(1, 1, 3));
        assert_eq!(cat.index_of("Warehouse"), Some(StructureTypeId(2)));
        assert!(cat.get(StructureTypeId(9)).is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let defs = vec![StructureTypeDef::new("A", 1, 1, 1), StructureTypeDef::new("A", 2, 2, 1)];
        assert!(matches!(
            StructureCatalog::from_defs(defs),
            Err(CatalogLoadError::DuplicateName { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn zero_footprint_is_rejected() {
        let defs = vec![StructureTypeDef::new("Flat", 2, 0, 1)];
        assert!(matches!(StructureCatalog::from_defs(defs), Err(CatalogLoadError::ZeroFootprint { .. })));
    }

    #[test]
    fn oversized_footprint_is_rejected() {
        for def in [
            StructureTypeDef::new("Sprawl", u32::MAX, 1, 1),
            StructureTypeDef::new("Tower", 1, 1, MAX_FOOTPRINT_SIDE + 1),
        ] {
            assert!(matches!(
                StructureCatalog::from_defs(vec![def]),
                Err(CatalogLoadError::OversizedFootprint { max: MAX_FOOTPRINT_SIDE, .. })
            ));
        }
        let edge = StructureTypeDef::new("Edge", MAX_FOOTPRINT_SIDE, 1, 1);
        assert!(StructureCatalog::from_defs(vec![edge]).is_ok());
    }

    #[test]
    fn shipped_catalog_is_valid() {
        let cat = StructureCatalog::from_ron_bytes(include_bytes!("../../assets/structures/default.structures.ron")).unwrap();
        assert!(!cat.is_empty());
        assert!(cat.len() <= 9, "digit keys only reach nine slots");
    }

    #[test]
    fn bad_ron_reports_parse_error() {
        assert!(matches!(StructureCatalog::from_ron_bytes(b"[(name: 3)]"), Err(CatalogLoadError::Ron(_))));
    }
}
