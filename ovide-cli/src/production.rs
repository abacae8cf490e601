//! Production files: the resource library, placements and asset index of a
//! production, stored as one JSON document.

use anyhow::{Context, Result};
use ovide_types::{
    AssetId, AssetRef, Contextualization, ContextualizationId, Contextualizer, ContextualizerId,
    ProductionAssetsIndex, ProductionId, Resource, ResourceId,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ProductionFile {
    pub id: ProductionId,
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, Resource>,
    #[serde(default)]
    pub contextualizers: BTreeMap<ContextualizerId, Contextualizer>,
    #[serde(default)]
    pub contextualizations: BTreeMap<ContextualizationId, Contextualization>,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, AssetRef>,
}

impl ProductionFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read production file {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse production file {:?}", path))
    }

    pub fn resource(&self, id: &str) -> Result<&Resource> {
        self.resources
            .get(&ResourceId::new(id))
            .with_context(|| format!("Resource '{}' not found in production", id))
    }

    pub fn contextualization(&self, id: &str) -> Result<&Contextualization> {
        self.contextualizations
            .get(&ContextualizationId::new(id))
            .with_context(|| format!("Contextualization '{}' not found in production", id))
    }

    pub fn contextualizer(&self, id: &ContextualizerId) -> Result<&Contextualizer> {
        self.contextualizers
            .get(id)
            .with_context(|| format!("Contextualizer '{}' not found in production", id))
    }

    pub fn assets_index(&self) -> ProductionAssetsIndex {
        self.assets.clone()
    }
}
