//! Contract with the asset preview renderer.
//!
//! Rendering the asset itself is left to the host; a block only assembles
//! the props the preview needs.

use ovide_types::{
    AssetId, AssetMap, Contextualization, Contextualizer, ProductionId, RenderingMode, Resource,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewProps<'a> {
    pub resource: &'a Resource,
    pub production_id: Option<&'a ProductionId>,
    pub assets: &'a AssetMap,
    /// Assets that could not be loaded, with the reason
    pub failed_assets: &'a BTreeMap<AssetId, String>,
    pub contextualization: &'a Contextualization,
    pub contextualizer: &'a Contextualizer,
    pub is_active: bool,
    pub rendering_mode: RenderingMode,
    pub is_ghost_mode: bool,
    pub show_panel: bool,
}

impl PreviewProps<'_> {
    /// True when some related assets failed to load
    pub fn is_degraded(&self) -> bool {
        !self.failed_assets.is_empty()
    }
}

/// Renders a resource preview from block props
pub trait PreviewRenderer {
    type Output;

    fn render(&self, props: &PreviewProps<'_>) -> Self::Output;
}

/// Summarises preview props as JSON, for tooling and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPreviewRenderer;

impl PreviewRenderer for JsonPreviewRenderer {
    type Output = Value;

    fn render(&self, props: &PreviewProps<'_>) -> Value {
        json!({
            "resource": props.resource.id,
            "type": props.resource.resource_type(),
            "productionId": props.production_id,
            "contextualization": props.contextualization.id,
            "contextualizer": props.contextualizer.id,
            "assets": props.assets.keys().collect::<Vec<_>>(),
            "failedAssets": props.failed_assets.keys().collect::<Vec<_>>(),
            "isActive": props.is_active,
            "renderingMode": props.rendering_mode,
            "isGhostMode": props.is_ghost_mode,
            "isDegraded": props.is_degraded(),
        })
    }
}
