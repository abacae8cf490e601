//! Related-asset resolution.
//!
//! A resource's data payload may point at other assets of the production
//! (an image's source file, the media behind an embed, the records a table
//! cites). References are recognised by key name:
//!
//! - `assetId` or any key ending in `AssetId` holds a single asset id
//! - `assetIds`/`assetsIds` or any key ending in `AssetIds`/`AssetsIds`
//!   holds an array of asset ids
//!
//! Nested objects and arrays are walked as well.

use ovide_types::{AssetId, AssetRef, ProductionAssetsIndex};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Collect the asset ids referenced from a resource's data payload.
///
/// The result is deduplicated and keeps first-seen order, which is the order
/// assets are later loaded in. Missing or malformed data yields no ids.
pub fn related_asset_ids(data: Option<&Value>) -> Vec<AssetId> {
    let mut collector = Collector::default();
    if let Some(data) = data {
        collector.walk(data);
    }
    collector.order
}

/// Keep the related ids that exist in the production asset index, in order.
pub fn related_assets(ids: &[AssetId], index: &ProductionAssetsIndex) -> Vec<AssetRef> {
    ids.iter()
        .filter_map(|id| {
            let found = index.get(id).cloned();
            if found.is_none() {
                debug!("Related asset '{}' is not in the production index", id);
            }
            found
        })
        .collect()
}

#[derive(Default)]
struct Collector {
    order: Vec<AssetId>,
    seen: HashSet<AssetId>,
}

impl Collector {
    fn walk(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if is_single_ref_key(key) {
                        if let Value::String(id) = child {
                            self.push(id);
                            continue;
                        }
                    } else if is_list_ref_key(key) {
                        if let Value::Array(items) = child {
                            for item in items {
                                if let Value::String(id) = item {
                                    self.push(id);
                                }
                            }
                            continue;
                        }
                    }
                    self.walk(child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            _ => {}
        }
    }

    fn push(&mut self, id: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        let id = AssetId::new(id);
        if self.seen.insert(id.clone()) {
            self.order.push(id);
        }
    }
}

fn is_single_ref_key(key: &str) -> bool {
    key == "assetId" || key.ends_with("AssetId")
}

fn is_list_ref_key(key: &str) -> bool {
    matches!(key, "assetIds" | "assetsIds") || key.ends_with("AssetIds") || key.ends_with("AssetsIds")
}
