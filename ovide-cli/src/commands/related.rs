//! List the related assets of a resource.

use crate::production::ProductionFile;
use anyhow::Result;
use ovide_blocks::{related_asset_ids, related_assets};
use serde_json::json;
use std::path::Path;

pub fn list_related(production_path: &Path, resource_id: &str, json: bool) -> Result<()> {
    let production = ProductionFile::load(production_path)?;
    let resource = production.resource(resource_id)?;
    let index = production.assets_index();

    let ids = related_asset_ids(resource.data.as_ref());
    let loadable = related_assets(&ids, &index);

    if json {
        let payload: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "indexed": index.contains_key(id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if ids.is_empty() {
        println!("Resource '{}' references no assets", resource_id);
        return Ok(());
    }

    println!(
        "Resource '{}' references {} assets ({} in the production index):",
        resource_id,
        ids.len(),
        loadable.len()
    );
    for id in &ids {
        let marker = if index.contains_key(id) { "" } else { " (missing)" };
        println!("  - {}{}", id, marker);
    }

    Ok(())
}
