//! Mount a block for one contextualization and print what it renders.

use crate::production::ProductionFile;
use crate::ModeArg;
use anyhow::{Context, Result};
use ovide_blocks::{
    BlockConfig, BlockDeps, BlockProps, ContextualizationBlock, FsAssetFetcher, HostCallbacks,
    IdentityTranslator, JsonPreviewRenderer, PreviewRenderer, SelectionStore, SharedSelection,
};
use ovide_types::{
    BoundAsset, ContextualizationId, CustomContext, Production, RenderingMode, Revision, Stamped,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct RenderOptions {
    pub mode: Option<ModeArg>,
    pub selected: Option<String>,
    pub assets_dir: Option<PathBuf>,
    pub json: bool,
}

pub async fn render_block(
    config_path: &Path,
    production_path: &Path,
    contextualization_id: &str,
    opts: RenderOptions,
) -> Result<()> {
    let config = load_config(config_path)?;
    let production = ProductionFile::load(production_path)?;

    let contextualization = production.contextualization(contextualization_id)?.clone();
    let resource = production
        .resource(contextualization.resource_id.as_str())?
        .clone();
    let contextualizer = production
        .contextualizer(&contextualization.contextualizer_id)?
        .clone();

    let assets_dir = opts.assets_dir.unwrap_or_else(|| {
        production_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("assets")
    });

    let rendering_mode = opts.mode.map(|mode| match mode {
        ModeArg::Screen => RenderingMode::Screen,
        ModeArg::Paged => RenderingMode::Paged,
    });

    let selection = Arc::new(SharedSelection::new());
    if let Some(selected) = opts.selected {
        selection.set(Some(ContextualizationId::new(selected)));
    }

    let props = BlockProps::new(
        BoundAsset::new(
            contextualization,
            Stamped::new(Revision::default(), resource),
            Stamped::new(Revision::default(), contextualizer),
        ),
        Stamped::new(
            Revision::default(),
            CustomContext {
                production_id: Some(production.id.clone()),
                production_assets: production.assets_index(),
                rendering_mode,
            },
        ),
    );
    let deps = BlockDeps {
        fetcher: Arc::new(FsAssetFetcher::new(assets_dir)),
        selection,
        host: HostCallbacks::new(),
        translator: Arc::new(IdentityTranslator),
        production: Some(Production {
            id: production.id.clone(),
        }),
    };

    let mut block = ContextualizationBlock::mount(props, deps, config);
    block.settle().await;

    let view = block.render();
    if opts.json {
        let payload = match &view {
            Some(view) => json!({
                "contextualization": block.id(),
                "rendered": true,
                "phase": block.phase(),
                "toolbar": view.toolbar,
                "preview": JsonPreviewRenderer.render(&view.preview),
                "assets": view.preview.assets,
            }),
            None => json!({
                "contextualization": block.id(),
                "rendered": false,
                "phase": block.phase(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let Some(view) = view else {
        println!(
            "Contextualization '{}' renders nothing (resource has no data)",
            block.id()
        );
        return Ok(());
    };

    let preview = &view.preview;
    println!(
        "Contextualization '{}' of {} '{}'",
        block.id(),
        preview.resource.resource_type(),
        preview.resource.id
    );
    println!(
        "  mode: {}{}{}",
        preview.rendering_mode.as_str(),
        if preview.is_ghost_mode { ", ghost" } else { "" },
        if preview.is_active { ", active" } else { "" }
    );
    println!("  toolbar:");
    for button in &view.toolbar.buttons {
        let state = if button.available { "" } else { " (unavailable)" };
        println!("    - {}{}", button.tooltip, state);
    }
    println!("  assets loaded: {}", preview.assets.len());
    for id in preview.assets.keys() {
        println!("    - {}", id);
    }
    for (id, error) in preview.failed_assets {
        println!("    ! {}: {}", id, error);
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<BlockConfig> {
    if !path.exists() {
        tracing::debug!("No config at {:?}, using defaults", path);
        return Ok(BlockConfig::default());
    }
    BlockConfig::from_file(path).with_context(|| format!("Failed to load config {:?}", path))
}
