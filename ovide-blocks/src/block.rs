//! Contextualization block controller.
//!
//! A block is mounted for one placement of a resource. It resolves the
//! resource's related assets, loads them one by one on a background task and
//! merges each arrival into its asset map, while exposing the toolbar and
//! preview props the host renders. Whenever the resource, the custom context
//! or the contextualizer is republished under a new revision, the block
//! starts over with an empty asset map; events still arriving from the
//! previous chain are dropped by generation.

use crate::config::BlockConfig;
use crate::fetch::AssetFetcher;
use crate::host::{ActionOutcome, HostCallbacks, HostCapability};
use crate::i18n::{NamespacedTranslator, Translator};
use crate::loader::{AssetLoader, Generation, LoadEvent, LoadTask};
use crate::preview::PreviewProps;
use crate::resolver::{related_asset_ids, related_assets};
use crate::selection::{is_active, toggle, SelectionStore};
use crate::state::{Applied, BindingStamp, ContextualizationState, Phase};
use crate::toolbar::{ToolbarAction, ToolbarView};
use ovide_types::{
    AssetId, AssetMap, BoundAsset, ContextualizationId, CustomContext, Production, RenderingMode,
    Stamped,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inputs a block is mounted and updated with
#[derive(Debug, Clone)]
pub struct BlockProps {
    pub asset: BoundAsset,
    pub custom_context: Stamped<CustomContext>,
}

impl BlockProps {
    pub fn new(asset: BoundAsset, custom_context: Stamped<CustomContext>) -> Self {
        Self {
            asset,
            custom_context,
        }
    }

    fn stamp(&self) -> BindingStamp {
        BindingStamp::of(&self.asset, &self.custom_context)
    }
}

/// Collaborators injected by the host editor
#[derive(Clone)]
pub struct BlockDeps {
    pub fetcher: Arc<dyn AssetFetcher>,
    pub selection: Arc<dyn SelectionStore>,
    pub host: HostCallbacks,
    pub translator: Arc<dyn Translator>,
    pub production: Option<Production>,
}

/// Everything the host needs to draw a block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView<'a> {
    pub toolbar: ToolbarView,
    pub preview: PreviewProps<'a>,
}

pub struct ContextualizationBlock {
    props: BlockProps,
    deps: BlockDeps,
    config: BlockConfig,
    loader: AssetLoader,
    state: ContextualizationState,
    task: Option<LoadTask>,
    events_tx: mpsc::UnboundedSender<LoadEvent>,
    events_rx: mpsc::UnboundedReceiver<LoadEvent>,
}

impl ContextualizationBlock {
    /// Mount a block and start loading its related assets.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(props: BlockProps, deps: BlockDeps, config: BlockConfig) -> Self {
        let loader = AssetLoader::new(deps.fetcher.clone(), config.failure_policy);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut block = Self {
            props,
            deps,
            config,
            loader,
            state: ContextualizationState::new(),
            task: None,
            events_tx,
            events_rx,
        };
        debug!("Mounting block for contextualization '{}'", block.id());
        block.refresh();
        block
    }

    /// Replace the block's inputs, rebinding if any stamped input changed.
    ///
    /// Returns true when a new resolution cycle was started.
    pub fn update(&mut self, props: BlockProps) -> bool {
        let rebind = self.state.needs_rebind(props.stamp());
        self.props = props;
        if rebind {
            self.refresh();
        }
        rebind
    }

    fn refresh(&mut self) {
        if let Some(task) = self.task.take() {
            if self.config.cancel_stale_loads {
                task.cancel();
            } else {
                task.detach();
            }
        }

        let generation = self.state.begin(self.props.stamp());
        let resource = &self.props.asset.resource;
        let context = &self.props.custom_context;

        let ids = related_asset_ids(resource.data.as_ref());
        let assets = related_assets(&ids, &context.production_assets);

        let production_id = context
            .production_id
            .clone()
            .or_else(|| self.deps.production.as_ref().map(|p| p.id.clone()));

        let production_id = match production_id {
            Some(id) => id,
            None if assets.is_empty() => {
                self.state.resolved(Vec::new());
                return;
            }
            None => {
                warn!(
                    "No production id for contextualization '{}', skipping {} related assets",
                    self.props.asset.id,
                    assets.len()
                );
                self.state.resolved(Vec::new());
                return;
            }
        };

        self.state.resolved(assets.iter().map(|a| a.id.clone()));
        if assets.is_empty() {
            debug!("Resource '{}' has no loadable related assets", resource.id);
            return;
        }

        info!(
            "Loading {} related assets for resource '{}' (generation {})",
            assets.len(),
            resource.id,
            generation.0
        );
        self.task = Some(
            self.loader
                .spawn(generation, production_id, assets, self.events_tx.clone()),
        );
    }

    /// Wait for the next load event and apply it.
    ///
    /// Returns `None` once the current generation has settled.
    pub async fn next_update(&mut self) -> Option<Applied> {
        loop {
            if self.state.phase().is_settled() {
                return None;
            }
            if let Ok(event) = self.events_rx.try_recv() {
                return Some(self.apply(event));
            }
            let Some(task) = self.task.as_mut() else {
                warn!("Load chain for block '{}' ended early", self.id());
                return Some(self.state.interrupt());
            };

            let events = &mut self.events_rx;
            let event = tokio::select! {
                event = events.recv() => event,
                _ = task.join() => None,
            };
            match event {
                Some(event) => return Some(self.apply(event)),
                // the chain is gone; anything it sent is already queued
                None => self.task = None,
            }
        }
    }

    /// Apply every event already queued, without waiting
    pub fn apply_pending(&mut self) -> Vec<Applied> {
        let mut applied = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            applied.push(self.apply(event));
        }
        applied
    }

    /// Apply events until the current generation has settled
    pub async fn settle(&mut self) -> &Phase {
        while self.next_update().await.is_some() {}
        self.state.phase()
    }

    fn apply(&mut self, event: LoadEvent) -> Applied {
        let applied = self.state.apply(event);
        match &applied {
            Applied::Merged(id) => debug!("Merged asset '{}' into block '{}'", id, self.id()),
            Applied::Failed(id) => warn!("Asset '{}' unavailable for block '{}'", id, self.id()),
            Applied::Finished => debug!("Block '{}' settled: {:?}", self.id(), self.state.phase()),
            Applied::Stale => {}
        }
        applied
    }

    /// Render description, or `None` while the resource has no data
    pub fn render(&self) -> Option<BlockView<'_>> {
        let asset = &self.props.asset;
        let resource = &asset.resource.value;
        if !resource.has_data() {
            return None;
        }

        let active = self.is_active();
        let mode = self.rendering_mode();
        let translate = NamespacedTranslator::new(
            self.deps.translator.as_ref(),
            &self.config.translation_namespace,
        );

        Some(BlockView {
            toolbar: ToolbarView::build(resource, active, &self.deps.host, &translate),
            preview: PreviewProps {
                resource,
                production_id: self.deps.production.as_ref().map(|p| &p.id),
                assets: self.state.assets(),
                failed_assets: self.state.failures(),
                contextualization: &asset.contextualization,
                contextualizer: &asset.contextualizer.value,
                is_active: active,
                rendering_mode: mode,
                is_ghost_mode: asset.contextualization.visibility.is_ghost_in(mode),
                show_panel: true,
            },
        })
    }

    /// Toggle the shared selection from a preview click; returns the new selection
    pub fn click_preview(&self) -> Option<ContextualizationId> {
        let next = toggle(self.deps.selection.get().as_ref(), self.id());
        self.deps.selection.set(next.clone());
        next
    }

    pub fn request_delete(&self) -> ActionOutcome {
        self.deps.host.delete_contextualization(self.id())
    }

    pub fn request_edit_parameters(&self) -> ActionOutcome {
        self.deps.host.set_edited_contextualization(self.id())
    }

    /// Clear the selection, then open the resource's configuration
    pub fn request_edit_resource(&self) -> ActionOutcome {
        if !self.deps.host.has(HostCapability::ConfigureResource) {
            return ActionOutcome::Unavailable;
        }
        self.deps.selection.set(None);
        let resource_id = &self.props.asset.resource.id;
        self.deps
            .host
            .start_existing_resource_configuration(resource_id)
    }

    pub fn dispatch(&self, action: ToolbarAction) -> ActionOutcome {
        match action {
            ToolbarAction::Delete => self.request_delete(),
            ToolbarAction::EditParameters => self.request_edit_parameters(),
            ToolbarAction::EditResource => self.request_edit_resource(),
        }
    }

    pub fn id(&self) -> &ContextualizationId {
        &self.props.asset.id
    }

    pub fn props(&self) -> &BlockProps {
        &self.props
    }

    pub fn is_active(&self) -> bool {
        is_active(self.deps.selection.get().as_ref(), self.id())
    }

    pub fn rendering_mode(&self) -> RenderingMode {
        self.props
            .custom_context
            .rendering_mode
            .unwrap_or(self.config.default_rendering_mode)
    }

    pub fn assets(&self) -> &AssetMap {
        self.state.assets()
    }

    pub fn failures(&self) -> &BTreeMap<AssetId, String> {
        self.state.failures()
    }

    pub fn phase(&self) -> &Phase {
        self.state.phase()
    }

    pub fn generation(&self) -> Generation {
        self.state.generation()
    }
}
