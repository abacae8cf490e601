//! # ovide-blocks
//!
//! Contextualization blocks for the ovide section editor.
//!
//! A contextualization block is the editable placeholder shown in a section
//! wherever a library resource (image, video, table, embed...) is placed.
//! This crate holds everything such a block does apart from drawing:
//!
//! - **Resolution**: find the auxiliary assets a resource's data points at
//! - **Loading**: fetch those assets one at a time, merging each as it arrives
//! - **Lifecycle**: restart from an empty asset map whenever the binding changes,
//!   ignoring late results from earlier bindings
//! - **Selection**: derive the active flag from the host's shared selection and
//!   toggle it on preview clicks
//! - **Toolbar**: delete, edit-parameters and edit-resource intents routed to
//!   host callbacks
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ovide_blocks::{
//!     BlockConfig, BlockDeps, BlockProps, ContextualizationBlock, HostCallbacks,
//!     IdentityTranslator, MemoryAssetFetcher, SharedSelection,
//! };
//! # async fn demo(props: BlockProps) {
//! let deps = BlockDeps {
//!     fetcher: Arc::new(MemoryAssetFetcher::new()),
//!     selection: Arc::new(SharedSelection::new()),
//!     host: HostCallbacks::new(),
//!     translator: Arc::new(IdentityTranslator),
//!     production: None,
//! };
//! let mut block = ContextualizationBlock::mount(props, deps, BlockConfig::default());
//! block.settle().await;
//! if let Some(view) = block.render() {
//!     println!("{} assets loaded", view.preview.assets.len());
//! }
//! # }
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod i18n;
pub mod loader;
pub mod preview;
pub mod resolver;
pub mod selection;
pub mod state;
pub mod toolbar;

pub use block::{BlockDeps, BlockProps, BlockView, ContextualizationBlock};
pub use config::{BlockConfig, FailurePolicy};
pub use error::{ConfigError, FetchError, FetchResult};
pub use fetch::{AssetFetcher, FsAssetFetcher, MemoryAssetFetcher};
pub use host::{ActionOutcome, HostCallbacks, HostCapability};
pub use i18n::{IdentityTranslator, NamespacedTranslator, TableTranslator, Translator};
pub use loader::{load_sequential, AssetLoader, Generation, LoadEvent, LoadOutcome, LoadProgress};
pub use preview::{JsonPreviewRenderer, PreviewProps, PreviewRenderer};
pub use resolver::{related_asset_ids, related_assets};
pub use selection::{SelectionStore, SharedSelection};
pub use state::{Applied, BindingStamp, ContextualizationState, Phase};
pub use toolbar::{ButtonTone, ToolbarAction, ToolbarButton, ToolbarView};
