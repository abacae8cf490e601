//! Shared "selected contextualization" handling.
//!
//! The selected id is owned by the host editor; blocks only read it to know
//! whether they are active and request a new value when their preview is
//! clicked. Every block receives the same [`SelectionStore`] handle.

use ovide_types::ContextualizationId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Whether the block identified by `own` is the selected one
pub fn is_active(selected: Option<&ContextualizationId>, own: &ContextualizationId) -> bool {
    selected == Some(own)
}

/// Selection after clicking the block identified by `own`.
///
/// Clicking the selected block clears the selection; clicking any other block
/// selects it.
pub fn toggle(
    selected: Option<&ContextualizationId>,
    own: &ContextualizationId,
) -> Option<ContextualizationId> {
    if is_active(selected, own) {
        None
    } else {
        Some(own.clone())
    }
}

/// Handle on the host's selected contextualization id
pub trait SelectionStore: Send + Sync {
    fn get(&self) -> Option<ContextualizationId>;

    fn set(&self, selected: Option<ContextualizationId>);

    /// Receiver notified on every write
    fn subscribe(&self) -> watch::Receiver<Option<ContextualizationId>>;
}

/// In-process selection store backed by a `watch` channel.
///
/// Writes are visible to every reader immediately.
#[derive(Debug, Clone)]
pub struct SharedSelection {
    tx: Arc<watch::Sender<Option<ContextualizationId>>>,
}

impl SharedSelection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_selected(selected: impl Into<ContextualizationId>) -> Self {
        let store = Self::new();
        store.set(Some(selected.into()));
        store
    }
}

impl Default for SharedSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore for SharedSelection {
    fn get(&self) -> Option<ContextualizationId> {
        self.tx.borrow().clone()
    }

    fn set(&self, selected: Option<ContextualizationId>) {
        debug!("Selected contextualization: {:?}", selected);
        self.tx.send_replace(selected);
    }

    fn subscribe(&self) -> watch::Receiver<Option<ContextualizationId>> {
        self.tx.subscribe()
    }
}
