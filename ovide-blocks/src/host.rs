//! Host editor capabilities.
//!
//! The host decides which intents a block may emit by providing the matching
//! callback. A block never mutates the document itself.

use ovide_types::{ContextualizationId, ResourceId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Host callback receiving the id an intent targets
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostCapability {
    /// Open the configuration of an existing resource
    ConfigureResource,
    /// Remove a contextualization from the document
    DeleteContextualization,
    /// Enter edit mode for a contextualization's parameters
    EditContextualization,
}

/// Whether an intent reached the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Invoked,
    /// The host did not provide the capability; nothing happened
    Unavailable,
}

impl ActionOutcome {
    pub fn is_invoked(&self) -> bool {
        matches!(self, ActionOutcome::Invoked)
    }
}

/// Optional callbacks provided by the host editor
#[derive(Clone, Default)]
pub struct HostCallbacks {
    start_existing_resource_configuration: Option<Callback<ResourceId>>,
    delete_contextualization: Option<Callback<ContextualizationId>>,
    set_edited_contextualization: Option<Callback<ContextualizationId>>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_configuration(
        mut self,
        callback: impl Fn(&ResourceId) + Send + Sync + 'static,
    ) -> Self {
        self.start_existing_resource_configuration = Some(Arc::new(callback));
        self
    }

    pub fn with_delete_contextualization(
        mut self,
        callback: impl Fn(&ContextualizationId) + Send + Sync + 'static,
    ) -> Self {
        self.delete_contextualization = Some(Arc::new(callback));
        self
    }

    pub fn with_edit_contextualization(
        mut self,
        callback: impl Fn(&ContextualizationId) + Send + Sync + 'static,
    ) -> Self {
        self.set_edited_contextualization = Some(Arc::new(callback));
        self
    }

    pub fn has(&self, capability: HostCapability) -> bool {
        match capability {
            HostCapability::ConfigureResource => {
                self.start_existing_resource_configuration.is_some()
            }
            HostCapability::DeleteContextualization => self.delete_contextualization.is_some(),
            HostCapability::EditContextualization => self.set_edited_contextualization.is_some(),
        }
    }

    pub fn start_existing_resource_configuration(&self, resource_id: &ResourceId) -> ActionOutcome {
        invoke(
            self.start_existing_resource_configuration.as_ref(),
            resource_id,
            HostCapability::ConfigureResource,
        )
    }

    pub fn delete_contextualization(&self, id: &ContextualizationId) -> ActionOutcome {
        invoke(
            self.delete_contextualization.as_ref(),
            id,
            HostCapability::DeleteContextualization,
        )
    }

    pub fn set_edited_contextualization(&self, id: &ContextualizationId) -> ActionOutcome {
        invoke(
            self.set_edited_contextualization.as_ref(),
            id,
            HostCapability::EditContextualization,
        )
    }
}

fn invoke<T: fmt::Display>(
    callback: Option<&Callback<T>>,
    target: &T,
    capability: HostCapability,
) -> ActionOutcome {
    match callback {
        Some(callback) => {
            callback(target);
            ActionOutcome::Invoked
        }
        None => {
            debug!("Host has no {:?} capability, ignoring intent for {}", capability, target);
            ActionOutcome::Unavailable
        }
    }
}

impl fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallbacks")
            .field(
                "configure_resource",
                &self.has(HostCapability::ConfigureResource),
            )
            .field(
                "delete_contextualization",
                &self.has(HostCapability::DeleteContextualization),
            )
            .field(
                "edit_contextualization",
                &self.has(HostCapability::EditContextualization),
            )
            .finish()
    }
}
