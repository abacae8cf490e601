//! Per-binding asset state of a contextualization block.

use crate::loader::{Generation, LoadEvent, LoadOutcome, LoadProgress};
use ovide_types::{AssetId, AssetMap, BoundAsset, CustomContext, Revision, Stamped};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Revisions of the inputs a resolution cycle depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindingStamp {
    pub resource: Revision,
    pub custom_context: Revision,
    pub contextualizer: Revision,
}

impl BindingStamp {
    pub fn of(asset: &BoundAsset, custom_context: &Stamped<CustomContext>) -> Self {
        Self {
            resource: asset.resource.revision,
            custom_context: custom_context.revision,
            contextualizer: asset.contextualizer.revision,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Resolving,
    Loading,
    Accumulating,
    Settled { outcome: LoadOutcome },
}

impl Phase {
    pub fn is_settled(&self) -> bool {
        matches!(self, Phase::Settled { .. })
    }
}

/// What applying a load event did to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Merged(AssetId),
    Failed(AssetId),
    Finished,
    /// The event belongs to another generation or asset set and was dropped
    Stale,
}

/// Asset map of the current binding and the lifecycle around it
#[derive(Debug, Default)]
pub struct ContextualizationState {
    generation: Generation,
    stamp: Option<BindingStamp>,
    phase: Phase,
    related: HashSet<AssetId>,
    assets: AssetMap,
    failures: BTreeMap<AssetId, String>,
}

impl ContextualizationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    /// Assets whose fetch failed in the current generation, with the error text
    pub fn failures(&self) -> &BTreeMap<AssetId, String> {
        &self.failures
    }

    /// Whether `stamp` describes a different binding than the current one
    pub fn needs_rebind(&self, stamp: BindingStamp) -> bool {
        self.stamp != Some(stamp)
    }

    /// Start a new resolution cycle, discarding everything from the previous one.
    pub fn begin(&mut self, stamp: BindingStamp) -> Generation {
        self.generation = self.generation.next();
        self.stamp = Some(stamp);
        self.phase = Phase::Resolving;
        self.related.clear();
        self.assets.clear();
        self.failures.clear();
        debug!("Binding generation {} started", self.generation.0);
        self.generation
    }

    /// Record the related assets that will be loaded for this cycle.
    ///
    /// An empty list settles the cycle immediately.
    pub fn resolved(&mut self, ids: impl IntoIterator<Item = AssetId>) {
        self.related = ids.into_iter().collect();
        self.phase = if self.related.is_empty() {
            Phase::Settled {
                outcome: LoadOutcome::Exhausted,
            }
        } else {
            Phase::Loading
        };
    }

    /// Settle a cycle whose chain ended without a `Finished` event
    pub fn interrupt(&mut self) -> Applied {
        if self.phase.is_settled() {
            return Applied::Stale;
        }
        debug!("Generation {} interrupted", self.generation.0);
        self.phase = Phase::Settled {
            outcome: LoadOutcome::Interrupted,
        };
        Applied::Finished
    }

    pub fn apply(&mut self, event: LoadEvent) -> Applied {
        if event.generation != self.generation {
            debug!(
                "Dropping event from generation {} (current {})",
                event.generation.0, self.generation.0
            );
            return Applied::Stale;
        }
        if self.phase.is_settled() {
            return Applied::Stale;
        }

        match event.progress {
            LoadProgress::Loaded(asset) => {
                let id = asset.id().clone();
                if !self.related.contains(&id) || self.assets.contains_key(&id) {
                    return Applied::Stale;
                }
                self.assets.insert(id.clone(), asset);
                self.phase = Phase::Accumulating;
                Applied::Merged(id)
            }
            LoadProgress::Failed {
                asset_id, error, ..
            } => {
                if !self.related.contains(&asset_id) {
                    return Applied::Stale;
                }
                self.failures.insert(asset_id.clone(), error);
                Applied::Failed(asset_id)
            }
            LoadProgress::Finished(outcome) => {
                self.phase = Phase::Settled { outcome };
                Applied::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovide_types::{AssetRef, LoadedAsset};
    use serde_json::json;

    fn stamp(resource: u64) -> BindingStamp {
        BindingStamp {
            resource: Revision::new(resource),
            custom_context: Revision::new(0),
            contextualizer: Revision::new(0),
        }
    }

    fn loaded(generation: Generation, id: &str) -> LoadEvent {
        LoadEvent {
            generation,
            progress: LoadProgress::Loaded(LoadedAsset::new(AssetRef::new(id), json!(id))),
        }
    }

    #[test]
    fn test_initial_state_is_idle_and_empty() {
        let state = ContextualizationState::new();
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.assets().is_empty());
        assert!(state.needs_rebind(stamp(0)));
    }

    #[test]
    fn test_empty_resolution_settles() {
        let mut state = ContextualizationState::new();
        state.begin(stamp(1));
        state.resolved(Vec::new());
        assert!(state.phase().is_settled());
    }

    #[test]
    fn test_merge_then_finish() {
        let mut state = ContextualizationState::new();
        let generation = state.begin(stamp(1));
        state.resolved(vec![AssetId::new("x")]);
        assert_eq!(state.phase(), &Phase::Loading);

        assert_eq!(
            state.apply(loaded(generation, "x")),
            Applied::Merged(AssetId::new("x"))
        );
        assert_eq!(state.phase(), &Phase::Accumulating);

        let finished = LoadEvent {
            generation,
            progress: LoadProgress::Finished(LoadOutcome::Exhausted),
        };
        assert_eq!(state.apply(finished), Applied::Finished);
        assert!(state.phase().is_settled());
        assert_eq!(state.assets().len(), 1);
    }

    #[test]
    fn test_stale_generation_dropped() {
        let mut state = ContextualizationState::new();
        let old = state.begin(stamp(1));
        state.resolved(vec![AssetId::new("x")]);
        state.apply(loaded(old, "x"));

        let current = state.begin(stamp(2));
        assert!(state.assets().is_empty());
        state.resolved(vec![AssetId::new("x")]);

        assert_eq!(state.apply(loaded(old, "x")), Applied::Stale);
        assert!(state.assets().is_empty());
        assert_eq!(
            state.apply(loaded(current, "x")),
            Applied::Merged(AssetId::new("x"))
        );
    }

    #[test]
    fn test_unrelated_asset_rejected() {
        let mut state = ContextualizationState::new();
        let generation = state.begin(stamp(1));
        state.resolved(vec![AssetId::new("x")]);
        assert_eq!(state.apply(loaded(generation, "other")), Applied::Stale);
        assert!(state.assets().is_empty());
    }

    #[test]
    fn test_failures_recorded() {
        let mut state = ContextualizationState::new();
        let generation = state.begin(stamp(1));
        state.resolved(vec![AssetId::new("x")]);
        let failed = LoadEvent {
            generation,
            progress: LoadProgress::Failed {
                asset_id: AssetId::new("x"),
                error: "boom".to_string(),
                attempts: 1,
            },
        };
        assert_eq!(state.apply(failed), Applied::Failed(AssetId::new("x")));
        assert_eq!(state.failures().get(&AssetId::new("x")).map(String::as_str), Some("boom"));
        assert!(state.assets().is_empty());
    }

    #[test]
    fn test_needs_rebind_on_any_revision_change() {
        let mut state = ContextualizationState::new();
        let base = stamp(1);
        state.begin(base);
        assert!(!state.needs_rebind(base));
        assert!(state.needs_rebind(BindingStamp {
            contextualizer: Revision::new(1),
            ..base
        }));
        assert!(state.needs_rebind(BindingStamp {
            custom_context: Revision::new(5),
            ..base
        }));
    }

    #[test]
    fn test_interrupt_settles_once() {
        let mut state = ContextualizationState::new();
        let generation = state.begin(stamp(1));
        state.resolved(vec![AssetId::new("x")]);

        assert_eq!(state.interrupt(), Applied::Finished);
        assert_eq!(
            state.phase(),
            &Phase::Settled {
                outcome: LoadOutcome::Interrupted
            }
        );
        assert_eq!(state.interrupt(), Applied::Stale);
        assert_eq!(state.apply(loaded(generation, "x")), Applied::Stale);
    }
}
