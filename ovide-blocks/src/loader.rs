//! Sequential asset loading.
//!
//! Assets are fetched one at a time in list order: the request for asset
//! `i + 1` is only issued once asset `i` has resolved. Each completion is
//! surfaced as its own progress item so callers can merge results
//! incrementally.

use crate::config::FailurePolicy;
use crate::fetch::AssetFetcher;
use futures::{FutureExt, Stream, StreamExt};
use ovide_types::{AssetId, AssetRef, LoadedAsset, ProductionId};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Identifies one resolution cycle of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// How a load chain ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum LoadOutcome {
    /// Every asset was processed
    Exhausted,
    /// The chain stopped at a failed asset; later assets were never requested
    Halted { at: AssetId },
    /// The chain stopped without reporting how it ended
    Interrupted,
}

/// One step of a load chain
#[derive(Debug, Clone, PartialEq)]
pub enum LoadProgress {
    Loaded(LoadedAsset),
    Failed {
        asset_id: AssetId,
        error: String,
        attempts: u32,
    },
    Finished(LoadOutcome),
}

/// A progress item tagged with the generation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub generation: Generation,
    pub progress: LoadProgress,
}

/// Load `assets` one after the other.
///
/// The stream always ends with a single [`LoadProgress::Finished`]. Ids that
/// appear more than once in `assets` are only requested the first time.
pub fn load_sequential(
    fetcher: Arc<dyn AssetFetcher>,
    production_id: ProductionId,
    assets: Vec<AssetRef>,
    policy: FailurePolicy,
) -> impl Stream<Item = LoadProgress> + Send {
    async_stream::stream! {
        let mut requested: HashSet<AssetId> = HashSet::new();
        let mut halted_at = None;

        'assets: for asset in assets {
            if !requested.insert(asset.id.clone()) {
                continue;
            }

            let max_attempts = policy.max_attempts().max(1);
            let mut attempt = 1;
            loop {
                let delay = policy.backoff(attempt);
                if !delay.is_zero() {
                    debug!("Retrying asset '{}' in {:?}", asset.id, delay);
                    tokio::time::sleep(delay).await;
                }

                debug!("Fetching asset '{}' (attempt {})", asset.id, attempt);
                match fetcher.fetch_asset_data(&production_id, &asset).await {
                    Ok(data) => {
                        yield LoadProgress::Loaded(LoadedAsset::new(asset.clone(), data));
                        continue 'assets;
                    }
                    Err(e) if attempt < max_attempts => {
                        debug!("Fetch of asset '{}' failed: {}", asset.id, e);
                        attempt += 1;
                    }
                    Err(e) => {
                        warn!("Failed to load asset '{}': {}", asset.id, e);
                        yield LoadProgress::Failed {
                            asset_id: asset.id.clone(),
                            error: e.to_string(),
                            attempts: attempt,
                        };
                        if policy.continues_after_failure() {
                            continue 'assets;
                        }
                        halted_at = Some(asset.id.clone());
                        break 'assets;
                    }
                }
            }
        }

        let outcome = match halted_at {
            Some(at) => LoadOutcome::Halted { at },
            None => LoadOutcome::Exhausted,
        };
        yield LoadProgress::Finished(outcome);
    }
}

/// Spawns load chains onto the tokio runtime
#[derive(Clone)]
pub struct AssetLoader {
    fetcher: Arc<dyn AssetFetcher>,
    policy: FailurePolicy,
}

impl AssetLoader {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, policy: FailurePolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Start a chain for `generation`, forwarding its progress into `sink`.
    ///
    /// A fetcher that panics halts the chain at the asset it was fetching; the
    /// failure is reported like any other before the closing `Finished`.
    pub fn spawn(
        &self,
        generation: Generation,
        production_id: ProductionId,
        assets: Vec<AssetRef>,
        sink: mpsc::UnboundedSender<LoadEvent>,
    ) -> LoadTask {
        let mut pending: VecDeque<AssetId> = VecDeque::new();
        for asset in &assets {
            if !pending.contains(&asset.id) {
                pending.push_back(asset.id.clone());
            }
        }

        let stream = load_sequential(self.fetcher.clone(), production_id, assets, self.policy);
        let handle = tokio::spawn(async move {
            futures::pin_mut!(stream);
            loop {
                let progress = match AssertUnwindSafe(stream.next()).catch_unwind().await {
                    Ok(Some(progress)) => progress,
                    Ok(None) => break,
                    Err(_) => {
                        let Some(at) = pending.pop_front() else {
                            let _ = sink.send(LoadEvent {
                                generation,
                                progress: LoadProgress::Finished(LoadOutcome::Interrupted),
                            });
                            break;
                        };
                        error!("Fetch of asset '{}' panicked, halting chain", at);
                        let _ = sink.send(LoadEvent {
                            generation,
                            progress: LoadProgress::Failed {
                                asset_id: at.clone(),
                                error: "fetch panicked".to_string(),
                                attempts: 1,
                            },
                        });
                        let _ = sink.send(LoadEvent {
                            generation,
                            progress: LoadProgress::Finished(LoadOutcome::Halted { at }),
                        });
                        break;
                    }
                };

                if let LoadProgress::Loaded(_) | LoadProgress::Failed { .. } = &progress {
                    pending.pop_front();
                }
                if sink.send(LoadEvent { generation, progress }).is_err() {
                    debug!("Load sink for generation {} closed", generation.0);
                    break;
                }
            }
        });

        LoadTask {
            generation,
            handle: Some(handle),
        }
    }
}

/// Handle on a running load chain. Dropping it aborts the chain.
#[derive(Debug)]
pub struct LoadTask {
    generation: Generation,
    handle: Option<JoinHandle<()>>,
}

impl LoadTask {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Abort the chain. Events it already sent stay queued.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Wait for the chain to end, however it ends
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.await {
                debug!("Load chain for generation {} ended: {}", self.generation.0, e);
            }
            self.handle = None;
        }
    }

    /// Let the chain run to completion in the background instead of aborting it on drop
    pub fn detach(mut self) {
        debug!("Detached load chain for generation {}", self.generation.0);
        self.handle.take();
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryAssetFetcher;
    use serde_json::json;
    use std::time::Duration;

    fn refs(ids: &[&str]) -> Vec<AssetRef> {
        ids.iter().map(|id| AssetRef::new(*id)).collect()
    }

    async fn collect(
        fetcher: Arc<MemoryAssetFetcher>,
        ids: &[&str],
        policy: FailurePolicy,
    ) -> Vec<LoadProgress> {
        load_sequential(fetcher, ProductionId::new("p1"), refs(ids), policy)
            .collect()
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_in_list_order_regardless_of_latency() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_payload("x", json!("dx"))
                .with_payload("y", json!("dy"))
                .with_latency("x", Duration::from_millis(10))
                .with_latency("y", Duration::from_millis(5)),
        );

        let progress = collect(fetcher.clone(), &["x", "y"], FailurePolicy::Halt).await;
        let loaded: Vec<&str> = progress
            .iter()
            .filter_map(|p| match p {
                LoadProgress::Loaded(asset) => Some(asset.id().as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, vec!["x", "y"]);
        assert_eq!(
            progress.last(),
            Some(&LoadProgress::Finished(LoadOutcome::Exhausted))
        );
    }

    #[tokio::test]
    async fn test_halt_stops_chain() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_payload("a", json!(1))
                .with_failure("b")
                .with_payload("c", json!(3)),
        );

        let progress = collect(fetcher.clone(), &["a", "b", "c"], FailurePolicy::Halt).await;
        assert_eq!(progress.len(), 3);
        assert!(matches!(&progress[0], LoadProgress::Loaded(a) if a.id().as_str() == "a"));
        assert!(matches!(&progress[1], LoadProgress::Failed { asset_id, .. } if asset_id.as_str() == "b"));
        assert_eq!(
            progress[2],
            LoadProgress::Finished(LoadOutcome::Halted {
                at: AssetId::new("b")
            })
        );
        assert_eq!(fetcher.requests(), vec![AssetId::new("a"), AssetId::new("b")]);
    }

    #[tokio::test]
    async fn test_skip_continues_after_failure() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_failure("a")
                .with_payload("b", json!(2)),
        );

        let progress = collect(fetcher.clone(), &["a", "b"], FailurePolicy::Skip).await;
        assert!(matches!(&progress[0], LoadProgress::Failed { .. }));
        assert!(matches!(&progress[1], LoadProgress::Loaded(b) if b.data == json!(2)));
        assert_eq!(
            progress[2],
            LoadProgress::Finished(LoadOutcome::Exhausted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_backoff() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_payload("a", json!(1))
                .with_transient_failures("a", 2),
        );
        let policy = FailurePolicy::Retry {
            max_attempts: 3,
            initial_backoff_ms: 50,
        };

        let started = tokio::time::Instant::now();
        let progress = collect(fetcher.clone(), &["a"], policy).await;
        assert!(matches!(&progress[0], LoadProgress::Loaded(_)));
        assert_eq!(fetcher.requests().len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted_halts() {
        let fetcher = Arc::new(MemoryAssetFetcher::new().with_failure("a"));
        let policy = FailurePolicy::Retry {
            max_attempts: 2,
            initial_backoff_ms: 10,
        };

        let progress = collect(fetcher.clone(), &["a", "b"], policy).await;
        assert!(matches!(&progress[0], LoadProgress::Failed { attempts: 2, .. }));
        assert!(matches!(&progress[1], LoadProgress::Finished(LoadOutcome::Halted { .. })));
        assert_eq!(fetcher.requests(), vec![AssetId::new("a"), AssetId::new("a")]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_fetched_once() {
        let fetcher = Arc::new(MemoryAssetFetcher::new().with_payload("a", json!(1)));
        let progress = collect(fetcher.clone(), &["a", "a"], FailurePolicy::Halt).await;
        assert_eq!(progress.len(), 2);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_spawned_chain_tags_generation() {
        let fetcher = Arc::new(MemoryAssetFetcher::new().with_payload("a", json!(1)));
        let loader = AssetLoader::new(fetcher, FailurePolicy::Halt);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = loader.spawn(Generation(7), ProductionId::new("p1"), refs(&["a"]), tx);
        assert_eq!(task.generation(), Generation(7));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.generation, Generation(7));
        assert!(matches!(first.progress, LoadProgress::Loaded(_)));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.progress, LoadProgress::Finished(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_chain() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_payload("a", json!(1))
                .with_latency("a", Duration::from_millis(100)),
        );
        let loader = AssetLoader::new(fetcher.clone(), FailurePolicy::Halt);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = loader.spawn(Generation(1), ProductionId::new("p1"), refs(&["a"]), tx);
        tokio::task::yield_now().await;
        task.cancel();
        drop(task);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_returns_once_cancelled_chain_ends() {
        let fetcher = Arc::new(
            MemoryAssetFetcher::new()
                .with_payload("a", json!(1))
                .with_latency("a", Duration::from_millis(100)),
        );
        let loader = AssetLoader::new(fetcher, FailurePolicy::Halt);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut task = loader.spawn(Generation(3), ProductionId::new("p1"), refs(&["a"]), tx);
        tokio::task::yield_now().await;
        task.cancel();
        task.join().await;

        assert!(rx.try_recv().is_err());
        // a second join has nothing left to wait for
        task.join().await;
    }
}
