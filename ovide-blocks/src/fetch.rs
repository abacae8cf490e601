//! Data-access collaborators for asset payloads.

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use ovide_types::{AssetId, AssetRef, ProductionId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Fetches the full data payload of an asset.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch_asset_data(
        &self,
        production_id: &ProductionId,
        asset: &AssetRef,
    ) -> FetchResult<Value>;
}

/// Reads asset payloads from a directory.
///
/// `<root>/<asset-id>.json` is parsed as JSON; otherwise `<root>/<asset-id>`
/// is returned as a JSON string.
#[derive(Debug, Clone)]
pub struct FsAssetFetcher {
    root: PathBuf,
}

impl FsAssetFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetFetcher for FsAssetFetcher {
    async fn fetch_asset_data(
        &self,
        _production_id: &ProductionId,
        asset: &AssetRef,
    ) -> FetchResult<Value> {
        let id = asset.id.as_str();
        if id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(FetchError::Rejected {
                asset: asset.id.clone(),
                reason: "asset id is not a plain file name".to_string(),
            });
        }

        let json_path = self.root.join(format!("{id}.json"));
        match tokio::fs::read_to_string(&json_path).await {
            Ok(raw) => {
                return serde_json::from_str(&raw).map_err(|e| FetchError::Decode {
                    asset: asset.id.clone(),
                    message: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(FetchError::Io {
                    asset: asset.id.clone(),
                    source,
                })
            }
        }

        match tokio::fs::read_to_string(self.root.join(id)).await {
            Ok(raw) => Ok(Value::String(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(asset.id.clone()))
            }
            Err(source) => Err(FetchError::Io {
                asset: asset.id.clone(),
                source,
            }),
        }
    }
}

/// In-memory fetcher with scripted latency and failures.
///
/// Every request is recorded, which makes it handy for checking request order.
#[derive(Debug, Default)]
pub struct MemoryAssetFetcher {
    payloads: HashMap<AssetId, Value>,
    latency: HashMap<AssetId, Duration>,
    failing: HashSet<AssetId>,
    failures_before_success: Mutex<HashMap<AssetId, u32>>,
    requests: Mutex<Vec<AssetId>>,
}

impl MemoryAssetFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, id: impl Into<AssetId>, data: Value) -> Self {
        self.payloads.insert(id.into(), data);
        self
    }

    pub fn with_latency(mut self, id: impl Into<AssetId>, latency: Duration) -> Self {
        self.latency.insert(id.into(), latency);
        self
    }

    /// Every request for `id` is rejected
    pub fn with_failure(mut self, id: impl Into<AssetId>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// The first `count` requests for `id` are rejected
    pub fn with_transient_failures(self, id: impl Into<AssetId>, count: u32) -> Self {
        self.failures_before_success.lock().insert(id.into(), count);
        self
    }

    /// Ids requested so far, in request order
    pub fn requests(&self) -> Vec<AssetId> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AssetFetcher for MemoryAssetFetcher {
    async fn fetch_asset_data(
        &self,
        _production_id: &ProductionId,
        asset: &AssetRef,
    ) -> FetchResult<Value> {
        self.requests.lock().push(asset.id.clone());

        if let Some(latency) = self.latency.get(&asset.id) {
            tokio::time::sleep(*latency).await;
        }

        if self.failing.contains(&asset.id) {
            return Err(FetchError::Rejected {
                asset: asset.id.clone(),
                reason: "scripted failure".to_string(),
            });
        }

        {
            let mut transient = self.failures_before_success.lock();
            if let Some(remaining) = transient.get_mut(&asset.id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Rejected {
                        asset: asset.id.clone(),
                        reason: "scripted transient failure".to_string(),
                    });
                }
            }
        }

        self.payloads
            .get(&asset.id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(asset.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fs_fetcher_reads_json_then_raw() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.json"), r#"{"rows": 3}"#).unwrap();
        std::fs::write(dir.path().join("y"), "plain text").unwrap();

        let fetcher = FsAssetFetcher::new(dir.path());
        let production = ProductionId::new("p1");

        let x = fetcher
            .fetch_asset_data(&production, &AssetRef::new("x"))
            .await
            .unwrap();
        assert_eq!(x, json!({"rows": 3}));

        let y = fetcher
            .fetch_asset_data(&production, &AssetRef::new("y"))
            .await
            .unwrap();
        assert_eq!(y, json!("plain text"));

        let missing = fetcher
            .fetch_asset_data(&production, &AssetRef::new("z"))
            .await;
        assert!(matches!(missing, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fs_fetcher_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsAssetFetcher::new(dir.path());
        let result = fetcher
            .fetch_asset_data(&ProductionId::new("p1"), &AssetRef::new("../secret"))
            .await;
        assert!(matches!(result, Err(FetchError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_fs_fetcher_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.json"), "{not json").unwrap();
        let fetcher = FsAssetFetcher::new(dir.path());
        let result = fetcher
            .fetch_asset_data(&ProductionId::new("p1"), &AssetRef::new("x"))
            .await;
        assert!(matches!(result, Err(FetchError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_memory_fetcher_transient_failures() {
        let fetcher = MemoryAssetFetcher::new()
            .with_payload("x", json!(1))
            .with_transient_failures("x", 1);
        let production = ProductionId::new("p1");
        let asset = AssetRef::new("x");

        assert!(fetcher.fetch_asset_data(&production, &asset).await.is_err());
        assert_eq!(
            fetcher.fetch_asset_data(&production, &asset).await.unwrap(),
            json!(1)
        );
        assert_eq!(fetcher.requests().len(), 2);
    }
}
