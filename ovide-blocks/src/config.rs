//! Block configuration parsing and management.

use crate::error::{ConfigError, ConfigResult};
use ovide_types::RenderingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What the loader does when fetching one asset fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the chain at the failed asset
    Halt,
    /// Record the failure and continue with the next asset
    Skip,
    /// Retry with exponential backoff, then halt
    Retry {
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
        #[serde(default = "default_backoff_ms")]
        initial_backoff_ms: u64,
    },
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    100
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Halt
    }
}

impl FailurePolicy {
    /// Total number of requests allowed for a single asset
    pub fn max_attempts(&self) -> u32 {
        match self {
            FailurePolicy::Retry { max_attempts, .. } => *max_attempts,
            _ => 1,
        }
    }

    /// Delay before attempt number `attempt` (1-based; the first attempt has none)
    pub fn backoff(&self, attempt: u32) -> Duration {
        match self {
            FailurePolicy::Retry {
                initial_backoff_ms, ..
            } if attempt > 1 => {
                let factor = 1u64 << (attempt - 2).min(16);
                Duration::from_millis(initial_backoff_ms.saturating_mul(factor))
            }
            _ => Duration::ZERO,
        }
    }

    /// Whether the chain continues past an asset that could not be fetched
    pub fn continues_after_failure(&self) -> bool {
        matches!(self, FailurePolicy::Skip)
    }
}

/// Configuration for contextualization blocks, usually read from `ovide.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub failure_policy: FailurePolicy,

    /// Abort the previous load task when the block is rebound
    pub cancel_stale_loads: bool,

    pub translation_namespace: String,

    pub default_rendering_mode: RenderingMode,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            cancel_stale_loads: true,
            translation_namespace: String::from("Components.BlockContextualization"),
            default_rendering_mode: RenderingMode::Screen,
        }
    }
}

impl BlockConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> ConfigResult<Self> {
        let config: BlockConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let FailurePolicy::Retry { max_attempts, .. } = self.failure_policy {
            if max_attempts == 0 {
                return Err(ConfigError::Invalid(
                    "failure_policy.max_attempts must be at least 1".to_string(),
                ));
            }
        }
        if self.translation_namespace.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "translation_namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = BlockConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, BlockConfig::default());
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
    }

    #[test]
    fn test_retry_policy_from_yaml() {
        let config = BlockConfig::from_yaml_str(
            r#"
failure_policy:
  policy: retry
  max_attempts: 4
  initial_backoff_ms: 50
default_rendering_mode: paged
"#,
        )
        .unwrap();
        assert_eq!(
            config.failure_policy,
            FailurePolicy::Retry {
                max_attempts: 4,
                initial_backoff_ms: 50
            }
        );
        assert_eq!(config.default_rendering_mode, RenderingMode::Paged);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = BlockConfig::from_yaml_str(
            "failure_policy:\n  policy: retry\n  max_attempts: 0\n",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = FailurePolicy::Retry {
            max_attempts: 4,
            initial_backoff_ms: 100,
        };
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(400));
        assert_eq!(FailurePolicy::Halt.max_attempts(), 1);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ovide.yml");
        std::fs::write(&path, "failure_policy:\n  policy: skip\ncancel_stale_loads: false\n")
            .unwrap();
        let config = BlockConfig::from_file(&path).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert!(!config.cancel_stale_loads);
    }
}
