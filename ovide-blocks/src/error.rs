//! Error types for contextualization blocks

use ovide_types::AssetId;
use thiserror::Error;

/// Failure reported by a data-access collaborator.
///
/// A fetch must fail with one of these rather than hand back an empty
/// payload, otherwise the loader cannot tell a missing asset from an empty one.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The collaborator has no data for this asset
    #[error("No data for asset {0}")]
    NotFound(AssetId),

    /// Reading the payload failed
    #[error("I/O error while fetching {asset}: {source}")]
    Io {
        asset: AssetId,
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be decoded
    #[error("Invalid payload for asset {asset}: {message}")]
    Decode { asset: AssetId, message: String },

    /// The collaborator refused the request
    #[error("Request for asset {asset} rejected: {reason}")]
    Rejected { asset: AssetId, reason: String },
}

impl FetchError {
    pub fn asset_id(&self) -> &AssetId {
        match self {
            FetchError::NotFound(asset) => asset,
            FetchError::Io { asset, .. } => asset,
            FetchError::Decode { asset, .. } => asset,
            FetchError::Rejected { asset, .. } => asset,
        }
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
