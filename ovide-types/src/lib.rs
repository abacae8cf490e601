//! Shared types for ovide
//!
//! This crate provides the document-level data model shared by the editor
//! blocks and the tooling around them: resources from the production library,
//! their placements (contextualizations) in the document, and the auxiliary
//! assets a resource depends on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Production (top-level document/project) identifier
    ProductionId
);
string_id!(
    /// Resource identifier in the production library
    ResourceId
);
string_id!(
    /// Identifier of one placement of a resource in the document
    ContextualizationId
);
string_id!(
    /// Contextualizer identifier
    ContextualizerId
);
string_id!(
    /// Auxiliary asset identifier
    AssetId
);

/// Monotonic version stamp attached to an input binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u64);

impl Revision {
    pub fn new(revision: u64) -> Self {
        Self(revision)
    }

    /// The revision that follows this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A value together with the revision it was published at.
///
/// Two stamped values are considered the same binding when their revisions
/// match, whatever their contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub revision: Revision,
    pub value: T,
}

impl<T> Stamped<T> {
    pub fn new(revision: Revision, value: T) -> Self {
        Self { revision, value }
    }

    /// Replace the value and bump the revision
    pub fn replace(&mut self, value: T) {
        self.value = value;
        self.revision = self.revision.next();
    }
}

impl<T> std::ops::Deref for Stamped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Where the document is being rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMode {
    #[default]
    Screen,
    Paged,
}

impl RenderingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderingMode::Screen => "screen",
            RenderingMode::Paged => "paged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "screen" => Some(RenderingMode::Screen),
            "paged" => Some(RenderingMode::Paged),
            _ => None,
        }
    }
}

/// Per-mode visibility of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    #[serde(default = "default_true")]
    pub screened: bool,
    #[serde(default = "default_true")]
    pub paged: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            screened: true,
            paged: true,
        }
    }
}

impl Visibility {
    pub fn is_visible_in(&self, mode: RenderingMode) -> bool {
        match mode {
            RenderingMode::Screen => self.screened,
            RenderingMode::Paged => self.paged,
        }
    }

    /// Whether the placement is suppressed for `mode` but still shown for editing
    pub fn is_ghost_in(&self, mode: RenderingMode) -> bool {
        !self.is_visible_in(mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An item of the production's resource library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: ResourceMetadata {
                resource_type: resource_type.into(),
                extra: Map::new(),
            },
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.metadata.resource_type
    }

    /// Whether the resource carries a usable data payload.
    ///
    /// Null, `false`, zero, empty strings, empty arrays and empty objects
    /// all count as "not loaded yet". Any other value renders.
    pub fn has_data(&self) -> bool {
        match &self.data {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }
}

/// One placement of a resource in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contextualization {
    pub id: ContextualizationId,
    pub resource_id: ResourceId,
    pub contextualizer_id: ContextualizerId,
    #[serde(default)]
    pub visibility: Visibility,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contextualization {
    pub fn new(
        id: impl Into<ContextualizationId>,
        resource_id: impl Into<ResourceId>,
        contextualizer_id: impl Into<ContextualizerId>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            contextualizer_id: contextualizer_id.into(),
            visibility: Visibility::default(),
            extra: Map::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Per-placement rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contextualizer {
    pub id: ContextualizerId,
    #[serde(rename = "type", default)]
    pub contextualizer_type: Option<String>,

    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Contextualizer {
    pub fn new(id: impl Into<ContextualizerId>) -> Self {
        Self {
            id: id.into(),
            contextualizer_type: None,
            options: Map::new(),
        }
    }
}

/// Asset metadata as listed in the production asset index (no heavy data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: AssetId,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl AssetRef {
    pub fn new(id: impl Into<AssetId>) -> Self {
        Self {
            id: id.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// An asset reference merged with its fetched payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedAsset {
    #[serde(flatten)]
    pub reference: AssetRef,
    pub data: Value,
}

impl LoadedAsset {
    pub fn new(reference: AssetRef, data: Value) -> Self {
        Self { reference, data }
    }

    pub fn id(&self) -> &AssetId {
        &self.reference.id
    }
}

/// Loaded assets for one resource binding, keyed by asset id
pub type AssetMap = BTreeMap<AssetId, LoadedAsset>;

/// Asset metadata of a production, keyed by asset id
pub type ProductionAssetsIndex = BTreeMap<AssetId, AssetRef>;

/// Production read context supplied by the host editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub id: ProductionId,
}

/// Render scope supplied alongside a bound asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomContext {
    #[serde(default)]
    pub production_id: Option<ProductionId>,
    #[serde(default)]
    pub production_assets: ProductionAssetsIndex,
    #[serde(default)]
    pub rendering_mode: Option<RenderingMode>,
}

/// The asset prop a block is mounted with: a contextualization together
/// with its resolved resource and contextualizer
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAsset {
    pub id: ContextualizationId,
    pub resource: Stamped<Resource>,
    pub contextualizer: Stamped<Contextualizer>,
    pub contextualization: Contextualization,
}

impl BoundAsset {
    pub fn new(
        contextualization: Contextualization,
        resource: Stamped<Resource>,
        contextualizer: Stamped<Contextualizer>,
    ) -> Self {
        Self {
            id: contextualization.id.clone(),
            resource,
            contextualizer,
            contextualization,
        }
    }
}
