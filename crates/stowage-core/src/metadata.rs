//! Object metadata attached to every stored variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::CONTENT_TYPE_KEY;

/// Content type plus caller-supplied key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(content_type: impl Into<String>) -> Self {
        ObjectMetadata {
            content_type: content_type.into(),
            custom: BTreeMap::new(),
        }
    }

    pub fn with_custom(mut self, custom: BTreeMap<String, String>) -> Self {
        self.custom = custom;
        self
    }

    /// Flatten into a single map, the form reported back to producers.
    ///
    /// A caller-supplied `contentType` entry never shadows the real content type.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.custom.clone();
        map.insert(CONTENT_TYPE_KEY.to_string(), self.content_type.clone());
        map
    }
}
