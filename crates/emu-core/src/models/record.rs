use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::geometry::Location;

/// Raw attribute record returned by the feature-query provider.
///
/// Attribute values are scalars; numbers are read back through their string
/// rendering, so `12`, `12.0` and `"12"` all extract the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub attributes: HashMap<String, serde_json::Value>,

    /// Point geometry, when the provider returned one
    #[serde(default)]
    pub geometry: Option<Location>,
}

impl RawRecord {
    pub fn new(attributes: HashMap<String, serde_json::Value>) -> Self {
        Self { attributes, geometry: None }
    }

    pub fn with_geometry(mut self, location: Location) -> Self {
        self.geometry = Some(location);
        self
    }

    /// Builder-style attribute insertion
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// String rendering of a field.
    ///
    /// Missing keys, nulls and blank strings all yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        let rendered = match self.attributes.get(field)? {
            serde_json::Value::Null => return None,
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        };
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}
