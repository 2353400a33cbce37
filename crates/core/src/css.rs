//! CSS override rules.
//!
//! A stencil edit's style payload is always a single rule of the shape
//! `#id{prop:value;...}` — the cumulative override for one element on one
//! page. Successive edits are merged property-by-property into the existing
//! rule, never appended as a second rule. Properties are kept in sorted
//! order so re-serialization is deterministic and re-applying the same
//! patch is a byte-for-byte no-op.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;
use crate::ids::ElementId;

/// One `#id{prop:value;...}` rule with stable property ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssPartial {
    selector: ElementId,
    properties: BTreeMap<String, String>,
}

impl CssPartial {
    /// Build a rule from scratch.
    pub fn new(selector: ElementId, properties: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            selector,
            properties: properties.into_iter().collect(),
        }
    }

    pub fn selector(&self) -> &ElementId {
        &self.selector
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    /// Shallow-merge new properties over the existing ones. New values win;
    /// untouched properties are preserved.
    pub fn merge(&mut self, properties: impl IntoIterator<Item = (String, String)>) {
        for (prop, value) in properties {
            self.properties.insert(prop, value);
        }
    }
}

impl std::fmt::Display for CssPartial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = self
            .properties
            .iter()
            .map(|(prop, value)| format!("{prop}:{value}"))
            .collect::<Vec<_>>()
            .join(";");
        write!(f, "#{}{{{body}}}", self.selector)
    }
}

impl FromStr for CssPartial {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s
            .strip_prefix('#')
            .ok_or_else(|| StoreError::InvalidCssPartial(s.to_string()))?;
        let (selector, body) = rest
            .split_once('{')
            .ok_or_else(|| StoreError::InvalidCssPartial(s.to_string()))?;
        let body = body
            .strip_suffix('}')
            .ok_or_else(|| StoreError::InvalidCssPartial(s.to_string()))?;

        let mut properties = BTreeMap::new();
        for declaration in body.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let (prop, value) = declaration
                .split_once(':')
                .ok_or_else(|| StoreError::InvalidCssPartial(s.to_string()))?;
            properties.insert(prop.trim().to_string(), value.trim().to_string());
        }

        Ok(Self {
            selector: ElementId::new(selector.trim()),
            properties,
        })
    }
}

// On the wire a partial is the raw rule string — the persisted artifact
// contract requires exactly the `#id{...}` shape.
impl Serialize for CssPartial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CssPartial {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
