use crate::RESPONSE;
use crate::Weight;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-feature objective weights. Features without an override weigh 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<String, Weight>);

impl Weights {
    pub fn get(&self, feature: &str) -> Weight {
        self.0.get(feature).copied().unwrap_or(1.)
    }
    pub fn with(mut self, feature: impl Into<String>, weight: Weight) -> Self {
        self.0.insert(feature.into(), weight);
        self
    }
    pub fn overrides(&self) -> &BTreeMap<String, Weight> {
        &self.0
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self(BTreeMap::from([(RESPONSE.to_string(), 1.)]))
    }
}

impl From<BTreeMap<String, Weight>> for Weights {
    fn from(map: BTreeMap<String, Weight>) -> Self {
        Self(map)
    }
}
