use super::*;
use crate::Measure;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// A composite unit aggregating a non-empty set of [`GeoUnit`]s.
///
/// Scalar attributes are always derived from the members: response and
/// spend are summed, covariates follow [`Aggregation::of`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supergeo {
    id: String,
    units: Vec<String>,
    response: Measure,
    spend: Measure,
    covariates: BTreeMap<String, Measure>,
}

impl Supergeo {
    /// aggregate `members` over the covariate schema `features`
    pub fn aggregate(id: impl Into<String>, members: &[&GeoUnit], features: &[String]) -> Self {
        debug_assert!(!members.is_empty(), "supergeo without members");
        Self {
            id: id.into(),
            units: members.iter().map(|u| u.id().to_string()).collect(),
            response: members.iter().map(|u| u.response()).sum(),
            spend: members.iter().map(|u| u.spend()).sum(),
            covariates: features
                .iter()
                .map(|f| (f.clone(), Aggregation::of(f).apply(f, members)))
                .collect(),
        }
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn units(&self) -> &[String] {
        &self.units
    }
    pub fn size(&self) -> usize {
        self.units.len()
    }
    pub fn response(&self) -> Measure {
        self.response
    }
    pub fn spend(&self) -> Measure {
        self.spend
    }
    pub fn covariates(&self) -> &BTreeMap<String, Measure> {
        &self.covariates
    }
    pub fn covariate(&self, name: &str) -> Measure {
        self.covariates.get(name).copied().unwrap_or(0.)
    }
    /// `[response, spend, covariates...]` in the order of `names`
    pub fn vector(&self, names: &[String]) -> Vec<Measure> {
        [self.response, self.spend]
            .into_iter()
            .chain(names.iter().map(|name| self.covariate(name)))
            .collect()
    }
}
