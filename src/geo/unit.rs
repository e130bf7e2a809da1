use crate::Measure;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// An atomic geographic unit.
///
/// Created once by the data source and never mutated. Covariates are kept
/// in a sorted map so every traversal sees features in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoUnit {
    id: String,
    response: Measure,
    spend: Measure,
    covariates: BTreeMap<String, Measure>,
}

impl GeoUnit {
    pub fn new(
        id: impl Into<String>,
        response: Measure,
        spend: Measure,
        covariates: BTreeMap<String, Measure>,
    ) -> Self {
        Self {
            id: id.into(),
            response,
            spend,
            covariates,
        }
    }
    pub fn id(&self) -> &str {
        &self.id
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
    /// missing covariates read as zero
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

impl crate::Arbitrary for GeoUnit {
    fn random(rng: &mut rand::rngs::SmallRng) -> Self {
        use rand::Rng;
        let urban = rng.random_bool(0.3);
        let revenue = match urban {
            true => (12. + crate::gaussian(rng)).exp(),
            false => (10. + 0.3 * crate::gaussian(rng)).exp(),
        };
        let spend = match urban {
            true => 0.15 * revenue * (1. + 0.1 * crate::gaussian(rng)),
            false => 0.08 * revenue * (1. + 0.05 * crate::gaussian(rng)),
        };
        let population = match urban {
            true => revenue * 0.5,
            false => revenue * 2.0,
        };
        let income = match urban {
            true => 80_000. + 20_000. * crate::gaussian(rng),
            false => 40_000. + 5_000. * crate::gaussian(rng),
        };
        let id = format!("geo_{:08x}", rng.random::<u32>());
        let covariates = [
            (String::from("population"), population),
            (String::from("income"), income),
        ];
        Self::new(id, revenue, spend, covariates.into_iter().collect())
    }
}
