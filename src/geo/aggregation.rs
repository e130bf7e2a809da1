use super::*;
use crate::EXTENSIVE_KEYWORDS;
use crate::Measure;
use crate::POPULATION;

/// How a covariate combines across the members of a supergeo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// extensive quantities (population, counts) add up
    Sum,
    /// intensive quantities (income) average, weighted by population
    Weighted,
}

impl Aggregation {
    /// classify a covariate by name
    pub fn of(feature: &str) -> Self {
        let lower = feature.to_lowercase();
        match EXTENSIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            true => Self::Sum,
            false => Self::Weighted,
        }
    }

    /// combine one covariate over a set of member units
    pub fn apply(&self, feature: &str, members: &[&GeoUnit]) -> Measure {
        match self {
            Self::Sum => members.iter().map(|u| u.covariate(feature)).sum(),
            Self::Weighted => {
                let weights = members
                    .iter()
                    .map(|u| u.covariates().get(POPULATION).copied().unwrap_or(1.))
                    .collect::<Vec<Measure>>();
                let total = weights.iter().sum::<Measure>();
                if total > 0. {
                    members
                        .iter()
                        .zip(weights.iter())
                        .map(|(u, w)| u.covariate(feature) * w)
                        .sum::<Measure>()
                        / total
                } else {
                    members.iter().map(|u| u.covariate(feature)).sum::<Measure>()
                        / members.len() as Measure
                }
            }
        }
    }
}
