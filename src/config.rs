use crate::CANDIDATE_PARTITIONS;
use crate::EMBEDDING_DIM;
use crate::GraphConfig;
use crate::Method;
use crate::SOLVER_TIME_LIMIT;
use crate::SageConfig;
use crate::Weights;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Run parameters for one design.
///
/// Every field has a default, so a partial JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub method: Method,
    pub dim: usize,
    /// k-NN graph of the spectral embedding
    pub graph: GraphConfig,
    /// learned graph embedding hyperparameters
    pub sage: SageConfig,
    /// candidate partitions to search
    pub partitions: usize,
    /// supergeos per partition; a tenth of the units (at least 4) if unset
    pub target: Option<usize>,
    /// treatment supergeos; half the target if unset
    pub treatment: Option<usize>,
    /// control supergeos; the rest of the target if unset
    pub control: Option<usize>,
    /// wall-clock budget per assignment solve, in seconds
    pub time_limit: f64,
    pub weights: Weights,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::default(),
            dim: EMBEDDING_DIM,
            graph: GraphConfig::default(),
            sage: SageConfig::default(),
            partitions: CANDIDATE_PARTITIONS,
            target: None,
            treatment: None,
            control: None,
            time_limit: SOLVER_TIME_LIMIT.as_secs_f64(),
            weights: Weights::default(),
            seed: 42,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit).unwrap_or(Duration::ZERO)
    }
    /// `(treatment, control)` for a partition of `target` supergeos
    pub fn groups(&self, target: usize) -> (usize, usize) {
        let treatment = self.treatment.unwrap_or(target / 2);
        let control = self
            .control
            .unwrap_or(target.saturating_sub(treatment));
        (treatment, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"method": "Spectral", "partitions": 3}"#).unwrap();
        assert_eq!(config.method, Method::Spectral);
        assert_eq!(config.partitions, 3);
        assert_eq!(config.dim, EMBEDDING_DIM);
        assert_eq!(config.budget(), SOLVER_TIME_LIMIT);
        assert_eq!(config.sage, SageConfig::default());
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = Config::from_json(r#"{"method": "tsne"}"#).unwrap_err();
        assert!(err.to_string().contains("tsne"));
    }

    #[test]
    fn groups_split_the_target() {
        let config = Config::default();
        assert_eq!(config.groups(5), (2, 3));
        let config = Config {
            treatment: Some(1),
            control: Some(2),
            ..Config::default()
        };
        assert_eq!(config.groups(8), (1, 2));
    }

    #[test]
    fn negative_budget_is_zero() {
        let config = Config {
            time_limit: -1.,
            ..Config::default()
        };
        assert_eq!(config.budget(), Duration::ZERO);
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
