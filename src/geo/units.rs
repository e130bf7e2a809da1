use super::*;
use crate::DesignError;
use crate::Matrix;
use crate::Measure;
use std::collections::BTreeSet;

/// The unit store: an ordered, validated collection of [`GeoUnit`]s
/// sharing one covariate schema.
///
/// Row `i` of every matrix derived from the store corresponds to
/// `units()[i]`.
#[derive(Debug, Clone)]
pub struct Units {
    units: Vec<GeoUnit>,
    features: Vec<String>,
}

impl Units {
    /// Validates the schema invariants and takes ownership of the records.
    pub fn new(units: Vec<GeoUnit>) -> anyhow::Result<Self> {
        let first = units.first().ok_or(DesignError::EmptyUnits)?;
        let schema = first.covariates().keys().collect::<BTreeSet<_>>();
        let mut seen = BTreeSet::new();
        for unit in units.iter() {
            if !seen.insert(unit.id()) {
                return Err(DesignError::DuplicateUnit(unit.id().to_string()).into());
            }
            if unit.covariates().keys().collect::<BTreeSet<_>>() != schema {
                return Err(DesignError::SchemaMismatch(unit.id().to_string()).into());
            }
        }
        let features = schema.into_iter().cloned().collect();
        Ok(Self { units, features })
    }
    pub fn units(&self) -> &[GeoUnit] {
        &self.units
    }
    pub fn unit(&self, i: usize) -> &GeoUnit {
        &self.units[i]
    }
    pub fn len(&self) -> usize {
        self.units.len()
    }
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
    /// covariate names, sorted
    pub fn features(&self) -> &[String] {
        &self.features
    }
    /// raw matrix with columns `[response, spend, covariates...]`
    pub fn matrix(&self) -> Matrix {
        Matrix::from(
            self.units
                .iter()
                .map(|u| u.vector(&self.features))
                .collect::<Vec<Vec<Measure>>>(),
        )
    }
    /// column-standardized copy of [`Units::matrix`]
    pub fn normalized(&self) -> Matrix {
        self.matrix().standardize()
    }
    /// deterministic synthetic store with mixed urban and rural units
    pub fn random(n: usize, rng: &mut rand::rngs::SmallRng) -> Self {
        use crate::Arbitrary;
        let units = (0..n)
            .map(|i| (i, GeoUnit::random(rng)))
            .map(|(i, g)| {
                GeoUnit::new(
                    format!("geo_{:04}", i),
                    g.response(),
                    g.spend(),
                    g.covariates().clone(),
                )
            })
            .collect::<Vec<_>>();
        let features = units
            .first()
            .map(|u| u.covariates().keys().cloned().collect())
            .unwrap_or_default();
        Self { units, features }
    }
}
