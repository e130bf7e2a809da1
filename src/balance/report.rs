use crate::Imbalance;
use crate::Measure;
use serde::Serialize;

/// Raw-scale balance of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBalance {
    pub feature: String,
    pub treatment: Measure,
    pub control: Measure,
    pub smd: Imbalance,
}

/// Balance of an assignment across every feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub features: Vec<FeatureBalance>,
    pub cost: Imbalance,
}

impl Report {
    /// largest absolute SMD over all features
    pub fn worst(&self) -> Imbalance {
        self.features
            .iter()
            .map(|f| f.smd.abs())
            .fold(0., Imbalance::max)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<24}{:>16}{:>16}{:>12}", "feature", "treatment", "control", "smd")?;
        for x in self.features.iter() {
            writeln!(
                f,
                "{:<24}{:>16.4}{:>16.4}{:>12.4}",
                x.feature, x.treatment, x.control, x.smd
            )?;
        }
        write!(f, "{:<24}{:>44.4}", "cost", self.cost)
    }
}
