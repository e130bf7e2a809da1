use serde::Deserialize;
use serde::Serialize;

/// Merge criterion between clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// minimum increase in within-cluster variance
    #[default]
    Ward,
    /// maximum pairwise distance
    Complete,
    /// mean pairwise distance
    Average,
}

impl Linkage {
    pub const ALL: [Self; 3] = [Self::Ward, Self::Complete, Self::Average];

    /// cycle through the criteria by partition index
    pub fn nth(i: usize) -> Self {
        Self::ALL[i % Self::ALL.len()]
    }

    /// Lance–Williams update: dissimilarity between cluster `k` and the
    /// union of clusters `i` and `j`.
    pub fn update(&self, dki: f64, dkj: f64, dij: f64, ni: f64, nj: f64, nk: f64) -> f64 {
        match self {
            Self::Complete => dki.max(dkj),
            Self::Average => (ni * dki + nj * dkj) / (ni + nj),
            Self::Ward => ((ni + nk) * dki + (nj + nk) * dkj - nk * dij) / (ni + nj + nk),
        }
    }

    /// Initial point dissimilarity. Ward works on squared distances.
    pub fn dissimilarity(&self, a: &[f64], b: &[f64]) -> f64 {
        let squared = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>();
        match self {
            Self::Ward => squared,
            Self::Complete | Self::Average => squared.sqrt(),
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ward => write!(f, "ward"),
            Self::Complete => write!(f, "complete"),
            Self::Average => write!(f, "average"),
        }
    }
}
