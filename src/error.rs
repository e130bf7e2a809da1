/// Configuration errors. These fail immediately and are never retried;
/// numerical degradation is reported through [`crate::Status`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignError {
    UnknownMethod(String),
    EmptyUnits,
    DuplicateUnit(String),
    SchemaMismatch(String),
    ClusterCount { k: usize, n: usize },
    EmbeddingShape { rows: usize, units: usize },
    Cardinality { treatment: usize, control: usize, n: usize },
    NonFinite(&'static str),
    NoFeasiblePartition(usize),
}

impl std::fmt::Display for DesignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMethod(s) => write!(f, "unknown embedding method: {}", s),
            Self::EmptyUnits => write!(f, "no geo units supplied"),
            Self::DuplicateUnit(s) => write!(f, "duplicate unit id: {}", s),
            Self::SchemaMismatch(s) => write!(f, "covariate schema mismatch at unit: {}", s),
            Self::ClusterCount { k, n } => write!(f, "cannot form {} clusters from {} points", k, n),
            Self::EmbeddingShape { rows, units } => {
                write!(f, "embedding has {} rows for {} units", rows, units)
            }
            Self::Cardinality { treatment, control, n } => write!(
                f,
                "requested {} treatment + {} control from {} supergeos",
                treatment, control, n
            ),
            Self::NonFinite(s) => write!(f, "non-finite values in {}", s),
            Self::NoFeasiblePartition(n) => write!(f, "none of {} candidate partitions solved", n),
        }
    }
}

impl std::error::Error for DesignError {}
