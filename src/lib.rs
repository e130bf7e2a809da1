//! Optimized supergeo design for geo experiments.
//!
//! Atomic geographic units are embedded, clustered into composite
//! supergeos, and the supergeos are split into treatment and control
//! groups by an exact mixed-integer program that minimizes covariate
//! imbalance.
//!
//! ## Pipeline
//!
//! 1. **Units**: validated unit records sharing one covariate schema
//! 2. **Embedding**: PCA, spectral, learned graph, or random vectors per unit
//! 3. **Candidates**: agglomerative clustering into one or many partitions
//! 4. **Balance**: MILP assignment per partition, best partition by SMD cost
//!
//! ## Core Types
//!
//! - [`GeoUnit`] / [`Units`]: input records and the unit store
//! - [`Supergeo`] / [`Partition`]: aggregated units and disjoint covers
//! - [`Balancer`]: immutable solver context for one partition
//! - [`Search`]: best partition across a candidate batch
#![allow(dead_code)]

pub mod balance;
pub mod candidates;
pub mod clustering;
pub mod config;
pub mod embedding;
pub mod error;
pub mod geo;
pub mod linalg;
pub mod milp;
pub mod pipeline;

pub use balance::*;
pub use candidates::*;
pub use clustering::*;
pub use config::*;
pub use embedding::*;
pub use error::*;
pub use geo::*;
pub use linalg::*;
pub use milp::*;
pub use pipeline::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Raw feature values: response, spend, covariates.
pub type Measure = f64;
/// Standardized mean differences and weighted imbalance costs.
pub type Imbalance = f64;
/// Per-feature objective weights.
pub type Weight = f64;

// ============================================================================
// TRAITS
// ============================================================================
/// Random instance generation for testing and benchmarking.
pub trait Arbitrary {
    /// Generate a random instance from an explicit generator.
    fn random(rng: &mut rand::rngs::SmallRng) -> Self;
}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================
/// Name of the primary outcome feature.
pub const RESPONSE: &str = "response";
/// Name of the treatment cost feature.
pub const SPEND: &str = "spend";
/// Covariate used as the weight of intensive aggregates.
pub const POPULATION: &str = "population";
/// Substrings marking a covariate as extensive (aggregated by sum).
pub const EXTENSIVE_KEYWORDS: [&str; 5] = ["population", "spend", "response", "users", "count"];
/// Additive guard on standard deviations before scaling.
pub const SCALE_EPSILON: Measure = 1e-6;

// ============================================================================
// EMBEDDING
// ============================================================================
/// Default embedding dimensionality.
pub const EMBEDDING_DIM: usize = 32;
/// Upper bound on neighbours (self included) in the k-NN graph.
pub const GRAPH_NEIGHBORS: usize = 10;
/// Hidden width of the learned graph embedding.
pub const SAGE_HIDDEN: usize = 64;
/// Full-batch gradient steps for the learned graph embedding.
pub const SAGE_EPOCHS: usize = 100;
/// Adam step size for the learned graph embedding.
pub const SAGE_LEARNING_RATE: f64 = 0.01;
/// Negative sampling rounds per epoch.
pub const SAGE_NEGATIVES: usize = 5;
/// Hinge margin separating non-adjacent embeddings.
pub const SAGE_MARGIN: f64 = 1.0;

// ============================================================================
// CANDIDATE PARTITIONS
// ============================================================================
/// Fraction of the unit count requested as supergeos by default.
pub const SUPERGEO_FRACTION: f64 = 0.1;
/// Smallest default supergeo request.
pub const SUPERGEO_FLOOR: usize = 4;
/// Relative jitter on the requested cluster count per partition.
pub const CLUSTER_JITTER: f64 = 0.1;
/// Embedding noise as a fraction of each dimension's standard deviation.
pub const EMBEDDING_NOISE: f64 = 0.05;
/// Default number of candidate partitions.
pub const CANDIDATE_PARTITIONS: usize = 5;

// ============================================================================
// BALANCE SOLVER
// ============================================================================
/// Pooled standard deviation below which SMD is reported as zero.
pub const SMD_THRESHOLD: Imbalance = 1e-9;
/// Default wall-clock budget for a single MILP solve.
pub const SOLVER_TIME_LIMIT: std::time::Duration = std::time::Duration::from_secs(30);
/// Distance from an integer below which a relaxed value counts as integral.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;
/// Pivot and feasibility tolerance of the simplex.
pub const SIMPLEX_TOLERANCE: f64 = 1e-9;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging: DEBUG to `<directory>/<unix-seconds>.log`,
/// INFO to the terminal. Fails if a logger is already installed.
#[cfg(feature = "server")]
pub fn log(directory: impl AsRef<std::path::Path>) -> anyhow::Result<std::path::PathBuf> {
    let directory = directory.as_ref();
    std::fs::create_dir_all(directory)?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let path = directory.join(format!("{}.log", time));
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(&path)?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file])?;
    Ok(path)
}

/// Draw one standard normal sample (Box–Muller).
pub fn gaussian(rng: &mut impl rand::Rng) -> f64 {
    let u = 1. - rng.random::<f64>();
    let v = rng.random::<f64>();
    (-2. * u.ln()).sqrt() * (2. * std::f64::consts::PI * v).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "server")]
    fn log_writes_into_the_given_directory() {
        let directory = std::env::temp_dir().join(format!("supergeo-log-{}", std::process::id()));
        let path = log(&directory).unwrap();
        assert!(path.starts_with(&directory));
        assert!(path.exists());
        log::info!("{:<32}{:<32}", "logging to", path.display());
        assert!(log(&directory).is_err());
        std::fs::remove_dir_all(&directory).ok();
    }
}
