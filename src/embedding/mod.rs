//! Unit embeddings.
//!
//! Every variant maps the normalized unit feature matrix (one row per unit)
//! to an embedding matrix with the same row order. Only the learned graph
//! embedding trains; the others are closed-form.
mod embedder;
mod method;
mod neighborhood;
mod pca;
mod random;
mod sage;
mod spectral;

pub use embedder::*;
pub use method::*;
pub use neighborhood::*;
pub use pca::*;
pub use random::*;
pub use sage::*;
pub use spectral::*;

use crate::Matrix;
use rand::rngs::SmallRng;

/// The single capability shared by all embedding variants.
pub trait Embed {
    /// Embed `features` into at most `dim` columns.
    ///
    /// Variants that cannot produce `dim` components return fewer.
    fn embed(&self, features: &Matrix, dim: usize, rng: &mut SmallRng) -> anyhow::Result<Matrix>;
}
