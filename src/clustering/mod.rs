//! Hierarchical agglomerative clustering of embeddings.
mod agglomerative;
mod linkage;

pub use agglomerative::*;
pub use linkage::*;
