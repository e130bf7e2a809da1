//! Dense numerics for embeddings and the simplex tableau.
//!
//! [`Matrix`] keeps rows contiguous for row-wise kernels (tableau pivots,
//! pairwise distances, layer biases) and hands products and spectral
//! decompositions to `nalgebra`.
mod matrix;

pub use matrix::*;
