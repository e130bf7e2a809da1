//! Candidate supergeo partitions.
mod generator;

pub use generator::*;
