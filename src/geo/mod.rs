//! Geographic units and their aggregates.
mod aggregation;
mod partition;
mod supergeo;
mod unit;
mod units;

pub use aggregation::*;
pub use partition::*;
pub use supergeo::*;
pub use unit::*;
pub use units::*;
