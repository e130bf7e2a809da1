mod balancer;
mod report;
mod search;
mod smd;
mod solution;
mod weights;

pub use balancer::*;
pub use report::*;
pub use search::*;
pub use smd::*;
pub use solution::*;
pub use weights::*;
