//! Mixed-integer linear programming.
//!
//! A [`Program`] is solved by branch and bound over LP relaxations
//! ([`Simplex`]), under a wall-clock budget.
mod branch;
mod program;
mod simplex;

pub use branch::*;
pub use program::*;
pub use simplex::*;
