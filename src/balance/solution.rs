use serde::Deserialize;
use serde::Serialize;

/// How a treatment assignment was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// the assignment program was solved to optimality
    Optimal,
    /// the time budget elapsed with a feasible assignment in hand
    TimeLimited,
    /// no feasible assignment was found; treatment was drawn at random
    Fallback,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::TimeLimited => write!(f, "time-limited"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Treatment supergeo indices, sorted, and how they were found.
/// Every other supergeo of the partition is control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    treatment: Vec<usize>,
    status: Status,
}

impl Solution {
    pub fn new(mut treatment: Vec<usize>, status: Status) -> Self {
        treatment.sort();
        Self { treatment, status }
    }
    pub fn treatment(&self) -> &[usize] {
        &self.treatment
    }
    pub fn status(&self) -> Status {
        self.status
    }
    /// indices in `0..n` not assigned to treatment
    pub fn control(&self, n: usize) -> Vec<usize> {
        (0..n)
            .filter(|i| self.treatment.binary_search(i).is_err())
            .collect()
    }
}
