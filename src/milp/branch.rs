use super::*;
use crate::INTEGRALITY_TOLERANCE;
use std::time::Duration;
use std::time::Instant;

/// Result of a bounded MILP solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// search finished; the incumbent is optimal
    Optimal(Vec<f64>),
    /// budget ran out with a feasible incumbent in hand
    TimeLimited(Vec<f64>),
    /// search finished without any integral point
    Infeasible,
    /// budget ran out before any integral point was found
    Exhausted,
}

impl Outcome {
    pub fn solution(&self) -> Option<&[f64]> {
        match self {
            Self::Optimal(x) | Self::TimeLimited(x) => Some(x),
            Self::Infeasible | Self::Exhausted => None,
        }
    }
    pub fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal(_))
    }
}

/// a box of variable bounds still to be explored
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Depth-first branch and bound over [`Simplex`] relaxations.
///
/// The branch nearest the relaxed value is explored first, which dives
/// quickly to an integral incumbent. The wall-clock budget is checked
/// before every node.
pub struct BranchAndBound<'a> {
    program: &'a Program,
    limit: Duration,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(program: &'a Program, limit: Duration) -> Self {
        Self { program, limit }
    }

    pub fn solve(&self) -> Outcome {
        let start = Instant::now();
        let mut incumbent = None::<(Vec<f64>, f64)>;
        let mut explored = 0usize;
        let mut stack = vec![Node {
            lower: self.program.lower().to_vec(),
            upper: self.program.upper().to_vec(),
        }];
        while let Some(node) = stack.pop() {
            if start.elapsed() >= self.limit {
                log::debug!("{:<32}{:<32}", "branch and bound timed out", explored);
                return match incumbent {
                    Some((x, _)) => Outcome::TimeLimited(x),
                    None => Outcome::Exhausted,
                };
            }
            explored += 1;
            let (x, value) = match Simplex::solve(self.program, &node.lower, &node.upper) {
                Relaxed::Optimal { x, value } => (x, value),
                Relaxed::Infeasible | Relaxed::Unbounded => continue,
            };
            if let Some((_, best)) = incumbent.as_ref() {
                if value >= best - 1e-9 * (1. + best.abs()) {
                    continue;
                }
            }
            match self.fractional(&x) {
                None => incumbent = Some((self.rounded(x), value)),
                Some(j) => {
                    let floor = x[j].floor();
                    let mut down = Node {
                        lower: node.lower.clone(),
                        upper: node.upper.clone(),
                    };
                    down.upper[j] = floor;
                    let mut up = node;
                    up.lower[j] = floor + 1.;
                    if x[j] - floor < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                }
            }
        }
        log::debug!("{:<32}{:<32}", "branch and bound nodes", explored);
        match incumbent {
            Some((x, _)) => Outcome::Optimal(x),
            None => Outcome::Infeasible,
        }
    }

    /// most fractional integer variable, lowest index on ties
    fn fractional(&self, x: &[f64]) -> Option<usize> {
        x.iter()
            .enumerate()
            .filter(|(j, _)| self.program.integer()[*j])
            .map(|(j, v)| (j, (v - v.round()).abs()))
            .filter(|(_, f)| *f > INTEGRALITY_TOLERANCE)
            .fold(None, |best: Option<(usize, f64)>, (j, f)| match best {
                Some((_, b)) if b >= f => best,
                _ => Some((j, f)),
            })
            .map(|(j, _)| j)
    }

    fn rounded(&self, mut x: Vec<f64>) -> Vec<f64> {
        x.iter_mut()
            .zip(self.program.integer())
            .filter(|(_, integer)| **integer)
            .for_each(|(v, _)| *v = v.round());
        x
    }
}
