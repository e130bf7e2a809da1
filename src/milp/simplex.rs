use super::*;
use crate::Matrix;
use crate::SIMPLEX_TOLERANCE;

/// Pivot budget per phase before a relaxation is abandoned.
const MAX_PIVOTS: usize = 100_000;

/// Outcome of an LP relaxation.
#[derive(Debug, Clone, PartialEq)]
pub enum Relaxed {
    Optimal { x: Vec<f64>, value: f64 },
    Infeasible,
    Unbounded,
}

/// Dense two-phase simplex over a [`Program`] with integrality dropped.
///
/// Variables are shifted to their (finite) lower bounds and fixed
/// variables are substituted out. Finite upper bounds become `≤` rows.
/// Entering and leaving columns follow Bland's rule, so the method
/// cannot cycle.
pub struct Simplex {
    tableau: Matrix,
    basis: Vec<usize>,
    artificial: usize,
}

impl Simplex {
    /// Solve the relaxation of `program` under overridden bounds.
    pub fn solve(program: &Program, lower: &[f64], upper: &[f64]) -> Relaxed {
        debug_assert!(lower.iter().all(|l| l.is_finite()));
        if lower.iter().zip(upper).any(|(l, u)| l > &(u + SIMPLEX_TOLERANCE)) {
            return Relaxed::Infeasible;
        }
        let free = (0..program.n())
            .filter(|j| upper[*j] - lower[*j] > SIMPLEX_TOLERANCE)
            .collect::<Vec<usize>>();
        let mut rows = Vec::new();
        for row in program.rows() {
            let shift = row.coefficients.iter().zip(lower).map(|(a, l)| a * l).sum::<f64>();
            let coefficients = free.iter().map(|j| row.coefficients[*j]).collect::<Vec<f64>>();
            rows.push((coefficients, row.sense, row.rhs - shift));
        }
        for (c, j) in free.iter().enumerate() {
            if upper[*j].is_finite() {
                let mut coefficients = vec![0.; free.len()];
                coefficients[c] = 1.;
                rows.push((coefficients, Sense::Le, upper[*j] - lower[*j]));
            }
        }
        // rows without free variables are checked outright
        let mut kept = Vec::with_capacity(rows.len());
        for (coefficients, sense, rhs) in rows {
            if coefficients.iter().any(|a: &f64| a.abs() > SIMPLEX_TOLERANCE) {
                kept.push((coefficients, sense, rhs));
                continue;
            }
            let satisfied = match sense {
                Sense::Eq => rhs.abs() <= SIMPLEX_TOLERANCE,
                Sense::Le => rhs >= -SIMPLEX_TOLERANCE,
            };
            if !satisfied {
                return Relaxed::Infeasible;
            }
        }
        let ref costs = free
            .iter()
            .map(|j| program.objective()[*j])
            .collect::<Vec<f64>>();
        let Some(y) = Self::build(free.len(), &kept).run(costs) else {
            return Relaxed::Infeasible;
        };
        let Some(y) = y else {
            return Relaxed::Unbounded;
        };
        let mut x = lower.to_vec();
        for (c, j) in free.iter().enumerate() {
            x[*j] += y[c];
        }
        let value = program.value(&x);
        Relaxed::Optimal { x, value }
    }

    /// Standard-form tableau `[structural | slack | artificial | rhs]`
    /// with the objective as its last row.
    fn build(n: usize, rows: &[(Vec<f64>, Sense, f64)]) -> Self {
        let m = rows.len();
        let slacks = rows.iter().filter(|(_, s, _)| *s == Sense::Le).count();
        let artificials = rows
            .iter()
            .filter(|(_, s, b)| *s == Sense::Eq || *b < 0.)
            .count();
        let artificial = n + slacks;
        let width = artificial + artificials + 1;
        let mut tableau = Matrix::zeros(m + 1, width);
        let mut basis = vec![0; m];
        let (mut s, mut a) = (n, artificial);
        for (i, (coefficients, sense, rhs)) in rows.iter().enumerate() {
            let sign = if *rhs < 0. { -1. } else { 1. };
            for (c, x) in coefficients.iter().enumerate() {
                tableau[(i, c)] = sign * x;
            }
            tableau[(i, width - 1)] = sign * rhs;
            if *sense == Sense::Le {
                tableau[(i, s)] = sign;
                if sign > 0. {
                    basis[i] = s;
                }
                s += 1;
            }
            if *sense == Sense::Eq || sign < 0. {
                tableau[(i, a)] = 1.;
                basis[i] = a;
                a += 1;
            }
        }
        Self {
            tableau,
            basis,
            artificial,
        }
    }

    /// `None` if infeasible, `Some(None)` if unbounded, else the
    /// structural values.
    fn run(mut self, costs: &[f64]) -> Option<Option<Vec<f64>>> {
        let m = self.basis.len();
        let rhs = self.tableau.cols() - 1;
        if self.basis.iter().any(|b| *b >= self.artificial) {
            let mut scale = 1.;
            for j in self.artificial..rhs {
                self.tableau[(m, j)] = 1.;
            }
            for i in (0..m).filter(|i| self.basis[*i] >= self.artificial) {
                scale += self.tableau[(i, rhs)].abs();
                for j in 0..=rhs {
                    self.tableau[(m, j)] -= self.tableau[(i, j)];
                }
            }
            self.optimize(self.artificial)?;
            if -self.tableau[(m, rhs)] > SIMPLEX_TOLERANCE * 1e2 * scale {
                return None;
            }
            self.evict();
        }
        for j in 0..=rhs {
            self.tableau[(m, j)] = costs.get(j).copied().unwrap_or(0.);
        }
        for i in 0..m {
            let cb = self.tableau[(m, self.basis[i])];
            if cb != 0. {
                for j in 0..=rhs {
                    self.tableau[(m, j)] -= cb * self.tableau[(i, j)];
                }
            }
        }
        match self.optimize(self.artificial) {
            None => None,
            Some(false) => Some(None),
            Some(true) => {
                let mut y = vec![0.; costs.len()];
                for (i, b) in self.basis.iter().enumerate() {
                    if *b < costs.len() {
                        y[*b] = self.tableau[(i, rhs)].max(0.);
                    }
                }
                Some(Some(y))
            }
        }
    }

    /// Pivot until no column below `allowed` improves the objective.
    /// `Some(true)` at optimum, `Some(false)` if unbounded, `None` if the
    /// pivot budget runs out.
    fn optimize(&mut self, allowed: usize) -> Option<bool> {
        let m = self.basis.len();
        let rhs = self.tableau.cols() - 1;
        for _ in 0..MAX_PIVOTS {
            let Some(e) = (0..allowed).find(|j| self.tableau[(m, *j)] < -SIMPLEX_TOLERANCE) else {
                return Some(true);
            };
            let leaving = (0..m)
                .filter(|i| self.tableau[(*i, e)] > SIMPLEX_TOLERANCE)
                .map(|i| (i, self.tableau[(i, rhs)] / self.tableau[(i, e)]))
                .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
                    Some((b, rb))
                        if rb < r - SIMPLEX_TOLERANCE
                            || ((rb - r).abs() <= SIMPLEX_TOLERANCE
                                && self.basis[b] < self.basis[i]) =>
                    {
                        best
                    }
                    _ => Some((i, r)),
                });
            match leaving {
                None => return Some(false),
                Some((l, _)) => self.pivot(l, e),
            }
        }
        log::warn!("simplex pivot budget exhausted after {} pivots", MAX_PIVOTS);
        None
    }

    /// Move artificial variables out of the basis after phase one. Rows
    /// with no structural or slack entry are redundant and keep theirs.
    fn evict(&mut self) {
        for i in 0..self.basis.len() {
            if self.basis[i] >= self.artificial {
                if let Some(j) =
                    (0..self.artificial).find(|j| self.tableau[(i, *j)].abs() > SIMPLEX_TOLERANCE)
                {
                    self.pivot(i, j);
                }
            }
        }
    }

    fn pivot(&mut self, r: usize, c: usize) {
        let p = self.tableau[(r, c)];
        self.tableau.row_mut(r).iter_mut().for_each(|x| *x /= p);
        let ref pivot = self.tableau.row(r).to_vec();
        for i in (0..self.tableau.rows()).filter(|i| *i != r) {
            let f = self.tableau[(i, c)];
            if f != 0. {
                self.tableau
                    .row_mut(i)
                    .iter_mut()
                    .zip(pivot)
                    .for_each(|(x, p)| *x -= f * p);
            }
        }
        self.basis[r] = c;
    }
}
