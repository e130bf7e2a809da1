/// Constraint direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `a·x = b`
    Eq,
    /// `a·x ≤ b`
    Le,
}

/// One linear constraint row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coefficients: Vec<f64>,
    pub sense: Sense,
    pub rhs: f64,
}

/// `minimize c·x` subject to linear rows, variable bounds and integrality.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    objective: Vec<f64>,
    rows: Vec<Row>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    integer: Vec<bool>,
}

impl Program {
    /// continuous variables in `[0, ∞)`, one per objective coefficient
    pub fn minimize(objective: Vec<f64>) -> Self {
        let n = objective.len();
        Self {
            objective,
            rows: Vec::new(),
            lower: vec![0.; n],
            upper: vec![f64::INFINITY; n],
            integer: vec![false; n],
        }
    }
    pub fn bound(mut self, j: usize, lower: f64, upper: f64) -> Self {
        self.lower[j] = lower;
        self.upper[j] = upper;
        self
    }
    pub fn integral(mut self, j: usize) -> Self {
        self.integer[j] = true;
        self
    }
    pub fn constrain(mut self, coefficients: Vec<f64>, sense: Sense, rhs: f64) -> Self {
        debug_assert!(coefficients.len() == self.objective.len());
        self.rows.push(Row {
            coefficients,
            sense,
            rhs,
        });
        self
    }

    pub fn n(&self) -> usize {
        self.objective.len()
    }
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }
    pub fn integer(&self) -> &[bool] {
        &self.integer
    }
    pub fn value(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, x)| c * x).sum()
    }
    /// whether `x` satisfies every row and bound within `tolerance`
    pub fn feasible(&self, x: &[f64], tolerance: f64) -> bool {
        let bounded = x
            .iter()
            .enumerate()
            .all(|(j, v)| *v >= self.lower[j] - tolerance && *v <= self.upper[j] + tolerance);
        let rows = self.rows.iter().all(|row| {
            let lhs = row.coefficients.iter().zip(x).map(|(a, x)| a * x).sum::<f64>();
            match row.sense {
                Sense::Eq => (lhs - row.rhs).abs() <= tolerance,
                Sense::Le => lhs <= row.rhs + tolerance,
            }
        });
        bounded && rows
    }
}
