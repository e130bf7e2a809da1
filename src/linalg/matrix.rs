use crate::SCALE_EPSILON;
use nalgebra::DMatrix;
use std::ops::Index;
use std::ops::IndexMut;

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.; rows * cols],
        }
    }
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(|x| f(x / cols, x % cols)).collect(),
        }
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self[(i, j)]).collect()
    }
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// column means
    pub fn means(&self) -> Vec<f64> {
        (0..self.cols)
            .map(|j| self.column(j).iter().sum::<f64>() / self.rows.max(1) as f64)
            .collect()
    }
    /// column population standard deviations
    pub fn stds(&self) -> Vec<f64> {
        self.means()
            .iter()
            .enumerate()
            .map(|(j, mu)| {
                self.column(j).iter().map(|x| (x - mu) * (x - mu)).sum::<f64>()
                    / self.rows.max(1) as f64
            })
            .map(f64::sqrt)
            .collect()
    }
    /// zero mean, unit variance per column, epsilon-guarded
    pub fn standardize(&self) -> Self {
        let ref means = self.means();
        let ref stds = self.stds();
        Self::from_fn(self.rows, self.cols, |i, j| {
            (self[(i, j)] - means[j]) / (stds[j] + SCALE_EPSILON)
        })
    }
    /// mean of the per-column variances
    pub fn spread(&self) -> f64 {
        self.stds().iter().map(|s| s * s).sum::<f64>() / self.cols.max(1) as f64
    }

    /// column-major copy for `nalgebra`
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.rows, self.cols, &self.data)
    }
    pub fn transpose(&self) -> Self {
        Self::from(self.to_dmatrix().transpose())
    }
    pub fn matmul(&self, other: &Self) -> Self {
        debug_assert!(self.cols == other.rows);
        Self::from(self.to_dmatrix() * other.to_dmatrix())
    }
    /// `[self | other]`
    pub fn concat(&self, other: &Self) -> Self {
        debug_assert!(self.rows == other.rows);
        Self::from_fn(self.rows, self.cols + other.cols, |i, j| match j < self.cols {
            true => self[(i, j)],
            false => other[(i, j - self.cols)],
        })
    }
    /// flip column signs so each column's largest-magnitude entry is positive
    pub fn oriented(mut self) -> Self {
        for j in 0..self.cols {
            let pivot = self
                .column(j)
                .into_iter()
                .max_by(|x, y| x.abs().total_cmp(&y.abs()))
                .unwrap_or(0.);
            if pivot < 0. {
                (0..self.rows).for_each(|i| self[(i, j)] = -self[(i, j)]);
            }
        }
        self
    }
    /// columns `[from, to)`
    pub fn slice(&self, from: usize, to: usize) -> Self {
        Self::from_fn(self.rows, to - from, |i, j| self[(i, from + j)])
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(m: DMatrix<f64>) -> Self {
        Self::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)])
    }
}

impl From<Vec<Vec<f64>>> for Matrix {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        debug_assert!(rows.iter().all(|r| r.len() == cols), "ragged rows");
        Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardize_centers_and_scales() {
        let m = Matrix::from(vec![vec![1., 10.], vec![2., 10.], vec![3., 10.]]);
        let z = m.standardize();
        assert!(z.means().iter().all(|mu| mu.abs() < 1e-12));
        assert!((z.stds()[0] - 1.).abs() < 1e-5);
        assert_eq!(z.column(1), vec![0., 0., 0.]);
    }

    #[test]
    fn products_keep_row_major_layout() {
        let m = Matrix::from(vec![vec![1., 2., 3.], vec![4., 5., 6.]]);
        let p = Matrix::from(vec![vec![1., 0.], vec![0., 1.], vec![1., 1.]]);
        assert_eq!(m.matmul(&p), Matrix::from(vec![vec![4., 5.], vec![10., 11.]]));
        assert_eq!(m.transpose().row(2), &[3., 6.]);
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(Matrix::from(m.to_dmatrix()), m);
    }

    #[test]
    fn concat_then_slice() {
        let a = Matrix::from(vec![vec![1.], vec![2.]]);
        let b = Matrix::from(vec![vec![3., 4.], vec![5., 6.]]);
        let c = a.concat(&b);
        assert_eq!(c.row(1), &[2., 5., 6.]);
        assert_eq!(c.slice(1, 3), b);
    }
}
