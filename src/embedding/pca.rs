use super::*;
use crate::DesignError;
use nalgebra::DMatrix;
use nalgebra::SymmetricEigen;

/// Principal-component rotation of the feature matrix.
///
/// Deterministic: components are ordered by explained variance and each
/// score column is oriented so its largest-magnitude entry is positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pca;

impl Embed for Pca {
    fn embed(&self, features: &Matrix, dim: usize, _: &mut SmallRng) -> anyhow::Result<Matrix> {
        if !features.is_finite() {
            return Err(DesignError::NonFinite("pca features").into());
        }
        let n = features.rows();
        let d = features.cols();
        let m = dim.min(d).min(n);
        let ref means = features.means();
        let ref centered = DMatrix::from_fn(n, d, |i, j| features[(i, j)] - means[j]);
        let covariance = centered.transpose() * centered / (n.max(2) - 1) as f64;
        let eigen = SymmetricEigen::new(covariance);
        let mut order = (0..d).collect::<Vec<usize>>();
        order.sort_by(|a, b| {
            let (x, y) = (eigen.eigenvalues[*a], eigen.eigenvalues[*b]);
            y.total_cmp(&x).then(a.cmp(b))
        });
        let components = DMatrix::from_fn(d, m, |r, c| eigen.eigenvectors[(r, order[c])]);
        log::debug!("{:<32}{:<32}", "pca components", m);
        Ok(Matrix::from(centered * components).oriented())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bounded_by_feature_count() {
        let x = Matrix::from(vec![
            vec![1., 2., 0.],
            vec![2., 1., 1.],
            vec![3., 5., 0.],
            vec![4., 3., 1.],
        ]);
        let ref mut rng = SmallRng::seed_from_u64(0);
        let y = Pca.embed(&x, 32, rng).unwrap();
        assert_eq!((y.rows(), y.cols()), (4, 3));
    }

    #[test]
    fn first_component_dominates_variance() {
        let x = Matrix::from(vec![
            vec![-2., -2.1],
            vec![-1., -0.9],
            vec![0., 0.1],
            vec![1., 1.0],
            vec![2., 1.9],
        ]);
        let ref mut rng = SmallRng::seed_from_u64(0);
        let y = Pca.embed(&x, 2, rng).unwrap();
        let variances = y.stds().iter().map(|s| s * s).collect::<Vec<_>>();
        assert!(variances[0] > 50. * variances[1]);
    }

    #[test]
    fn deterministic() {
        let x = Matrix::from(vec![vec![1., 0.], vec![0., 1.], vec![2., 3.]]);
        let ref mut a = SmallRng::seed_from_u64(1);
        let ref mut b = SmallRng::seed_from_u64(2);
        assert_eq!(Pca.embed(&x, 2, a).unwrap(), Pca.embed(&x, 2, b).unwrap());
    }
}
