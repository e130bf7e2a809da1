use super::*;
use crate::DesignError;
use nalgebra::DMatrix;
use nalgebra::SymmetricEigen;

/// Laplacian eigenmap of the k-NN affinity graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spectral {
    pub graph: GraphConfig,
}

impl Spectral {
    /// `I - D^-1/2 W D^-1/2` with the diagonal of `W` ignored
    fn laplacian(affinity: &Matrix) -> (DMatrix<f64>, Vec<f64>) {
        let n = affinity.rows();
        let w = Matrix::from_fn(n, n, |i, j| if i == j { 0. } else { affinity[(i, j)] });
        let roots = (0..n)
            .map(|i| w.row(i).iter().sum::<f64>())
            .map(|d| d.max(f64::MIN_POSITIVE).sqrt())
            .collect::<Vec<f64>>();
        let laplacian = DMatrix::from_fn(n, n, |i, j| {
            let identity = if i == j { 1. } else { 0. };
            identity - w[(i, j)] / (roots[i] * roots[j])
        });
        (laplacian, roots)
    }
}

impl Embed for Spectral {
    fn embed(&self, features: &Matrix, dim: usize, _: &mut SmallRng) -> anyhow::Result<Matrix> {
        if !features.is_finite() {
            return Err(DesignError::NonFinite("spectral features").into());
        }
        let n = features.rows();
        let k = self.graph.k(n);
        let m = dim.min(n.saturating_sub(1));
        let ref affinity = Neighborhood::new(features, k).affinity();
        let (laplacian, ref roots) = Self::laplacian(affinity);
        let eigen = SymmetricEigen::new(laplacian);
        let mut order = (0..n).collect::<Vec<usize>>();
        order.sort_by(|a, b| {
            let (x, y) = (eigen.eigenvalues[*a], eigen.eigenvalues[*b]);
            x.total_cmp(&y).then(a.cmp(b))
        });
        log::debug!("{:<32}{:<32}", "spectral neighbors", k);
        // drop the trivial eigenvector, rescale by inverse sqrt degree
        Ok(Matrix::from_fn(n, m, |i, c| eigen.eigenvectors[(i, order[c + 1])] / roots[i]).oriented())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn blobs() -> Matrix {
        Matrix::from(
            (0..12)
                .map(|i| match i < 6 {
                    true => vec![i as f64 * 0.01, 0.],
                    false => vec![5. + i as f64 * 0.01, 5.],
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn shape_is_capped_by_units() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let spectral = Spectral::default();
        let y = spectral.embed(&blobs(), 32, rng).unwrap();
        assert_eq!((y.rows(), y.cols()), (12, 11));
        assert!(y.is_finite());
    }

    #[test]
    fn fiedler_vector_orders_a_chain() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let chain = Matrix::from((0..10).map(|i| vec![i as f64]).collect::<Vec<_>>());
        let spectral = Spectral {
            graph: GraphConfig { k: 3 },
        };
        let y = spectral.embed(&chain, 1, rng).unwrap();
        let values = y.column(0);
        let rising = values.windows(2).all(|w| w[0] < w[1]);
        let falling = values.windows(2).all(|w| w[0] > w[1]);
        assert!(rising || falling);
    }
}
