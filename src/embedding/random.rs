use super::*;

/// Standard-normal noise. A floor for comparing the other methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct Random;

impl Embed for Random {
    fn embed(&self, features: &Matrix, dim: usize, rng: &mut SmallRng) -> anyhow::Result<Matrix> {
        Ok(Matrix::from_fn(features.rows(), dim, |_, _| crate::gaussian(rng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn ignores_features_but_keeps_rows() {
        let x = Matrix::zeros(50, 3);
        let ref mut rng = SmallRng::seed_from_u64(3);
        let y = Random.embed(&x, 8, rng).unwrap();
        assert_eq!((y.rows(), y.cols()), (50, 8));
        assert!(y.spread() > 0.);
    }

    #[test]
    fn reproducible_from_seed() {
        let x = Matrix::zeros(5, 1);
        let ref mut a = SmallRng::seed_from_u64(3);
        let ref mut b = SmallRng::seed_from_u64(3);
        assert_eq!(Random.embed(&x, 2, a).unwrap(), Random.embed(&x, 2, b).unwrap());
    }
}
