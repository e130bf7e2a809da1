use super::*;

/// Configured embedding strategy, one variant per [`Method`].
#[derive(Debug, Clone, Copy)]
pub enum Embedder {
    Pca(Pca),
    Spectral(Spectral),
    Sage(Sage),
    Random(Random),
}

impl Embedder {
    pub fn method(&self) -> Method {
        match self {
            Self::Pca(_) => Method::Pca,
            Self::Spectral(_) => Method::Spectral,
            Self::Sage(_) => Method::Gnn,
            Self::Random(_) => Method::Random,
        }
    }
}

impl From<(Method, GraphConfig, SageConfig)> for Embedder {
    fn from((method, graph, sage): (Method, GraphConfig, SageConfig)) -> Self {
        match method {
            Method::Pca => Self::Pca(Pca),
            Method::Spectral => Self::Spectral(Spectral { graph }),
            Method::Gnn => Self::Sage(Sage { config: sage }),
            Method::Random => Self::Random(Random),
        }
    }
}

impl From<Method> for Embedder {
    fn from(method: Method) -> Self {
        Self::from((method, GraphConfig::default(), SageConfig::default()))
    }
}

impl Embed for Embedder {
    fn embed(&self, features: &Matrix, dim: usize, rng: &mut SmallRng) -> anyhow::Result<Matrix> {
        log::info!("{:<32}{:<32}", "embedding units", self.method());
        let embedding = match self {
            Self::Pca(x) => x.embed(features, dim, rng),
            Self::Spectral(x) => x.embed(features, dim, rng),
            Self::Sage(x) => x.embed(features, dim, rng),
            Self::Random(x) => x.embed(features, dim, rng),
        }?;
        debug_assert!(embedding.rows() == features.rows());
        log::info!(
            "{:<32}{:<32}",
            "embedding spread",
            format!("{:.6}", embedding.spread())
        );
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn every_method_keeps_row_alignment() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let x = Matrix::from_fn(15, 4, |i, j| ((i * 7 + j * 3) % 11) as f64).standardize();
        for method in [Method::Pca, Method::Spectral, Method::Gnn, Method::Random] {
            let mut sage = SageConfig::default();
            sage.epochs = 5;
            let embedder = Embedder::from((method, GraphConfig::default(), sage));
            let y = embedder.embed(&x, 3, rng).unwrap();
            assert_eq!(y.rows(), 15, "{}", method);
            assert_eq!(y.cols(), 3, "{}", method);
            assert!(y.is_finite(), "{}", method);
        }
    }
}
