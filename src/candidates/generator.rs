use crate::Agglomerative;
use crate::CLUSTER_JITTER;
use crate::DesignError;
use crate::EMBEDDING_NOISE;
use crate::Embed;
use crate::Linkage;
use crate::Matrix;
use crate::Partition;
use crate::SUPERGEO_FLOOR;
use crate::SUPERGEO_FRACTION;
use crate::Units;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Candidate partition generator.
///
/// Holds the unit store and its embedding (row-aligned, read-only) and
/// clusters the embedding into supergeo partitions.
pub struct Generator<'a> {
    units: &'a Units,
    embedding: Matrix,
}

impl<'a> Generator<'a> {
    /// Embed the normalized unit features with `embedder`.
    pub fn new(
        units: &'a Units,
        embedder: &impl Embed,
        dim: usize,
        rng: &mut SmallRng,
    ) -> anyhow::Result<Self> {
        let embedding = embedder.embed(&units.normalized(), dim, rng)?;
        Self::from_embedding(units, embedding)
    }

    /// Use a precomputed embedding.
    pub fn from_embedding(units: &'a Units, embedding: Matrix) -> anyhow::Result<Self> {
        if embedding.rows() != units.len() {
            return Err(DesignError::EmbeddingShape {
                rows: embedding.rows(),
                units: units.len(),
            }
            .into());
        }
        Ok(Self { units, embedding })
    }

    pub fn units(&self) -> &Units {
        self.units
    }
    pub fn embedding(&self) -> &Matrix {
        &self.embedding
    }

    /// Roughly a tenth of the units, at least [`SUPERGEO_FLOOR`], at most all of them.
    pub fn default_target(n: usize) -> usize {
        ((n as f64 * SUPERGEO_FRACTION).round() as usize)
            .max(SUPERGEO_FLOOR)
            .min(n)
    }

    /// Cluster the embedding into exactly `target` supergeos with Ward linkage.
    pub fn generate_supergeos(&self, target: usize) -> anyhow::Result<Partition> {
        let n = self.units.len();
        if target < 2 || target > n {
            return Err(DesignError::ClusterCount { k: target, n }.into());
        }
        log::info!("{:<32}{:<32}", "clustering supergeos", target);
        let labels = Agglomerative::new(target, Linkage::Ward).labels(&self.embedding)?;
        Ok(Partition::from_labels(self.units, &labels))
    }

    /// Produce `count` independent partitions for diversity.
    ///
    /// Partition `i` uses linkage [`Linkage::nth`]`(i)`, a cluster count
    /// jittered by up to ±10% and clamped to `[2, n / 2]`, and for `i > 0`
    /// an embedding perturbed by Gaussian noise at 5% of each column's
    /// standard deviation. A slot whose clustering fails falls back to the
    /// unperturbed Ward partition at `target`.
    pub fn generate_candidate_partitions(
        &self,
        count: usize,
        target: usize,
        seed: u64,
    ) -> anyhow::Result<Vec<Partition>> {
        let n = self.units.len();
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let ref scales = self
            .embedding
            .stds()
            .into_iter()
            .map(|s| s * EMBEDDING_NOISE)
            .collect::<Vec<f64>>();
        let mut partitions = Vec::with_capacity(count);
        for i in 0..count {
            let linkage = Linkage::nth(i);
            let jitter = rng.random_range(-CLUSTER_JITTER..CLUSTER_JITTER);
            let k = ((target as f64 * (1. + jitter)) as usize).min(n / 2).max(2);
            let points = match i {
                0 => self.embedding.clone(),
                _ => Matrix::from_fn(self.embedding.rows(), self.embedding.cols(), |r, c| {
                    self.embedding[(r, c)] + crate::gaussian(rng) * scales[c]
                }),
            };
            log::debug!("{:<32}{:<32}", format!("candidate {} {}", i, linkage), k);
            let partition = match Agglomerative::new(k, linkage).labels(&points) {
                Ok(labels) => Partition::from_labels(self.units, &labels),
                Err(e) => {
                    log::warn!(
                        "candidate {} failed with {} linkage at k={}: {}; using ward at k={}",
                        i,
                        linkage,
                        k,
                        e,
                        target
                    );
                    self.generate_supergeos(target)?
                }
            };
            debug_assert!(partition.check(self.units));
            partitions.push(partition);
        }
        log::info!("{:<32}{:<32}", "candidate partitions", partitions.len());
        Ok(partitions)
    }
}
