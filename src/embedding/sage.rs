use super::*;
use crate::DesignError;
use crate::SAGE_EPOCHS;
use crate::SAGE_HIDDEN;
use crate::SAGE_LEARNING_RATE;
use crate::SAGE_MARGIN;
use crate::SAGE_NEGATIVES;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

/// Learned graph embedding hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    pub graph: GraphConfig,
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub negatives: usize,
    pub margin: f64,
}

impl Default for SageConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            hidden: SAGE_HIDDEN,
            epochs: SAGE_EPOCHS,
            learning_rate: SAGE_LEARNING_RATE,
            negatives: SAGE_NEGATIVES,
            margin: SAGE_MARGIN,
        }
    }
}

/// Two-layer neighbourhood aggregation model trained with a contrastive
/// objective over the k-NN graph.
///
/// Each layer concatenates a unit's representation with the mean of its
/// neighbours' and applies an affine map. Layer one is followed by a ReLU,
/// layer two by L2 normalization, so embeddings live on the unit sphere.
///
/// The loss pulls adjacent units together (mean squared distance over
/// edges) and pushes randomly drawn non-adjacent partners at least
/// `margin` apart (squared hinge). Training is full-batch Adam.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sage {
    pub config: SageConfig,
}

impl Sage {
    /// cap on positive pairs per epoch
    const POSITIVES: usize = 10_000;

    /// Train on `features` and return the embedding with the loss per epoch.
    pub fn train(&self, features: &Matrix, dim: usize, rng: &mut SmallRng) -> anyhow::Result<(Matrix, Vec<f64>)> {
        if !features.is_finite() {
            return Err(DesignError::NonFinite("gnn features").into());
        }
        let n = features.rows();
        let ref graph = Neighborhood::new(features, self.config.graph.k(n));
        let ref edges = graph.edges();
        let mut network = Network {
            graph,
            input: Dense::new(2 * features.cols(), self.config.hidden, rng),
            output: Dense::new(2 * self.config.hidden, dim, rng),
        };
        let mut history = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            let trace = network.forward(features);
            let (loss, gradient) = self.loss(&trace.e, graph, edges, rng);
            network.backward(&trace, gradient, epoch + 1, self.config.learning_rate);
            history.push(loss);
            if epoch % 10 == 0 {
                log::debug!("{:<32}{:<32}", format!("gnn epoch {}", epoch), format!("{:.6}", loss));
            }
        }
        log::info!(
            "{:<32}{:<32}",
            "gnn trained",
            format!("{:.6}", history.last().copied().unwrap_or(0.))
        );
        Ok((network.forward(features).e, history))
    }

    /// contrastive loss and its gradient with respect to the embeddings
    fn loss(
        &self,
        e: &Matrix,
        graph: &Neighborhood,
        edges: &[(usize, usize)],
        rng: &mut SmallRng,
    ) -> (f64, Matrix) {
        let n = e.rows();
        let mut gradient = Matrix::zeros(n, e.cols());
        let positives = match edges.len() > Self::POSITIVES {
            true => rand::seq::index::sample(rng, edges.len(), Self::POSITIVES)
                .into_iter()
                .map(|i| edges[i])
                .collect::<Vec<_>>(),
            false => edges.to_vec(),
        };
        if positives.is_empty() {
            return (0., gradient);
        }
        let p = positives.len() as f64;
        let mut pull = 0.;
        for (i, j) in positives.iter().copied() {
            for c in 0..e.cols() {
                let delta = e[(i, c)] - e[(j, c)];
                pull += delta * delta / p;
                gradient[(i, c)] += 2. * delta / p;
                gradient[(j, c)] -= 2. * delta / p;
            }
        }
        let rounds = self.config.negatives.max(1) as f64;
        let mut push = 0.;
        for _ in 0..self.config.negatives {
            let pairs = positives
                .iter()
                .map(|(i, _)| (*i, rng.random_range(0..n)))
                .filter(|(i, r)| !graph.adjacent(*i, *r))
                .collect::<Vec<_>>();
            let valid = pairs.len() as f64 + 1e-6;
            for (i, r) in pairs {
                let d = Self::distance(e.row(i), e.row(r));
                let slack = self.config.margin - d;
                if slack <= 0. {
                    continue;
                }
                push += slack * slack / valid / rounds;
                if d > 0. {
                    for c in 0..e.cols() {
                        let direction = (e[(i, c)] - e[(r, c)]) / d;
                        let g = -2. * slack * direction / valid / rounds;
                        gradient[(i, c)] += g;
                        gradient[(r, c)] -= g;
                    }
                }
            }
        }
        (pull + push, gradient)
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
    }
}

impl Embed for Sage {
    fn embed(&self, features: &Matrix, dim: usize, rng: &mut SmallRng) -> anyhow::Result<Matrix> {
        self.train(features, dim, rng).map(|(e, _)| e)
    }
}

/// Forward activations kept for backpropagation.
struct Trace {
    c1: Matrix,
    z1: Matrix,
    c2: Matrix,
    z2: Matrix,
    norms: Vec<f64>,
    e: Matrix,
}

struct Network<'a> {
    graph: &'a Neighborhood,
    input: Dense,
    output: Dense,
}

impl Network<'_> {
    fn forward(&self, x: &Matrix) -> Trace {
        let c1 = x.concat(&self.graph.aggregate(x));
        let z1 = self.input.forward(&c1);
        let h1 = Matrix::from_fn(z1.rows(), z1.cols(), |i, j| z1[(i, j)].max(0.));
        let c2 = h1.concat(&self.graph.aggregate(&h1));
        let z2 = self.output.forward(&c2);
        let norms = (0..z2.rows())
            .map(|i| z2.row(i).iter().map(|x| x * x).sum::<f64>().sqrt().max(1e-12))
            .collect::<Vec<f64>>();
        let e = Matrix::from_fn(z2.rows(), z2.cols(), |i, j| z2[(i, j)] / norms[i]);
        Trace { c1, z1, c2, z2, norms, e }
    }

    fn backward(&mut self, trace: &Trace, de: Matrix, t: usize, lr: f64) {
        let ref e = trace.e;
        let dots = (0..e.rows())
            .map(|i| e.row(i).iter().zip(de.row(i)).map(|(a, b)| a * b).sum::<f64>())
            .collect::<Vec<f64>>();
        let dz2 = Matrix::from_fn(e.rows(), e.cols(), |i, j| {
            (de[(i, j)] - e[(i, j)] * dots[i]) / trace.norms[i]
        });
        let dc2 = dz2.matmul(&self.output.w.transpose());
        let hidden = trace.z1.cols();
        let dh1 = dc2.slice(0, hidden);
        let dn1 = self.graph.scatter(&dc2.slice(hidden, 2 * hidden));
        let dz1 = Matrix::from_fn(dh1.rows(), hidden, |i, j| match trace.z1[(i, j)] > 0. {
            true => dh1[(i, j)] + dn1[(i, j)],
            false => 0.,
        });
        self.output.step(&trace.c2, &dz2, t, lr);
        self.input.step(&trace.c1, &dz1, t, lr);
        debug_assert!(trace.z2.is_finite());
    }
}

/// Affine layer with its Adam moments.
struct Dense {
    w: Matrix,
    b: Vec<f64>,
    mw: Matrix,
    vw: Matrix,
    mb: Vec<f64>,
    vb: Vec<f64>,
}

impl Dense {
    const BETA1: f64 = 0.9;
    const BETA2: f64 = 0.999;
    const EPSILON: f64 = 1e-8;

    fn new(fan_in: usize, fan_out: usize, rng: &mut SmallRng) -> Self {
        let bound = 1. / (fan_in.max(1) as f64).sqrt();
        Self {
            w: Matrix::from_fn(fan_in, fan_out, |_, _| rng.random_range(-bound..bound)),
            b: (0..fan_out).map(|_| rng.random_range(-bound..bound)).collect(),
            mw: Matrix::zeros(fan_in, fan_out),
            vw: Matrix::zeros(fan_in, fan_out),
            mb: vec![0.; fan_out],
            vb: vec![0.; fan_out],
        }
    }

    fn forward(&self, c: &Matrix) -> Matrix {
        let mut z = c.matmul(&self.w);
        for i in 0..z.rows() {
            z.row_mut(i).iter_mut().zip(self.b.iter()).for_each(|(z, b)| *z += b);
        }
        z
    }

    /// one Adam update given layer input `c` and output gradient `dz`
    fn step(&mut self, c: &Matrix, dz: &Matrix, t: usize, lr: f64) {
        let gw = c.transpose().matmul(dz);
        let gb = (0..dz.cols()).map(|j| dz.column(j).iter().sum::<f64>()).collect::<Vec<f64>>();
        let correction1 = 1. - Self::BETA1.powi(t as i32);
        let correction2 = 1. - Self::BETA2.powi(t as i32);
        let adam = |p: &mut f64, m: &mut f64, v: &mut f64, g: f64| {
            *m = Self::BETA1 * *m + (1. - Self::BETA1) * g;
            *v = Self::BETA2 * *v + (1. - Self::BETA2) * g * g;
            *p -= lr * (*m / correction1) / ((*v / correction2).sqrt() + Self::EPSILON);
        };
        for i in 0..gw.rows() {
            for j in 0..gw.cols() {
                adam(&mut self.w[(i, j)], &mut self.mw[(i, j)], &mut self.vw[(i, j)], gw[(i, j)]);
            }
        }
        for j in 0..gb.len() {
            adam(&mut self.b[j], &mut self.mb[j], &mut self.vb[j], gb[j]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn blobs(rng: &mut SmallRng) -> Matrix {
        Matrix::from(
            (0..24)
                .map(|i| if i < 12 { -2. } else { 2. })
                .map(|center| {
                    vec![
                        center + 0.1 * crate::gaussian(rng),
                        center + 0.1 * crate::gaussian(rng),
                        0.1 * crate::gaussian(rng),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn config() -> SageConfig {
        SageConfig {
            graph: GraphConfig { k: 5 },
            hidden: 16,
            epochs: 60,
            ..SageConfig::default()
        }
    }

    #[test]
    fn negatives_skip_graph_neighbours() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        let e = Matrix::from_fn(6, 2, |i, c| 0.01 * (i + c) as f64);
        let sage = Sage { config: config() };
        let pull = |edges: &[(usize, usize)]| {
            edges
                .iter()
                .map(|(i, j)| Sage::distance(e.row(*i), e.row(*j)).powi(2))
                .sum::<f64>()
                / edges.len() as f64
        };
        // every unit neighbours every other, so no negative survives
        let ref complete = Neighborhood::new(&e, 6);
        let ref edges = complete.edges();
        assert_eq!(edges.len(), 30);
        let (loss, _) = sage.loss(&e, complete, edges, rng);
        assert!((loss - pull(edges)).abs() < 1e-12);
        // a sparse graph leaves close non-neighbours inside the margin
        let ref sparse = Neighborhood::new(&e, 2);
        let ref edges = sparse.edges();
        let (loss, _) = sage.loss(&e, sparse, edges, rng);
        assert!(loss > pull(edges) + 0.1);
    }

    #[test]
    fn embeddings_are_unit_norm() {
        let ref mut rng = SmallRng::seed_from_u64(11);
        let x = blobs(rng);
        let y = Sage { config: config() }.embed(&x, 4, rng).unwrap();
        assert_eq!((y.rows(), y.cols()), (24, 4));
        for i in 0..y.rows() {
            let norm = y.row(i).iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.).abs() < 1e-9);
        }
    }

    #[test]
    fn training_reduces_loss() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        let x = blobs(rng);
        let (_, history) = Sage { config: config() }.train(&x, 4, rng).unwrap();
        let head = history[..5].iter().sum::<f64>() / 5.;
        let tail = history[history.len() - 5..].iter().sum::<f64>() / 5.;
        assert!(tail < head);
    }

    #[test]
    fn neighbours_end_closer_than_strangers() {
        let ref mut rng = SmallRng::seed_from_u64(9);
        let x = blobs(rng);
        let y = Sage { config: config() }.embed(&x, 4, rng).unwrap();
        let d = |i: usize, j: usize| Sage::distance(y.row(i), y.row(j));
        let within = (0..12).flat_map(|i| (0..12).map(move |j| (i, j))).map(|(i, j)| d(i, j)).sum::<f64>() / 144.;
        let across = (0..12).flat_map(|i| (12..24).map(move |j| (i, j))).map(|(i, j)| d(i, j)).sum::<f64>() / 144.;
        assert!(within < across);
    }

    #[test]
    fn reproducible_from_seed() {
        let ref mut rng = SmallRng::seed_from_u64(2);
        let x = blobs(rng);
        let sage = Sage { config: config() };
        let a = sage.embed(&x, 3, &mut SmallRng::seed_from_u64(4)).unwrap();
        let b = sage.embed(&x, 3, &mut SmallRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }
}
