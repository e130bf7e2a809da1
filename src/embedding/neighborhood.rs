use crate::GRAPH_NEIGHBORS;
use crate::Matrix;
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use serde::Serialize;

/// k-NN graph hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// neighbours per unit, the unit itself included; capped at `n - 1`
    pub k: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { k: GRAPH_NEIGHBORS }
    }
}

impl GraphConfig {
    pub fn k(&self, n: usize) -> usize {
        self.k.min(n.saturating_sub(1))
    }
}

/// Directed k-nearest-neighbour connectivity graph over units.
///
/// Node `i` is unit `i`. Each node has an edge to itself and to its
/// `k - 1` nearest other units by Euclidean distance (ties by index).
pub struct Neighborhood {
    graph: DiGraph<usize, ()>,
}

impl Neighborhood {
    pub fn new(points: &Matrix, k: usize) -> Self {
        let n = points.rows();
        let mut graph = DiGraph::with_capacity(n, n * k);
        let nodes = (0..n).map(|i| graph.add_node(i)).collect::<Vec<NodeIndex>>();
        for i in 0..n {
            let mut others = (0..n)
                .filter(|j| *j != i)
                .map(|j| (j, Self::distance(points.row(i), points.row(j))))
                .collect::<Vec<(usize, f64)>>();
            others.sort_by(|(a, x), (b, y)| x.total_cmp(y).then(a.cmp(b)));
            if k > 0 {
                graph.add_edge(nodes[i], nodes[i], ());
            }
            others
                .into_iter()
                .take(k.saturating_sub(1))
                .for_each(|(j, _)| {
                    graph.add_edge(nodes[i], nodes[j], ());
                });
        }
        Self { graph }
    }

    fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
    }

    pub fn n(&self) -> usize {
        self.graph.node_count()
    }
    /// out-neighbours of `i`, itself included
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(i))
            .map(|x| self.graph[x])
    }
    pub fn degree(&self, i: usize) -> usize {
        self.neighbors(i).count()
    }
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        self.graph
            .contains_edge(NodeIndex::new(i), NodeIndex::new(j))
    }
    /// all `(i, j)` edges excluding self loops
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a], self.graph[b]))
            .filter(|(a, b)| a != b)
            .collect()
    }
    /// symmetrized adjacency `(A + Aᵀ) / 2`, self loops included
    pub fn affinity(&self) -> Matrix {
        let n = self.n();
        let mut a = Matrix::zeros(n, n);
        for i in 0..n {
            for j in self.neighbors(i) {
                a[(i, j)] += 0.5;
                a[(j, i)] += 0.5;
            }
        }
        a
    }
    /// row `i` is the mean of `h` over the neighbours of `i`
    pub fn aggregate(&self, h: &Matrix) -> Matrix {
        let mut out = Matrix::zeros(h.rows(), h.cols());
        for i in 0..self.n() {
            let degree = self.degree(i).max(1) as f64;
            for j in self.neighbors(i) {
                for c in 0..h.cols() {
                    out[(i, c)] += h[(j, c)] / degree;
                }
            }
        }
        out
    }
    /// adjoint of [`Neighborhood::aggregate`]: routes row gradients back to neighbours
    pub fn scatter(&self, g: &Matrix) -> Matrix {
        let mut out = Matrix::zeros(g.rows(), g.cols());
        for i in 0..self.n() {
            let degree = self.degree(i).max(1) as f64;
            for j in self.neighbors(i) {
                for c in 0..g.cols() {
                    out[(j, c)] += g[(i, c)] / degree;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Matrix {
        Matrix::from(vec![vec![0.], vec![1.], vec![3.], vec![10.]])
    }

    #[test]
    fn includes_self_and_nearest() {
        let graph = Neighborhood::new(&line(), 2);
        assert!(graph.adjacent(0, 0));
        assert!(graph.adjacent(0, 1));
        assert!(!graph.adjacent(0, 2));
        assert!(graph.adjacent(3, 2));
        assert_eq!(graph.degree(2), 2);
        assert_eq!(graph.edges().len(), 4);
    }

    #[test]
    fn affinity_is_symmetric() {
        let a = Neighborhood::new(&line(), 3).affinity();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(a[(i, j)], a[(j, i)]);
            }
        }
    }

    #[test]
    fn scatter_is_adjoint_of_aggregate() {
        let graph = Neighborhood::new(&line(), 3);
        let h = Matrix::from(vec![vec![1.], vec![2.], vec![3.], vec![4.]]);
        let g = Matrix::from(vec![vec![0.5], vec![-1.], vec![2.], vec![0.25]]);
        let lhs = graph.aggregate(&h).as_slice().iter().zip(g.as_slice()).map(|(a, b)| a * b).sum::<f64>();
        let rhs = h.as_slice().iter().zip(graph.scatter(&g).as_slice()).map(|(a, b)| a * b).sum::<f64>();
        assert!((lhs - rhs).abs() < 1e-12);
    }
}
