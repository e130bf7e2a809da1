use super::*;
use crate::DesignError;
use crate::Matrix;

/// Bottom-up hierarchical clustering cut at exactly `k` clusters.
///
/// Starts from singletons and repeatedly merges the closest pair of
/// clusters under the chosen [`Linkage`], updating dissimilarities with
/// the Lance–Williams recurrence. Each active cluster caches its nearest
/// neighbour so a merge only rescans rows whose neighbour changed.
#[derive(Debug, Clone, Copy)]
pub struct Agglomerative {
    k: usize,
    linkage: Linkage,
}

impl Agglomerative {
    pub fn new(k: usize, linkage: Linkage) -> Self {
        Self { k, linkage }
    }
    pub fn k(&self) -> usize {
        self.k
    }
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// One label in `0..k` per row of `points`.
    pub fn labels(&self, points: &Matrix) -> anyhow::Result<Vec<usize>> {
        let n = points.rows();
        if self.k == 0 || self.k > n {
            return Err(DesignError::ClusterCount { k: self.k, n }.into());
        }
        if !points.is_finite() {
            return Err(DesignError::NonFinite("clustering input").into());
        }
        let mut d = Matrix::from_fn(n, n, |i, j| {
            self.linkage.dissimilarity(points.row(i), points.row(j))
        });
        let mut active = vec![true; n];
        let mut sizes = vec![1usize; n];
        let mut owner = (0..n).collect::<Vec<usize>>();
        let mut nearest = (0..n)
            .map(|i| Self::nearest(&d, &active, i))
            .collect::<Vec<Option<(usize, f64)>>>();
        for _ in 0..n - self.k {
            let (i, j) = Self::closest(&nearest, &active);
            let (ni, nj) = (sizes[i] as f64, sizes[j] as f64);
            let dij = d[(i, j)];
            active[j] = false;
            for r in (0..n).filter(|r| active[*r] && *r != i) {
                let nr = sizes[r] as f64;
                let merged = self.linkage.update(d[(r, i)], d[(r, j)], dij, ni, nj, nr);
                d[(r, i)] = merged;
                d[(i, r)] = merged;
            }
            sizes[i] += sizes[j];
            owner.iter_mut().filter(|o| **o == j).for_each(|o| *o = i);
            for r in (0..n).filter(|r| active[*r]) {
                nearest[r] = match nearest[r] {
                    _ if r == i => Self::nearest(&d, &active, r),
                    Some((m, _)) if m == i || m == j => Self::nearest(&d, &active, r),
                    Some((m, dm)) if d[(r, i)] < dm || (d[(r, i)] == dm && i < m) => {
                        Some((i, d[(r, i)]))
                    }
                    other => other,
                };
            }
            nearest[j] = None;
        }
        let mut roots = owner.clone();
        roots.sort();
        roots.dedup();
        Ok(owner
            .iter()
            .map(|o| roots.binary_search(o).unwrap_or_default())
            .collect())
    }

    /// nearest active cluster to `i`, lowest index on ties
    fn nearest(d: &Matrix, active: &[bool], i: usize) -> Option<(usize, f64)> {
        (0..active.len())
            .filter(|j| active[*j] && *j != i)
            .map(|j| (j, d[(i, j)]))
            .fold(None, |best, (j, x)| match best {
                Some((_, b)) if b <= x => best,
                _ => Some((j, x)),
            })
    }

    /// globally closest active pair as `(survivor, absorbed)`
    fn closest(nearest: &[Option<(usize, f64)>], active: &[bool]) -> (usize, usize) {
        nearest
            .iter()
            .enumerate()
            .filter(|(r, _)| active[*r])
            .filter_map(|(r, x)| x.map(|(m, dm)| (r.min(m), r.max(m), dm)))
            .fold(None, |best: Option<(usize, usize, f64)>, (a, b, x)| match best {
                Some((_, _, y)) if y <= x => best,
                _ => Some((a, b, x)),
            })
            .map(|(a, b, _)| (a, b))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> Matrix {
        Matrix::from(vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.2],
            vec![-5.0, 8.0],
            vec![10.2, 9.9],
            vec![-5.1, 8.2],
            vec![0.2, -0.1],
            vec![9.8, 10.1],
            vec![-4.9, 7.9],
        ])
    }

    #[test]
    fn recovers_separated_blobs_under_every_linkage() {
        for linkage in Linkage::ALL {
            let labels = Agglomerative::new(3, linkage).labels(&three_blobs()).unwrap();
            assert_eq!(labels[0], labels[2], "{}", linkage);
            assert_eq!(labels[0], labels[6], "{}", linkage);
            assert_eq!(labels[1], labels[4], "{}", linkage);
            assert_eq!(labels[1], labels[7], "{}", linkage);
            assert_eq!(labels[3], labels[5], "{}", linkage);
            assert_eq!(labels[3], labels[8], "{}", linkage);
            assert_ne!(labels[0], labels[1], "{}", linkage);
            assert_ne!(labels[0], labels[3], "{}", linkage);
            assert_ne!(labels[1], labels[3], "{}", linkage);
        }
    }

    #[test]
    fn produces_exactly_k_labels() {
        let points = Matrix::from_fn(30, 2, |i, j| ((i * 13 + j * 7) % 17) as f64);
        for k in [1, 2, 5, 30] {
            let mut labels = Agglomerative::new(k, Linkage::Ward).labels(&points).unwrap();
            labels.sort();
            labels.dedup();
            assert_eq!(labels, (0..k).collect::<Vec<_>>());
        }
    }

    #[test]
    fn rejects_bad_cluster_count() {
        let points = Matrix::zeros(4, 2);
        let err = Agglomerative::new(5, Linkage::Ward).labels(&points).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DesignError>(),
            Some(&DesignError::ClusterCount { k: 5, n: 4 })
        );
        assert!(Agglomerative::new(0, Linkage::Ward).labels(&points).is_err());
    }

    #[test]
    fn rejects_non_finite_points() {
        let points = Matrix::from(vec![vec![0.], vec![f64::NAN]]);
        assert!(Agglomerative::new(1, Linkage::Average).labels(&points).is_err());
    }
}
