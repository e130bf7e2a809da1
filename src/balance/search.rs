use super::*;
use crate::DesignError;
use crate::Imbalance;
use crate::Partition;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::time::Duration;

/// The best partition of a search and its assignment.
#[derive(Debug, Clone)]
pub struct Selection {
    pub index: usize,
    pub solution: Solution,
    pub cost: Imbalance,
    /// context of the winning partition, for later balance queries
    pub balancer: Balancer,
}

/// Multi-partition search.
///
/// Every candidate partition gets a fresh [`Balancer`] and its own
/// generator derived from `(seed, index)`, so partitions are solved in
/// parallel and the result does not depend on evaluation order.
pub struct Search<'a> {
    weights: &'a Weights,
}

impl<'a> Search<'a> {
    pub fn new(weights: &'a Weights) -> Self {
        Self { weights }
    }

    /// Solve every partition and keep the one with the lowest raw-scale
    /// cost. Ties keep the lowest index. Partitions that fail to solve are
    /// logged and skipped.
    pub fn run(
        &self,
        partitions: &[Partition],
        n_treatment: usize,
        n_control: usize,
        time_limit: Duration,
        seed: u64,
    ) -> anyhow::Result<Selection> {
        log::info!("{:<32}{:<32}", "searching partitions", partitions.len());
        partitions
            .par_iter()
            .enumerate()
            .map(|(index, partition)| {
                let balancer = Balancer::new(partition.supergeos(), self.weights);
                let ref mut rng = SmallRng::seed_from_u64(seed.wrapping_add(index as u64));
                match balancer.solve(n_treatment, n_control, time_limit, rng) {
                    Ok(solution) => {
                        let cost = balancer.cost(solution.treatment());
                        log::debug!(
                            "{:<32}{:<32}",
                            format!("partition {} {}", index, solution.status()),
                            format!("{:.6}", cost)
                        );
                        Some(Selection {
                            index,
                            solution,
                            cost,
                            balancer,
                        })
                    }
                    Err(e) => {
                        log::warn!("partition {} skipped: {}", index, e);
                        None
                    }
                }
            })
            .collect::<Vec<Option<Selection>>>()
            .into_iter()
            .flatten()
            .fold(None, |best: Option<Selection>, next| match best {
                Some(best) if best.cost <= next.cost => Some(best),
                _ => Some(next),
            })
            .inspect(|s| log::info!("{:<32}{:<32}", "selected partition", s.index))
            .ok_or_else(|| DesignError::NoFeasiblePartition(partitions.len()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoUnit;
    use crate::Supergeo;
    use std::collections::BTreeMap;

    const BUDGET: Duration = Duration::from_secs(10);

    fn partition(values: &[(f64, f64)]) -> Partition {
        values
            .iter()
            .enumerate()
            .map(|(i, (response, income))| {
                let id = format!("u{}", i);
                let unit = GeoUnit::new(
                    id.as_str(),
                    *response,
                    1.,
                    BTreeMap::from([("income".to_string(), *income)]),
                );
                Supergeo::aggregate(format!("sg_{}", i), &[&unit], &["income".to_string()])
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn poor() -> Partition {
        partition(&[(1., 10.), (100., 20.), (1000., 5.), (10000., 90.)])
    }
    fn balanced() -> Partition {
        partition(&[(10., 30.), (10., 30.), (20., 60.), (20., 60.)])
    }

    #[test]
    fn selects_the_balanced_partition() {
        let ref weights = Weights::default();
        let partitions = vec![poor(), balanced()];
        let selection = Search::new(weights).run(&partitions, 2, 2, BUDGET, 0).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.cost, 0.);
        assert_eq!(selection.balancer.supergeos(), balanced().supergeos());
    }

    #[test]
    fn cost_is_a_minimum_over_independent_solves() {
        let ref weights = Weights::default();
        let partitions = vec![poor(), balanced(), poor()];
        let selection = Search::new(weights).run(&partitions, 2, 2, BUDGET, 3).unwrap();
        for (i, partition) in partitions.iter().enumerate() {
            let balancer = Balancer::new(partition.supergeos(), weights);
            let ref mut rng = SmallRng::seed_from_u64(3 + i as u64);
            let solution = balancer.solve(2, 2, BUDGET, rng).unwrap();
            assert!(selection.cost <= balancer.cost(solution.treatment()));
        }
    }

    #[test]
    fn ties_keep_the_lowest_index() {
        let ref weights = Weights::default();
        let partitions = vec![balanced(), balanced(), balanced()];
        let selection = Search::new(weights).run(&partitions, 2, 2, BUDGET, 0).unwrap();
        assert_eq!(selection.index, 0);
    }

    #[test]
    fn failing_partitions_are_skipped() {
        let ref weights = Weights::default();
        let small = partition(&[(1., 1.), (2., 2.)]);
        let partitions = vec![small.clone(), balanced()];
        let selection = Search::new(weights).run(&partitions, 2, 2, BUDGET, 0).unwrap();
        assert_eq!(selection.index, 1);
        let err = Search::new(weights)
            .run(&[small], 2, 2, BUDGET, 0)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DesignError>(),
            Some(&DesignError::NoFeasiblePartition(1))
        );
    }
}
