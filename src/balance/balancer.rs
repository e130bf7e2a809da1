use super::*;
use crate::BranchAndBound;
use crate::DesignError;
use crate::Imbalance;
use crate::Matrix;
use crate::Measure;
use crate::Outcome;
use crate::Program;
use crate::RESPONSE;
use crate::SCALE_EPSILON;
use crate::SPEND;
use crate::Sense;
use crate::Supergeo;
use crate::Weight;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::time::Duration;

/// Immutable solver context for one partition.
///
/// Holds the supergeo list, the feature names (response, spend, then
/// covariates in sorted order), the raw feature matrix, its column
/// statistics and the standardized copy used to condition the assignment
/// program. Balance is always reported on the raw scale.
#[derive(Debug, Clone)]
pub struct Balancer {
    supergeos: Vec<Supergeo>,
    features: Vec<String>,
    weights: Vec<Weight>,
    raw: Matrix,
    means: Vec<Measure>,
    stds: Vec<Measure>,
    normalized: Matrix,
}

impl Balancer {
    pub fn new(supergeos: &[Supergeo], weights: &Weights) -> Self {
        let ref covariates = supergeos
            .first()
            .map(|sg| sg.covariates().keys().cloned().collect::<Vec<String>>())
            .unwrap_or_default();
        let features = [RESPONSE.to_string(), SPEND.to_string()]
            .into_iter()
            .chain(covariates.iter().cloned())
            .collect::<Vec<String>>();
        let raw = match supergeos.is_empty() {
            true => Matrix::zeros(0, features.len()),
            false => Matrix::from(
                supergeos
                    .iter()
                    .map(|sg| sg.vector(covariates))
                    .collect::<Vec<Vec<Measure>>>(),
            ),
        };
        let means = raw.means();
        let stds = raw.stds().into_iter().map(|s| s + SCALE_EPSILON).collect::<Vec<_>>();
        let normalized = Matrix::from_fn(raw.rows(), raw.cols(), |i, j| {
            (raw[(i, j)] - means[j]) / stds[j]
        });
        let weights = features.iter().map(|f| weights.get(f)).collect();
        Self {
            supergeos: supergeos.to_vec(),
            features,
            weights,
            raw,
            means,
            stds,
            normalized,
        }
    }

    pub fn supergeos(&self) -> &[Supergeo] {
        &self.supergeos
    }
    pub fn features(&self) -> &[String] {
        &self.features
    }
    pub fn len(&self) -> usize {
        self.supergeos.len()
    }
    pub fn is_empty(&self) -> bool {
        self.supergeos.is_empty()
    }
    pub fn raw(&self) -> &Matrix {
        &self.raw
    }
    pub fn normalized(&self) -> &Matrix {
        &self.normalized
    }
    /// raw column means
    pub fn means(&self) -> &[Measure] {
        &self.means
    }
    /// raw column standard deviations, epsilon included
    pub fn stds(&self) -> &[Measure] {
        &self.stds
    }

    /// The assignment program.
    ///
    /// Variables are one binary indicator per supergeo followed by one
    /// non-negative imbalance per feature. Each imbalance bounds the
    /// absolute deviation of the treatment group's standardized sum from
    /// that feature's total scaled by the treatment fraction.
    pub fn program(&self, n_treatment: usize, n_control: usize) -> Program {
        let n = self.len();
        let k = self.features.len();
        let fraction = n_treatment as f64 / (n_treatment + n_control) as f64;
        let objective = std::iter::repeat_n(0., n)
            .chain(self.weights.iter().copied())
            .collect::<Vec<f64>>();
        let mut program = Program::minimize(objective);
        for i in 0..n {
            program = program.bound(i, 0., 1.).integral(i);
        }
        let cardinality = std::iter::repeat_n(1., n)
            .chain(std::iter::repeat_n(0., k))
            .collect::<Vec<f64>>();
        program = program.constrain(cardinality, Sense::Eq, n_treatment as f64);
        for f in 0..k {
            let ref column = self.normalized.column(f);
            let target = column.iter().sum::<f64>() * fraction;
            let mut above = column.clone();
            let mut below = column.iter().map(|v| -v).collect::<Vec<f64>>();
            above.extend((0..k).map(|j| if j == f { -1. } else { 0. }));
            below.extend((0..k).map(|j| if j == f { -1. } else { 0. }));
            program = program
                .constrain(above, Sense::Le, target)
                .constrain(below, Sense::Le, -target);
        }
        program
    }

    /// Choose exactly `n_treatment` supergeos for treatment.
    ///
    /// `n_control` only sets the treatment fraction of the balance
    /// targets; every unselected supergeo is control. When the program
    /// yields nothing within `time_limit` the assignment is drawn from
    /// `rng` and flagged [`Status::Fallback`].
    pub fn solve(
        &self,
        n_treatment: usize,
        n_control: usize,
        time_limit: Duration,
        rng: &mut SmallRng,
    ) -> anyhow::Result<Solution> {
        let n = self.len();
        if n_treatment + n_control > n || n_treatment + n_control == 0 {
            return Err(DesignError::Cardinality {
                treatment: n_treatment,
                control: n_control,
                n,
            }
            .into());
        }
        log::debug!("{:<32}{:<32}", "solving assignment", format!("{} of {}", n_treatment, n));
        let ref program = self.program(n_treatment, n_control);
        let outcome = BranchAndBound::new(program, time_limit).solve();
        let status = match outcome {
            Outcome::Optimal(_) => Status::Optimal,
            Outcome::TimeLimited(_) => Status::TimeLimited,
            Outcome::Infeasible | Outcome::Exhausted => Status::Fallback,
        };
        let treatment = outcome
            .solution()
            .map(|x| (0..n).filter(|i| x[*i] > 0.5).collect::<Vec<usize>>())
            .filter(|t| t.len() == n_treatment);
        match treatment {
            Some(treatment) => Ok(Solution::new(treatment, status)),
            None => {
                log::warn!(
                    "assignment solve found nothing within {:?} for {} of {} supergeos; drawing at random",
                    time_limit,
                    n_treatment,
                    n
                );
                let treatment = rand::seq::index::sample(rng, n, n_treatment).into_vec();
                Ok(Solution::new(treatment, Status::Fallback))
            }
        }
    }

    /// raw values of feature `f` split into (treatment, control)
    fn groups(&self, treatment: &[usize], f: usize) -> (Vec<Measure>, Vec<Measure>) {
        let mut selected = vec![false; self.len()];
        treatment
            .iter()
            .filter(|i| **i < self.len())
            .for_each(|i| selected[*i] = true);
        let (t, c) = (0..self.len()).partition::<Vec<usize>, _>(|i| selected[*i]);
        (
            t.into_iter().map(|i| self.raw[(i, f)]).collect(),
            c.into_iter().map(|i| self.raw[(i, f)]).collect(),
        )
    }

    /// SMD between treatment and control per feature on the raw scale.
    pub fn evaluate_balance(&self, treatment: &[usize]) -> BTreeMap<String, Imbalance> {
        self.features
            .iter()
            .enumerate()
            .map(|(f, name)| {
                let (t, c) = self.groups(treatment, f);
                (name.clone(), calculate_smd(&t, &c))
            })
            .collect()
    }

    /// weighted sum of absolute raw-scale SMDs
    pub fn cost(&self, treatment: &[usize]) -> Imbalance {
        let ref smd = self.evaluate_balance(treatment);
        self.features
            .iter()
            .zip(self.weights.iter())
            .map(|(name, w)| w * smd[name].abs())
            .sum()
    }

    /// per-feature group means and SMD, with the weighted cost
    pub fn report(&self, treatment: &[usize]) -> Report {
        let mean = |xs: &[Measure]| xs.iter().sum::<Measure>() / xs.len() as Measure;
        let features = self
            .features
            .iter()
            .enumerate()
            .map(|(f, name)| {
                let (t, c) = self.groups(treatment, f);
                FeatureBalance {
                    feature: name.clone(),
                    treatment: mean(&t),
                    control: mean(&c),
                    smd: calculate_smd(&t, &c),
                }
            })
            .collect();
        Report {
            features,
            cost: self.cost(treatment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoUnit;
    use rand::SeedableRng;

    fn supergeo(id: &str, response: f64, spend: f64, income: f64) -> Supergeo {
        let unit = GeoUnit::new(
            id,
            response,
            spend,
            BTreeMap::from([("income".to_string(), income)]),
        );
        Supergeo::aggregate(id, &[&unit], &["income".to_string()])
    }

    fn pairs() -> Vec<Supergeo> {
        vec![
            supergeo("a", 10., 1., 50.),
            supergeo("b", 10., 1., 50.),
            supergeo("c", 20., 2., 70.),
            supergeo("d", 20., 2., 70.),
        ]
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0)
    }

    #[test]
    fn features_are_response_spend_then_covariates() {
        let balancer = Balancer::new(&pairs(), &Weights::default());
        assert_eq!(balancer.features(), &["response", "spend", "income"]);
        assert_eq!(balancer.raw().column(0), vec![10., 10., 20., 20.]);
        assert!(balancer.normalized().means().iter().all(|m| m.abs() < 1e-9));
        assert_eq!(balancer.means()[0], 15.);
        assert!((balancer.stds()[0] - 5.).abs() < 1e-5);
    }

    #[test]
    fn optimal_assignment_splits_the_pairs() {
        let balancer = Balancer::new(&pairs(), &Weights::default());
        let solution = balancer.solve(2, 2, Duration::from_secs(10), &mut rng()).unwrap();
        assert_eq!(solution.status(), Status::Optimal);
        assert_eq!(solution.treatment().len(), 2);
        let t = solution.treatment();
        assert!(t.contains(&0) ^ t.contains(&1));
        assert!(t.contains(&2) ^ t.contains(&3));
        assert_eq!(balancer.cost(t), 0.);
    }

    #[test]
    fn cardinality_holds_on_larger_partitions() {
        let supergeos = (0..10)
            .map(|i| supergeo(&format!("s{}", i), (i * i) as f64, i as f64, (7 * i % 5) as f64))
            .collect::<Vec<_>>();
        let balancer = Balancer::new(&supergeos, &Weights::default());
        for (t, c) in [(3, 7), (5, 5), (2, 4)] {
            let solution = balancer.solve(t, c, Duration::from_secs(10), &mut rng()).unwrap();
            assert_ne!(solution.status(), Status::Fallback);
            assert_eq!(solution.treatment().len(), t);
        }
    }

    #[test]
    fn short_budget_keeps_the_incumbent() {
        use rand::Rng;
        let ref mut draw = SmallRng::seed_from_u64(3);
        let supergeos = (0..40)
            .map(|i| {
                let response = draw.random_range(10. ..100.);
                let spend = draw.random_range(1. ..10.);
                let income = draw.random_range(30. ..90.);
                supergeo(&format!("s{}", i), response, spend, income)
            })
            .collect::<Vec<_>>();
        let balancer = Balancer::new(&supergeos, &Weights::default());
        let budget = Duration::from_secs(2);
        let start = std::time::Instant::now();
        let solution = balancer.solve(20, 20, budget, &mut rng()).unwrap();
        let elapsed = start.elapsed();
        assert_eq!(solution.status(), Status::TimeLimited);
        assert_eq!(solution.treatment().len(), 20);
        assert!(solution.treatment().iter().all(|i| *i < 40));
        assert!(elapsed < budget + Duration::from_secs(2), "{:?}", elapsed);
    }

    #[test]
    fn zero_budget_falls_back_to_random_selection() {
        let balancer = Balancer::new(&pairs(), &Weights::default());
        let solution = balancer.solve(3, 1, Duration::ZERO, &mut rng()).unwrap();
        assert_eq!(solution.status(), Status::Fallback);
        assert_eq!(solution.treatment().len(), 3);
        assert!(solution.treatment().windows(2).all(|w| w[0] < w[1]));
        assert!(solution.treatment().iter().all(|i| *i < 4));
    }

    #[test]
    fn rejects_oversized_requests() {
        let balancer = Balancer::new(&pairs(), &Weights::default());
        let err = balancer.solve(3, 2, Duration::from_secs(1), &mut rng()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DesignError>(),
            Some(&DesignError::Cardinality {
                treatment: 3,
                control: 2,
                n: 4
            })
        );
        assert!(balancer.solve(0, 0, Duration::from_secs(1), &mut rng()).is_err());
    }

    #[test]
    fn balance_is_reported_on_the_raw_scale() {
        let balancer = Balancer::new(&pairs(), &Weights::default());
        let smd = balancer.evaluate_balance(&[0, 1]);
        // treatment [10, 10] against control [20, 20]: zero pooled variance
        assert_eq!(smd["response"], 0.);
        let smd = balancer.evaluate_balance(&[0, 2]);
        assert_eq!(smd["income"], 0.);
        let report = balancer.report(&[0, 2]);
        assert_eq!(report.features[0].treatment, 15.);
        assert_eq!(report.features[0].control, 15.);
        assert_eq!(report.cost, 0.);
    }

    #[test]
    fn weights_scale_the_cost() {
        let supergeos = vec![
            supergeo("a", 1., 1., 1.),
            supergeo("b", 2., 1., 1.),
            supergeo("c", 4., 1., 1.),
            supergeo("d", 5., 1., 1.),
        ];
        let plain = Balancer::new(&supergeos, &Weights::default());
        let heavy = Balancer::new(&supergeos, &Weights::default().with("response", 3.));
        let ref treatment = [0, 1];
        assert!(plain.cost(treatment) > 0.);
        assert!((heavy.cost(treatment) - 3. * plain.cost(treatment)).abs() < 1e-9);
    }

    #[test]
    fn empty_partition_is_undefined() {
        let balancer = Balancer::new(&[], &Weights::default());
        let smd = balancer.evaluate_balance(&[]);
        assert!(smd.values().all(|x| *x == f64::INFINITY));
        assert_eq!(balancer.cost(&[]), f64::INFINITY);
        assert!(balancer.solve(1, 0, Duration::from_secs(1), &mut rng()).is_err());
    }
}
