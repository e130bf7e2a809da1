use crate::Config;
use crate::DesignError;
use crate::Embedder;
use crate::Generator;
use crate::Imbalance;
use crate::Method;
use crate::Partition;
use crate::Report;
use crate::Search;
use crate::Solution;
use crate::Units;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a reporting collaborator needs from one design run.
#[derive(Debug, Clone, Serialize)]
pub struct Design {
    pub method: Method,
    /// index of the winning candidate partition
    pub index: usize,
    pub partition: Partition,
    pub solution: Solution,
    pub cost: Imbalance,
    /// raw-scale SMD per feature
    pub balance: BTreeMap<String, Imbalance>,
    pub report: Report,
    /// unit ids in treatment supergeos, sorted
    pub treatment: Vec<String>,
    /// unit ids in control supergeos, sorted
    pub control: Vec<String>,
}

/// Units in, balanced design out: embed, cluster into candidate
/// partitions, solve each, keep the best.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, units: &Units) -> anyhow::Result<Design> {
        let ref config = self.config;
        let target = config
            .target
            .unwrap_or_else(|| Generator::default_target(units.len()));
        let (n_treatment, n_control) = config.groups(target);
        if n_treatment + n_control > target || n_treatment + n_control == 0 {
            return Err(DesignError::Cardinality {
                treatment: n_treatment,
                control: n_control,
                n: target,
            }
            .into());
        }
        log::info!("{:<32}{:<32}", "designing units", units.len());
        log::info!("{:<32}{:<32}", "target supergeos", target);
        log::info!(
            "{:<32}{:<32}",
            "treatment / control",
            format!("{} / {}", n_treatment, n_control)
        );
        let ref mut rng = SmallRng::seed_from_u64(config.seed);
        let ref embedder = Embedder::from((config.method, config.graph, config.sage));
        let generator = Generator::new(units, embedder, config.dim, rng)?;
        let partitions = match config.partitions {
            0 | 1 => vec![generator.generate_supergeos(target)?],
            count => generator.generate_candidate_partitions(count, target, config.seed)?,
        };
        let selection = Search::new(&config.weights).run(
            &partitions,
            n_treatment,
            n_control,
            config.budget(),
            config.seed,
        )?;
        let partition = partitions[selection.index].clone();
        let treatment = selection.solution.treatment().to_vec();
        let control = selection.solution.control(partition.len());
        let report = selection.balancer.report(&treatment);
        log::info!("{:<32}{:<32}", "assignment status", selection.solution.status());
        log::info!("{:<32}{:<32}", "balance cost", format!("{:.6}", selection.cost));
        Ok(Design {
            method: config.method,
            index: selection.index,
            balance: selection.balancer.evaluate_balance(&treatment),
            treatment: partition.expand(&treatment),
            control: partition.expand(&control),
            cost: selection.cost,
            solution: selection.solution,
            report,
            partition,
        })
    }
}
