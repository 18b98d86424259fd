//! Experiment Runner
//!
//! Sweeps the configured parameter grid, runs repeated seeded trials per
//! grid point, and merges their statistics into a report.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rebac_types::{AgentCharacter, AgentId, RelationSchema};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ExperimentConfig, ExperimentKind};
use crate::environment::Environment;
use crate::error::SimError;
use crate::output::report::{ExperimentReport, MispredictedContent, ResultRow, TOP_MISPREDICTIONS};
use crate::output::stats::{AggregatedStats, MispredictionLog, RelationStats};
use crate::setup::{build_environment, distribute, prepare_contents, Dataset, Newcomer};

/// One combination of sweep parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    /// Tags kept per content, zero keeps all
    pub max_tags: usize,
    pub training: usize,
    pub test: usize,
    pub threshold: f64,
    /// Agents turned opposite (trust experiments only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untrusted: Option<usize>,
}

/// Merged statistics of all trials at one grid point.
#[derive(Debug, Clone)]
pub struct PointOutcome {
    pub internal: AggregatedStats,
    pub external: AggregatedStats,
    pub newcomer: Option<AggregatedStats>,
    pub mispredictions: MispredictionLog,
}

/// Seed of one trial, derived from the experiment seed.
pub fn trial_seed(seed: u64, point_index: usize, trial: usize) -> u64 {
    seed.wrapping_add((point_index as u64) << 32)
        .wrapping_add(trial as u64)
}

/// Runs the experiment described by a validated configuration.
pub struct ExperimentRunner<'a> {
    config: &'a ExperimentConfig,
    dataset: &'a Dataset,
    schema: RelationSchema,
}

impl<'a> ExperimentRunner<'a> {
    pub fn new(config: &'a ExperimentConfig, dataset: &'a Dataset) -> Result<Self, SimError> {
        config.validate()?;
        if dataset.agents.is_empty() {
            return Err(SimError::NoAgents);
        }
        Ok(Self {
            config,
            dataset,
            schema: config.schema(),
        })
    }

    pub fn kind(&self) -> ExperimentKind {
        self.config.experiment.kind
    }

    /// Tag numbers × training sizes × test sizes × thresholds, and × untrusted
    /// counts for trust experiments. Internal experiments run at threshold 0.
    pub fn grid(&self) -> Vec<GridPoint> {
        let experiment = &self.config.experiment;
        let thresholds = match experiment.kind {
            ExperimentKind::Internal => vec![0.0],
            _ if experiment.thresholds.is_empty() => vec![0.0],
            _ => experiment.thresholds.clone(),
        };
        let tag_numbers = if experiment.tag_numbers.is_empty() {
            vec![0]
        } else {
            experiment.tag_numbers.clone()
        };
        let untrusted: Vec<Option<usize>> = match experiment.kind {
            ExperimentKind::Trust => {
                self.config.trust.untrusted_counts.iter().map(|n| Some(*n)).collect()
            }
            _ => vec![None],
        };

        let mut grid = Vec::new();
        for &max_tags in &tag_numbers {
            for &training in &experiment.training_sizes {
                for &test in &experiment.test_sizes {
                    for &threshold in &thresholds {
                        for &untrusted in &untrusted {
                            grid.push(GridPoint {
                                max_tags,
                                training,
                                test,
                                threshold,
                                untrusted,
                            });
                        }
                    }
                }
            }
        }
        grid
    }

    pub fn run(&self) -> Result<ExperimentReport, SimError> {
        let experiment = &self.config.experiment;
        let grid = self.grid();
        info!(
            "Running {} experiment: {} grid points x {} trials",
            experiment.kind,
            grid.len(),
            experiment.trials
        );

        let mut rows = Vec::new();
        let mut mispredictions = MispredictionLog::new();
        for (index, point) in grid.iter().enumerate() {
            let outcome = self.run_point(index, point)?;
            rows.extend(self.rows(point, &outcome));
            mispredictions.merge(&outcome.mispredictions);
        }

        let top_mispredictions = mispredictions
            .ranked()
            .into_iter()
            .take(TOP_MISPREDICTIONS)
            .map(|(content, misses)| MispredictedContent { content, misses })
            .collect();

        Ok(ExperimentReport {
            run_id: Uuid::new_v4(),
            kind: experiment.kind,
            seed: experiment.seed,
            trials: experiment.trials,
            relation_types: self.schema.types().to_vec(),
            newcomer: self.newcomer_agent(),
            rows,
            top_mispredictions,
        })
    }

    /// Runs every trial of one grid point.
    pub fn run_point(
        &self,
        point_index: usize,
        point: &GridPoint,
    ) -> Result<PointOutcome, SimError> {
        let newcomer = self.newcomer_agent();
        let mut outcome = PointOutcome {
            internal: AggregatedStats::new(&self.schema),
            external: AggregatedStats::new(&self.schema),
            newcomer: newcomer.map(|_| AggregatedStats::new(&self.schema)),
            mispredictions: MispredictionLog::new(),
        };

        for trial in 0..self.config.experiment.trials {
            let seed = trial_seed(self.config.experiment.seed, point_index, trial);
            let mut rng = SmallRng::seed_from_u64(seed);
            let env = self.run_trial(point, &mut rng)?;

            outcome.internal.add_trial(env.relation_stats());
            outcome.external.add_trial(env.external_stats());
            outcome.mispredictions.merge(env.mispredictions());
            if let (Some(agent), Some(stats)) = (newcomer, outcome.newcomer.as_mut()) {
                let empty = RelationStats::new(&self.schema);
                stats.add_trial(env.agent_stats(agent).unwrap_or(&empty));
            }
            debug!("Trial {} of grid point {} done: {}", trial, point_index, env);
        }

        info!(
            "Grid point {:?}: {} internal and {} external predictions",
            point,
            outcome.internal.relation_stats().total(),
            outcome.external.relation_stats().total()
        );
        Ok(outcome)
    }

    /// Builds a fresh environment and runs the training and test phases.
    pub fn run_trial(
        &self,
        point: &GridPoint,
        rng: &mut SmallRng,
    ) -> Result<Environment, SimError> {
        let config = self.config;
        let mut env = build_environment(
            self.dataset,
            &self.schema,
            config.network.bidirectional,
            config.experiment.kind.pipeline(),
        )?;

        if let Some(count) = point.untrusted {
            mark_untrusted(&mut env, count, rng);
        }

        let mut contents = prepare_contents(
            &self.dataset.contents,
            point.max_tags,
            &config.content.forbidden_tags,
        );
        contents.shuffle(rng);
        let training = point.training.min(contents.len());
        let test = point.test.min(contents.len() - training);

        let threshold = match config.experiment.kind {
            ExperimentKind::Internal => 0.0,
            _ => point.threshold,
        };
        let mode = config.run_mode(threshold);

        let (training_newcomer, test_newcomer) = match self.newcomer_agent() {
            Some(agent) => (
                Some(Newcomer::held_out(agent)),
                Some(Newcomer::joining_after(agent, config.newcomer.turn)),
            ),
            None => (None, None),
        };

        distribute(&mut env, &contents[..training], &mode, rng, training_newcomer)?;
        distribute(
            &mut env,
            &contents[training..training + test],
            &mode.predicting(),
            rng,
            test_newcomer,
        )?;
        Ok(env)
    }

    /// Rebuilds the environment of the final trial at the final grid point.
    pub fn replay_last_trial(&self) -> Result<Option<Environment>, SimError> {
        let grid = self.grid();
        let last_trial = self.config.experiment.trials.checked_sub(1);
        let (Some(point), Some(trial)) = (grid.last(), last_trial) else {
            return Ok(None);
        };
        let seed = trial_seed(self.config.experiment.seed, grid.len() - 1, trial);
        let mut rng = SmallRng::seed_from_u64(seed);
        self.run_trial(point, &mut rng).map(Some)
    }

    fn newcomer_agent(&self) -> Option<AgentId> {
        match self.config.experiment.kind {
            ExperimentKind::SingleAgent => self.config.newcomer.agent,
            _ => None,
        }
    }

    fn rows(&self, point: &GridPoint, outcome: &PointOutcome) -> Vec<ResultRow> {
        let combined = outcome.internal.combined(&outcome.external);
        self.schema
            .iter()
            .map(|rtype| {
                let internal = outcome.internal.get(rtype).copied().unwrap_or_default();
                let external = outcome.external.get(rtype).copied().unwrap_or_default();
                let total = combined.get(rtype).copied().unwrap_or_default();
                let internal_share = if total.total() == 0 {
                    None
                } else {
                    Some(internal.total() as f64 / total.total() as f64)
                };
                ResultRow {
                    point: *point,
                    trials: combined.trials(),
                    relation_type: rtype,
                    internal: internal.metrics(),
                    external: external.metrics(),
                    combined: total.metrics(),
                    internal_share,
                    newcomer: outcome
                        .newcomer
                        .as_ref()
                        .and_then(|stats| stats.get(rtype))
                        .map(|stats| stats.metrics()),
                }
            })
            .collect()
    }
}

/// Turns `count` randomly chosen agents opposite.
fn mark_untrusted(env: &mut Environment, count: usize, rng: &mut SmallRng) {
    let ids = env.agent_ids();
    let chosen: Vec<AgentId> = ids.choose_multiple(rng, count).copied().collect();
    for id in &chosen {
        if let Some(agent) = env.agent_mut(*id) {
            agent.set_character(AgentCharacter::Opposite);
        }
    }
    debug!("Untrusted agents: {:?}", chosen);
}
