use super::config::{ExecutionConfig, parallel_width};
use super::error::EngineError;
use super::invoker::ProcessInvoker;
use super::job::Job;
use super::progress::{Progress, ProgressReporter};
use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Something the scheduler can run and name in its reports.
pub trait WorkUnit: Sync {
    fn label(&self) -> String;
}

/// One seed of one job.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionUnit<'a> {
    pub job: &'a Job,
    pub seed: usize,
}

impl WorkUnit for ExecutionUnit<'_> {
    fn label(&self) -> String {
        format!("{}/seed{}", self.job.name(), self.seed)
    }
}

impl ExecutionUnit<'_> {
    pub fn run(&self, invoker: &ProcessInvoker) -> UnitStatus {
        match self.job.run(invoker, self.seed) {
            Ok(status) if status.success() => UnitStatus::Succeeded,
            Ok(status) => UnitStatus::Failed {
                code: status.code(),
            },
            Err(e) => UnitStatus::LaunchFailed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Succeeded,
    /// The process ran and exited unsuccessfully; `None` when killed by a signal.
    Failed { code: Option<i32> },
    LaunchFailed(String),
}

impl UnitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, UnitStatus::Succeeded)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Succeeded => write!(f, "ok"),
            UnitStatus::Failed { code: Some(code) } => write!(f, "exit code {}", code),
            UnitStatus::Failed { code: None } => write!(f, "terminated by signal"),
            UnitStatus::LaunchFailed(reason) => write!(f, "launch failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub label: String,
    pub batch: usize,
    pub status: UnitStatus,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Outcomes in the order the units were given.
    pub outcomes: Vec<UnitOutcome>,
    pub batch_sizes: Vec<usize>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Runs units in consecutive batches no wider than `ncores / np`.
///
/// Each batch runs on its own thread pool and must finish completely before the next
/// one starts. A failing unit never stops its siblings or later batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    ncores: usize,
    np: usize,
    max_parallel: usize,
}

impl BatchScheduler {
    pub fn new(ncores: usize, np: usize) -> Result<Self, EngineError> {
        Self::with_width(ncores, np, parallel_width(ncores, np))
    }

    pub fn from_config(config: &ExecutionConfig) -> Result<Self, EngineError> {
        Self::with_width(config.ncores, config.np, config.max_parallel())
    }

    fn with_width(ncores: usize, np: usize, max_parallel: usize) -> Result<Self, EngineError> {
        if max_parallel < 1 {
            return Err(EngineError::InvalidParallelism { ncores, np });
        }
        Ok(Self {
            ncores,
            np,
            max_parallel,
        })
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Batch sizes for `n_units` units, in execution order.
    pub fn plan(&self, n_units: usize) -> Vec<usize> {
        let mut sizes = vec![self.max_parallel; n_units / self.max_parallel];
        if n_units % self.max_parallel != 0 {
            sizes.push(n_units % self.max_parallel);
        }
        sizes
    }

    pub fn execute(
        &self,
        units: &[ExecutionUnit<'_>],
        invoker: &ProcessInvoker,
        reporter: &ProgressReporter,
    ) -> Result<RunSummary, EngineError> {
        self.execute_with(units, reporter, |unit| unit.run(invoker))
    }

    #[instrument(skip_all, name = "batch_scheduler", fields(units = units.len()))]
    pub fn execute_with<T, F>(
        &self,
        units: &[T],
        reporter: &ProgressReporter,
        run: F,
    ) -> Result<RunSummary, EngineError>
    where
        T: WorkUnit,
        F: Fn(&T) -> UnitStatus + Sync,
    {
        let start = Instant::now();
        let batch_sizes = self.plan(units.len());
        info!(
            "Running {} unit(s) in {} batch(es) of at most {} ({} cores, {} per unit)",
            units.len(),
            batch_sizes.len(),
            self.max_parallel,
            self.ncores,
            self.np
        );

        let width = self.max_parallel.min(units.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("mdsweep-unit-{}", i))
            .build()?;

        let mut outcomes = Vec::with_capacity(units.len());
        for (batch_idx, batch) in units.chunks(self.max_parallel).enumerate() {
            reporter.phase_start(format!("Batch {} of {}", batch_idx + 1, batch_sizes.len()));
            reporter.task_start(batch.len());

            let batch_outcomes: Vec<UnitOutcome> = pool.install(|| {
                batch
                    .par_iter()
                    .with_max_len(1)
                    .map(|unit| {
                        let unit_start = Instant::now();
                        let status = run(unit);
                        let outcome = UnitOutcome {
                            label: unit.label(),
                            batch: batch_idx,
                            status,
                            elapsed: unit_start.elapsed(),
                        };
                        if !outcome.status.is_success() {
                            warn!("{} failed: {}", outcome.label, outcome.status);
                            reporter.report(Progress::Message(format!(
                                "{} failed: {}",
                                outcome.label, outcome.status
                            )));
                        }
                        reporter.report(Progress::TaskIncrement);
                        outcome
                    })
                    .collect()
            });

            reporter.report(Progress::TaskFinish);
            reporter.report(Progress::PhaseFinish);
            outcomes.extend(batch_outcomes);
        }

        let summary = RunSummary {
            outcomes,
            batch_sizes,
            elapsed: start.elapsed(),
        };
        let failed = summary.outcomes.len() - summary.succeeded();
        if failed > 0 {
            error!(
                "{} of {} unit(s) failed; total time {:.2?}",
                failed,
                summary.outcomes.len(),
                summary.elapsed
            );
        } else {
            info!(
                "All {} unit(s) succeeded; total time {:.2?}",
                summary.outcomes.len(),
                summary.elapsed
            );
        }
        Ok(summary)
    }
}
