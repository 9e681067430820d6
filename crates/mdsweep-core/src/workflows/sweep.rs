use crate::core::params::ParameterSet;
use crate::engine::config::SweepConfig;
use crate::engine::error::EngineError;
use crate::engine::invoker::ProcessInvoker;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::project::Project;
use crate::engine::scheduler::{BatchScheduler, RunSummary};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct SweepResult {
    pub project: Project,
    pub summary: RunSummary,
}

/// Creates the project and registers one job per parameter set.
///
/// `None` registers a single `base` job running the unmodified script defaults. An
/// empty table registers no jobs at all.
#[instrument(skip_all, name = "sweep_prepare")]
pub fn prepare(
    config: &SweepConfig,
    combinations: Option<&[ParameterSet]>,
    reporter: &ProgressReporter,
) -> Result<Project, EngineError> {
    let rng = match config.seeds.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut project = Project::create_with_rng(&config.project, rng)?;

    reporter.phase_start("Preparing workspaces");
    let Some(combinations) = combinations else {
        reporter.task_start(1);
        let name = ParameterSet::new().job_name();
        project.register_job(&name, config.seeds.count, &config.seeds.variables, None)?;
        reporter.report(Progress::TaskIncrement);
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
        info!("Registered the base job under {:?}", project.outpath());
        return Ok(project);
    };
    if combinations.is_empty() {
        warn!("The combination table has no rows; no jobs will be registered.");
    }
    reporter.task_start(combinations.len());
    for set in combinations {
        let overrides = set.to_variable_map();
        project.register_job(
            &set.job_name(),
            config.seeds.count,
            &config.seeds.variables,
            Some(&overrides),
        )?;
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        "Registered {} job(s) with {} seed(s) each under {:?}",
        project.jobs().len(),
        config.seeds.count,
        project.outpath()
    );
    Ok(project)
}

/// Runs every seed of every registered job.
pub fn execute(
    project: &Project,
    config: &SweepConfig,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    let invoker = ProcessInvoker::from_template(
        &config.execution.command_template,
        config.execution.np,
    )?;
    let scheduler = BatchScheduler::from_config(&config.execution)?;
    scheduler.execute(&project.expand_to_seed_units(), &invoker, reporter)
}

#[instrument(skip_all, name = "sweep_workflow")]
pub fn run(
    config: &SweepConfig,
    combinations: Option<&[ParameterSet]>,
    reporter: &ProgressReporter,
) -> Result<SweepResult, EngineError> {
    // Reject bad execution settings before anything is written to disk.
    ProcessInvoker::from_template(&config.execution.command_template, config.execution.np)?;
    BatchScheduler::from_config(&config.execution)?;

    let project = prepare(config, combinations, reporter)?;
    let summary = execute(&project, config, reporter)?;
    Ok(SweepResult { project, summary })
}
