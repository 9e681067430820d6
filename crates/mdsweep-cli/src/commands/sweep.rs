use crate::cli::SweepArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mdsweep::core::io::combinations::read_combinations_from_path;
use mdsweep::core::params::ParameterSet;
use mdsweep::engine::error::EngineError;
use mdsweep::engine::progress::ProgressReporter;
use mdsweep::engine::scheduler::RunSummary;
use mdsweep::workflows;
use tracing::{info, warn};

pub async fn run(args: SweepArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;
    let combinations = load_combinations(&app)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if app.dry_run {
        let project = tokio::task::block_in_place(|| {
            workflows::sweep::prepare(&app.sweep, combinations.as_deref(), &reporter)
        })?;
        println!(
            "✓ Prepared {} job(s) under {} (dry run, nothing executed)",
            project.jobs().len(),
            project.outpath().display()
        );
        return Ok(());
    }

    println!(
        "Starting sweep '{}' on {} core(s), {} per simulation...",
        app.sweep.project.name, app.sweep.execution.ncores, app.sweep.execution.np
    );
    let result = tokio::task::block_in_place(|| {
        workflows::sweep::run(&app.sweep, combinations.as_deref(), &reporter)
    })?;

    print_summary(&result.summary);
    println!("Workspaces: {}", result.project.outpath().display());

    let total = result.summary.outcomes.len();
    let failed = total - result.summary.succeeded();
    if failed > 0 {
        return Err(CliError::UnitsFailed { failed, total });
    }
    Ok(())
}

/// `None` when the default combination file is absent and the script defaults should run.
fn load_combinations(app: &AppConfig) -> Result<Option<Vec<ParameterSet>>> {
    let path = &app.combinations_path;
    if !path.exists() {
        if app.combinations_explicit {
            return Err(CliError::Argument(format!(
                "Combination file {} does not exist.",
                path.display()
            )));
        }
        warn!(
            "No combination file at {}; running the script defaults as a single job.",
            path.display()
        );
        return Ok(None);
    }
    info!("Reading parameter combinations from {:?}", path);
    let sets = read_combinations_from_path(path).map_err(EngineError::from)?;
    if sets.is_empty() {
        warn!(
            "Combination file {} has no rows; no jobs will run.",
            path.display()
        );
    }
    Ok(Some(sets))
}

fn print_summary(summary: &RunSummary) {
    println!(
        "--- {} of {} unit(s) succeeded in {} batch(es); all units took {:.2?} ---",
        summary.succeeded(),
        summary.outcomes.len(),
        summary.batch_sizes.len(),
        summary.elapsed
    );
    for outcome in summary.failures() {
        println!(
            "  ✗ {} (batch {}): {}",
            outcome.label,
            outcome.batch + 1,
            outcome.status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const SCRIPT: &str = "variable T equal 300\nvariable velocity_seed equal 1\n";

    fn sweep_args(dir: &Path) -> SweepArgs {
        let script = dir.join("in.melt");
        fs::write(&script, SCRIPT).unwrap();
        let combos = dir.join("param_combos.csv");
        fs::write(&combos, "T\n300\n600\n").unwrap();
        SweepArgs {
            input: Some(script),
            base_path: Some(dir.to_path_buf()),
            name: Some("melt".to_string()),
            combos: Some(combos),
            seeds: Some(2),
            ncores: Some(2),
            np: Some(1),
            rng_seed: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dry_run_only_prepares_workspaces() {
        let dir = tempdir().unwrap();
        let mut args = sweep_args(dir.path());
        args.dry_run = true;

        run(args).await.unwrap();

        let seed_dir = dir.path().join("melt").join("T600").join("seed1");
        let templated = fs::read_to_string(seed_dir.join("in.melt_T600")).unwrap();
        assert!(templated.starts_with("variable T equal 600\n"));
        assert!(!seed_dir.join("mdsweep.stdout").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn explicit_missing_combination_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut args = sweep_args(dir.path());
        args.combos = Some(dir.path().join("nope.csv"));

        assert!(matches!(run(args).await, Err(CliError::Argument(_))));
        assert!(!dir.path().join("melt").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn header_only_combination_file_runs_no_jobs() {
        let dir = tempdir().unwrap();
        let mut args = sweep_args(dir.path());
        let combos = dir.path().join("empty.csv");
        fs::write(&combos, "T,L\n").unwrap();
        args.combos = Some(combos);
        args.command = Some("true {input}".to_string());

        run(args).await.unwrap();

        let project_dir = dir.path().join("melt");
        assert!(project_dir.is_dir());
        assert!(!project_dir.join("base").exists());
        let job_dirs = fs::read_dir(&project_dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().is_dir())
            .count();
        assert_eq!(job_dirs, 0);
    }

    #[test]
    fn missing_default_combination_file_means_no_table() {
        let dir = tempdir().unwrap();
        let mut app = build_config(&sweep_args(dir.path())).unwrap();
        app.combinations_path = dir.path().join("param_combos.csv");
        fs::remove_file(&app.combinations_path).unwrap();
        app.combinations_explicit = false;

        assert!(load_combinations(&app).unwrap().is_none());

        fs::write(&app.combinations_path, "T,L\n").unwrap();
        assert_eq!(load_combinations(&app).unwrap(), Some(Vec::new()));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn failing_units_are_reported_after_the_run() {
        let dir = tempdir().unwrap();
        let mut args = sweep_args(dir.path());
        args.command = Some("false {input}".to_string());

        let result = run(args).await;
        assert!(matches!(
            result,
            Err(CliError::UnitsFailed { failed: 4, total: 4 })
        ));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn successful_sweep_runs_every_seed() {
        let dir = tempdir().unwrap();
        let mut args = sweep_args(dir.path());
        args.command = Some("true {input}".to_string());

        run(args).await.unwrap();
        for job in ["T300", "T600"] {
            for seed in 0..2 {
                let seed_dir = dir.path().join("melt").join(job).join(format!("seed{}", seed));
                assert!(seed_dir.join("mdsweep.stdout").is_file());
            }
        }
    }
}
