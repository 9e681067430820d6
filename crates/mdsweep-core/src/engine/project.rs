use super::config::{ConfigError, ProjectConfig, validate_component};
use super::error::EngineError;
use super::invoker::ProcessInvoker;
use super::job::{Job, JobSpec};
use super::scheduler::{ExecutionUnit, UnitOutcome, UnitStatus, WorkUnit};
use crate::core::io::input_script::InputScript;
use crate::core::params::VariableMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// The output root of one sweep and the jobs registered under it.
///
/// A project owns `<base>/<name>/`, a copy of the input script inside it, and every job
/// directory created through [`Project::register_job`].
#[derive(Debug)]
pub struct Project {
    name: String,
    outpath: PathBuf,
    script: InputScript,
    jobs: Vec<Job>,
    index: HashMap<String, usize>,
    rng: StdRng,
}

impl Project {
    pub fn create(config: &ProjectConfig) -> Result<Self, EngineError> {
        Self::create_with_rng(config, StdRng::from_entropy())
    }

    /// Like [`Project::create`], drawing seed variables from `rng`.
    #[instrument(skip_all, name = "project_create", fields(project = %config.name))]
    pub fn create_with_rng(config: &ProjectConfig, rng: StdRng) -> Result<Self, EngineError> {
        let name = validate_component(&config.name, "project_name")?.to_string();

        if !config.base_path.is_dir() {
            return Err(EngineError::BasePathMissing {
                path: config.base_path.clone(),
            });
        }
        let base = fs::canonicalize(&config.base_path)
            .map_err(|e| EngineError::fs(&config.base_path, e))?;
        let outpath = base.join(&name);
        if outpath.exists() {
            return Err(EngineError::ProjectExists { name, base });
        }

        fs::metadata(&config.input_script).map_err(|e| EngineError::fs(&config.input_script, e))?;
        let script_name = config.input_script.file_name().ok_or_else(|| {
            ConfigError::InvalidValue {
                parameter: "input_script",
                reason: format!("{:?} has no file name", config.input_script),
            }
        })?;

        fs::create_dir(&outpath).map_err(|e| EngineError::fs(&outpath, e))?;
        let canonical = outpath.join(script_name);
        fs::copy(&config.input_script, &canonical).map_err(|e| EngineError::fs(&canonical, e))?;
        let script = InputScript::open(&canonical)?;

        info!(
            "Created project '{}' at {:?} with {} free variable(s)",
            name,
            &outpath,
            script.variables().len()
        );
        Ok(Self {
            name,
            outpath,
            script,
            jobs: Vec::new(),
            index: HashMap::new(),
            rng,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outpath(&self) -> &Path {
        &self.outpath
    }

    /// The project's own copy of the input script.
    pub fn input_script(&self) -> &Path {
        self.script.path()
    }

    pub fn free_variables(&self) -> VariableMap {
        self.script.free_variables()
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.index.get(name).map(|&i| &self.jobs[i])
    }

    /// Registered jobs in registration order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Creates a job whose variables are the script defaults with `overrides` merged in.
    ///
    /// Duplicate names and overrides that are not free variables of the script are
    /// rejected before anything is written to disk.
    pub fn register_job(
        &mut self,
        name: &str,
        n_seeds: usize,
        seed_variables: &[String],
        overrides: Option<&VariableMap>,
    ) -> Result<&Job, EngineError> {
        let name = validate_component(name, "job_name")?;
        if self.index.contains_key(name) {
            return Err(EngineError::DuplicateJob {
                name: name.to_string(),
            });
        }
        if n_seeds == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "seed_count",
                reason: format!("job '{}' needs at least one seed", name),
            }
            .into());
        }

        let mut variables = self.free_variables();
        for (key, value) in overrides.into_iter().flatten() {
            if !self.script.is_free(key) {
                return Err(EngineError::NotModifiable {
                    name: key.clone(),
                    script: self.script.path().to_path_buf(),
                });
            }
            variables.insert(key.clone(), *value);
        }

        let spec = JobSpec {
            name,
            n_seeds,
            seed_variables,
            variables: Some(&variables),
        };
        let job = Job::create(&self.outpath, self.script.path(), spec, &mut self.rng)?;

        let slot = self.jobs.len();
        self.index.insert(job.name().to_string(), slot);
        self.jobs.push(job);
        Ok(&self.jobs[slot])
    }

    /// Every (job, seed) pair, jobs in registration order and seeds ascending.
    pub fn expand_to_seed_units(&self) -> Vec<ExecutionUnit<'_>> {
        self.jobs
            .iter()
            .flat_map(|job| (0..job.n_seeds()).map(move |seed| ExecutionUnit { job, seed }))
            .collect()
    }

    /// Runs every seed of one job, one after another.
    #[instrument(skip_all, name = "run_job_serial", fields(job = name))]
    pub fn run_job_serial(
        &self,
        name: &str,
        invoker: &ProcessInvoker,
    ) -> Result<Vec<UnitOutcome>, EngineError> {
        let job = self
            .job(name)
            .ok_or_else(|| EngineError::UnknownJob(name.to_string()))?;

        let mut outcomes = Vec::with_capacity(job.n_seeds());
        for seed in 0..job.n_seeds() {
            let unit = ExecutionUnit { job, seed };
            let start = Instant::now();
            let status = unit.run(invoker);
            if status != UnitStatus::Succeeded {
                warn!("{} failed: {}", unit.label(), status);
            }
            outcomes.push(UnitOutcome {
                label: unit.label(),
                batch: 0,
                status,
                elapsed: start.elapsed(),
            });
        }
        Ok(outcomes)
    }
}
