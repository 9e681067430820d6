use std::path::PathBuf;
use thiserror::Error;

/// Launch template used when none is configured; `{np}` and `{input}` are substituted.
pub const DEFAULT_COMMAND_TEMPLATE: &str = "mpirun -np {np} lmp -in {input} -screen none";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
    pub input_script: PathBuf,
    pub base_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    /// Number of independent repetitions per job.
    pub count: usize,
    /// Script variables that receive a fresh random integer for every seed.
    pub variables: Vec<String>,
    /// Seeds the generator behind the per-seed draws; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Total cores available to the sweep.
    pub ncores: usize,
    /// Cores (MPI ranks) used by every unit.
    pub np: usize,
    pub command_template: String,
}

impl ExecutionConfig {
    /// Number of units that fit in the core budget at once.
    pub fn max_parallel(&self) -> usize {
        parallel_width(self.ncores, self.np)
    }
}

pub(crate) fn parallel_width(ncores: usize, np: usize) -> usize {
    ncores.checked_div(np).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub project: ProjectConfig,
    pub seeds: SeedConfig,
    pub execution: ExecutionConfig,
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    project_name: Option<String>,
    input_script: Option<PathBuf>,
    base_path: Option<PathBuf>,
    seed_count: Option<usize>,
    seed_variables: Vec<String>,
    rng_seed: Option<u64>,
    ncores: Option<usize>,
    np: Option<usize>,
    command_template: Option<String>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }
    pub fn input_script(mut self, path: PathBuf) -> Self {
        self.input_script = Some(path);
        self
    }
    pub fn base_path(mut self, path: PathBuf) -> Self {
        self.base_path = Some(path);
        self
    }
    pub fn seed_count(mut self, count: usize) -> Self {
        self.seed_count = Some(count);
        self
    }
    pub fn seed_variables(mut self, names: Vec<String>) -> Self {
        self.seed_variables = names;
        self
    }
    pub fn rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }
    pub fn ncores(mut self, ncores: usize) -> Self {
        self.ncores = Some(ncores);
        self
    }
    pub fn np(mut self, np: usize) -> Self {
        self.np = Some(np);
        self
    }
    pub fn command_template(mut self, template: impl Into<String>) -> Self {
        self.command_template = Some(template.into());
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let name = self
            .project_name
            .ok_or(ConfigError::MissingParameter("project_name"))?;
        let name = validate_component(&name, "project_name")?.to_string();

        let project = ProjectConfig {
            name,
            input_script: self
                .input_script
                .ok_or(ConfigError::MissingParameter("input_script"))?,
            base_path: self
                .base_path
                .ok_or(ConfigError::MissingParameter("base_path"))?,
        };

        let count = self
            .seed_count
            .ok_or(ConfigError::MissingParameter("seed_count"))?;
        if count == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "seed_count",
                reason: "at least one seed is required".to_string(),
            });
        }
        let seeds = SeedConfig {
            count,
            variables: self.seed_variables,
            rng_seed: self.rng_seed,
        };

        let ncores = self.ncores.ok_or(ConfigError::MissingParameter("ncores"))?;
        let np = self.np.ok_or(ConfigError::MissingParameter("np"))?;
        for (parameter, value) in [("ncores", ncores), ("np", np)] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    parameter,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        let execution = ExecutionConfig {
            ncores,
            np,
            command_template: self
                .command_template
                .ok_or(ConfigError::MissingParameter("command_template"))?,
        };

        Ok(SweepConfig {
            project,
            seeds,
            execution,
        })
    }
}

/// Trims `name` and checks that it can be used as a single directory name.
pub(crate) fn validate_component<'n>(
    name: &'n str,
    parameter: &'static str,
) -> Result<&'n str, ConfigError> {
    let trimmed = name.trim();
    let invalid = |reason: &str| ConfigError::InvalidValue {
        parameter,
        reason: format!("'{}' {}", name, reason),
    };
    if trimmed.is_empty() {
        return Err(invalid("is empty"));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(invalid("must be a plain directory name"));
    }
    Ok(trimmed)
}
