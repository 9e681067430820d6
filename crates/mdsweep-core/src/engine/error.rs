use super::config::ConfigError;
use crate::core::combinations::CombinationError;
use crate::core::io::combinations::CombinationFileError;
use crate::core::io::input_script::InputScriptError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Base path does not exist: {path}", path = path.display())]
    BasePathMissing { path: PathBuf },

    #[error("A project named '{name}' already exists in {base}", base = base.display())]
    ProjectExists { name: String, base: PathBuf },

    #[error("Job folder already exists: {path}", path = path.display())]
    JobExists { path: PathBuf },

    #[error("A job named '{name}' already exists in the current project")]
    DuplicateJob { name: String },

    #[error("'{name}' is not a modifiable variable in the input script at {script}", script = script.display())]
    NotModifiable { name: String, script: PathBuf },

    #[error("Seed variable '{name}' was not found in the variables of job '{job}'")]
    SeedVariableMissing { name: String, job: String },

    #[error("Permission denied creating {path}", path = path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error at {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A core budget of {ncores} cannot run units that need {np} cores each")]
    InvalidParallelism { ncores: usize, np: usize },

    #[error("Seed {seed} is out of range for job '{job}' with {n_seeds} seed(s)")]
    SeedOutOfRange {
        job: String,
        seed: usize,
        n_seeds: usize,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("No job named '{0}' is registered")]
    UnknownJob(String),

    #[error("Failed to start the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to serialize job manifest: {0}")]
    Manifest(#[from] toml::ser::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InputScript(#[from] InputScriptError),

    #[error(transparent)]
    Combination(#[from] CombinationError),

    #[error(transparent)]
    CombinationFile(#[from] CombinationFileError),
}

impl EngineError {
    /// Wraps a filesystem error with the path it occurred on, singling out permission denials.
    pub(crate) fn fs(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            EngineError::PermissionDenied { path, source }
        } else {
            EngineError::Io { path, source }
        }
    }
}
