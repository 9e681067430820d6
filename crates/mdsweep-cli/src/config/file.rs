use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub project: Option<FileProjectConfig>,
    pub seeds: Option<FileSeedConfig>,
    pub execution: Option<FileExecutionConfig>,
    pub combinations: Option<FileCombinationsConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileProjectConfig {
    pub name: Option<String>,
    #[serde(rename = "input-script")]
    pub input_script: Option<PathBuf>,
    #[serde(rename = "base-path")]
    pub base_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSeedConfig {
    pub count: Option<usize>,
    pub variables: Option<Vec<String>>,
    #[serde(rename = "rng-seed")]
    pub rng_seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileExecutionConfig {
    pub ncores: Option<usize>,
    pub np: Option<usize>,
    pub command: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileCombinationsConfig {
    pub file: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        fs::write(
            &path,
            r#"
            [project]
            name = "argon"
            input-script = "in.argon"
            base-path = "runs"

            [seeds]
            count = 5
            variables = ["velocity_seed", "thermostat_seed"]
            rng-seed = 2024

            [execution]
            ncores = 32
            np = 8
            command = "srun -n {np} lmp -in {input}"

            [combinations]
            file = "combos.csv"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let project = config.project.unwrap();
        assert_eq!(project.name.as_deref(), Some("argon"));
        assert_eq!(project.base_path, Some(PathBuf::from("runs")));
        let seeds = config.seeds.unwrap();
        assert_eq!(seeds.count, Some(5));
        assert_eq!(seeds.rng_seed, Some(2024));
        assert_eq!(seeds.variables.unwrap().len(), 2);
        assert_eq!(config.execution.unwrap().np, Some(8));
        assert_eq!(
            config.combinations.unwrap().file,
            Some(PathBuf::from("combos.csv"))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        fs::write(&path, "[execution]\ncores = 4\n").unwrap();

        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
