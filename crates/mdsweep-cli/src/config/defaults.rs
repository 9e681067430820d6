use mdsweep::core::io::combinations::DEFAULT_COMBINATIONS_FILE;
use mdsweep::engine::config::DEFAULT_COMMAND_TEMPLATE;
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub base_path: PathBuf,
    pub seed_count: usize,
    pub seed_variables: Vec<String>,
    pub ncores: usize,
    pub np: usize,
    pub command_template: String,
    pub combinations_file: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            seed_count: 1,
            seed_variables: vec!["velocity_seed".to_string()],
            ncores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            np: 1,
            command_template: DEFAULT_COMMAND_TEMPLATE.to_string(),
            combinations_file: PathBuf::from(DEFAULT_COMBINATIONS_FILE),
        }
    }
}
