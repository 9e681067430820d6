use mdsweep::engine::config::SweepConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub sweep: SweepConfig,
    pub combinations_path: PathBuf,
    /// Whether the combination file was named explicitly rather than defaulted.
    pub combinations_explicit: bool,
    pub dry_run: bool,
}
