use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mdsweep - parametric molecular-dynamics sweeps: parameter combinations, seeded job workspaces, and core-budgeted batch execution.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the matrix of parameter combinations and write it as CSV.
    Combos(CombosArgs),
    /// List the modifiable variables of a simulation input script.
    Vars(VarsArgs),
    /// Create a project, register one job per combination, and run every seed.
    Sweep(SweepArgs),
    /// Estimate means and statistical errors of simulation output columns by block averaging.
    Analyze(AnalyzeArgs),
}

/// Arguments for the `combos` subcommand.
#[derive(Args, Debug)]
pub struct CombosArgs {
    /// Parameter names matching variables of the input script, e.g. 'T,L' or "['T', 'L']".
    #[arg(short, long, required = true, value_name = "NAMES")]
    pub names: String,

    /// Candidate values per parameter as a list of lists, e.g. '[[10, 20], [100, 200]]'.
    #[arg(long, required = true, value_name = "LISTS")]
    pub values: String,

    /// Pegging per parameter: -1 for free, otherwise the index of the parameter it follows.
    /// Example: '-1,-1,0' pegs the third parameter to the first.
    #[arg(short, long, value_name = "INDICES", allow_hyphen_values = true)]
    pub peg_to: Option<String>,

    /// Directory where the combination file is written.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,
}

/// Arguments for the `vars` subcommand.
#[derive(Args, Debug)]
pub struct VarsArgs {
    /// Path to the simulation input script.
    #[arg(required = true, value_name = "SCRIPT")]
    pub script: PathBuf,
}

/// Arguments for the `sweep` subcommand.
#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// Path to a sweep configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Project ---
    /// Path to the simulation input script.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Directory in which the project folder is created.
    #[arg(short, long, value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// Name of the project folder to create.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Combination file produced by `mdsweep combos`.
    #[arg(long, value_name = "PATH")]
    pub combos: Option<PathBuf>,

    // --- Seeds ---
    /// Number of independent seeds per job.
    #[arg(short, long, value_name = "INT")]
    pub seeds: Option<usize>,

    /// Script variable that receives a random value for each seed. Can be repeated.
    #[arg(long = "seed-var", value_name = "NAME")]
    pub seed_vars: Vec<String>,

    /// Seed for the generator behind the seed variables, for reproducible workspaces.
    #[arg(long, value_name = "INT")]
    pub rng_seed: Option<u64>,

    // --- Execution ---
    /// Total number of cores available to the sweep.
    #[arg(long, value_name = "INT")]
    pub ncores: Option<usize>,

    /// Number of cores (MPI ranks) per simulation.
    #[arg(long, value_name = "INT")]
    pub np: Option<usize>,

    /// Launch command template; `{np}` and `{input}` are substituted.
    #[arg(long, value_name = "TEMPLATE")]
    pub command: Option<String>,

    /// Prepare the workspaces without running any simulation.
    #[arg(long)]
    pub dry_run: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S execution.np=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// The thermo table of a simulation log.
    #[default]
    Log,
    /// A commented, column-oriented output file.
    Columnar,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Output file to analyze.
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// Layout of the file.
    #[arg(short, long, value_enum, default_value_t = TableFormat::Log)]
    pub format: TableFormat,

    /// Column to analyze. Can be repeated; defaults to every column.
    #[arg(long = "column", value_name = "HEADING")]
    pub columns: Vec<String>,

    /// Comment prefix for columnar files.
    #[arg(long, default_value = "#", value_name = "PREFIX")]
    pub comment: String,

    /// Field delimiter for columnar files; whitespace when omitted.
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Cut-off on the normalized slope of the block variance curve.
    #[arg(long, default_value_t = mdsweep::core::analysis::DEFAULT_SLOPE_THRESHOLD)]
    pub threshold: f64,

    /// Time between consecutive samples, used to report the correlation time.
    #[arg(long, default_value_t = 1.0, value_name = "FLOAT")]
    pub time_step: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sweep_flags_parse() {
        let cli = Cli::try_parse_from([
            "mdsweep", "-vv", "sweep", "--input", "in.melt", "--seeds", "3", "--seed-var", "v1",
            "--seed-var", "v2", "--np", "4", "-S", "execution.ncores=16",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Sweep(args) = cli.command else {
            panic!("expected the sweep subcommand");
        };
        assert_eq!(args.seeds, Some(3));
        assert_eq!(args.seed_vars, vec!["v1", "v2"]);
        assert_eq!(args.np, Some(4));
        assert_eq!(args.set_values, vec!["execution.ncores=16"]);
        assert!(!args.dry_run);
    }

    #[test]
    fn combos_accepts_negative_peg_indices() {
        let cli = Cli::try_parse_from([
            "mdsweep", "combos", "--names", "T,L", "--values", "[[10,20],[100,200]]", "--peg-to",
            "-1,0",
        ])
        .unwrap();
        let Commands::Combos(args) = cli.command else {
            panic!("expected the combos subcommand");
        };
        assert_eq!(args.peg_to.as_deref(), Some("-1,0"));
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["mdsweep", "-q", "-v", "vars", "in.x"]).is_err());
    }
}
