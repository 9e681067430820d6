use super::error::EngineError;
use super::invoker::ProcessInvoker;
use crate::core::io::input_script::InputScript;
use crate::core::params::{ParamValue, VariableMap};
use rand::Rng;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Range every seed variable is drawn from.
pub const SEED_RANGE: Range<i64> = 1000..1_000_000;

pub const MANIFEST_FILE: &str = "job.toml";
pub const STDOUT_FILE: &str = "mdsweep.stdout";
pub const STDERR_FILE: &str = "mdsweep.stderr";

/// What a job needs to know before its workspace is materialized.
#[derive(Debug, Clone, Copy)]
pub struct JobSpec<'a> {
    pub name: &'a str,
    pub n_seeds: usize,
    pub seed_variables: &'a [String],
    /// Resolved variables for the job. `None` copies the script without templating.
    pub variables: Option<&'a VariableMap>,
}

/// One independent repetition of a job.
#[derive(Debug, Clone, Serialize)]
pub struct Seed {
    pub index: usize,
    #[serde(skip)]
    pub dir: PathBuf,
    #[serde(rename = "input")]
    pub input_path: PathBuf,
    /// Values drawn for the seed variables of this repetition.
    pub draws: VariableMap,
}

#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    outpath: PathBuf,
    seed_variables: Vec<String>,
    variables: Option<VariableMap>,
    seeds: Vec<Seed>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    name: &'a str,
    n_seeds: usize,
    seed_variables: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a VariableMap>,
    seeds: &'a [Seed],
}

impl Job {
    /// Materializes `<parent>/<name>/seed{i}` for every seed and templates one input
    /// script per seed directory.
    ///
    /// Fails without touching the disk when a seed variable is missing from the
    /// resolved variables, and fails when the job directory already exists.
    #[instrument(skip_all, name = "job_create", fields(job = spec.name))]
    pub fn create<R: Rng + ?Sized>(
        parent: &Path,
        script: &Path,
        spec: JobSpec<'_>,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        if let Some(variables) = spec.variables {
            if let Some(missing) = spec
                .seed_variables
                .iter()
                .find(|name| !variables.contains_key(name.as_str()))
            {
                return Err(EngineError::SeedVariableMissing {
                    name: missing.clone(),
                    job: spec.name.to_string(),
                });
            }
        }

        let outpath = parent.join(spec.name);
        if outpath.exists() {
            return Err(EngineError::JobExists { path: outpath });
        }
        let script_name = script
            .file_name()
            .ok_or_else(|| {
                EngineError::fs(
                    script,
                    io::Error::new(io::ErrorKind::InvalidInput, "input script has no file name"),
                )
            })?
            .to_string_lossy()
            .into_owned();
        let templated_name = format!("{}_{}", script_name, spec.name);

        fs::create_dir(&outpath).map_err(|e| EngineError::fs(&outpath, e))?;

        let mut seeds = Vec::with_capacity(spec.n_seeds);
        for index in 0..spec.n_seeds {
            let dir = outpath.join(format!("seed{}", index));
            fs::create_dir(&dir).map_err(|e| EngineError::fs(&dir, e))?;

            let input_path = dir.join(&templated_name);
            let mut draws = VariableMap::new();
            if !input_path.exists() {
                fs::copy(script, &input_path).map_err(|e| EngineError::fs(&input_path, e))?;
                if let Some(variables) = spec.variables {
                    draws = template_seed(&input_path, variables, spec.seed_variables, rng)?;
                }
            }
            debug!("Prepared seed {} at {:?}", index, &dir);
            seeds.push(Seed {
                index,
                dir,
                input_path,
                draws,
            });
        }

        let job = Self {
            name: spec.name.to_string(),
            outpath,
            seed_variables: spec.seed_variables.to_vec(),
            variables: spec.variables.cloned(),
            seeds,
        };
        job.write_manifest()?;
        info!(
            "Created job '{}' with {} seed(s) at {:?}",
            job.name,
            job.seeds.len(),
            &job.outpath
        );
        Ok(job)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outpath(&self) -> &Path {
        &self.outpath
    }

    pub fn n_seeds(&self) -> usize {
        self.seeds.len()
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn seed(&self, index: usize) -> Option<&Seed> {
        self.seeds.get(index)
    }

    pub fn seed_variables(&self) -> &[String] {
        &self.seed_variables
    }

    pub fn variables(&self) -> Option<&VariableMap> {
        self.variables.as_ref()
    }

    /// Runs the simulation for one seed inside its own directory and waits for it.
    ///
    /// Standard output and error go to files in the seed directory. A non-zero exit
    /// status is returned, not raised.
    #[instrument(skip_all, name = "job_run", fields(job = %self.name, seed = seed))]
    pub fn run(&self, invoker: &ProcessInvoker, seed: usize) -> Result<ExitStatus, EngineError> {
        let entry = self.seed(seed).ok_or_else(|| EngineError::SeedOutOfRange {
            job: self.name.clone(),
            seed,
            n_seeds: self.seeds.len(),
        })?;

        let stdout_path = entry.dir.join(STDOUT_FILE);
        let stderr_path = entry.dir.join(STDERR_FILE);
        let stdout = File::create(&stdout_path).map_err(|e| EngineError::fs(&stdout_path, e))?;
        let stderr = File::create(&stderr_path).map_err(|e| EngineError::fs(&stderr_path, e))?;

        let mut command = invoker.command(&entry.input_path, &entry.dir);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        debug!("Launching: {}", invoker.describe(&entry.input_path));

        let start = Instant::now();
        let status = command.status().map_err(|e| EngineError::Spawn {
            program: invoker.program().to_string(),
            source: e,
        })?;
        info!(
            "{} seed {} finished in {:.2?} ({})",
            self.name,
            seed,
            start.elapsed(),
            status
        );
        Ok(status)
    }

    fn write_manifest(&self) -> Result<(), EngineError> {
        let manifest = Manifest {
            name: &self.name,
            n_seeds: self.seeds.len(),
            seed_variables: &self.seed_variables,
            variables: self.variables.as_ref(),
            seeds: &self.seeds,
        };
        let content = toml::to_string(&manifest)?;
        let path = self.outpath.join(MANIFEST_FILE);
        fs::write(&path, content).map_err(|e| EngineError::fs(&path, e))
    }
}

/// Applies the job variables, then a fresh draw for each seed variable.
fn template_seed<R: Rng + ?Sized>(
    input_path: &Path,
    variables: &VariableMap,
    seed_variables: &[String],
    rng: &mut R,
) -> Result<VariableMap, EngineError> {
    let mut script = InputScript::open(input_path)?;

    let fixed: VariableMap = variables
        .iter()
        .filter(|(name, _)| !seed_variables.contains(*name))
        .map(|(name, value)| (name.clone(), *value))
        .collect();
    script.apply(&fixed)?;

    let draws: VariableMap = seed_variables
        .iter()
        .map(|name| (name.clone(), ParamValue::Int(rng.gen_range(SEED_RANGE))))
        .collect();
    script.apply(&draws)?;
    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    const SCRIPT: &str = "\
variable T equal 300
variable velocity_seed equal 1
velocity all create ${T} ${velocity_seed}
";

    fn setup(dir: &Path) -> PathBuf {
        let script = dir.join("in.lj");
        fs::write(&script, SCRIPT).unwrap();
        script
    }

    fn variables(t: i64) -> VariableMap {
        let mut vars = VariableMap::new();
        vars.insert("T".to_string(), ParamValue::Int(t));
        vars.insert("velocity_seed".to_string(), ParamValue::Int(1));
        vars
    }

    fn seed_vars() -> Vec<String> {
        vec!["velocity_seed".to_string()]
    }

    #[test]
    fn create_lays_out_seed_directories_and_templates() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let vars = variables(600);
        let seed_vars = seed_vars();
        let spec = JobSpec {
            name: "T600",
            n_seeds: 3,
            seed_variables: &seed_vars,
            variables: Some(&vars),
        };
        let job = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(job.n_seeds(), 3);
        for (i, seed) in job.seeds().iter().enumerate() {
            assert_eq!(seed.dir, dir.path().join("T600").join(format!("seed{}", i)));
            assert_eq!(seed.input_path, seed.dir.join("in.lj_T600"));
            let content = fs::read_to_string(&seed.input_path).unwrap();
            assert!(content.starts_with("variable T equal 600\n"));

            let drawn = seed.draws["velocity_seed"];
            let ParamValue::Int(v) = drawn else {
                panic!("seed draw should be an integer");
            };
            assert!(SEED_RANGE.contains(&v));
            assert!(content.contains(&format!("variable velocity_seed equal {}\n", v)));
        }
        assert!(dir.path().join("T600").join(MANIFEST_FILE).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn read_only_parent_is_a_permission_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let parent = dir.path().join("locked");
        fs::create_dir(&parent).unwrap();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions.
        if fs::write(parent.join("writable"), "").is_ok() {
            return;
        }

        let vars = variables(300);
        let seed_vars = seed_vars();
        let spec = JobSpec {
            name: "T300",
            n_seeds: 1,
            seed_variables: &seed_vars,
            variables: Some(&vars),
        };
        let result = Job::create(&parent, &script, spec, &mut StdRng::seed_from_u64(1));
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(EngineError::PermissionDenied { path, .. }) => {
                assert_eq!(path, parent.join("T300"))
            }
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
    }

    #[test]
    fn seeded_generator_gives_reproducible_draws() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let vars = variables(300);
        let seed_vars = seed_vars();

        let draws_for = |name: &str| {
            let spec = JobSpec {
                name,
                n_seeds: 4,
                seed_variables: &seed_vars,
                variables: Some(&vars),
            };
            let job =
                Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(42)).unwrap();
            job.seeds()
                .iter()
                .map(|s| s.draws["velocity_seed"])
                .collect::<Vec<_>>()
        };

        let first = draws_for("a");
        let second = draws_for("b");
        assert_eq!(first, second);
        assert!(first.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn existing_job_directory_is_never_merged() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let existing = dir.path().join("T300");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("keep.txt"), "untouched").unwrap();

        let spec = JobSpec {
            name: "T300",
            n_seeds: 1,
            seed_variables: &[],
            variables: None,
        };
        let result = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(0));

        assert!(matches!(result, Err(EngineError::JobExists { .. })));
        assert_eq!(
            fs::read_to_string(existing.join("keep.txt")).unwrap(),
            "untouched"
        );
        assert!(!existing.join("seed0").exists());
    }

    #[test]
    fn missing_seed_variable_fails_before_any_directory_exists() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let mut vars = variables(300);
        vars.remove("velocity_seed");
        let seed_vars = seed_vars();
        let spec = JobSpec {
            name: "T300",
            n_seeds: 2,
            seed_variables: &seed_vars,
            variables: Some(&vars),
        };

        let result = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(EngineError::SeedVariableMissing { ref name, .. }) if name == "velocity_seed"
        ));
        assert!(!dir.path().join("T300").exists());
    }

    #[test]
    fn without_variables_the_script_is_copied_verbatim() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let seed_vars = seed_vars();
        let spec = JobSpec {
            name: "base",
            n_seeds: 1,
            seed_variables: &seed_vars,
            variables: None,
        };
        let job = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(0)).unwrap();

        let seed = &job.seeds()[0];
        assert_eq!(fs::read_to_string(&seed.input_path).unwrap(), SCRIPT);
        assert!(seed.draws.is_empty());
    }

    #[test]
    fn manifest_records_variables_and_draws() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let vars = variables(450);
        let seed_vars = seed_vars();
        let spec = JobSpec {
            name: "T450",
            n_seeds: 2,
            seed_variables: &seed_vars,
            variables: Some(&vars),
        };
        let job = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(3)).unwrap();

        let text = fs::read_to_string(job.outpath().join(MANIFEST_FILE)).unwrap();
        let manifest: toml::Table = toml::from_str(&text).unwrap();
        assert_eq!(manifest["name"].as_str(), Some("T450"));
        assert_eq!(manifest["n_seeds"].as_integer(), Some(2));
        assert_eq!(manifest["variables"]["T"].as_integer(), Some(450));

        let seeds = manifest["seeds"].as_array().unwrap();
        assert_eq!(seeds.len(), 2);
        let ParamValue::Int(drawn) = job.seeds()[1].draws["velocity_seed"] else {
            panic!("seed draw should be an integer");
        };
        assert_eq!(seeds[1]["draws"]["velocity_seed"].as_integer(), Some(drawn));
    }

    #[test]
    fn run_rejects_seed_out_of_range() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let spec = JobSpec {
            name: "base",
            n_seeds: 1,
            seed_variables: &[],
            variables: None,
        };
        let job = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(0)).unwrap();
        let invoker = ProcessInvoker::from_template("true {input}", 1).unwrap();

        assert!(matches!(
            job.run(&invoker, 1),
            Err(EngineError::SeedOutOfRange {
                seed: 1,
                n_seeds: 1,
                ..
            })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn run_executes_in_the_seed_directory_and_captures_output() {
        let dir = tempdir().unwrap();
        let script = setup(dir.path());
        let spec = JobSpec {
            name: "base",
            n_seeds: 1,
            seed_variables: &[],
            variables: None,
        };
        let job = Job::create(dir.path(), &script, spec, &mut StdRng::seed_from_u64(0)).unwrap();

        let ok = ProcessInvoker::from_template("ls {input}", 1).unwrap();
        assert!(job.run(&ok, 0).unwrap().success());
        let seed_dir = &job.seeds()[0].dir;
        let stdout = fs::read_to_string(seed_dir.join(STDOUT_FILE)).unwrap();
        assert!(stdout.contains("in.lj_base"));

        let fail = ProcessInvoker::from_template("false {input}", 1).unwrap();
        assert!(!job.run(&fail, 0).unwrap().success());
    }
}
