use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::SweepArgs;
use crate::error::{CliError, Result};
use mdsweep::engine::config::SweepConfigBuilder;
use std::path::PathBuf;
use std::str::FromStr;

pub fn build_config(args: &SweepArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let project_file = file_config.project.take().unwrap_or_default();
    let seeds_file = file_config.seeds.take().unwrap_or_default();
    let exec_file = file_config.execution.take().unwrap_or_default();
    let combos_file = file_config.combinations.take().unwrap_or_default();

    let name = args.name.clone().or(project_file.name).ok_or_else(|| {
        CliError::Config(
            "A project name is required either via --name or `project.name`.".to_string(),
        )
    })?;
    let input_script = args
        .input
        .clone()
        .or(project_file.input_script)
        .ok_or_else(|| {
            CliError::Config(
                "An input script is required either via --input or `project.input-script`."
                    .to_string(),
            )
        })?;
    let base_path = args
        .base_path
        .clone()
        .or(project_file.base_path)
        .unwrap_or(defaults.base_path);

    let seed_count = args
        .seeds
        .or(seeds_file.count)
        .unwrap_or(defaults.seed_count);
    let seed_variables = if args.seed_vars.is_empty() {
        seeds_file.variables.unwrap_or(defaults.seed_variables)
    } else {
        args.seed_vars.clone()
    };
    let rng_seed = args.rng_seed.or(seeds_file.rng_seed);

    let ncores = args.ncores.or(exec_file.ncores).unwrap_or(defaults.ncores);
    let np = args.np.or(exec_file.np).unwrap_or(defaults.np);
    let command_template = args
        .command
        .clone()
        .or(exec_file.command)
        .unwrap_or(defaults.command_template);

    let (combinations_path, combinations_explicit) = match args.combos.clone().or(combos_file.file)
    {
        Some(path) => (path, true),
        None => (defaults.combinations_file, false),
    };

    let sweep = SweepConfigBuilder::new()
        .project_name(name)
        .input_script(input_script)
        .base_path(base_path)
        .seed_count(seed_count)
        .seed_variables(seed_variables)
        .rng_seed(rng_seed)
        .ncores(ncores)
        .np(np)
        .command_template(command_template)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        sweep,
        combinations_path,
        combinations_explicit,
        dry_run: args.dry_run,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "project.name" => {
                config.project.get_or_insert_with(Default::default).name =
                    Some(value_str.trim().to_string());
            }
            "project.input-script" => {
                config
                    .project
                    .get_or_insert_with(Default::default)
                    .input_script = Some(PathBuf::from(value_str.trim()));
            }
            "project.base-path" => {
                config.project.get_or_insert_with(Default::default).base_path =
                    Some(PathBuf::from(value_str.trim()));
            }
            "seeds.count" => {
                config.seeds.get_or_insert_with(Default::default).count =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "seeds.variables" => {
                config.seeds.get_or_insert_with(Default::default).variables = Some(
                    value_str
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            "seeds.rng-seed" => {
                config.seeds.get_or_insert_with(Default::default).rng_seed =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "execution.ncores" => {
                config.execution.get_or_insert_with(Default::default).ncores =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "execution.np" => {
                config.execution.get_or_insert_with(Default::default).np =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "execution.command" => {
                config.execution.get_or_insert_with(Default::default).command =
                    Some(value_str.trim().to_string());
            }
            "combinations.file" => {
                config.combinations.get_or_insert_with(Default::default).file =
                    Some(PathBuf::from(value_str.trim()));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdsweep::engine::config::DEFAULT_COMMAND_TEMPLATE;
    use std::fs;
    use tempfile::tempdir;

    fn base_args() -> SweepArgs {
        SweepArgs {
            input: Some(PathBuf::from("in.melt")),
            name: Some("melt".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_everything_not_given() {
        let app = build_config(&base_args()).expect("build ok");
        let defaults = DefaultsConfig::default();
        let cfg = app.sweep;

        assert_eq!(cfg.project.name, "melt");
        assert_eq!(cfg.project.base_path, PathBuf::from("."));
        assert_eq!(cfg.seeds.count, 1);
        assert_eq!(cfg.seeds.variables, vec!["velocity_seed"]);
        assert_eq!(cfg.seeds.rng_seed, None);
        assert_eq!(cfg.execution.ncores, defaults.ncores);
        assert_eq!(cfg.execution.np, 1);
        assert_eq!(cfg.execution.command_template, DEFAULT_COMMAND_TEMPLATE);
        assert_eq!(app.combinations_path, PathBuf::from("param_combos.csv"));
        assert!(!app.combinations_explicit);
        assert!(!app.dry_run);
    }

    #[test]
    fn missing_name_or_input_is_a_config_error() {
        let mut args = base_args();
        args.name = None;
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        let mut args = base_args();
        args.input = None;
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn file_values_are_used_and_cli_wins() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("sweep.toml");
        fs::write(
            &cfg_path,
            r#"
            [project]
            name = "from-file"
            input-script = "in.file"

            [seeds]
            count = 4
            variables = ["seed_a"]

            [execution]
            ncores = 12
            np = 3

            [combinations]
            file = "grid.csv"
            "#,
        )
        .unwrap();

        let args = SweepArgs {
            config: Some(cfg_path),
            np: Some(6),
            seed_vars: vec!["seed_b".to_string()],
            ..Default::default()
        };
        let app = build_config(&args).expect("build ok");
        let cfg = app.sweep;

        assert_eq!(cfg.project.name, "from-file");
        assert_eq!(cfg.project.input_script, PathBuf::from("in.file"));
        assert_eq!(cfg.seeds.count, 4);
        assert_eq!(cfg.seeds.variables, vec!["seed_b"]);
        assert_eq!(cfg.execution.ncores, 12);
        assert_eq!(cfg.execution.np, 6);
        assert_eq!(app.combinations_path, PathBuf::from("grid.csv"));
        assert!(app.combinations_explicit);
    }

    #[test]
    fn set_values_override_file_but_not_flags() {
        let mut args = base_args();
        args.seeds = Some(2);
        args.set_values = vec![
            "seeds.count=9".to_string(),
            "seeds.variables=v1, v2".to_string(),
            "seeds.rng-seed=77".to_string(),
            "execution.ncores=8".to_string(),
            "execution.np=2".to_string(),
            "execution.command=lmp -in {input}".to_string(),
        ];

        let cfg = build_config(&args).expect("build ok").sweep;
        assert_eq!(cfg.seeds.count, 2);
        assert_eq!(cfg.seeds.variables, vec!["v1", "v2"]);
        assert_eq!(cfg.seeds.rng_seed, Some(77));
        assert_eq!(cfg.execution.max_parallel(), 4);
        assert_eq!(cfg.execution.command_template, "lmp -in {input}");
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["execution.np", "execution.np=four", "execution.cores=4"] {
            let mut args = base_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args), Err(CliError::Config(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn zero_np_is_reported_by_the_builder() {
        let mut args = base_args();
        args.np = Some(0);
        let Err(CliError::Config(msg)) = build_config(&args) else {
            panic!("expected a configuration error");
        };
        assert!(msg.contains("np"));
    }
}
