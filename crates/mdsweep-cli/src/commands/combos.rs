use crate::cli::CombosArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use mdsweep::core::combinations::{CombinationMatrix, CombinationSpec};
use mdsweep::core::io::combinations::{DEFAULT_COMBINATIONS_FILE, write_combinations_to_path};
use mdsweep::engine::error::EngineError;
use std::path::PathBuf;
use tracing::info;

pub async fn run(args: CombosArgs) -> Result<()> {
    let matrix = generate(&args)?;
    let path = write(&matrix, &args)?;

    println!(
        "✓ Wrote {} combination(s) of {} parameter(s) to {}",
        matrix.len(),
        matrix.names().count(),
        path.display()
    );
    for row in matrix.rows() {
        println!("  {}", row.job_name());
    }
    Ok(())
}

fn generate(args: &CombosArgs) -> Result<CombinationMatrix> {
    let names = parser::parse_names(&args.names).map_err(|e| CliError::Argument(e.to_string()))?;
    let values =
        parser::parse_value_lists(&args.values).map_err(|e| CliError::Argument(e.to_string()))?;
    let pegging = args
        .peg_to
        .as_deref()
        .map(parser::parse_pegging)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let spec = CombinationSpec::new(names, values, pegging).map_err(EngineError::from)?;
    let count = spec.combination_count().map_err(EngineError::from)?;
    info!(
        "Generating {} combination(s) for parameters {:?}",
        count,
        spec.names()
    );
    Ok(spec.generate().map_err(EngineError::from)?)
}

fn write(matrix: &CombinationMatrix, args: &CombosArgs) -> Result<PathBuf> {
    std::fs::create_dir_all(&args.output_dir)?;
    let path = args.output_dir.join(DEFAULT_COMBINATIONS_FILE);
    write_combinations_to_path(matrix, &path).map_err(EngineError::from)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdsweep::core::io::combinations::read_combinations_from_path;
    use mdsweep::core::params::ParamValue;
    use tempfile::tempdir;

    fn args(dir: PathBuf, peg_to: Option<&str>) -> CombosArgs {
        CombosArgs {
            names: "['Temp', 'Interval', 'Lattice_const']".to_string(),
            values: "[[10, 20, 30], [1, 2], [5.5, 5.4, 5.3]]".to_string(),
            peg_to: peg_to.map(String::from),
            output_dir: dir,
        }
    }

    #[test]
    fn pegged_lattice_constant_follows_temperature() {
        let dir = tempdir().unwrap();
        let args = args(dir.path().join("out"), Some("-1,-1,0"));

        let matrix = generate(&args).unwrap();
        let path = write(&matrix, &args).unwrap();
        let rows = read_combinations_from_path(&path).unwrap();

        assert_eq!(rows.len(), 6);
        let pairs: Vec<(ParamValue, ParamValue)> = rows
            .iter()
            .map(|r| (r.get("Temp").unwrap(), r.get("Lattice_const").unwrap()))
            .collect();
        assert_eq!(pairs[0], (ParamValue::Int(10), ParamValue::Float(5.5)));
        assert_eq!(pairs[3], (ParamValue::Int(20), ParamValue::Float(5.4)));
        assert_eq!(pairs[5], (ParamValue::Int(30), ParamValue::Float(5.3)));
    }

    #[test]
    fn self_pegging_is_an_error() {
        let dir = tempdir().unwrap();
        let args = args(dir.path().to_path_buf(), Some("0,-1,-1"));
        assert!(matches!(generate(&args), Err(CliError::Engine(_))));
    }

    #[test]
    fn bad_value_list_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path().to_path_buf(), None);
        args.values = "10, 20".to_string();
        assert!(matches!(generate(&args), Err(CliError::Argument(_))));
    }
}
