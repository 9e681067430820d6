use crate::core::combinations::CombinationMatrix;
use crate::core::params::{ParamValue, ParameterSet};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// File name the combination generator writes by default.
pub const DEFAULT_COMBINATIONS_FILE: &str = "param_combos.csv";

#[derive(Debug, Error)]
pub enum CombinationFileError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid value '{value}' in column '{column}' on row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

/// Writes the matrix as CSV: one header row of parameter names, one row per combination.
pub fn write_combinations<W: Write>(
    matrix: &CombinationMatrix,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    let names: Vec<&str> = matrix.names().collect();
    if names.is_empty() {
        return Ok(());
    }
    wtr.write_record(&names)?;
    for row in matrix.rows() {
        wtr.write_record(row.iter().map(|(_, v)| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_combinations_to_path(
    matrix: &CombinationMatrix,
    path: impl AsRef<Path>,
) -> Result<(), CombinationFileError> {
    let path = path.as_ref();
    let to_err = |source| CombinationFileError::Csv {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|e| to_err(e.into()))?;
    write_combinations(matrix, file).map_err(to_err)
}

/// Reads combinations back, preserving the column order of the header.
pub fn read_combinations<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<Vec<ParameterSet>, CombinationFileError> {
    let to_err = |source| CombinationFileError::Csv {
        path: source_name.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(to_err)?.clone();

    let mut sets = Vec::new();
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record.map_err(to_err)?;
        let mut set = ParameterSet::new();
        for (column, cell) in headers.iter().zip(record.iter()) {
            let value: ParamValue =
                cell.parse()
                    .map_err(|_| CombinationFileError::InvalidValue {
                        row: row_idx + 1,
                        column: column.to_string(),
                        value: cell.to_string(),
                    })?;
            set.insert(column, value);
        }
        sets.push(set);
    }
    Ok(sets)
}

pub fn read_combinations_from_path(
    path: impl AsRef<Path>,
) -> Result<Vec<ParameterSet>, CombinationFileError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| CombinationFileError::Csv {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    read_combinations(file, &path.display().to_string())
}
