use super::table::{DataTable, TableParseError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsing strategy for simulation output that is laid out as numeric columns.
///
/// Generic outputs such as the thermo log have a fixed layout; files written by custom
/// dump or fix commands need a configured strategy. Both produce a [`DataTable`].
pub trait DataTableFile {
    /// Reads a table from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is not recognized or a value is not numeric.
    fn read_from(&self, reader: &mut impl BufRead) -> Result<DataTable, TableParseError>;

    /// Reads a table from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(&self, path: P) -> Result<DataTable, TableParseError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_from(&mut reader)
    }
}
