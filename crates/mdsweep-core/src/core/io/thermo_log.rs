use super::table::{DataTable, TableParseError, parse_row};
use super::traits::DataTableFile;
use std::io::BufRead;

const TABLE_START_MARKER: &str = "Per MPI rank";
const TABLE_END_MARKER: &str = "Loop time";
const WARNING_PREFIX: &str = "WARNING";

/// Parser for the thermodynamic output table of a simulation log.
///
/// The table used is the last one in the log. Its headings are on the line after the
/// last `Per MPI rank` marker, and its rows run up to the next `Loop time` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermoLog;

impl DataTableFile for ThermoLog {
    fn read_from(&self, reader: &mut impl BufRead) -> Result<DataTable, TableParseError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

        let start = lines
            .iter()
            .rposition(|l| l.trim_start().starts_with(TABLE_START_MARKER))
            .ok_or(TableParseError::MissingMarker(TABLE_START_MARKER))?
            + 1;
        let end = lines[start..]
            .iter()
            .position(|l| l.trim_start().starts_with(TABLE_END_MARKER))
            .map(|offset| start + offset)
            .ok_or(TableParseError::MissingMarker(TABLE_END_MARKER))?;

        let Some(heading_line) = lines[start..end].first() else {
            return Err(TableParseError::MissingHeadings);
        };
        let headings: Vec<String> = heading_line
            .split_whitespace()
            .map(String::from)
            .collect();

        let mut rows = Vec::with_capacity(end - start);
        for (idx, line) in lines.iter().enumerate().take(end).skip(start + 1) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(WARNING_PREFIX) {
                continue;
            }
            rows.push((idx + 1, parse_row(trimmed.split_whitespace(), idx + 1)?));
        }

        DataTable::from_rows(headings, rows)
    }
}
