use thiserror::Error;

/// Numeric columns keyed by heading, in the order the headings appear in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    headings: Vec<String>,
    columns: Vec<Vec<f64>>,
}

#[derive(Debug, Error)]
pub enum TableParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing required marker line starting with '{0}'")]
    MissingMarker(&'static str),
    #[error("No column headings found before the first data line")]
    MissingHeadings,
    #[error("Table contains no data rows")]
    EmptyTable,
    #[error("Invalid number '{value}' on line {line}")]
    InvalidNumber { line: usize, value: String },
    #[error("Line {line} has {found} values, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl DataTable {
    /// Builds a table from headings and row-major data.
    ///
    /// `rows` are `(line_number, values)` pairs; the line number is only used for errors.
    pub(crate) fn from_rows(
        headings: Vec<String>,
        rows: Vec<(usize, Vec<f64>)>,
    ) -> Result<Self, TableParseError> {
        if headings.is_empty() {
            return Err(TableParseError::MissingHeadings);
        }
        if rows.is_empty() {
            return Err(TableParseError::EmptyTable);
        }
        let mut columns = vec![Vec::with_capacity(rows.len()); headings.len()];
        for (line, row) in rows {
            if row.len() != headings.len() {
                return Err(TableParseError::RaggedRow {
                    line,
                    expected: headings.len(),
                    found: row.len(),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Ok(Self { headings, columns })
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn column(&self, heading: &str) -> Option<&[f64]> {
        self.headings
            .iter()
            .position(|h| h == heading)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.headings
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

pub(crate) fn parse_row<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec<f64>, TableParseError> {
    tokens
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| TableParseError::InvalidNumber {
                    line,
                    value: tok.to_string(),
                })
        })
        .collect()
}
