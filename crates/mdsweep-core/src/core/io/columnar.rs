use super::table::{DataTable, TableParseError, parse_row};
use super::traits::DataTableFile;
use std::io::BufRead;

/// Parser for column-oriented output such as `fix ave/time ... file out.txt`.
///
/// The first non-comment line is the first data row. Headings are taken from the last
/// commented line before it, with the comment prefix removed. Every value is read as
/// an `f64`.
#[derive(Debug, Clone)]
pub struct ColumnarDump {
    comment: String,
    delimiter: Option<char>,
}

impl Default for ColumnarDump {
    fn default() -> Self {
        Self {
            comment: "#".to_string(),
            delimiter: None,
        }
    }
}

impl ColumnarDump {
    pub fn new(comment: impl Into<String>, delimiter: Option<char>) -> Self {
        Self {
            comment: comment.into(),
            delimiter,
        }
    }

    fn tokens<'a>(&self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.delimiter {
            Some(d) => Box::new(line.split(d).map(str::trim).filter(|t| !t.is_empty())),
            None => Box::new(line.split_whitespace()),
        }
    }
}

impl DataTableFile for ColumnarDump {
    fn read_from(&self, reader: &mut impl BufRead) -> Result<DataTable, TableParseError> {
        let mut last_comment: Option<String> = None;
        let mut headings: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with(self.comment.as_str()) {
                if headings.is_none() {
                    last_comment = Some(trimmed.to_string());
                }
                continue;
            }
            if headings.is_none() {
                let comment = last_comment.take().ok_or(TableParseError::MissingHeadings)?;
                let stripped = comment.replace(self.comment.as_str(), "");
                headings = Some(self.tokens(&stripped).map(String::from).collect());
            }
            rows.push((idx + 1, parse_row(self.tokens(trimmed), idx + 1)?));
        }

        let headings = headings.ok_or(TableParseError::EmptyTable)?;
        DataTable::from_rows(headings, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn recovers_series_from_fix_ave_time_output() {
        let steps = [1000.0, 2000.0, 3000.0];
        let energy = [-3.25, -3.5, -3.125];
        let pressure = [1.0, 0.5, 0.25];
        let mut text = String::from("# Time-averaged data for fix Uavg\n# TimeStep c_2 v_pesq\n");
        for i in 0..3 {
            text.push_str(&format!("{} {} {}\n", steps[i], energy[i], pressure[i]));
        }

        let table = ColumnarDump::default()
            .read_from(&mut Cursor::new(text))
            .unwrap();

        assert_eq!(table.headings(), &["TimeStep", "c_2", "v_pesq"]);
        assert_eq!(table.column("TimeStep").unwrap(), &steps);
        assert_eq!(table.column("c_2").unwrap(), &energy);
        assert_eq!(table.column("v_pesq").unwrap(), &pressure);
    }

    #[test]
    fn honors_custom_comment_and_delimiter() {
        let text = "% header\n% a, b\n1.5, 2\n\n3, 4.25\n% trailing note\n";
        let table = ColumnarDump::new("%", Some(','))
            .read_from(&mut Cursor::new(text))
            .unwrap();
        assert_eq!(table.column("a").unwrap(), &[1.5, 3.0]);
        assert_eq!(table.column("b").unwrap(), &[2.0, 4.25]);
    }

    #[test]
    fn data_without_a_heading_comment_is_rejected() {
        let result = ColumnarDump::default().read_from(&mut Cursor::new("1 2\n3 4\n"));
        assert!(matches!(result, Err(TableParseError::MissingHeadings)));
    }

    #[test]
    fn comments_only_is_an_empty_table() {
        let result = ColumnarDump::default().read_from(&mut Cursor::new("# a b\n"));
        assert!(matches!(result, Err(TableParseError::EmptyTable)));
    }
}
