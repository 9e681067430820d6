use mdsweep::core::combinations::{CombinationError, Pegging};
use mdsweep::core::params::ParamValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Expected a bracketed list of lists such as '[[1, 2], [3, 4]]', got '{0}'.")]
    NotAListOfLists(String),

    #[error("Unbalanced brackets in '{0}'.")]
    Unbalanced(String),

    #[error("'{value}' in list {list} is not a number.")]
    InvalidValue { list: usize, value: String },

    #[error("Parameter name list '{0}' is empty.")]
    EmptyNames(String),

    #[error("'{0}' is not an integer pegging index.")]
    InvalidIndex(String),

    #[error(transparent)]
    Pegging(#[from] CombinationError),
}

fn strip_brackets(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(s)
}

/// Parses parameter names given as `T,L` or as a bracketed, quoted list like `['T', 'L']`.
pub fn parse_names(input: &str) -> Result<Vec<String>, ParseError> {
    let names: Vec<String> = strip_brackets(input)
        .split(',')
        .map(|n| n.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(ParseError::EmptyNames(input.to_string()));
    }
    Ok(names)
}

/// Parses candidate values written as a list of lists, e.g. `[[10, 20], [5.5, 5.4]]`.
pub fn parse_value_lists(input: &str) -> Result<Vec<Vec<ParamValue>>, ParseError> {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| ParseError::NotAListOfLists(input.to_string()))?;

    let mut lists = Vec::new();
    let mut rest = inner.trim();
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| ParseError::NotAListOfLists(input.to_string()))?;
        let end = body
            .find(']')
            .ok_or_else(|| ParseError::Unbalanced(input.to_string()))?;
        let items = &body[..end];
        if items.contains('[') {
            return Err(ParseError::Unbalanced(input.to_string()));
        }

        let list_idx = lists.len();
        let values = items
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<ParamValue>().map_err(|_| ParseError::InvalidValue {
                    list: list_idx,
                    value: t.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        lists.push(values);

        rest = body[end + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Ok(lists)
}

/// Parses a pegging vector such as `-1,-1,0` or `[-1, -1, 0]`.
pub fn parse_pegging(input: &str) -> Result<Vec<Pegging>, ParseError> {
    strip_brackets(input)
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let index: i64 = t
                .parse()
                .map_err(|_| ParseError::InvalidIndex(t.to_string()))?;
            Ok(Pegging::from_index(index)?)
        })
        .collect()
}
