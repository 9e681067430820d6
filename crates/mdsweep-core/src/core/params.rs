use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const BASE_JOB_NAME: &str = "base";

/// Resolved variable assignment for an input script, keyed by variable name.
pub type VariableMap = BTreeMap<String, ParamValue>;

/// A numeric parameter value as it appears in a combination table or an input script.
///
/// Integers and floats are kept apart so that a value is written back the way it was
/// read, but they compare numerically: `Int(10) == Float(10.0)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("'{0}' is not a numeric value")]
pub struct ParseValueError(pub String);

impl ParamValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
        }
    }

    /// Parses a bare numeric literal: ASCII digits with at most one decimal point.
    ///
    /// Signs, exponents and anything expression-like are rejected, so
    /// `100*dt`, `-1` and `1e5` all return `None`.
    pub fn parse_literal(token: &str) -> Option<Self> {
        let mut dots = 0;
        let mut digits = 0;
        for c in token.chars() {
            match c {
                '.' => dots += 1,
                c if c.is_ascii_digit() => digits += 1,
                _ => return None,
            }
        }
        if digits == 0 || dots > 1 {
            return None;
        }
        if dots == 0 {
            token.parse().ok().map(ParamValue::Int)
        } else {
            token.parse().ok().map(ParamValue::Float)
        }
    }
}

impl FromStr for ParamValue {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(ParamValue::Int(v));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(ParamValue::Float(v)),
            _ => Err(ParseValueError(s.to_string())),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b,
            (ParamValue::Int(a), ParamValue::Float(b))
            | (ParamValue::Float(b), ParamValue::Int(a)) => (*a as f64) == *b,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

/// One row of a combination matrix: parameter names in column order with their values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, keeping the column position of an existing entry.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derives the job name for this row, e.g. `T10_L100` for `{T: 10, L: 100}`.
    ///
    /// A row without parameters is the unmodified script and is named `base`.
    pub fn job_name(&self) -> String {
        if self.entries.is_empty() {
            return BASE_JOB_NAME.to_string();
        }
        self.entries
            .iter()
            .map(|(name, value)| format!("{}{}", name, value))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn to_variable_map(&self) -> VariableMap {
        self.entries.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, ParamValue)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (S, ParamValue)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}
