use super::params::{ParamValue, ParameterSet};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// How a parameter takes part in combination generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pegging {
    /// Contributes its candidate list to the Cartesian product.
    Free,
    /// Takes the candidate at the same position as the value chosen for the
    /// referenced free parameter.
    PeggedTo(usize),
}

impl Pegging {
    /// Decodes the command-line convention where `-1` means free and any other
    /// integer is the index of the parameter to peg to.
    pub fn from_index(index: i64) -> Result<Self, CombinationError> {
        match index {
            -1 => Ok(Pegging::Free),
            i if i >= 0 => Ok(Pegging::PeggedTo(i as usize)),
            i => Err(CombinationError::InvalidPegIndex(i)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum CombinationError {
    #[error("Expected {expected} {what}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Parameter name '{0}' appears more than once")]
    DuplicateName(String),

    #[error("Invalid pegging index {0}; use -1 for free parameters")]
    InvalidPegIndex(i64),

    #[error("Parameter '{param}' cannot be pegged to itself")]
    SelfPeg { param: String },

    #[error("Parameter '{param}' is pegged to index {index}, but only {count} parameters exist")]
    PegIndexOutOfRange {
        param: String,
        index: usize,
        count: usize,
    },

    #[error("Parameter '{param}' is pegged to '{target}', which is itself pegged")]
    PegToPegged { param: String, target: String },

    #[error(
        "Parameter '{param}' has {found} candidate values but is pegged to '{target}' with {expected}"
    )]
    PeggedLengthMismatch {
        param: String,
        target: String,
        expected: usize,
        found: usize,
    },

    #[error("Value {value} of '{target}' not found in its candidate list while resolving '{param}'")]
    PeggedValueNotFound {
        param: String,
        target: String,
        value: ParamValue,
    },

    #[error("Combination count overflows the addressable range")]
    TooManyCombinations,
}

/// A validated description of a parameter sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationSpec {
    names: Vec<String>,
    values: Vec<Vec<ParamValue>>,
    pegging: Vec<Pegging>,
}

impl CombinationSpec {
    /// Validates names, candidate lists and pegging before anything is generated.
    ///
    /// A missing pegging vector treats every parameter as free.
    pub fn new(
        names: Vec<String>,
        values: Vec<Vec<ParamValue>>,
        pegging: Option<Vec<Pegging>>,
    ) -> Result<Self, CombinationError> {
        if values.len() != names.len() {
            return Err(CombinationError::LengthMismatch {
                what: "value lists",
                expected: names.len(),
                found: values.len(),
            });
        }
        let pegging = pegging.unwrap_or_else(|| vec![Pegging::Free; names.len()]);
        if pegging.len() != names.len() {
            return Err(CombinationError::LengthMismatch {
                what: "pegging entries",
                expected: names.len(),
                found: pegging.len(),
            });
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(CombinationError::DuplicateName(name.clone()));
            }
        }

        for (i, peg) in pegging.iter().enumerate() {
            let Pegging::PeggedTo(k) = *peg else {
                continue;
            };
            if k == i {
                return Err(CombinationError::SelfPeg {
                    param: names[i].clone(),
                });
            }
            if k >= names.len() {
                return Err(CombinationError::PegIndexOutOfRange {
                    param: names[i].clone(),
                    index: k,
                    count: names.len(),
                });
            }
            if pegging[k] != Pegging::Free {
                return Err(CombinationError::PegToPegged {
                    param: names[i].clone(),
                    target: names[k].clone(),
                });
            }
            if values[i].len() != values[k].len() {
                return Err(CombinationError::PeggedLengthMismatch {
                    param: names[i].clone(),
                    target: names[k].clone(),
                    expected: values[k].len(),
                    found: values[i].len(),
                });
            }
        }

        Ok(Self {
            names,
            values,
            pegging,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn pegging(&self) -> &[Pegging] {
        &self.pegging
    }

    fn free_indices(&self) -> Vec<usize> {
        self.pegging
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Pegging::Free)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of rows [`generate`](Self::generate) will produce.
    pub fn combination_count(&self) -> Result<usize, CombinationError> {
        self.free_indices()
            .iter()
            .try_fold(1usize, |acc, &i| acc.checked_mul(self.values[i].len()))
            .ok_or(CombinationError::TooManyCombinations)
    }

    /// Expands the Cartesian product of the free parameters and resolves every pegged
    /// parameter positionally against the parameter it is pegged to.
    ///
    /// Rows are in lexicographic product order: the last free parameter varies fastest.
    pub fn generate(&self) -> Result<CombinationMatrix, CombinationError> {
        let free = self.free_indices();
        let total = self.combination_count()?;
        debug!(
            "Generating {} combinations from {} free and {} pegged parameters.",
            total,
            free.len(),
            self.names.len() - free.len()
        );

        let mut columns: Vec<Vec<ParamValue>> = vec![Vec::with_capacity(total); self.names.len()];
        let mut choice = vec![0usize; self.names.len()];

        for row in 0..total {
            let mut rem = row;
            for &i in free.iter().rev() {
                let len = self.values[i].len();
                choice[i] = rem % len;
                rem /= len;
            }

            for &i in &free {
                columns[i].push(self.values[i][choice[i]]);
            }

            for (p, peg) in self.pegging.iter().enumerate() {
                let Pegging::PeggedTo(k) = *peg else {
                    continue;
                };
                let chosen = self.values[k][choice[k]];
                let position = self.values[k]
                    .iter()
                    .position(|candidate| *candidate == chosen)
                    .ok_or_else(|| CombinationError::PeggedValueNotFound {
                        param: self.names[p].clone(),
                        target: self.names[k].clone(),
                        value: chosen,
                    })?;
                columns[p].push(self.values[p][position]);
            }
        }

        Ok(CombinationMatrix {
            columns: self.names.iter().cloned().zip(columns).collect(),
            rows: total,
        })
    }
}

/// Generated combinations in columnar form: every column has one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationMatrix {
    columns: Vec<(String, Vec<ParamValue>)>,
    rows: usize,
}

impl CombinationMatrix {
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[ParamValue]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn row(&self, index: usize) -> Option<ParameterSet> {
        if index >= self.rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|(name, values)| (name.as_str(), values[index]))
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = ParameterSet> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i))
    }
}

/// Convenience wrapper over [`CombinationSpec::new`] and [`CombinationSpec::generate`].
pub fn generate_combinations(
    names: Vec<String>,
    values: Vec<Vec<ParamValue>>,
    pegging: Option<Vec<Pegging>>,
) -> Result<CombinationMatrix, CombinationError> {
    CombinationSpec::new(names, values, pegging)?.generate()
}
