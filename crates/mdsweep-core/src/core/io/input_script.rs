use crate::core::params::{ParamValue, VariableMap};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// A free variable declared in an input script.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: ParamValue,
    /// Zero-based index of the declaring line.
    pub line: usize,
}

/// Outcome of [`InputScript::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    /// Names that were requested but are not free variables of the script.
    pub skipped: Vec<String>,
}

#[derive(Debug, Error)]
pub enum InputScriptError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to replace '{path}' atomically: {source}")]
    Persist {
        path: String,
        source: tempfile::PersistError,
    },
}

/// A simulation input script whose literal-valued `variable` lines can be rewritten.
///
/// Only declarations of the form `variable <name> <style> <number>` are tracked, where
/// `<number>` is a bare literal. Declarations built from expressions or other variables
/// (`variable t_damp equal 100*dt`) are left alone.
#[derive(Debug, Clone)]
pub struct InputScript {
    path: PathBuf,
    variables: BTreeMap<String, Variable>,
}

impl InputScript {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputScriptError> {
        let path = path.as_ref().to_path_buf();
        let content = read(&path)?;
        let variables = parse_variables(&content);
        debug!(
            "Parsed {} free variable(s) from {:?}",
            variables.len(),
            &path
        );
        Ok(Self { path, variables })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    /// Free variables in the order they are declared.
    pub fn list_variables(&self) -> Vec<&Variable> {
        let mut vars: Vec<&Variable> = self.variables.values().collect();
        vars.sort_by_key(|v| v.line);
        vars
    }

    pub fn free_variables(&self) -> VariableMap {
        self.variables
            .iter()
            .map(|(name, var)| (name.clone(), var.value))
            .collect()
    }

    pub fn is_free(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Rewrites the declaring line of every changed free variable as
    /// `variable <name> equal <value>` and replaces the file atomically.
    ///
    /// Every other line is written back byte for byte. Unknown names are reported in
    /// [`ApplyReport::skipped`] and logged, not treated as errors.
    pub fn apply(&mut self, changes: &VariableMap) -> Result<ApplyReport, InputScriptError> {
        let content = read(&self.path)?;
        let mut lines: Vec<String> = content.split_inclusive('\n').map(String::from).collect();
        let mut report = ApplyReport::default();

        for (name, value) in changes {
            let Some(var) = self.variables.get_mut(name) else {
                warn!(
                    "'{}' is not a modifiable variable in {:?}; it will not be changed.",
                    name, &self.path
                );
                report.skipped.push(name.clone());
                continue;
            };
            let Some(line) = lines.get_mut(var.line) else {
                warn!(
                    "Line {} of {:?} disappeared since parsing; skipping '{}'.",
                    var.line, &self.path, name
                );
                report.skipped.push(name.clone());
                continue;
            };
            let ending = line_ending(line);
            *line = format!("variable {} equal {}{}", name, value, ending);
            var.value = *value;
            report.applied.push(name.clone());
        }

        write_atomic(&self.path, &lines.concat())?;
        debug!(
            "Applied {} variable change(s) to {:?}",
            report.applied.len(),
            &self.path
        );
        Ok(report)
    }
}

fn parse_variables(content: &str) -> BTreeMap<String, Variable> {
    let mut variables = BTreeMap::new();
    for (line_idx, line) in content.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("variable") {
            continue;
        }
        let (Some(name), Some(_style), Some(token)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            continue;
        };
        if let Some(value) = ParamValue::parse_literal(token) {
            variables.insert(
                name.to_string(),
                Variable {
                    name: name.to_string(),
                    value,
                    line: line_idx,
                },
            );
        }
    }
    variables
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn read(path: &Path) -> Result<String, InputScriptError> {
    fs::read_to_string(path).map_err(|e| InputScriptError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Writes `content` to a sibling temporary file and renames it over `path`, keeping the
/// permissions of the file being replaced.
fn write_atomic(path: &Path, content: &str) -> Result<(), InputScriptError> {
    let io_err = |e| InputScriptError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let permissions = fs::metadata(path).map_err(io_err)?.permissions();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| InputScriptError::Persist {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
