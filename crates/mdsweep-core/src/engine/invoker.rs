use super::config::ConfigError;
use std::path::Path;
use std::process::Command;

const NP_PLACEHOLDER: &str = "{np}";
const INPUT_PLACEHOLDER: &str = "{input}";

/// Builds the external simulation command for one execution unit.
///
/// The template is split on whitespace; `{np}` is substituted once at construction and
/// `{input}` is substituted per unit with the path of its templated input script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvoker {
    program: String,
    args: Vec<String>,
}

impl ProcessInvoker {
    pub fn from_template(template: &str, np: usize) -> Result<Self, ConfigError> {
        if !template.contains(INPUT_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                parameter: "command_template",
                reason: format!("'{}' does not contain {}", template, INPUT_PLACEHOLDER),
            });
        }
        let np = np.to_string();
        let mut tokens = template
            .split_whitespace()
            .map(|t| t.replace(NP_PLACEHOLDER, &np));
        let program = tokens.next().ok_or(ConfigError::InvalidValue {
            parameter: "command_template",
            reason: "template is empty".to_string(),
        })?;
        if program.contains(INPUT_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                parameter: "command_template",
                reason: "the program itself cannot be the input placeholder".to_string(),
            });
        }
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn resolved_args(&self, input: &Path) -> Vec<String> {
        let input = input.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
            .collect()
    }

    /// A command ready to spawn, rooted at `workdir`.
    pub fn command(&self, input: &Path, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.resolved_args(input)).current_dir(workdir);
        cmd
    }

    /// The command line as it would be typed in a shell, for logs.
    pub fn describe(&self, input: &Path) -> String {
        std::iter::once(self.program.clone())
            .chain(self.resolved_args(input))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
