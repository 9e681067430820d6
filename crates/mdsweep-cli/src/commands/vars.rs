use crate::cli::VarsArgs;
use crate::error::{CliError, Result};
use mdsweep::core::io::input_script::{InputScript, Variable};

pub async fn run(args: VarsArgs) -> Result<()> {
    let script = InputScript::open(&args.script).map_err(|e| CliError::FileParsing {
        path: args.script.clone(),
        source: e.into(),
    })?;

    let variables = script.list_variables();
    if variables.is_empty() {
        println!("No modifiable variables found in {}", args.script.display());
        return Ok(());
    }
    print!("{}", render_table(&variables));
    Ok(())
}

fn render_table(variables: &[&Variable]) -> String {
    let name_width = variables
        .iter()
        .map(|v| v.name.len())
        .chain(std::iter::once("Variable".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<name_width$}  {}\n", "Variable", "Value");
    out.push_str(&format!("{:-<name_width$}  {:-<5}\n", "", ""));
    for var in variables {
        out.push_str(&format!("{:<name_width$}  {}\n", var.name, var.value));
    }
    out
}
