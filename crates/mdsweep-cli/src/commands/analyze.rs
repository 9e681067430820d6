use crate::cli::{AnalyzeArgs, TableFormat};
use crate::error::{CliError, Result};
use mdsweep::core::analysis::{BlockAverage, block_average};
use mdsweep::core::io::DataTable;
use mdsweep::core::io::columnar::ColumnarDump;
use mdsweep::core::io::thermo_log::ThermoLog;
use mdsweep::core::io::traits::DataTableFile;
use tracing::{info, warn};

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let table = read_table(&args)?;
    info!(
        "Read {} row(s) with columns {:?} from {:?}",
        table.n_rows(),
        table.headings(),
        &args.file
    );

    let rows = analyze(&table, &args)?;
    println!(
        "{:<16} {:>14} {:>14} {:>12} {:>6}",
        "Column", "Mean", "Std. error", "Corr. time", "Block"
    );
    for (heading, result) in rows {
        match result {
            Some(avg) => println!(
                "{:<16} {:>14.6e} {:>14.6e} {:>12.4} {:>6}",
                heading,
                avg.mean,
                avg.standard_error(),
                avg.correlation_time,
                avg.block_sizes[avg.best_transform]
            ),
            None => println!("{:<16} {:>14}", heading, "n/a"),
        }
    }
    Ok(())
}

fn read_table(args: &AnalyzeArgs) -> Result<DataTable> {
    let parsed = match args.format {
        TableFormat::Log => ThermoLog.read_from_path(&args.file),
        TableFormat::Columnar => {
            ColumnarDump::new(args.comment.clone(), args.delimiter).read_from_path(&args.file)
        }
    };
    parsed.map_err(|e| CliError::FileParsing {
        path: args.file.clone(),
        source: e.into(),
    })
}

/// Block-averages the selected columns; columns too short to analyze yield `None`.
fn analyze(table: &DataTable, args: &AnalyzeArgs) -> Result<Vec<(String, Option<BlockAverage>)>> {
    let headings: Vec<String> = if args.columns.is_empty() {
        table.headings().to_vec()
    } else {
        args.columns.clone()
    };

    let mut rows = Vec::with_capacity(headings.len());
    for heading in headings {
        let series = table.column(&heading).ok_or_else(|| {
            CliError::Argument(format!(
                "Column '{}' not found; available columns: {}",
                heading,
                table.headings().join(", ")
            ))
        })?;
        let result = match block_average(series, args.threshold, args.time_step) {
            Ok(avg) => Some(avg),
            Err(e) => {
                warn!("Skipping column '{}': {}", heading, e);
                None
            }
        };
        rows.push((heading, result));
    }
    Ok(rows)
}
