use std::path::PathBuf;

use statcourt_analysis::dataset::{ColumnSummary, Dataset};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ColumnsArg {
    /// Input CSV file
    data: PathBuf,
    /// Number of rows to preview
    #[arg(long, default_value_t = 5)]
    preview: usize,
    /// Print the column metadata as JSON
    #[arg(long)]
    json: bool,
    /// Write the column metadata as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ColumnsArg) -> anyhow::Result<()> {
    let ColumnsArg {
        data,
        preview,
        json,
        output,
    } = arg;

    let dataset = util::read_dataset(data)?;
    let summary = dataset.column_summary();

    if *json || output.is_some() {
        util::save_json(&summary, output.as_deref())?;
        if let Some(path) = output {
            eprintln!("Column metadata written to {}", path.display());
        }
        return Ok(());
    }

    print_summary(&summary);
    println!();
    print_preview(&dataset, *preview);
    Ok(())
}

fn print_summary(summary: &ColumnSummary) {
    println!("Numeric columns:     {}", summary.numeric.join(", "));
    println!("Categorical columns: {}", summary.categorical.join(", "));
    println!("Binary columns:      {}", summary.binary.join(", "));
}

fn print_preview(dataset: &Dataset, n: usize) {
    let header = dataset.column_names().map(str::to_owned).collect::<Vec<_>>();
    let rows = dataset.preview(n);
    let widths = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain([name.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    for row in [&header].into_iter().chain(&rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        println!("{}", line.join("  ").trim_end());
    }
}
