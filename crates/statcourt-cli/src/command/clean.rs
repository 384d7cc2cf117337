use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context as _;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CleanArg {
    /// Input CSV file
    data: PathBuf,
    /// Output CSV file
    #[arg(long)]
    output: PathBuf,
    /// Keep an indicator column for every category
    #[arg(long)]
    no_drop_first: bool,
}

pub(crate) fn run(arg: &CleanArg) -> anyhow::Result<()> {
    let CleanArg {
        data,
        output,
        no_drop_first,
    } = arg;

    let dataset = util::read_dataset(data)?;

    let complete = dataset.drop_incomplete_rows();
    eprintln!(
        "Dropped {} incomplete rows",
        dataset.row_count() - complete.row_count()
    );

    let encoded = complete.one_hot_encode(!no_drop_first);
    eprintln!(
        "Encoded {} columns into {} columns",
        complete.columns().len(),
        encoded.columns().len()
    );

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    encoded
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("Failed to write cleaned dataset: {}", output.display()))?;
    eprintln!("Cleaned dataset written to {}", output.display());
    Ok(())
}
