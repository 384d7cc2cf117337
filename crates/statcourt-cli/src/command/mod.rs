use clap::{Parser, Subcommand};

use self::{clean::CleanArg, columns::ColumnsArg, run::RunArg};

mod clean;
mod columns;
mod run;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Show column types and a preview of a CSV file
    Columns(#[clap(flatten)] ColumnsArg),
    /// Run hypothesis tests and write an HTML report
    Run(#[clap(flatten)] RunArg),
    /// Drop incomplete rows and one-hot encode categorical columns
    Clean(#[clap(flatten)] CleanArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    log::debug!("{args:?}");
    match args.mode {
        Mode::Columns(arg) => columns::run(&arg)?,
        Mode::Run(arg) => run::run(&arg)?,
        Mode::Clean(arg) => clean::run(&arg)?,
    }
    Ok(())
}
