use std::path::PathBuf;

use anyhow::Context as _;
use statcourt_analysis::{
    dispatch::Dispatcher,
    plot::BitmapRenderer,
    report::format_value,
    session::Session,
    spec::{CorrelationMethod, TestSpec},
};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Input CSV file
    data: PathBuf,
    /// JSON file with a list of test specifications
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chi-square test between two categorical columns
    #[arg(long, value_name = "COL1,COL2", value_parser = parse_chi2)]
    chi2: Vec<TestSpec>,
    /// Welch's t-test of a numeric column across a two-valued categorical column
    #[arg(long, value_name = "NUM,CAT", value_parser = parse_ttest)]
    ttest: Vec<TestSpec>,
    /// Correlation between two numeric columns (METHOD: pearson or spearman)
    #[arg(long, value_name = "COL1,COL2[,METHOD]", value_parser = parse_correlation)]
    correlation: Vec<TestSpec>,
    /// Directory receiving the report and plots
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
}

fn split_columns(s: &str) -> Vec<&str> {
    s.split(',').map(str::trim).collect()
}

fn parse_chi2(s: &str) -> Result<TestSpec, String> {
    match split_columns(s)[..] {
        [col1, col2] => Ok(TestSpec::categorical_association(col1, col2)),
        _ => Err("expected COL1,COL2".to_owned()),
    }
}

fn parse_ttest(s: &str) -> Result<TestSpec, String> {
    match split_columns(s)[..] {
        [num, cat] => Ok(TestSpec::mean_difference(num, cat)),
        _ => Err("expected NUM,CAT".to_owned()),
    }
}

fn parse_correlation(s: &str) -> Result<TestSpec, String> {
    match split_columns(s)[..] {
        [col1, col2] => Ok(TestSpec::correlation(
            col1,
            col2,
            CorrelationMethod::default(),
        )),
        [col1, col2, method] => {
            let method = method
                .parse::<CorrelationMethod>()
                .map_err(|e| e.to_string())?;
            Ok(TestSpec::correlation(col1, col2, method))
        }
        _ => Err("expected COL1,COL2[,METHOD]".to_owned()),
    }
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let RunArg {
        data,
        config,
        chi2,
        ttest,
        correlation,
        results_dir,
    } = arg;

    let dataset = util::read_dataset(data)?;

    let mut specs = match config {
        Some(path) => {
            TestSpec::from_records(util::read_json_file::<Vec<serde_json::Value>, _>(
                "test plan",
                path,
            )?)
        }
        None => vec![],
    };
    specs.extend(chi2.iter().chain(ttest).chain(correlation).cloned());
    anyhow::ensure!(
        !specs.is_empty(),
        "No tests requested; use --config, --chi2, --ttest or --correlation"
    );

    // unrecognized kinds are left to the dispatcher, which skips them
    for (index, spec) in specs.iter().enumerate() {
        if spec.kind().is_some() {
            spec.validate(&dataset)
                .with_context(|| format!("Invalid test #{index} ({})", spec.hypothesis()))?;
        }
    }

    let session = Session::new(results_dir);
    eprintln!("Running {} test(s)...", specs.len());
    let summary = Dispatcher::new(&session, BitmapRenderer::default())
        .run(&dataset, &specs)
        .with_context(|| {
            format!(
                "Failed to write report: {}",
                session.report_path().display()
            )
        })?;

    for outcome in &summary.outcomes {
        match outcome {
            Ok(row) => println!(
                "{}: {} (p={}) -> {}",
                row.test,
                row.hypothesis,
                format_value(row.p_value),
                row.verdict
            ),
            Err(skipped) => println!("{skipped}"),
        }
    }
    println!("Report written to {}", summary.report_path.display());
    Ok(())
}
