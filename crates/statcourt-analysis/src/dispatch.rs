//! Runs an ordered list of test requests against one dataset.
//!
//! Each request either succeeds, producing a report block and a summary
//! row, or is skipped with a reason. A failing one never prevents
//! the remaining ones from running. The summary table is inserted once all
//! requests have been processed.

use std::{error::Error, fmt::Write as _, io, path::PathBuf};

use crate::{
    adapter::{self, AdapterError},
    dataset::Dataset,
    plot::PlotRenderer,
    report::{Report, SummaryRow},
    result::TestResult,
    session::Session,
    spec::{ConfigError, TestSpec},
};

/// A test spec that produced no result.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("test #{index} skipped: {reason}")]
pub struct SkippedSpec {
    /// Position of the test spec in the input list.
    pub index: usize,
    pub reason: String,
}

pub type SpecOutcome = Result<SummaryRow, SkippedSpec>;

/// Outcome of every test spec, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub outcomes: Vec<SpecOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &SummaryRow> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedSpec> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }
}

#[derive(Debug)]
pub struct Dispatcher<'a, R> {
    session: &'a Session,
    renderer: R,
}

impl<'a, R> Dispatcher<'a, R>
where
    R: PlotRenderer,
{
    pub fn new(session: &'a Session, renderer: R) -> Self {
        Self { session, renderer }
    }

    /// Starts a fresh report and runs every test spec in order.
    ///
    /// Only failures to write the report itself are returned as errors.
    pub fn run(&self, dataset: &Dataset, specs: &[TestSpec]) -> io::Result<RunSummary> {
        let report = Report::initialize(self.session.report_path())?;

        let outcomes = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                log::info!("Running test #{index}: {spec:?}");
                self.run_one(&report, dataset, spec).map_err(|reason| {
                    log::warn!("Skipping test #{index}: {reason}");
                    SkippedSpec { index, reason }
                })
            })
            .collect::<Vec<_>>();

        let rows = outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok())
            .cloned()
            .collect::<Vec<_>>();
        report.insert_summary_table(&rows)?;
        log::info!(
            "Finished {} test(s), {} succeeded",
            outcomes.len(),
            rows.len()
        );

        Ok(RunSummary {
            report_path: report.path().to_owned(),
            outcomes,
        })
    }

    fn run_one(
        &self,
        report: &Report,
        dataset: &Dataset,
        spec: &TestSpec,
    ) -> Result<SummaryRow, String> {
        let result = self
            .compute(dataset, spec)
            .map_err(|err| error_chain(&err))?;
        log::debug!(
            "statistic={}, p_value={}, verdict={}",
            result.statistic,
            result.p_value,
            result.verdict
        );

        let hypothesis = spec.hypothesis();
        report
            .append_result(&hypothesis, &spec.report_test_name(), &result)
            .map_err(|err| format!("failed to append result to report: {err}"))?;

        Ok(SummaryRow {
            hypothesis,
            test: spec.summary_test_name(),
            p_value: result.p_value,
            verdict: result.verdict,
        })
    }

    fn compute(&self, dataset: &Dataset, spec: &TestSpec) -> Result<TestResult, AdapterError> {
        let Some(file_name) = spec.plot_file_name() else {
            return Err(ConfigError::UnrecognizedTest.into());
        };
        let plot_path = self.session.plot_path(&file_name);

        match spec {
            TestSpec::CategoricalAssociation { col1, col2, .. } => {
                adapter::categorical_association(dataset, col1, col2, &plot_path, &self.renderer)
            }
            TestSpec::MeanDifference { num, cat, .. } => {
                adapter::mean_difference(dataset, num, cat, &plot_path, &self.renderer)
            }
            TestSpec::Correlation {
                col1, col2, method, ..
            } => adapter::correlation(
                dataset,
                col1,
                col2,
                *method,
                Some(&plot_path),
                &self.renderer,
            ),
            TestSpec::Unrecognized => Err(ConfigError::UnrecognizedTest.into()),
        }
    }
}

/// Formats an error followed by each of its sources.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}
