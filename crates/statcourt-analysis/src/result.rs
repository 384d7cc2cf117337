use std::path::PathBuf;

use serde::Serialize;

/// Fixed significance level used to classify results.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Outcome of a hypothesis test at [`SIGNIFICANCE_LEVEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[display("Reject H₀")]
    RejectNull,
    #[display("Fail to Reject H₀")]
    FailToReject,
}

impl Verdict {
    /// `RejectNull` iff `p_value < SIGNIFICANCE_LEVEL`.
    #[must_use]
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < SIGNIFICANCE_LEVEL {
            Verdict::RejectNull
        } else {
            Verdict::FailToReject
        }
    }
}

/// A computed hypothesis test, ready to be written to a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub verdict: Verdict,
    pub interpretation: String,
    /// Where the supporting plot was written, if one was rendered.
    pub plot: Option<PathBuf>,
}

impl TestResult {
    pub(crate) fn new(
        statistic: f64,
        p_value: f64,
        interpretation: impl FnOnce(Verdict) -> String,
        plot: Option<PathBuf>,
    ) -> Self {
        let verdict = Verdict::from_p_value(p_value);
        Self {
            statistic,
            p_value,
            verdict,
            interpretation: interpretation(verdict),
            plot,
        }
    }
}
