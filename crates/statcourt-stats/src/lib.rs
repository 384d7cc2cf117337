//! Statistical primitives for the statcourt hypothesis-testing pipeline.
//!
//! This crate provides the numeric core behind every test in a report:
//!
//! - **Descriptive statistics**: mean, median, sample variance, standard deviation
//! - **Ranks**: average ranks with tie handling, used by Spearman correlation
//! - **Quartiles**: five-number summaries for box plots
//! - **Contingency tables**: cross-tabulation and the chi-square test of independence
//! - **Two-sample t-test**: Welch's unequal-variance t-test
//! - **Correlation**: Pearson (linear) and Spearman (monotonic) coefficients with p-values
//!
//! Every hypothesis test returns a statistic and a two-sided p-value. The
//! distribution tails are evaluated with [`statrs`].
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing samples
//! - [`rank`]: Average ranking of samples
//! - [`quartiles`]: Quartiles and whiskers
//! - [`contingency`]: Contingency tables and chi-square tests
//! - [`t_test`]: Welch's two-sample t-test
//! - [`correlation`]: Pearson and Spearman correlation tests
//!
//! # Examples
//!
//! ## Chi-square test of independence
//!
//! ```
//! use statcourt_stats::contingency::{ChiSquareTest, ContingencyTable};
//!
//! let pairs = [("a", "x"), ("a", "x"), ("a", "y"), ("b", "y"), ("b", "y"), ("b", "x")];
//! let table = ContingencyTable::from_pairs(pairs);
//! assert_eq!(table.degrees_of_freedom(), 1);
//!
//! let test = ChiSquareTest::from_table(&table).unwrap();
//! assert!((0.0..=1.0).contains(&test.p_value));
//! ```
//!
//! ## Welch's t-test
//!
//! ```
//! use statcourt_stats::t_test::WelchTTest;
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [6.0, 7.0, 8.0, 9.0, 10.0];
//! let test = WelchTTest::new(&a, &b).unwrap();
//! assert!(test.statistic < 0.0);
//! assert!(test.p_value < 0.05);
//! ```
//!
//! ## Correlation
//!
//! ```
//! use statcourt_stats::correlation::CorrelationTest;
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let test = CorrelationTest::pearson(&x, &x).unwrap();
//! assert!((test.coefficient - 1.0).abs() < 1e-12);
//! assert_eq!(test.p_value, 0.0);
//! ```

pub mod contingency;
pub mod correlation;
pub mod descriptive;
pub mod quartiles;
pub mod rank;

/// Errors raised when a hypothesis test cannot be computed from its input.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TestError {
    #[display("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[display("samples have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[display("sample has zero variance")]
    ZeroVariance,
    #[display("contingency table is empty")]
    EmptyTable,
    #[display("contingency table has an expected frequency of zero")]
    ZeroExpectedFrequency,
    #[display("{what} is not finite")]
    NonFinite { what: &'static str },
    #[display("invalid distribution parameters: {reason}")]
    Distribution { reason: String },
}

impl TestError {
    fn distribution<E>(err: &E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Distribution {
            reason: err.to_string(),
        }
    }
}

/// Rejects samples containing NaN or infinite values.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<(), TestError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(TestError::NonFinite {
            what: "sample value",
        })
    }
}

#[cfg(test)]
pub(crate) fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}
