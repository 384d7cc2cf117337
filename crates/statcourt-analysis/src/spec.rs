//! Declarative descriptions of hypothesis tests to run.
//!
//! Test plans are usually read from JSON. Each record is tagged with its
//! `type`:
//!
//! ```json
//! [
//!   { "type": "chi2", "col1": "city", "col2": "segment" },
//!   { "type": "ttest", "num": "sales", "cat": "city" },
//!   { "type": "correlation", "col1": "sales", "col2": "visits", "method": "spearman" }
//! ]
//! ```
//!
//! Records with any other `type` deserialize to [`TestSpec::Unrecognized`].
//! [`TestSpec::from_records`] parses a plan one record at a time, so a record
//! without a `type` or with malformed fields is skipped as well instead of
//! invalidating the whole plan.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::dataset::{Column, Dataset};

/// Correlation coefficient to compute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Pearson's coefficient, measuring a linear relationship.
    #[default]
    #[serde(alias = "linear")]
    Pearson,
    /// Spearman's rank coefficient, measuring a monotonic relationship.
    #[serde(alias = "monotonic")]
    Spearman,
}

impl CorrelationMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "Pearson",
            CorrelationMethod::Spearman => "Spearman",
        }
    }

    /// Kind of relationship the coefficient measures.
    #[must_use]
    pub fn relationship(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "linear",
            CorrelationMethod::Spearman => "monotonic",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown correlation method '{input}' (expected pearson, spearman, linear or monotonic)")]
pub struct ParseCorrelationMethodError {
    input: String,
}

impl FromStr for CorrelationMethod {
    type Err = ParseCorrelationMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" | "linear" => Ok(CorrelationMethod::Pearson),
            "spearman" | "monotonic" => Ok(CorrelationMethod::Spearman),
            _ => Err(ParseCorrelationMethodError {
                input: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TestKind {
    #[display("categorical association")]
    CategoricalAssociation,
    #[display("mean difference")]
    MeanDifference,
    #[display("correlation")]
    Correlation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ColumnType {
    #[display("numeric")]
    Numeric,
    #[display("categorical")]
    Categorical,
}

/// A test configuration that cannot run against the dataset.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("no column selected for '{role}'")]
    MissingColumn { role: &'static str },
    #[display("column '{name}' not found in dataset")]
    UnknownColumn { name: String },
    #[display("column '{name}' must be {expected}")]
    WrongColumnType { name: String, expected: ColumnType },
    #[display(
        "column '{name}' must have exactly two distinct values for a t-test, found {found}"
    )]
    GroupCardinality { name: String, found: usize },
    #[display("unrecognized test type")]
    UnrecognizedTest,
}

/// One requested hypothesis test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TestSpec {
    /// Chi-square test of independence between two categorical columns.
    #[serde(rename = "chi2")]
    CategoricalAssociation {
        col1: String,
        col2: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hypothesis: Option<String>,
    },
    /// Welch's t-test of a numeric column split by a two-valued categorical column.
    #[serde(rename = "ttest")]
    MeanDifference {
        num: String,
        cat: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hypothesis: Option<String>,
    },
    /// Correlation between two numeric columns.
    #[serde(rename = "correlation")]
    Correlation {
        col1: String,
        col2: String,
        #[serde(default)]
        method: CorrelationMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hypothesis: Option<String>,
    },
    /// Any record whose `type` is not one of the above.
    #[serde(other)]
    Unrecognized,
}

impl TestSpec {
    /// Parses each plan record independently.
    ///
    /// Records that do not describe a valid test become
    /// [`TestSpec::Unrecognized`] and are logged.
    pub fn from_records<I>(records: I) -> Vec<Self>
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                Self::deserialize(record).unwrap_or_else(|err| {
                    log::warn!("Test config #{index} is invalid, skipping: {err}");
                    Self::Unrecognized
                })
            })
            .collect()
    }

    pub fn categorical_association<S1, S2>(col1: S1, col2: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        TestSpec::CategoricalAssociation {
            col1: col1.into(),
            col2: col2.into(),
            hypothesis: None,
        }
    }

    pub fn mean_difference<S1, S2>(num: S1, cat: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        TestSpec::MeanDifference {
            num: num.into(),
            cat: cat.into(),
            hypothesis: None,
        }
    }

    pub fn correlation<S1, S2>(col1: S1, col2: S2, method: CorrelationMethod) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        TestSpec::Correlation {
            col1: col1.into(),
            col2: col2.into(),
            method,
            hypothesis: None,
        }
    }

    /// Returns `None` for [`TestSpec::Unrecognized`].
    #[must_use]
    pub fn kind(&self) -> Option<TestKind> {
        match self {
            TestSpec::CategoricalAssociation { .. } => Some(TestKind::CategoricalAssociation),
            TestSpec::MeanDifference { .. } => Some(TestKind::MeanDifference),
            TestSpec::Correlation { .. } => Some(TestKind::Correlation),
            TestSpec::Unrecognized => None,
        }
    }

    /// The explicit hypothesis if one was given, otherwise one derived from
    /// the test kind and columns.
    #[must_use]
    pub fn hypothesis(&self) -> String {
        match self {
            TestSpec::CategoricalAssociation {
                hypothesis: Some(h),
                ..
            }
            | TestSpec::MeanDifference {
                hypothesis: Some(h),
                ..
            }
            | TestSpec::Correlation {
                hypothesis: Some(h),
                ..
            } => h.clone(),
            TestSpec::CategoricalAssociation { col1, col2, .. } => {
                format!("There is an association between {col1} and {col2}")
            }
            TestSpec::MeanDifference { num, cat, .. } => {
                format!("There is a difference in the mean of {num} across {cat}")
            }
            TestSpec::Correlation { col1, col2, .. } => {
                format!("There is a correlation between {col1} and {col2}")
            }
            TestSpec::Unrecognized => "Unrecognized test".to_owned(),
        }
    }

    /// Test name shown in a result block.
    #[must_use]
    pub fn report_test_name(&self) -> String {
        match self {
            TestSpec::CategoricalAssociation { .. } => "Chi-square Test".to_owned(),
            _ => self.summary_test_name(),
        }
    }

    /// Test name shown in the summary table.
    #[must_use]
    pub fn summary_test_name(&self) -> String {
        match self {
            TestSpec::CategoricalAssociation { .. } => "Chi-square".to_owned(),
            TestSpec::MeanDifference { .. } => "T-test".to_owned(),
            TestSpec::Correlation { method, .. } => format!("{} Correlation", method.title()),
            TestSpec::Unrecognized => "Unrecognized".to_owned(),
        }
    }

    /// Deterministic plot file name derived from the kind and columns.
    ///
    /// Whitespace and path separators in column names become `_`.
    #[must_use]
    pub fn plot_file_name(&self) -> Option<String> {
        let name = match self {
            TestSpec::CategoricalAssociation { col1, col2, .. } => {
                format!("chi2_{col1}_vs_{col2}.png")
            }
            TestSpec::MeanDifference { num, cat, .. } => format!("ttest_{num}_by_{cat}.png"),
            TestSpec::Correlation {
                col1, col2, method, ..
            } => format!("correlation_{col1}_vs_{col2}_{method}.png"),
            TestSpec::Unrecognized => return None,
        };
        Some(
            name.chars()
                .map(|c| {
                    if c.is_whitespace() || matches!(c, '/' | '\\') {
                        '_'
                    } else {
                        c
                    }
                })
                .collect(),
        )
    }

    /// Checks that the selected columns exist and have the types the test needs.
    pub fn validate(&self, dataset: &Dataset) -> Result<(), ConfigError> {
        match self {
            TestSpec::CategoricalAssociation { col1, col2, .. } => {
                require_categorical(dataset, "col1", col1)?;
                require_categorical(dataset, "col2", col2)?;
            }
            TestSpec::MeanDifference { num, cat, .. } => {
                require_numeric(dataset, "num", num)?;
                require_binary_groups(dataset, "cat", cat)?;
            }
            TestSpec::Correlation { col1, col2, .. } => {
                require_numeric(dataset, "col1", col1)?;
                require_numeric(dataset, "col2", col2)?;
            }
            TestSpec::Unrecognized => return Err(ConfigError::UnrecognizedTest),
        }
        Ok(())
    }
}

fn require_column<'a>(
    dataset: &'a Dataset,
    role: &'static str,
    name: &str,
) -> Result<&'a Column, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::MissingColumn { role });
    }
    dataset
        .column(name)
        .ok_or_else(|| ConfigError::UnknownColumn {
            name: name.to_owned(),
        })
}

pub(crate) fn require_numeric<'a>(
    dataset: &'a Dataset,
    role: &'static str,
    name: &str,
) -> Result<&'a [Option<f64>], ConfigError> {
    require_column(dataset, role, name)?;
    dataset
        .numeric(name)
        .ok_or_else(|| ConfigError::WrongColumnType {
            name: name.to_owned(),
            expected: ColumnType::Numeric,
        })
}

pub(crate) fn require_categorical<'a>(
    dataset: &'a Dataset,
    role: &'static str,
    name: &str,
) -> Result<&'a [Option<String>], ConfigError> {
    require_column(dataset, role, name)?;
    dataset
        .categorical(name)
        .ok_or_else(|| ConfigError::WrongColumnType {
            name: name.to_owned(),
            expected: ColumnType::Categorical,
        })
}

/// Returns the column values and its two categories in order of first appearance.
pub(crate) fn require_binary_groups<'a>(
    dataset: &'a Dataset,
    role: &'static str,
    name: &str,
) -> Result<(&'a [Option<String>], [&'a str; 2]), ConfigError> {
    let values = require_categorical(dataset, role, name)?;
    let categories = require_column(dataset, role, name)?
        .categories()
        .unwrap_or_default();
    match categories[..] {
        [first, second] => Ok((values, [first, second])),
        _ => Err(ConfigError::GroupCardinality {
            name: name.to_owned(),
            found: categories.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            Column::categorical(
                "city",
                ["X", "Y", "X"].map(|s| Some(s.to_owned())),
            ),
            Column::categorical(
                "region",
                ["north", "south", "east"].map(|s| Some(s.to_owned())),
            ),
            Column::numeric("sales", vec![Some(1.0), Some(2.0), None]),
            Column::numeric("visits", vec![Some(3.0), Some(1.0), Some(2.0)]),
        ])
    }

    #[test]
    fn test_parse_plan() {
        let plan: Vec<TestSpec> = serde_json::from_str(
            r#"[
                {"type": "chi2", "col1": "city", "col2": "region"},
                {"type": "ttest", "num": "sales", "cat": "city", "hypothesis": "Sales differ"},
                {"type": "correlation", "col1": "sales", "col2": "visits", "method": "monotonic"},
                {"type": "anova", "col1": "sales"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            plan,
            [
                TestSpec::categorical_association("city", "region"),
                TestSpec::MeanDifference {
                    num: "sales".to_owned(),
                    cat: "city".to_owned(),
                    hypothesis: Some("Sales differ".to_owned()),
                },
                TestSpec::correlation("sales", "visits", CorrelationMethod::Spearman),
                TestSpec::Unrecognized,
            ]
        );
    }

    #[test]
    fn test_malformed_records_do_not_invalidate_plan() {
        let records: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"type": "ttest", "num": "sales", "cat": "city"},
                {"num": "sales"},
                {"type": 3, "col1": "a"},
                {"type": "chi2", "col1": "city"},
                {"type": "correlation", "col1": "sales", "col2": "visits"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            TestSpec::from_records(records),
            [
                TestSpec::mean_difference("sales", "city"),
                TestSpec::Unrecognized,
                TestSpec::Unrecognized,
                TestSpec::Unrecognized,
                TestSpec::correlation("sales", "visits", CorrelationMethod::Pearson),
            ]
        );
    }

    #[test]
    fn test_correlation_method_defaults_to_pearson() {
        let spec: TestSpec =
            serde_json::from_str(r#"{"type": "correlation", "col1": "a", "col2": "b"}"#).unwrap();
        assert_eq!(spec, TestSpec::correlation("a", "b", CorrelationMethod::Pearson));
    }

    #[test]
    fn test_correlation_method_from_str() {
        assert_eq!("Linear".parse::<CorrelationMethod>(), Ok(CorrelationMethod::Pearson));
        assert_eq!("spearman".parse::<CorrelationMethod>(), Ok(CorrelationMethod::Spearman));
        assert!("kendall".parse::<CorrelationMethod>().is_err());
    }

    #[test]
    fn test_names() {
        let chi2 = TestSpec::categorical_association("city", "region");
        assert_eq!(chi2.hypothesis(), "There is an association between city and region");
        assert_eq!(chi2.report_test_name(), "Chi-square Test");
        assert_eq!(chi2.summary_test_name(), "Chi-square");

        let ttest = TestSpec::mean_difference("sales", "city");
        assert_eq!(
            ttest.hypothesis(),
            "There is a difference in the mean of sales across city"
        );
        assert_eq!(ttest.report_test_name(), "T-test");

        let corr = TestSpec::correlation("sales", "visits", CorrelationMethod::Spearman);
        assert_eq!(corr.summary_test_name(), "Spearman Correlation");
        assert_eq!(corr.kind(), Some(TestKind::Correlation));
        assert_eq!(TestSpec::Unrecognized.kind(), None);
    }

    #[test]
    fn test_plot_file_names() {
        assert_eq!(
            TestSpec::categorical_association("home city", "region")
                .plot_file_name()
                .unwrap(),
            "chi2_home_city_vs_region.png"
        );
        assert_eq!(
            TestSpec::mean_difference("sales", "city").plot_file_name().unwrap(),
            "ttest_sales_by_city.png"
        );
        assert_eq!(
            TestSpec::correlation("a/b", "c", CorrelationMethod::Pearson)
                .plot_file_name()
                .unwrap(),
            "correlation_a_b_vs_c_pearson.png"
        );
        assert_eq!(TestSpec::Unrecognized.plot_file_name(), None);
    }

    #[test]
    fn test_validate() {
        let dataset = dataset();
        assert!(TestSpec::categorical_association("city", "region")
            .validate(&dataset)
            .is_ok());
        assert!(TestSpec::mean_difference("sales", "city").validate(&dataset).is_ok());
        assert!(TestSpec::correlation("sales", "visits", CorrelationMethod::Pearson)
            .validate(&dataset)
            .is_ok());

        assert_eq!(
            TestSpec::categorical_association("city", "sales").validate(&dataset),
            Err(ConfigError::WrongColumnType {
                name: "sales".to_owned(),
                expected: ColumnType::Categorical,
            })
        );
        assert_eq!(
            TestSpec::categorical_association("", "city").validate(&dataset),
            Err(ConfigError::MissingColumn { role: "col1" })
        );
        assert_eq!(
            TestSpec::correlation("sales", "price", CorrelationMethod::Pearson).validate(&dataset),
            Err(ConfigError::UnknownColumn {
                name: "price".to_owned()
            })
        );
        assert_eq!(
            TestSpec::mean_difference("sales", "region").validate(&dataset),
            Err(ConfigError::GroupCardinality {
                name: "region".to_owned(),
                found: 3,
            })
        );
        assert_eq!(
            TestSpec::Unrecognized.validate(&dataset),
            Err(ConfigError::UnrecognizedTest)
        );
    }
}
