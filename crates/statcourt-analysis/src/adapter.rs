//! Hypothesis tests over dataset columns.
//!
//! Each adapter selects and cleans the columns it needs, runs the statistical
//! test, renders the supporting plot and classifies the outcome. Configuration
//! problems (unknown or mistyped columns) are reported before anything is
//! computed, and no plot is written for a test that fails.

use std::path::Path;

use statcourt_stats::{
    TestError,
    contingency::{ChiSquareTest, ContingencyTable},
    correlation::CorrelationTest,
    t_test::WelchTTest,
};

use crate::{
    dataset::Dataset,
    plot::{Plot, PlotError, PlotRenderer},
    result::{TestResult, Verdict},
    spec::{self, ConfigError, CorrelationMethod},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AdapterError {
    #[display("invalid test configuration")]
    Config(ConfigError),
    #[display("statistical computation failed")]
    Test(TestError),
    #[display("failed to render plot")]
    Plot(PlotError),
}

/// Chi-square test of independence between two categorical columns.
///
/// Rows with a missing value in either column are ignored. A heatmap of the
/// contingency table is written to `plot_path`.
pub fn categorical_association<R>(
    dataset: &Dataset,
    col1: &str,
    col2: &str,
    plot_path: &Path,
    renderer: &R,
) -> Result<TestResult, AdapterError>
where
    R: PlotRenderer + ?Sized,
{
    let rows = spec::require_categorical(dataset, "col1", col1)?;
    let cols = spec::require_categorical(dataset, "col2", col2)?;

    let table = ContingencyTable::from_pairs(
        rows.iter()
            .zip(cols)
            .filter_map(|(r, c)| Some((r.as_deref()?, c.as_deref()?))),
    );
    let test = ChiSquareTest::from_table(&table)?;

    renderer.render(
        &Plot::Heatmap {
            title: format!("{col1} vs {col2}"),
            x_label: col2.to_owned(),
            y_label: col1.to_owned(),
            table,
        },
        plot_path,
    )?;

    let p = test.p_value;
    Ok(TestResult::new(
        test.statistic,
        p,
        |verdict| match verdict {
            Verdict::RejectNull => {
                format!("Significant association found between {col1} and {col2} (p={p:.4})")
            }
            Verdict::FailToReject => format!(
                "There is no significant association between {col1} and {col2} (p={p:.4})"
            ),
        },
        Some(plot_path.to_owned()),
    ))
}

/// Welch's t-test of `num` between the two groups of `cat`.
///
/// Groups are taken in order of first appearance, so the statistic is
/// `mean(first group) - mean(second group)` scaled by its standard error.
/// Missing values are dropped per group. A box plot is written to `plot_path`.
pub fn mean_difference<R>(
    dataset: &Dataset,
    num: &str,
    cat: &str,
    plot_path: &Path,
    renderer: &R,
) -> Result<TestResult, AdapterError>
where
    R: PlotRenderer + ?Sized,
{
    let values = spec::require_numeric(dataset, "num", num)?;
    let (groups, [first, second]) = spec::require_binary_groups(dataset, "cat", cat)?;

    let select = |group: &str| {
        values
            .iter()
            .zip(groups)
            .filter(|(_, g)| g.as_deref() == Some(group))
            .filter_map(|(v, _)| *v)
            .collect::<Vec<_>>()
    };
    let first_values = select(first);
    let second_values = select(second);
    let test = WelchTTest::new(&first_values, &second_values)?;

    renderer.render(
        &Plot::BoxPlot {
            title: format!("Boxplot of {num} by {cat}"),
            x_label: cat.to_owned(),
            y_label: num.to_owned(),
            groups: vec![
                (first.to_owned(), first_values),
                (second.to_owned(), second_values),
            ],
        },
        plot_path,
    )?;

    let p = test.p_value;
    Ok(TestResult::new(
        test.statistic,
        p,
        |verdict| match verdict {
            Verdict::RejectNull => format!(
                "Significant mean difference found between groups of {cat} on {num} (p={p:.4})"
            ),
            Verdict::FailToReject => format!(
                "Means do not differ significantly between groups of {cat} on {num} (p={p:.4})"
            ),
        },
        Some(plot_path.to_owned()),
    ))
}

/// Correlation between two numeric columns.
///
/// Only rows where both values are present are used. A scatter plot is
/// rendered only when `plot_path` is given.
pub fn correlation<R>(
    dataset: &Dataset,
    col1: &str,
    col2: &str,
    method: CorrelationMethod,
    plot_path: Option<&Path>,
    renderer: &R,
) -> Result<TestResult, AdapterError>
where
    R: PlotRenderer + ?Sized,
{
    let x = spec::require_numeric(dataset, "col1", col1)?;
    let y = spec::require_numeric(dataset, "col2", col2)?;

    let points = x
        .iter()
        .zip(y)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect::<Vec<_>>();
    let (xs, ys): (Vec<_>, Vec<_>) = points.iter().copied().unzip();
    let test = match method {
        CorrelationMethod::Pearson => CorrelationTest::pearson(&xs, &ys)?,
        CorrelationMethod::Spearman => CorrelationTest::spearman(&xs, &ys)?,
    };

    if let Some(path) = plot_path {
        renderer.render(
            &Plot::Scatter {
                title: format!("{col1} vs {col2} ({} Correlation)", method.title()),
                x_label: col1.to_owned(),
                y_label: col2.to_owned(),
                points,
            },
            path,
        )?;
    }

    let p = test.p_value;
    let relationship = method.relationship();
    Ok(TestResult::new(
        test.coefficient,
        p,
        |verdict| match verdict {
            Verdict::RejectNull => format!(
                "There is a significant {relationship} relationship between {col1} and {col2} (p={p:.4})"
            ),
            Verdict::FailToReject => format!(
                "No significant {relationship} relationship between {col1} and {col2} (p={p:.4})"
            ),
        },
        plot_path.map(Path::to_owned),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Column, plot::tests::RecordingRenderer};

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| (*v).to_owned()))
            .collect()
    }

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            Column::categorical("city", text(&["X", "Y", "X", "Y", "X", "Y", "X", "Y", "", "X"])),
            Column::categorical(
                "segment",
                text(&["a", "a", "b", "b", "a", "b", "a", "b", "a", "b"]),
            ),
            Column::categorical(
                "region",
                text(&["n", "s", "e", "n", "s", "e", "n", "s", "e", "n"]),
            ),
            Column::numeric(
                "sales",
                vec![
                    Some(10.0),
                    Some(20.0),
                    Some(11.0),
                    Some(22.0),
                    Some(9.5),
                    Some(19.0),
                    None,
                    Some(21.0),
                    Some(15.0),
                    Some(10.5),
                ],
            ),
            Column::numeric(
                "visits",
                vec![
                    Some(1.0),
                    Some(2.0),
                    Some(3.0),
                    Some(4.0),
                    Some(5.0),
                    None,
                    Some(7.0),
                    Some(8.0),
                    Some(9.0),
                    Some(10.0),
                ],
            ),
        ])
    }

    #[test]
    fn test_categorical_association() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let path = dir.path().join("plots/chi2_city_vs_segment.png");
        let result =
            categorical_association(&dataset(), "city", "segment", &path, &renderer).unwrap();

        assert!((0.0..=1.0).contains(&result.p_value));
        assert_eq!(result.verdict, Verdict::from_p_value(result.p_value));
        assert!(result.interpretation.contains("city and segment"));
        assert_eq!(result.plot.as_deref(), Some(path.as_path()));
        assert!(path.exists());
        assert_eq!(renderer.rendered.borrow()[0].0, "city vs segment");
    }

    #[test]
    fn test_categorical_association_rejects_numeric_column() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let path = dir.path().join("plot.png");
        let err = categorical_association(&dataset(), "city", "sales", &path, &renderer)
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Config(ConfigError::WrongColumnType { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_mean_difference() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let path = dir.path().join("ttest_sales_by_city.png");
        let result = mean_difference(&dataset(), "sales", "city", &path, &renderer).unwrap();

        // X: 10, 11, 9.5, 10.5 (one missing sales, one missing city); Y: 20, 22, 19, 21
        let expected = WelchTTest::new(&[10.0, 11.0, 9.5, 10.5], &[20.0, 22.0, 19.0, 21.0]).unwrap();
        assert!(result.statistic.is_finite());
        assert!((result.statistic - expected.statistic).abs() < 1e-12);
        assert!(result.statistic < 0.0);
        assert_eq!(result.verdict, Verdict::RejectNull);
        assert!(
            result
                .interpretation
                .starts_with("Significant mean difference found between groups of city on sales")
        );
        assert!(path.exists());
    }

    #[test]
    fn test_mean_difference_requires_two_groups() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let path = dir.path().join("ttest_sales_by_region.png");
        let err = mean_difference(&dataset(), "sales", "region", &path, &renderer).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Config(ConfigError::GroupCardinality { found: 3, .. })
        ));
        assert!(!path.exists());
        assert!(renderer.rendered.borrow().is_empty());
    }

    #[test]
    fn test_identical_columns_correlate_perfectly() {
        let renderer = RecordingRenderer::default();
        let result = correlation(
            &dataset(),
            "visits",
            "visits",
            CorrelationMethod::Pearson,
            None,
            &renderer,
        )
        .unwrap();
        assert!((result.statistic - 1.0).abs() < 1e-12);
        assert!(result.p_value < 1e-12);
        assert_eq!(result.verdict, Verdict::RejectNull);
        assert_eq!(result.plot, None);
        assert!(renderer.rendered.borrow().is_empty());
    }

    #[test]
    fn test_correlation_aligns_missing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let path = dir.path().join("corr.png");
        let result = correlation(
            &dataset(),
            "sales",
            "visits",
            CorrelationMethod::Spearman,
            Some(&path),
            &renderer,
        )
        .unwrap();

        let pairs = [
            (10.0, 1.0),
            (20.0, 2.0),
            (11.0, 3.0),
            (22.0, 4.0),
            (9.5, 5.0),
            (21.0, 8.0),
            (15.0, 9.0),
            (10.5, 10.0),
        ];
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let expected = CorrelationTest::spearman(&xs, &ys).unwrap();
        assert!((result.statistic - expected.coefficient).abs() < 1e-12);
        assert!(result.interpretation.contains("monotonic"));
        assert_eq!(
            renderer.rendered.borrow()[0].0,
            "sales vs visits (Spearman Correlation)"
        );
        assert!(path.exists());
    }
}
