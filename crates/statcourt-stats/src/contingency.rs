//! Contingency tables and the chi-square test of independence.
//!
//! A [`ContingencyTable`] cross-tabulates two categorical variables. Row and
//! column labels are kept in ascending order so the table layout is stable
//! regardless of the order observations arrive in.

use std::collections::{BTreeMap, BTreeSet};

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::TestError;

/// Cross-tabulation of counts for two categorical variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Builds a table from `(row_category, column_category)` observations.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statcourt_stats::contingency::ContingencyTable;
    /// let table = ContingencyTable::from_pairs([("b", "x"), ("a", "y"), ("a", "x")]);
    /// assert_eq!(table.row_labels(), ["a", "b"]);
    /// assert_eq!(table.col_labels(), ["x", "y"]);
    /// assert_eq!(table.counts(), [vec![1, 1], vec![1, 0]]);
    /// ```
    pub fn from_pairs<I, R, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
        R: Into<String>,
        C: Into<String>,
    {
        let mut cells = BTreeMap::<(String, String), u64>::new();
        let mut rows = BTreeSet::new();
        let mut cols = BTreeSet::new();
        for (row, col) in pairs {
            let (row, col) = (row.into(), col.into());
            rows.insert(row.clone());
            cols.insert(col.clone());
            *cells.entry((row, col)).or_default() += 1;
        }

        let row_labels = rows.into_iter().collect::<Vec<_>>();
        let col_labels = cols.into_iter().collect::<Vec<_>>();
        let counts = row_labels
            .iter()
            .map(|row| {
                col_labels
                    .iter()
                    .map(|col| {
                        cells
                            .get(&(row.clone(), col.clone()))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .collect();

        Self {
            row_labels,
            col_labels,
            counts,
        }
    }

    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[must_use]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Counts indexed as `counts()[row][col]`.
    #[must_use]
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.col_labels.is_empty()
    }

    /// Returns `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.col_labels.len())
    }

    #[must_use]
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    #[must_use]
    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.col_labels.len())
            .map(|col| self.counts.iter().map(|row| row[col]).sum())
            .collect()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// `(rows - 1) * (columns - 1)`, or zero for an empty table.
    #[must_use]
    pub fn degrees_of_freedom(&self) -> usize {
        let (rows, cols) = self.shape();
        rows.saturating_sub(1) * cols.saturating_sub(1)
    }

    /// Expected counts under independence: `row_total * col_total / total`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn expected(&self) -> Vec<Vec<f64>> {
        let total = self.total() as f64;
        let col_totals = self.col_totals();
        self.row_totals()
            .into_iter()
            .map(|row_total| {
                col_totals
                    .iter()
                    .map(|&col_total| row_total as f64 * col_total as f64 / total)
                    .collect()
            })
            .collect()
    }
}

/// Result of Pearson's chi-square test of independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    /// Whether Yates' continuity correction was applied (only for one degree of freedom).
    pub yates_corrected: bool,
}

impl ChiSquareTest {
    /// Runs the chi-square test on `table`.
    ///
    /// With one degree of freedom the observed counts are moved up to 0.5
    /// towards the expected counts before the statistic is computed (Yates'
    /// correction). A table with zero degrees of freedom yields a statistic
    /// of 0 and a p-value of 1.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_table(table: &ContingencyTable) -> Result<Self, TestError> {
        if table.is_empty() || table.total() == 0 {
            return Err(TestError::EmptyTable);
        }

        let expected = table.expected();
        if expected.iter().flatten().any(|e| *e == 0.0) {
            return Err(TestError::ZeroExpectedFrequency);
        }

        let degrees_of_freedom = table.degrees_of_freedom();
        if degrees_of_freedom == 0 {
            return Ok(Self {
                statistic: 0.0,
                p_value: 1.0,
                degrees_of_freedom,
                yates_corrected: false,
            });
        }

        let yates_corrected = degrees_of_freedom == 1;
        let statistic = table
            .counts()
            .iter()
            .flatten()
            .zip(expected.iter().flatten())
            .map(|(&observed, &expected)| {
                let mut observed = observed as f64;
                if yates_corrected {
                    let diff = expected - observed;
                    observed += diff.signum() * diff.abs().min(0.5);
                }
                (observed - expected).powi(2) / expected
            })
            .sum::<f64>();

        let dist = ChiSquared::new(degrees_of_freedom as f64)
            .map_err(|e| TestError::distribution(&e))?;
        let p_value = dist.sf(statistic).clamp(0.0, 1.0);

        Ok(Self {
            statistic,
            p_value,
            degrees_of_freedom,
            yates_corrected,
        })
    }
}
