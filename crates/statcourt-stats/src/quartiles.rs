/// Five-number summary used to draw a box plot.
///
/// Quartiles are computed with linear interpolation between closest ranks.
/// Whiskers extend to the most extreme observations within 1.5 IQR of the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl Quartiles {
    /// Computes quartiles from unsorted values.
    ///
    /// Returns `None` for an empty sample.
    ///
    /// # Examples
    ///
    /// ```
    /// # use statcourt_stats::quartiles::Quartiles;
    /// let q = Quartiles::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    /// assert_eq!(q.q1, 2.0);
    /// assert_eq!(q.median, 3.0);
    /// assert_eq!(q.q3, 4.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        if sorted.is_empty() {
            return None;
        }

        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);

        Some(Self {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
        })
    }

    /// Returns the summary as `[lower_whisker, q1, median, q3, upper_whisker]`.
    #[must_use]
    pub fn values(&self) -> [f64; 5] {
        [
            self.lower_whisker,
            self.q1,
            self.median,
            self.q3,
            self.upper_whisker,
        ]
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p / 100.0;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
