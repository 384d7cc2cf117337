/// Assigns 1-based ranks to `values`, giving tied values the average of the
/// ranks they span.
///
/// The returned vector is aligned with the input order.
///
/// # Examples
///
/// ```
/// # use statcourt_stats::rank::average_ranks;
/// let ranks = average_ranks(&[10.0, 30.0, 20.0, 20.0]);
/// assert_eq!(ranks, vec![1.0, 4.0, 2.5, 2.5]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}
