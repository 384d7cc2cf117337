use crate::{TestError, ensure_finite, rank::average_ranks, t_test::two_sided_p_value};

/// Correlation coefficient with its two-sided p-value.
///
/// The p-value tests the null hypothesis of zero correlation using
/// `t = r * sqrt((n - 2) / (1 - r^2))` with `n - 2` degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationTest {
    pub coefficient: f64,
    pub p_value: f64,
    pub sample_size: usize,
}

impl CorrelationTest {
    /// Pearson's product-moment correlation (linear relationship).
    #[expect(clippy::cast_precision_loss)]
    pub fn pearson(x: &[f64], y: &[f64]) -> Result<Self, TestError> {
        if x.len() != y.len() {
            return Err(TestError::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        ensure_finite(x)?;
        ensure_finite(y)?;
        let n = x.len();
        if n < 2 {
            return Err(TestError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mean_x = x.iter().sum::<f64>() / n as f64;
        let mean_y = y.iter().sum::<f64>() / n as f64;
        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx == 0.0 || syy == 0.0 {
            return Err(TestError::ZeroVariance);
        }

        let coefficient = sxy / (sxx * syy).sqrt();
        // overflow in the sums
        if !coefficient.is_finite() {
            return Err(TestError::NonFinite {
                what: "correlation coefficient",
            });
        }
        let coefficient = coefficient.clamp(-1.0, 1.0);
        let p_value = correlation_p_value(coefficient, n)?;
        Ok(Self {
            coefficient,
            p_value,
            sample_size: n,
        })
    }

    /// Spearman's rank correlation (monotonic relationship).
    ///
    /// Ties receive average ranks before the Pearson coefficient of the
    /// ranks is computed.
    pub fn spearman(x: &[f64], y: &[f64]) -> Result<Self, TestError> {
        if x.len() != y.len() {
            return Err(TestError::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        ensure_finite(x)?;
        ensure_finite(y)?;
        Self::pearson(&average_ranks(x), &average_ranks(y))
    }
}

#[expect(clippy::cast_precision_loss)]
fn correlation_p_value(r: f64, n: usize) -> Result<f64, TestError> {
    if n == 2 {
        return Ok(1.0);
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    two_sided_p_value(t, df)
}
