//! Pointwise confidence intervals for a Kaplan-Meier estimate.
//!
//! Bounds are computed on the complementary log-log scale and mapped back,
//! which keeps them inside `[0, 1]`:
//!
//! ```text
//! q = quantile(1 - alpha / 2)
//! l = ln(-ln S)
//! a = q * stderr / ln S
//! (lower, upper) = (exp(-exp(l - a)), exp(-exp(l + a)))
//! ```
//!
//! `stderr` is the standard error of `ln S` as stored by
//! [`KaplanMeierEstimate::stderr`].
//!
//! Degenerate points do not fail. `S == 1` yields `(1, 1)` and `S == 0`
//! yields `(0, 0)`. Any other non-finite intermediate shows up as NaN bounds.

use statrs::function::erf;

use crate::{estimate::KaplanMeierEstimate, observation::EstimateError};

/// Significance level used when the caller does not pick one.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Inverse cumulative distribution function used to pick the interval multiplier.
///
/// Implemented for every `Fn(f64) -> f64`, so a closure or function pointer can
/// be passed wherever a quantile function is expected.
pub trait Quantile {
    fn quantile(&self, p: f64) -> f64;
}

impl<F> Quantile for F
where
    F: Fn(f64) -> f64,
{
    fn quantile(&self, p: f64) -> f64 {
        self(p)
    }
}

/// Standard normal quantile function backed by `statrs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardNormal;

impl Quantile for StandardNormal {
    fn quantile(&self, p: f64) -> f64 {
        -std::f64::consts::SQRT_2 * erf::erfc_inv(2.0 * p)
    }
}

/// Lower and upper bound of a pointwise confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ConfidenceBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceBounds {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Log-log interval for a single point, given the quantile multiplier `q`.
///
/// # Examples
///
/// ```
/// use prolim_stats::confidence::log_log_bounds;
///
/// let bounds = log_log_bounds(0.5, 0.3, 1.96);
/// assert!(bounds.lower < 0.5 && 0.5 < bounds.upper);
///
/// assert_eq!(log_log_bounds(1.0, 0.0, 1.96).lower, 1.0);
/// assert_eq!(log_log_bounds(0.0, f64::INFINITY, 1.96).upper, 0.0);
/// ```
#[must_use]
pub fn log_log_bounds(survival: f64, stderr: f64, q: f64) -> ConfidenceBounds {
    if survival >= 1.0 {
        return ConfidenceBounds {
            lower: 1.0,
            upper: 1.0,
        };
    }
    if survival <= 0.0 {
        return ConfidenceBounds {
            lower: 0.0,
            upper: 0.0,
        };
    }

    let log_s = survival.ln();
    let l = (-log_s).ln();
    let a = q * stderr / log_s;
    ConfidenceBounds {
        lower: (-(l - a).exp()).exp(),
        upper: (-(l + a).exp()).exp(),
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<(), EstimateError> {
    if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
        return Err(EstimateError::InvalidSignificance { alpha });
    }
    Ok(())
}

impl KaplanMeierEstimate {
    /// Pointwise log-log confidence intervals using the standard normal quantile.
    ///
    /// # Examples
    ///
    /// ```
    /// use prolim_stats::{confidence::DEFAULT_ALPHA, estimate::KaplanMeierEstimate};
    ///
    /// let estimate =
    ///     KaplanMeierEstimate::from_codes(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1, 0, 1, 1, 0]).unwrap();
    /// let bounds = estimate.conf_int(DEFAULT_ALPHA).unwrap();
    ///
    /// assert_eq!(bounds.len(), estimate.len());
    /// for (b, &s) in bounds.iter().zip(estimate.survival()) {
    ///     assert!(b.contains(s));
    /// }
    /// ```
    pub fn conf_int(&self, alpha: f64) -> Result<Vec<ConfidenceBounds>, EstimateError> {
        self.conf_int_with(alpha, &StandardNormal)
    }

    /// Like [`Self::conf_int`], with the quantile function supplied by the caller.
    ///
    /// The quantile function is called once, with `1 - alpha / 2`.
    pub fn conf_int_with<Q>(
        &self,
        alpha: f64,
        quantile: &Q,
    ) -> Result<Vec<ConfidenceBounds>, EstimateError>
    where
        Q: Quantile + ?Sized,
    {
        check_alpha(alpha)?;
        let q = quantile.quantile(1.0 - alpha / 2.0);
        Ok(self
            .survival()
            .iter()
            .zip(self.stderr())
            .map(|(&s, &se)| log_log_bounds(s, se, q))
            .collect())
    }
}
