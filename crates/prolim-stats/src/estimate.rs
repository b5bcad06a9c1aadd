//! Kaplan-Meier product-limit estimate with Greenwood variance.
//!
//! The estimate is computed by folding over an [`EventTimeTable`] from the
//! earliest time to the latest, carrying two accumulators:
//!
//! ```text
//! S(t_i)   = S(t_{i-1}) * (1 - d_i / n_i)
//! V(t_i)   = V(t_{i-1}) + d_i / (n_i * (n_i - d_i))
//! stderr_i = sqrt(V(t_i))
//! ```
//!
//! `V` is Greenwood's estimate of the variance of `log S`, so `stderr` is the
//! standard error of the log survivor function. The standard error of `S`
//! itself is `S * stderr`, see [`KaplanMeierEstimate::survival_stderr`].
//!
//! # Exhausted risk sets
//!
//! When every subject still at risk has an event at the same time
//! (`d_i == n_i`), survival drops to exactly `0.0` and the Greenwood term is
//! undefined. The variance is then set to `+inf`, so `stderr` is infinite for
//! that record. Such a record is always the last one in the table.

use log::debug;

use crate::{
    event_table::{EventTimeRecord, EventTimeTable},
    observation::{self, EstimateError, Status},
};

/// Below this distance a survival value counts as having reached a quantile
/// threshold, absorbing rounding in the running product.
const QUANTILE_TOLERANCE: f64 = 1e-12;

/// Kaplan-Meier estimate of a survivor function.
///
/// All accessors return index-aligned slices with one element per distinct
/// observed time, in increasing time order. The value is immutable once built.
///
/// # Examples
///
/// ```
/// use prolim_stats::{estimate::KaplanMeierEstimate, observation::Status};
///
/// let estimate = KaplanMeierEstimate::new(
///     &[1.0, 2.0, 3.0, 4.0],
///     &[Status::Event, Status::Event, Status::Censored, Status::Event],
/// )
/// .unwrap();
///
/// assert_eq!(estimate.n_at_risk(), &[4, 3, 2, 1]);
/// assert!((estimate.survival()[1] - 0.5).abs() < 1e-12);
/// assert_eq!(estimate.survival()[3], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct KaplanMeierEstimate {
    times: Vec<f64>,
    n_events: Vec<usize>,
    n_censored: Vec<usize>,
    n_at_risk: Vec<usize>,
    survival: Vec<f64>,
    stderr: Vec<f64>,
}

impl KaplanMeierEstimate {
    /// Validates the observations, aggregates them and runs the recurrence.
    pub fn new(times: &[f64], status: &[Status]) -> Result<Self, EstimateError> {
        let table = EventTimeTable::new(times, status)?;
        Ok(Self::from_table(&table))
    }

    /// Like [`Self::new`], with status given as `1` (event) / `0` (censored).
    ///
    /// # Examples
    ///
    /// ```
    /// use prolim_stats::{estimate::KaplanMeierEstimate, observation::EstimateError};
    ///
    /// let estimate = KaplanMeierEstimate::from_codes(&[5.0], &[0]).unwrap();
    /// assert_eq!(estimate.survival(), &[1.0]);
    ///
    /// let err = KaplanMeierEstimate::from_codes(&[5.0], &[7]).unwrap_err();
    /// assert!(matches!(err, EstimateError::UnknownStatus { index: 0, .. }));
    /// ```
    pub fn from_codes(times: &[f64], codes: &[i64]) -> Result<Self, EstimateError> {
        observation::check_lengths(times.len(), codes.len())?;
        let status = observation::statuses_from_codes(codes)?;
        Self::new(times, &status)
    }

    /// Like [`Self::new`], with status given as text labels.
    pub fn from_labels<S>(times: &[f64], labels: &[S]) -> Result<Self, EstimateError>
    where
        S: AsRef<str>,
    {
        observation::check_lengths(times.len(), labels.len())?;
        let status = observation::statuses_from_labels(labels)?;
        Self::new(times, &status)
    }

    /// Runs the product-limit and Greenwood recurrences over an aggregated table.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_table(table: &EventTimeTable) -> Self {
        let len = table.len();
        let mut times = Vec::with_capacity(len);
        let mut n_events = Vec::with_capacity(len);
        let mut n_censored = Vec::with_capacity(len);
        let mut n_at_risk = Vec::with_capacity(len);
        let mut survival = Vec::with_capacity(len);
        let mut stderr = Vec::with_capacity(len);

        let mut survival_accum = 1.0_f64;
        let mut variance_accum = 0.0_f64;

        for record in table.records() {
            if record.n_events > 0 {
                let d = record.n_events as f64;
                let n = record.n_at_risk as f64;
                if record.n_events < record.n_at_risk {
                    survival_accum *= 1.0 - d / n;
                    variance_accum += d / (n * (n - d));
                } else {
                    debug!(
                        "risk set exhausted at time {} ({} events, {} at risk)",
                        record.time, record.n_events, record.n_at_risk
                    );
                    survival_accum = 0.0;
                    variance_accum = f64::INFINITY;
                }
            }

            times.push(record.time);
            n_events.push(record.n_events);
            n_censored.push(record.n_censored);
            n_at_risk.push(record.n_at_risk);
            survival.push(survival_accum);
            stderr.push(variance_accum.sqrt());
        }

        Self {
            times,
            n_events,
            n_censored,
            n_at_risk,
            survival,
            stderr,
        }
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn n_events(&self) -> &[usize] {
        &self.n_events
    }

    #[must_use]
    pub fn n_censored(&self) -> &[usize] {
        &self.n_censored
    }

    #[must_use]
    pub fn n_at_risk(&self) -> &[usize] {
        &self.n_at_risk
    }

    /// Product-limit survival probability at each time.
    #[must_use]
    pub fn survival(&self) -> &[f64] {
        &self.survival
    }

    /// Standard error of `log S` at each time (Greenwood).
    ///
    /// Infinite at a record whose risk set was exhausted by events.
    #[must_use]
    pub fn stderr(&self) -> &[f64] {
        &self.stderr
    }

    /// Greenwood standard error of the survival probability itself.
    ///
    /// This is `survival * stderr`. At an exhausted risk set the product is
    /// `0 * inf`, which is reported as `0.0`.
    #[must_use]
    pub fn survival_stderr(&self) -> Vec<f64> {
        self.survival
            .iter()
            .zip(&self.stderr)
            .map(|(&s, &se)| if s <= 0.0 { 0.0 } else { s * se })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterates over the aggregated records the estimate was built from.
    pub fn records(&self) -> impl Iterator<Item = EventTimeRecord> + '_ {
        (0..self.len()).map(|i| EventTimeRecord {
            time: self.times[i],
            n_events: self.n_events[i],
            n_censored: self.n_censored[i],
            n_at_risk: self.n_at_risk[i],
        })
    }

    /// Returns the survival probability at an arbitrary time.
    ///
    /// The estimate is a right-continuous step function: `1.0` before the first
    /// record and the last value after the last record.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prolim_stats::{estimate::KaplanMeierEstimate, observation::Status};
    /// let estimate =
    ///     KaplanMeierEstimate::new(&[10.0, 20.0], &[Status::Event, Status::Event]).unwrap();
    ///
    /// assert_eq!(estimate.survival_at(5.0), 1.0);
    /// assert_eq!(estimate.survival_at(10.0), 0.5);
    /// assert_eq!(estimate.survival_at(15.0), 0.5);
    /// assert_eq!(estimate.survival_at(25.0), 0.0);
    /// ```
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|&t| t <= time);
        if idx == 0 {
            1.0
        } else {
            self.survival[idx - 1]
        }
    }

    /// Returns the smallest time at which the survival probability has fallen
    /// to `1 - p` or below.
    ///
    /// `None` if the curve never gets that low or `p` lies outside `[0, 1]`.
    #[must_use]
    pub fn quantile_time(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        let threshold = 1.0 - p;
        self.survival
            .iter()
            .position(|&s| s <= threshold + QUANTILE_TOLERANCE)
            .map(|i| self.times[i])
    }

    /// Returns the median survival time.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prolim_stats::{estimate::KaplanMeierEstimate, observation::Status};
    /// let estimate = KaplanMeierEstimate::new(
    ///     &[1.0, 2.0, 3.0, 4.0],
    ///     &[Status::Event, Status::Event, Status::Censored, Status::Event],
    /// )
    /// .unwrap();
    /// assert_eq!(estimate.median_survival(), Some(2.0));
    ///
    /// let censored = KaplanMeierEstimate::new(&[5.0], &[Status::Censored]).unwrap();
    /// assert_eq!(censored.median_survival(), None);
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        self.quantile_time(0.5)
    }

    /// Area under the survival curve on `[0, tau]` (restricted mean survival time).
    #[must_use]
    pub fn restricted_mean(&self, tau: f64) -> f64 {
        if tau <= 0.0 {
            return 0.0;
        }

        let mut area = 0.0;
        let mut prev_time = 0.0;
        let mut prev_survival = 1.0;
        for (&time, &survival) in self.times.iter().zip(&self.survival) {
            if time >= tau {
                break;
            }
            area += prev_survival * (time - prev_time);
            prev_time = time;
            prev_survival = survival;
        }
        area + prev_survival * (tau - prev_time)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    use crate::observation::Status::{Censored as C, Event as E};

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_reference_scenario() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        assert_eq!(estimate.times(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(estimate.n_at_risk(), &[4, 3, 2, 1]);
        assert_eq!(estimate.n_events(), &[1, 1, 0, 1]);
        assert_eq!(estimate.n_censored(), &[0, 0, 1, 0]);
        assert_close(estimate.survival(), &[0.75, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_greenwood_stderr() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        let v1 = 1.0_f64 / (4.0 * 3.0);
        let v2 = v1 + 1.0 / (3.0 * 2.0);
        assert_close(
            &estimate.stderr()[..3],
            &[v1.sqrt(), v2.sqrt(), v2.sqrt()],
        );
        assert_eq!(estimate.stderr()[3], f64::INFINITY);

        let se = estimate.survival_stderr();
        assert_close(&se, &[0.75 * v1.sqrt(), 0.5 * v2.sqrt(), 0.5 * v2.sqrt(), 0.0]);
    }

    #[test]
    fn test_single_censored_observation() {
        let estimate = KaplanMeierEstimate::new(&[5.0], &[C]).unwrap();
        assert_eq!(estimate.len(), 1);
        assert_eq!(estimate.n_events(), &[0]);
        assert_eq!(estimate.survival(), &[1.0]);
        assert_eq!(estimate.stderr(), &[0.0]);
    }

    #[test]
    fn test_all_censored_stays_at_one() {
        let estimate =
            KaplanMeierEstimate::new(&[3.0, 1.0, 2.0, 2.0], &[C, C, C, C]).unwrap();
        assert!(estimate.survival().iter().all(|&s| s == 1.0));
        assert!(estimate.stderr().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_all_events_reach_zero() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0], &[E, E, E]).unwrap();
        assert_close(estimate.survival(), &[2.0 / 3.0, 1.0 / 3.0, 0.0]);
    }

    #[test]
    fn test_tied_last_events_exhaust_risk_set() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 2.0], &[E, E, E]).unwrap();
        assert_eq!(estimate.n_at_risk(), &[3, 2]);
        assert_eq!(estimate.survival()[1], 0.0);
        assert!(estimate.stderr()[1].is_infinite());
    }

    #[test]
    fn test_last_censored_keeps_survival_positive() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0], &[E, E, C]).unwrap();
        assert_close(estimate.survival(), &[2.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
        assert!(estimate.stderr().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_from_codes_and_labels_agree() {
        let times = [4.0, 1.0, 3.0, 2.0];
        let a = KaplanMeierEstimate::from_codes(&times, &[1, 1, 0, 1]).unwrap();
        let b = KaplanMeierEstimate::from_labels(&times, &["event", "event", "censored", "1"])
            .unwrap();
        let c = KaplanMeierEstimate::new(&times, &[E, E, C, E]).unwrap();
        assert_eq!(a, c);
        assert_eq!(b, c);
    }

    #[test]
    fn test_length_checked_before_status() {
        let err = KaplanMeierEstimate::from_codes(&[1.0], &[9, 9]).unwrap_err();
        assert_eq!(err, EstimateError::LengthMismatch { times: 1, status: 2 });
    }

    #[test]
    fn test_records_round_trip_table() {
        let table = EventTimeTable::new(&[2.0, 2.0, 5.0, 7.0], &[E, C, E, C]).unwrap();
        let estimate = KaplanMeierEstimate::from_table(&table);
        assert_eq!(estimate.records().collect::<Vec<_>>(), table.records());
    }

    #[test]
    fn test_serializes_as_columns() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0], &[E, C]).unwrap();
        let value = serde_json::to_value(&estimate).unwrap();
        assert_eq!(value["times"], serde_json::json!([1.0, 2.0]));
        assert_eq!(value["n_at_risk"], serde_json::json!([2, 1]));
        assert_eq!(value["survival"], serde_json::json!([0.5, 0.5]));
    }

    #[test]
    fn test_survival_at_step_function() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        assert_eq!(estimate.survival_at(0.5), 1.0);
        assert_eq!(estimate.survival_at(1.0), 0.75);
        assert_eq!(estimate.survival_at(1.5), 0.75);
        assert_eq!(estimate.survival_at(10.0), 0.0);
    }

    #[test]
    fn test_quantile_time() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        assert_eq!(estimate.quantile_time(0.25), Some(1.0));
        assert_eq!(estimate.quantile_time(0.5), Some(2.0));
        assert_eq!(estimate.quantile_time(0.75), Some(4.0));
        assert_eq!(estimate.quantile_time(0.0), Some(1.0));
        assert_eq!(estimate.quantile_time(1.5), None);

        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0], &[E, C]).unwrap();
        assert_eq!(estimate.median_survival(), Some(1.0));
        assert_eq!(estimate.quantile_time(0.9), None);
    }

    #[test]
    fn test_restricted_mean() {
        let estimate = KaplanMeierEstimate::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        // 1.0 * 1 + 0.75 * 1 + 0.5 * 1 + 0.5 * 1
        assert!((estimate.restricted_mean(4.0) - 2.75).abs() < 1e-12);
        assert!((estimate.restricted_mean(10.0) - 2.75).abs() < 1e-12);
        assert!((estimate.restricted_mean(1.5) - 1.375).abs() < 1e-12);
        assert_eq!(estimate.restricted_mean(0.0), 0.0);
    }

    #[test]
    fn test_random_estimates_hold_invariants() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.random_range(1..80);
            let times = (0..n)
                .map(|_| f64::from(rng.random_range(0..25_u32)) / 2.0)
                .collect::<Vec<_>>();
            let status = (0..n)
                .map(|_| if rng.random_bool(0.7) { E } else { C })
                .collect::<Vec<_>>();
            let estimate = KaplanMeierEstimate::new(&times, &status).unwrap();

            let survival = estimate.survival();
            assert!(survival.iter().all(|s| (0.0..=1.0).contains(s)));
            assert!(survival.windows(2).all(|w| w[1] <= w[0]));
            assert!(estimate.n_at_risk().windows(2).all(|w| w[1] < w[0]));
            assert!(estimate.times().windows(2).all(|w| w[0] < w[1]));
            for (i, &d) in estimate.n_events().iter().enumerate() {
                assert!(d + estimate.n_censored()[i] <= estimate.n_at_risk()[i]);
                if d == 0 && i > 0 {
                    assert_eq!(survival[i], survival[i - 1]);
                }
            }
        }
    }
}
