//! Summary statistics contrasting naive estimates with Kaplan-Meier.
//!
//! Naive means are biased under right censoring: the mean over event times
//! ignores the censored subjects entirely, and the mean over all times treats
//! censoring times as if they were event times. The Kaplan-Meier median
//! accounts for censoring and is reported alongside them for comparison.

use crate::estimate::KaplanMeierEstimate;

/// Overview of a single survival sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SurvivalSummary {
    /// Total number of subjects
    pub n_subjects: usize,
    /// Number of subjects with an observed event
    pub n_events: usize,
    /// Number of censored subjects
    pub n_censored: usize,
    /// Mean time over subjects with an observed event (`None` without events)
    pub mean_event_time: Option<f64>,
    /// Mean time over all subjects, censored ones included
    pub mean_all_time: f64,
    /// Kaplan-Meier median survival time
    pub median_km: Option<f64>,
}

impl SurvivalSummary {
    /// Builds a summary from a finished estimate.
    ///
    /// # Examples
    ///
    /// ```
    /// use prolim_stats::{estimate::KaplanMeierEstimate, summary::SurvivalSummary};
    ///
    /// let estimate =
    ///     KaplanMeierEstimate::from_codes(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 0, 1]).unwrap();
    /// let summary = SurvivalSummary::from_estimate(&estimate);
    ///
    /// assert_eq!(summary.n_subjects, 4);
    /// assert_eq!(summary.n_censored, 1);
    /// assert_eq!(summary.median_km, Some(2.0));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_estimate(estimate: &KaplanMeierEstimate) -> Self {
        let n_subjects = estimate.n_at_risk().first().copied().unwrap_or(0);
        let n_events = estimate.n_events().iter().sum::<usize>();
        let n_censored = estimate.n_censored().iter().sum::<usize>();

        let mut event_time_sum = 0.0;
        let mut all_time_sum = 0.0;
        for record in estimate.records() {
            event_time_sum += record.time * record.n_events as f64;
            all_time_sum += record.time * record.n_removed() as f64;
        }

        let mean_event_time = (n_events > 0).then(|| event_time_sum / n_events as f64);
        let mean_all_time = if n_subjects == 0 {
            0.0
        } else {
            all_time_sum / n_subjects as f64
        };

        Self {
            n_subjects,
            n_events,
            n_censored,
            mean_event_time,
            mean_all_time,
            median_km: estimate.median_survival(),
        }
    }

    /// Censoring rate as a percentage.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn censoring_rate(&self) -> f64 {
        if self.n_subjects == 0 {
            return 0.0;
        }
        100.0 * self.n_censored as f64 / self.n_subjects as f64
    }

    /// Relative difference between the KM median and the naive mean, as text.
    #[must_use]
    pub fn km_vs_all_str(&self) -> String {
        match self.median_km {
            Some(median) if self.mean_all_time > 0.0 => {
                let diff = 100.0 * (median - self.mean_all_time) / self.mean_all_time;
                format!("{diff:+.1}%")
            }
            _ => "N/A".to_owned(),
        }
    }
}

impl KaplanMeierEstimate {
    /// Naive means and the KM median for this sample.
    ///
    /// Shorthand for [`SurvivalSummary::from_estimate`].
    #[must_use]
    pub fn summary(&self) -> SurvivalSummary {
        SurvivalSummary::from_estimate(self)
    }
}
