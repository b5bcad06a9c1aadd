//! Raw right-censored observations and their validation.
//!
//! Every estimate starts from two parallel sequences: the observed times and
//! the status of each subject at that time. This module checks those
//! sequences once, up front, and turns them into [`Observation`] values that
//! the rest of the crate can trust without re-validating.

use std::str::FromStr;

/// Outcome recorded for a single subject at its observed time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The event of interest was observed.
    #[display("event")]
    Event,
    /// Observation ended before the event occurred (right-censored).
    #[display("censored")]
    Censored,
}

impl Status {
    /// Numeric code conventionally used for this status (`1` event, `0` censored).
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Status::Event => 1,
            Status::Censored => 0,
        }
    }

    /// Interprets a numeric status code.
    ///
    /// Returns `None` for anything other than `0` or `1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prolim_stats::observation::Status;
    ///
    /// assert_eq!(Status::from_code(1), Some(Status::Event));
    /// assert_eq!(Status::from_code(0), Some(Status::Censored));
    /// assert_eq!(Status::from_code(2), None);
    /// ```
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Status::Event),
            0 => Some(Status::Censored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unrecognized status '{value}'")]
pub struct ParseStatusError {
    pub value: String,
}

impl FromStr for Status {
    type Err = ParseStatusError;

    /// Accepts `1`/`0`, `event`/`censored` and `true`/`false`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let status = match trimmed.to_ascii_lowercase().as_str() {
            "1" | "event" | "true" => Status::Event,
            "0" | "censored" | "false" => Status::Censored,
            _ => {
                return Err(ParseStatusError {
                    value: trimmed.to_owned(),
                });
            }
        };
        Ok(status)
    }
}

/// Errors raised while building an estimate or querying its intervals.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EstimateError {
    #[display("no observations given")]
    Empty,
    #[display("times and status have different lengths ({times} vs {status})")]
    LengthMismatch { times: usize, status: usize },
    #[display("time at index {index} is negative ({time})")]
    NegativeTime { index: usize, time: f64 },
    #[display("time at index {index} is not a finite number")]
    NonFiniteTime { index: usize },
    #[display("status at index {index} is not an event or censoring indicator ('{value}')")]
    UnknownStatus { index: usize, value: String },
    #[display("significance level must lie strictly between 0 and 1, got {alpha}")]
    InvalidSignificance { alpha: f64 },
}

impl EstimateError {
    /// Returns `true` for the errors caused by malformed observation data.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, EstimateError::InvalidSignificance { .. })
    }
}

/// A validated `(time, status)` pair.
///
/// Values of this type can only be produced by [`collect`], so every
/// observation in circulation has a finite, non-negative time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Observation {
    time: f64,
    status: Status,
}

impl Observation {
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }
}

/// Validates parallel time and status sequences.
///
/// Checks, in order: non-empty input, equal lengths, and that every time is
/// finite and non-negative. A time of `-0.0` is accepted and stored as `0.0`.
///
/// # Examples
///
/// ```
/// use prolim_stats::observation::{self, EstimateError, Status};
///
/// let obs = observation::collect(&[3.0, 1.0], &[Status::Event, Status::Censored]).unwrap();
/// assert_eq!(obs.len(), 2);
///
/// let err = observation::collect(&[-1.0], &[Status::Event]).unwrap_err();
/// assert!(matches!(err, EstimateError::NegativeTime { index: 0, .. }));
/// ```
pub fn collect(times: &[f64], status: &[Status]) -> Result<Vec<Observation>, EstimateError> {
    check_lengths(times.len(), status.len())?;

    times
        .iter()
        .zip(status)
        .enumerate()
        .map(|(index, (&time, &status))| {
            if !time.is_finite() {
                return Err(EstimateError::NonFiniteTime { index });
            }
            if time < 0.0 {
                return Err(EstimateError::NegativeTime { index, time });
            }
            // Collapses -0.0 so equal times always aggregate together.
            let time = time + 0.0;
            Ok(Observation { time, status })
        })
        .collect()
}

/// Converts numeric status codes (`1` event, `0` censored).
pub fn statuses_from_codes(codes: &[i64]) -> Result<Vec<Status>, EstimateError> {
    codes
        .iter()
        .enumerate()
        .map(|(index, &code)| {
            Status::from_code(code).ok_or_else(|| EstimateError::UnknownStatus {
                index,
                value: code.to_string(),
            })
        })
        .collect()
}

/// Converts textual status labels using [`Status::from_str`].
pub fn statuses_from_labels<S>(labels: &[S]) -> Result<Vec<Status>, EstimateError>
where
    S: AsRef<str>,
{
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            label
                .as_ref()
                .parse()
                .map_err(|ParseStatusError { value }| EstimateError::UnknownStatus { index, value })
        })
        .collect()
}

pub(crate) fn check_lengths(times: usize, status: usize) -> Result<(), EstimateError> {
    if times != status {
        return Err(EstimateError::LengthMismatch { times, status });
    }
    if times == 0 {
        return Err(EstimateError::Empty);
    }
    Ok(())
}
