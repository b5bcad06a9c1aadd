//! Kaplan-Meier estimation of survivor functions from right-censored data.
//!
//! This crate computes the product-limit estimate of a single-sample survivor
//! function together with Greenwood standard errors and pointwise log-log
//! confidence intervals.
//!
//! The computation runs in two phases:
//!
//! 1. **Aggregation** ([`event_table::EventTimeTable`]): raw `(time, status)`
//!    observations are validated, sorted and grouped into one record per
//!    distinct time with event, censoring and at-risk counts.
//! 2. **Recurrence** ([`estimate::KaplanMeierEstimate`]): a single left-to-right
//!    fold over the records accumulates the survival product and the Greenwood
//!    variance sum.
//!
//! Confidence intervals ([`confidence`]) and summary statistics ([`summary`])
//! are derived from the finished estimate.
//!
//! # Modules
//!
//! - [`observation`]: Status values, input validation and errors
//! - [`event_table`]: Aggregation into distinct event times
//! - [`estimate`]: Product-limit survival and Greenwood standard error
//! - [`confidence`]: Log-log pointwise confidence intervals
//! - [`summary`]: Naive versus Kaplan-Meier summary statistics
//!
//! # Examples
//!
//! ```
//! use prolim_stats::{
//!     confidence::DEFAULT_ALPHA,
//!     estimate::KaplanMeierEstimate,
//!     observation::Status,
//! };
//!
//! let times = [1.0, 2.0, 3.0, 4.0];
//! let status = [Status::Event, Status::Event, Status::Censored, Status::Event];
//!
//! let estimate = KaplanMeierEstimate::new(&times, &status).unwrap();
//! let bounds = estimate.conf_int(DEFAULT_ALPHA).unwrap();
//!
//! assert_eq!(estimate.n_events(), &[1, 1, 0, 1]);
//! assert_eq!(bounds.len(), 4);
//! ```

pub use self::{
    confidence::{ConfidenceBounds, Quantile, StandardNormal},
    estimate::KaplanMeierEstimate,
    event_table::{EventTimeRecord, EventTimeTable},
    observation::{EstimateError, Status},
    summary::SurvivalSummary,
};

pub mod confidence;
pub mod estimate;
pub mod event_table;
pub mod observation;
pub mod summary;
