//! Aggregation of raw observations into an event-time table.
//!
//! Subjects are sorted once by time and then grouped into runs of equal time.
//! Each run becomes one [`EventTimeRecord`]. The size of the risk set at a run
//! is the number of subjects not yet consumed by earlier runs, so the whole
//! table is built in a single forward pass after the sort.
//!
//! ```text
//! time     1   2   3   4
//! status   E   E   C   E
//! at risk  4   3   2   1
//! ```

use log::debug;

use crate::observation::{self, EstimateError, Observation, Status};

/// Aggregate counts for one distinct observed time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EventTimeRecord {
    /// The distinct time value.
    pub time: f64,
    /// Number of subjects with an event at this time.
    pub n_events: usize,
    /// Number of subjects censored at this time.
    pub n_censored: usize,
    /// Number of subjects whose time is at or after this time.
    pub n_at_risk: usize,
}

impl EventTimeRecord {
    /// Number of subjects leaving the risk set at this time.
    #[must_use]
    pub fn n_removed(&self) -> usize {
        self.n_events + self.n_censored
    }
}

/// Event-time records ordered by strictly increasing time.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EventTimeTable {
    records: Vec<EventTimeRecord>,
}

impl EventTimeTable {
    /// Validates the observations and aggregates them.
    ///
    /// # Examples
    ///
    /// ```
    /// use prolim_stats::{event_table::EventTimeTable, observation::Status};
    ///
    /// let table = EventTimeTable::new(
    ///     &[2.0, 1.0, 2.0],
    ///     &[Status::Event, Status::Censored, Status::Censored],
    /// )
    /// .unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.records()[1].n_at_risk, 2);
    /// ```
    pub fn new(times: &[f64], status: &[Status]) -> Result<Self, EstimateError> {
        let observations = observation::collect(times, status)?;
        Ok(Self::from_observations(observations))
    }

    /// Aggregates already validated observations.
    #[must_use]
    pub fn from_observations(mut observations: Vec<Observation>) -> Self {
        observations.sort_by(|a, b| a.time().total_cmp(&b.time()));

        let total = observations.len();
        let mut records = vec![];
        let mut removed = 0;

        for group in observations.chunk_by(|a, b| a.time().total_cmp(&b.time()).is_eq()) {
            let n_events = group.iter().filter(|o| o.status().is_event()).count();
            records.push(EventTimeRecord {
                time: group[0].time(),
                n_events,
                n_censored: group.len() - n_events,
                n_at_risk: total - removed,
            });
            removed += group.len();
        }

        debug!(
            "aggregated {total} observations into {} distinct times",
            records.len()
        );

        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[EventTimeRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of subjects in the table.
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.records.first().map_or(0, |r| r.n_at_risk)
    }

    /// Total number of observed events.
    #[must_use]
    pub fn total_events(&self) -> usize {
        self.records.iter().map(|r| r.n_events).sum()
    }

    /// Total number of censored subjects.
    #[must_use]
    pub fn total_censored(&self) -> usize {
        self.records.iter().map(|r| r.n_censored).sum()
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _, seq::SliceRandom as _};
    use rand_pcg::Pcg32;

    use super::*;

    use crate::observation::Status::{Censored as C, Event as E};

    #[test]
    fn test_basic_aggregation() {
        let table = EventTimeTable::new(&[1.0, 2.0, 3.0, 4.0], &[E, E, C, E]).unwrap();
        let times = table.records().iter().map(|r| r.time).collect::<Vec<_>>();
        let at_risk = table.records().iter().map(|r| r.n_at_risk).collect::<Vec<_>>();
        let events = table.records().iter().map(|r| r.n_events).collect::<Vec<_>>();
        let censored = table.records().iter().map(|r| r.n_censored).collect::<Vec<_>>();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(at_risk, vec![4, 3, 2, 1]);
        assert_eq!(events, vec![1, 1, 0, 1]);
        assert_eq!(censored, vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_ties_are_grouped() {
        let table =
            EventTimeTable::new(&[5.0, 3.0, 5.0, 3.0, 5.0], &[E, C, C, E, E]).unwrap();
        assert_eq!(
            table.records(),
            &[
                EventTimeRecord {
                    time: 3.0,
                    n_events: 1,
                    n_censored: 1,
                    n_at_risk: 5,
                },
                EventTimeRecord {
                    time: 5.0,
                    n_events: 2,
                    n_censored: 1,
                    n_at_risk: 3,
                },
            ]
        );
        assert_eq!(table.n_subjects(), 5);
        assert_eq!(table.total_events(), 3);
        assert_eq!(table.total_censored(), 2);
    }

    #[test]
    fn test_censoring_only_time_is_kept() {
        let table = EventTimeTable::new(&[5.0], &[C]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].n_events, 0);
        assert_eq!(table.records()[0].n_censored, 1);
        assert_eq!(table.records()[0].n_at_risk, 1);
    }

    #[test]
    fn test_zero_and_negative_zero_share_a_record() {
        let table = EventTimeTable::new(&[0.0, -0.0, 1.0], &[E, C, E]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].n_removed(), 2);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert_eq!(EventTimeTable::new(&[], &[]), Err(EstimateError::Empty));
        assert!(matches!(
            EventTimeTable::new(&[1.0, -2.0], &[E, E]),
            Err(EstimateError::NegativeTime { index: 1, .. })
        ));
    }

    #[test]
    fn test_random_tables_hold_invariants() {
        let mut rng = Pcg32::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let n = rng.random_range(1..60);
            let times = (0..n)
                .map(|_| f64::from(rng.random_range(0..15_u32)))
                .collect::<Vec<_>>();
            let status = (0..n)
                .map(|_| if rng.random_bool(0.6) { E } else { C })
                .collect::<Vec<_>>();
            let table = EventTimeTable::new(&times, &status).unwrap();
            let records = table.records();

            assert_eq!(table.n_subjects(), n);
            assert_eq!(table.total_events() + table.total_censored(), n);
            for r in records {
                assert!(r.n_removed() <= r.n_at_risk);
                assert!(r.n_removed() > 0);
            }
            for pair in records.windows(2) {
                assert!(pair[0].time < pair[1].time);
                assert!(pair[1].n_at_risk < pair[0].n_at_risk);
                assert_eq!(pair[1].n_at_risk, pair[0].n_at_risk - pair[0].n_removed());
            }
            let last = records.last().unwrap();
            assert_eq!(last.n_removed(), last.n_at_risk);
        }
    }

    #[test]
    fn test_aggregation_ignores_input_order() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut pairs = (0..40)
            .map(|_| {
                let time = f64::from(rng.random_range(0..10_u32)) * 0.5;
                let status = if rng.random_bool(0.5) { E } else { C };
                (time, status)
            })
            .collect::<Vec<_>>();

        let build = |pairs: &[(f64, Status)]| {
            let (times, status): (Vec<_>, Vec<_>) = pairs.iter().copied().unzip();
            EventTimeTable::new(&times, &status).unwrap()
        };

        let expected = build(&pairs);
        for _ in 0..10 {
            pairs.shuffle(&mut rng);
            assert_eq!(build(&pairs), expected);
        }
    }
}
