//! Lifecycle status derivation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{dates, ConferenceRecord};

/// Display status, recomputed on every run. Persisted values are never
/// trusted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Past,
    SubmissionsOpen,
    SubmissionsClosed,
    Upcoming,
}

/// Derive a record's status for a given calendar date.
///
/// An end date strictly before `today` wins over everything: a finished
/// conference is never reported as open for submissions. Otherwise a
/// parseable deadline splits open/closed, and with neither signal the record
/// stays `Upcoming`. Unparseable dates count as absent.
pub fn determine_status(record: &ConferenceRecord, today: NaiveDate) -> Status {
    let end = record
        .conference_dates
        .as_ref()
        .and_then(|d| d.end.as_deref())
        .and_then(dates::normalize_date);
    if let Some(end) = end {
        if end < today {
            return Status::Past;
        }
    }

    if let Some(deadline) = record
        .submission_deadline
        .as_deref()
        .and_then(dates::normalize_date)
    {
        return if deadline > today {
            Status::SubmissionsOpen
        } else {
            Status::SubmissionsClosed
        };
    }

    Status::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConferenceDates;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn with_end(end: &str) -> ConferenceRecord {
        ConferenceRecord {
            conference_dates: Some(ConferenceDates {
                start: None,
                end: Some(end.into()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn past_end_wins_over_open_deadline() {
        let mut record = with_end("2020-01-01");
        record.submission_deadline = Some("2099-01-01".into());
        assert_eq!(determine_status(&record, today()), Status::Past);
    }

    #[test]
    fn future_deadline_means_open() {
        let record = ConferenceRecord {
            submission_deadline: Some("2099-01-01".into()),
            ..Default::default()
        };
        assert_eq!(determine_status(&record, today()), Status::SubmissionsOpen);
    }

    #[test]
    fn elapsed_deadline_means_closed() {
        let record = ConferenceRecord {
            submission_deadline: Some("2026-01-15".into()),
            ..Default::default()
        };
        assert_eq!(determine_status(&record, today()), Status::SubmissionsClosed);
    }

    #[test]
    fn deadline_on_today_is_closed() {
        // Strictly-after comparison: the deadline day itself counts as closed.
        let record = ConferenceRecord {
            submission_deadline: Some("2026-02-01".into()),
            ..Default::default()
        };
        assert_eq!(determine_status(&record, today()), Status::SubmissionsClosed);
    }

    #[test]
    fn no_signals_means_upcoming() {
        assert_eq!(
            determine_status(&ConferenceRecord::default(), today()),
            Status::Upcoming
        );
    }

    #[test]
    fn future_end_without_deadline_is_upcoming() {
        let record = with_end("2026-08-22");
        assert_eq!(determine_status(&record, today()), Status::Upcoming);
    }

    #[test]
    fn unparseable_dates_count_as_absent() {
        let mut record = with_end("TBD");
        assert_eq!(determine_status(&record, today()), Status::Upcoming);

        record.submission_deadline = Some("whenever".into());
        assert_eq!(determine_status(&record, today()), Status::Upcoming);

        record.submission_deadline = Some("2099-01-01".into());
        assert_eq!(determine_status(&record, today()), Status::SubmissionsOpen);
    }
}
