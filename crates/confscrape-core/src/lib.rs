//! Core domain model for the conference tracker.

use serde::{Deserialize, Serialize};

pub mod dates;
pub mod merge;
pub mod status;

pub use merge::merge_conferences;
pub use status::{determine_status, Status};

pub const CRATE_NAME: &str = "confscrape-core";

/// Event date range, ISO `YYYY-MM-DD` strings. Merged as a single field:
/// an override carrying dates replaces the whole pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConferenceDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// One conference edition. Every field is optional at the type level because
/// candidates arrive partial; `validate_conference` gates what enters the
/// pipeline, and `(short_name, year)` is the merge identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConferenceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_dates: Option<ConferenceDates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
}

impl ConferenceRecord {
    /// Merge identity. Missing components key as empty/zero so partial
    /// records still collide deterministically instead of multiplying.
    pub fn key(&self) -> (String, i32) {
        (
            self.short_name.clone().unwrap_or_default(),
            self.year.unwrap_or(0),
        )
    }
}

/// A candidate must carry a name, a short name and a non-zero year before it
/// may enter the merge stage.
pub fn validate_conference(record: &ConferenceRecord) -> bool {
    record.name.as_deref().is_some_and(|s| !s.is_empty())
        && record.short_name.as_deref().is_some_and(|s| !s.is_empty())
        && record.year.is_some_and(|y| y != 0)
}
