//! Per-organization page collectors.
//!
//! Each collector fetches one public page, flattens it to text and applies
//! regex heuristics tuned to that organization's current markup. The
//! heuristics are deliberately ad hoc and best effort: they break when a site
//! redesigns, and a broken collector simply contributes zero records for that
//! run. Candidate extraction is split from fetching so the parsing can be
//! exercised against inline HTML in tests.

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use scraper::Html;
use thiserror::Error;
use tracing::warn;

use confscrape_core::ConferenceRecord;
use confscrape_fetch::{FetchError, HttpFetcher, PageSnapshotStore};

mod aaa;
mod afa;
mod efa;
mod sfs;
mod wfa;

pub const CRATE_NAME: &str = "confscrape-sources";

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Page(String),
}

/// Shared run context handed to every collector: the HTTP client, an
/// optional raw-page archive, and the run's calendar date (collectors skip
/// editions older than the current year).
pub struct CollectContext<'a> {
    pub http: &'a HttpFetcher,
    pub snapshots: Option<&'a PageSnapshotStore>,
    pub today: NaiveDate,
}

impl CollectContext<'_> {
    /// Fetch a page, archive the raw body, and return its flattened text.
    /// Snapshot failures are logged and otherwise ignored; they must never
    /// cost a run its records.
    pub(crate) async fn fetch_page_text(
        &self,
        source_id: &str,
        url: &str,
    ) -> Result<String, CollectError> {
        let body = self.http.fetch_text(source_id, url).await?;
        if let Some(store) = self.snapshots {
            if let Err(err) = store.store(Utc::now(), source_id, &body).await {
                warn!(source_id, error = %err, "failed to snapshot fetched page");
            }
        }
        Ok(page_text(&body))
    }
}

/// One conference source: produces zero or more candidate records and fails
/// independently of every other source.
#[async_trait]
pub trait Collector: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn collect(
        &self,
        ctx: &CollectContext<'_>,
    ) -> Result<Vec<ConferenceRecord>, CollectError>;
}

/// Registry lookup. An unknown id is not an error; the pipeline logs and
/// moves on, so a registry entry can precede its collector.
pub fn collector_for_source(source_id: &str) -> Option<Box<dyn Collector>> {
    match source_id {
        "afa" => Some(Box::new(afa::AfaCollector)),
        "wfa" => Some(Box::new(wfa::WfaCollector)),
        "efa" => Some(Box::new(efa::EfaCollector)),
        "sfs" => Some(Box::new(sfs::SfsCollector)),
        "aaa" => Some(Box::new(aaa::AaaCollector)),
        _ => None,
    }
}

/// Flatten an HTML document to its text content, whitespace-collapsed, the
/// way the regex heuristics expect it.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&text)
}

pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Month D-D, YYYY` tokens appearing anywhere in the page text. Individual
/// collectors filter these down to the edition year they care about.
pub(crate) fn date_range_mentions(content: &str) -> impl Iterator<Item = &str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\w+\s+\d{1,2}\s*[-\u{2013}]\s*\d{1,2},?\s*\d{4}").expect("date mention pattern")
    });
    re.find_iter(content).map(|m| m.as_str())
}

/// US-style `City, ST` location mention following "in" or "at".
pub(crate) fn us_city_state(content: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?:in|at)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s*[A-Z]{2})")
            .expect("location pattern")
    });
    re.captures(content).map(|caps| caps[1].to_string())
}

/// First non-empty capture group of an alternation, parsed as a year.
pub(crate) fn captured_year(caps: &regex::Captures<'_>) -> Option<i32> {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse().ok())
}

/// First parseable date-range mention that names the given edition year.
pub(crate) fn range_mention_for_year(
    content: &str,
    year: i32,
) -> Option<(NaiveDate, NaiveDate)> {
    let needle = year.to_string();
    date_range_mentions(content)
        .filter(|mention| mention.contains(&needle))
        .find_map(|mention| confscrape_core::dates::parse_date_range(mention, year))
}
