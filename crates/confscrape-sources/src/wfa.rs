//! Western Finance Association annual meeting (westernfinance.org).

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;

use confscrape_core::{dates, ConferenceDates, ConferenceRecord};

use crate::{
    captured_year, range_mention_for_year, us_city_state, CollectContext, CollectError, Collector,
};

const BASE_URL: &str = "https://westernfinance.org";

pub(crate) struct WfaCollector;

#[async_trait]
impl Collector for WfaCollector {
    fn source_id(&self) -> &'static str {
        "wfa"
    }

    async fn collect(
        &self,
        ctx: &CollectContext<'_>,
    ) -> Result<Vec<ConferenceRecord>, CollectError> {
        let content = ctx.fetch_page_text(self.source_id(), BASE_URL).await?;
        Ok(parse_page(&content, ctx.today.year()))
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)WFA\s+(\d{4})|(\d{4})\s+WFA|Annual\s+Meeting\s+(\d{4})")
            .expect("year pattern")
    })
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:deadline|due).*?(\w+\s+\d{1,2},?\s*\d{4})").expect("deadline pattern")
    })
}

fn parse_page(content: &str, current_year: i32) -> Vec<ConferenceRecord> {
    let mut conferences = Vec::new();

    for caps in year_re().captures_iter(content) {
        let Some(year) = captured_year(&caps) else {
            continue;
        };
        if year < current_year {
            continue;
        }

        let range = range_mention_for_year(content, year);
        let submission_deadline = deadline_re()
            .captures(content)
            .and_then(|c| dates::parse_single_date(&c[1], year))
            .map(dates::iso);

        conferences.push(ConferenceRecord {
            name: Some(format!("WFA Annual Meeting {year}")),
            short_name: Some("WFA".into()),
            field: Some("finance".into()),
            category: Some("major".into()),
            year: Some(year),
            conference_dates: Some(ConferenceDates {
                start: range.map(|(start, _)| dates::iso(start)),
                end: range.map(|(_, end)| dates::iso(end)),
            }),
            location: us_city_state(content),
            submission_deadline,
            website: Some(BASE_URL.into()),
            source: Some("scraped".into()),
            ..Default::default()
        });
    }

    conferences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_text;

    const PAGE: &str = r#"<html><body>
        <h1>WFA 2026 Annual Meeting</h1>
        <p>June 21-24, 2026 at Whistler, BC.</p>
        <p>Submissions due November 1, 2025.</p>
    </body></html>"#;

    #[test]
    fn extracts_meeting_and_deadline() {
        let content = page_text(PAGE);
        let records = parse_page(&content, 2026);
        assert!(!records.is_empty());

        let record = &records[0];
        assert_eq!(record.name.as_deref(), Some("WFA Annual Meeting 2026"));
        assert_eq!(record.short_name.as_deref(), Some("WFA"));
        let range = record.conference_dates.as_ref().unwrap();
        assert_eq!(range.start.as_deref(), Some("2026-06-21"));
        assert_eq!(range.end.as_deref(), Some("2026-06-24"));
        assert_eq!(record.location.as_deref(), Some("Whistler, BC"));
        assert_eq!(record.submission_deadline.as_deref(), Some("2025-11-01"));
    }

    #[test]
    fn stale_editions_are_skipped() {
        let content = page_text("<p>WFA 2019 was held June 17-20, 2019.</p>");
        assert!(parse_page(&content, 2026).is_empty());
    }
}
