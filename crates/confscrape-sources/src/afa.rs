//! American Finance Association annual meeting (afajof.org).

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use confscrape_core::{dates, ConferenceDates, ConferenceRecord};

use crate::{captured_year, us_city_state, CollectContext, CollectError, Collector};

const BASE_URL: &str = "https://www.afajof.org";
const ANNUAL_MEETING_URL: &str = "https://www.afajof.org/annual-meeting";

pub(crate) struct AfaCollector;

#[async_trait]
impl Collector for AfaCollector {
    fn source_id(&self) -> &'static str {
        "afa"
    }

    async fn collect(
        &self,
        ctx: &CollectContext<'_>,
    ) -> Result<Vec<ConferenceRecord>, CollectError> {
        let content = ctx
            .fetch_page_text(self.source_id(), ANNUAL_MEETING_URL)
            .await?;
        Ok(parse_page(&content, ctx.today.year()))
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "2026 AFA Annual Meeting" or "AFA Annual Meeting 2026".
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{4})\s+AFA\s+Annual\s+Meeting|AFA\s+Annual\s+Meeting\s+(\d{4})")
            .expect("year pattern")
    })
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)submission\s+deadline.*?(\w+\s+\d{1,2},?\s*\d{4})")
            .expect("deadline pattern")
    })
}

/// Date range mentioned after the edition year, e.g. "... 2026 ... January
/// 3-5, 2026". Anchoring on the year keeps stale editions on the same page
/// from matching.
fn date_near_year(content: &str, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let pattern =
        format!(r"(?is){year}.*?(\w+\s+\d{{1,2}}\s*[-\u{{2013}}]\s*\d{{1,2}},?\s*{year})");
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(content)?;
    dates::parse_date_range(caps.get(1)?.as_str(), year)
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

        let range = date_near_year(content, year);
        // AFA deadlines fall in the year before the meeting.
        let submission_deadline = deadline_re()
            .captures(content)
            .and_then(|c| dates::parse_single_date(&c[1], year - 1))
            .map(dates::iso);

        conferences.push(ConferenceRecord {
            name: Some(format!("AFA Annual Meeting {year}")),
            short_name: Some("AFA".into()),
            field: Some("finance".into()),
            category: Some("major".into()),
            year: Some(year),
            conference_dates: Some(ConferenceDates {
                start: range.map(|(start, _)| dates::iso(start)),
                end: range.map(|(_, end)| dates::iso(end)),
            }),
            location: us_city_state(content),
            submission_deadline,
            website: Some(ANNUAL_MEETING_URL.into()),
            cfp_url: Some(format!("{BASE_URL}/call-for-papers")),
            source: Some("scraped".into()),
            notes: Some("Joint with ASSA. PhD poster session available.".into()),
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
        <h1>2026 AFA Annual Meeting</h1>
        <p>Join us January 3-5, 2026 in Chicago, IL for the premier event
        in academic finance.</p>
        <p>Paper submission deadline: September 15, 2025.</p>
    </body></html>"#;

    #[test]
    fn extracts_meeting_dates_location_and_deadline() {
        let content = page_text(PAGE);
        let records = parse_page(&content, 2025);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.name.as_deref(), Some("AFA Annual Meeting 2026"));
        assert_eq!(record.short_name.as_deref(), Some("AFA"));
        assert_eq!(record.year, Some(2026));
        let range = record.conference_dates.as_ref().unwrap();
        assert_eq!(range.start.as_deref(), Some("2026-01-03"));
        assert_eq!(range.end.as_deref(), Some("2026-01-05"));
        assert_eq!(record.location.as_deref(), Some("Chicago, IL"));
        assert_eq!(record.submission_deadline.as_deref(), Some("2025-09-15"));
        assert_eq!(record.source.as_deref(), Some("scraped"));
    }

    #[test]
    fn skips_editions_before_the_current_year() {
        let content = page_text("<p>AFA Annual Meeting 2024 was held in San Francisco, CA.</p>");
        assert!(parse_page(&content, 2025).is_empty());
    }

    #[test]
    fn missing_dates_leave_fields_unset() {
        let content = page_text("<p>AFA Annual Meeting 2027: details to follow.</p>");
        let records = parse_page(&content, 2025);
        assert_eq!(records.len(), 1);
        let range = records[0].conference_dates.as_ref().unwrap();
        assert_eq!(range.start, None);
        assert_eq!(range.end, None);
        assert_eq!(records[0].submission_deadline, None);
    }
}
