//! American Accounting Association annual meeting (aaahq.org).

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use confscrape_core::{dates, ConferenceDates, ConferenceRecord};

use crate::{
    captured_year, date_range_mentions, us_city_state, CollectContext, CollectError, Collector,
};

const MEETINGS_URL: &str = "https://aaahq.org/Meetings";

pub(crate) struct AaaCollector;

#[async_trait]
impl Collector for AaaCollector {
    fn source_id(&self) -> &'static str {
        "aaa"
    }

    async fn collect(
        &self,
        ctx: &CollectContext<'_>,
    ) -> Result<Vec<ConferenceRecord>, CollectError> {
        let content = ctx.fetch_page_text(self.source_id(), MEETINGS_URL).await?;
        Ok(parse_page(&content, ctx.today.year()))
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Annual\s+Meeting\s+(\d{4})|(\d{4})\s+Annual\s+Meeting")
            .expect("year pattern")
    })
}

/// The meetings page lists section midyear events with their own dates; the
/// annual meeting is the August one.
fn august_range_for_year(content: &str, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let needle = year.to_string();
    date_range_mentions(content)
        .filter(|mention| mention.contains(&needle))
        .filter(|mention| mention.to_lowercase().contains("august"))
        .find_map(|mention| dates::parse_date_range(mention, year))
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

        let range = august_range_for_year(content, year);

        conferences.push(ConferenceRecord {
            name: Some(format!("AAA Annual Meeting {year}")),
            short_name: Some("AAA".into()),
            field: Some("accounting".into()),
            category: Some("major".into()),
            year: Some(year),
            conference_dates: Some(ConferenceDates {
                start: range.map(|(start, _)| dates::iso(start)),
                end: range.map(|(_, end)| dates::iso(end)),
            }),
            location: us_city_state(content),
            website: Some(MEETINGS_URL.into()),
            source: Some("scraped".into()),
            notes: Some("Largest accounting conference. Multiple sections.".into()),
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
        <h1>2026 Annual Meeting</h1>
        <p>Join us in Denver, CO, August 8-12, 2026.</p>
        <p>Management Accounting Section Midyear: January 7-9, 2026.</p>
    </body></html>"#;

    #[test]
    fn prefers_the_august_range_over_section_meetings() {
        let content = page_text(PAGE);
        let records = parse_page(&content, 2026);
        assert!(!records.is_empty());

        let record = &records[0];
        assert_eq!(record.name.as_deref(), Some("AAA Annual Meeting 2026"));
        assert_eq!(record.field.as_deref(), Some("accounting"));
        let range = record.conference_dates.as_ref().unwrap();
        assert_eq!(range.start.as_deref(), Some("2026-08-08"));
        assert_eq!(range.end.as_deref(), Some("2026-08-12"));
        assert_eq!(record.location.as_deref(), Some("Denver, CO"));
    }

    #[test]
    fn no_august_mention_means_no_dates() {
        let content = page_text("<p>Annual Meeting 2026: dates May 4-6, 2026.</p>");
        let records = parse_page(&content, 2026);
        let range = records[0].conference_dates.as_ref().unwrap();
        assert_eq!(range.start, None);
        assert_eq!(range.end, None);
    }
}
