//! European Finance Association annual meeting (european-finance.org).

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;

use confscrape_core::{dates, ConferenceDates, ConferenceRecord};

use crate::{captured_year, range_mention_for_year, CollectContext, CollectError, Collector};

const BASE_URL: &str = "https://www.european-finance.org";

pub(crate) struct EfaCollector;

#[async_trait]
impl Collector for EfaCollector {
    fn source_id(&self) -> &'static str {
        "efa"
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
        Regex::new(r"(?i)EFA\s+(\d{4})|(\d{4})\s+EFA|Annual\s+Meeting\s+(\d{4})")
            .expect("year pattern")
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Looser than the US form: European venues have no state code, so accept
    // a bare capitalized place name after "in"/"at".
    RE.get_or_init(|| {
        Regex::new(r"(?:in|at)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,?\s*(?:[A-Z][a-z]+)?)")
            .expect("location pattern")
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
        let location = location_re()
            .captures(content)
            .map(|c| c[1].trim().to_string());

        conferences.push(ConferenceRecord {
            name: Some(format!("EFA Annual Meeting {year}")),
            short_name: Some("EFA".into()),
            field: Some("finance".into()),
            category: Some("major".into()),
            year: Some(year),
            conference_dates: Some(ConferenceDates {
                start: range.map(|(start, _)| dates::iso(start)),
                end: range.map(|(_, end)| dates::iso(end)),
            }),
            location,
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
        <h2>EFA 2026</h2>
        <p>The Annual Meeting takes place in Bergen, Norway on
        August 19-22, 2026.</p>
    </body></html>"#;

    #[test]
    fn extracts_meeting_and_loose_location() {
        let content = page_text(PAGE);
        let records = parse_page(&content, 2026);
        assert!(!records.is_empty());

        let record = &records[0];
        assert_eq!(record.name.as_deref(), Some("EFA Annual Meeting 2026"));
        assert_eq!(record.short_name.as_deref(), Some("EFA"));
        let range = record.conference_dates.as_ref().unwrap();
        assert_eq!(range.start.as_deref(), Some("2026-08-19"));
        assert_eq!(range.end.as_deref(), Some("2026-08-22"));
        assert_eq!(record.location.as_deref(), Some("Bergen, Norway"));
    }

    #[test]
    fn ignores_ranges_for_other_years() {
        let content =
            page_text("<p>EFA 2027. Last year we met August 20-23, 2025 in Lisbon.</p>");
        let records = parse_page(&content, 2026);
        assert_eq!(records.len(), 1);
        let range = records[0].conference_dates.as_ref().unwrap();
        assert_eq!(range.start, None);
        assert_eq!(range.end, None);
    }
}
