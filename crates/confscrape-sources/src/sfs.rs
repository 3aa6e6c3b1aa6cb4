//! Society for Financial Studies Cavalcade (sfs.org).

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;

use confscrape_core::{dates, ConferenceDates, ConferenceRecord};

use crate::{captured_year, range_mention_for_year, CollectContext, CollectError, Collector};

const CAVALCADE_URL: &str = "https://sfs.org/sfs-cavalcade/";

pub(crate) struct SfsCollector;

#[async_trait]
impl Collector for SfsCollector {
    fn source_id(&self) -> &'static str {
        "sfs"
    }

    async fn collect(
        &self,
        ctx: &CollectContext<'_>,
    ) -> Result<Vec<ConferenceRecord>, CollectError> {
        let content = ctx.fetch_page_text(self.source_id(), CAVALCADE_URL).await?;
        Ok(parse_page(&content, ctx.today.year()))
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Cavalcade\s+(?:North\s+America\s+)?(\d{4})|(\d{4})\s+Cavalcade")
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
            name: Some(format!("SFS Cavalcade North America {year}")),
            short_name: Some("SFS".into()),
            field: Some("finance".into()),
            category: Some("major".into()),
            year: Some(year),
            conference_dates: Some(ConferenceDates {
                start: range.map(|(start, _)| dates::iso(start)),
                end: range.map(|(_, end)| dates::iso(end)),
            }),
            submission_deadline,
            website: Some(CAVALCADE_URL.into()),
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
        <h1>SFS Cavalcade North America 2026</h1>
        <p>Hosted May 18-21, 2026 at Vanderbilt University.</p>
        <p>Papers are due December 8, 2025.</p>
    </body></html>"#;

    #[test]
    fn extracts_cavalcade_edition() {
        let content = page_text(PAGE);
        let records = parse_page(&content, 2026);
        assert!(!records.is_empty());

        let record = &records[0];
        assert_eq!(
            record.name.as_deref(),
            Some("SFS Cavalcade North America 2026")
        );
        assert_eq!(record.short_name.as_deref(), Some("SFS"));
        let range = record.conference_dates.as_ref().unwrap();
        assert_eq!(range.start.as_deref(), Some("2026-05-18"));
        assert_eq!(range.end.as_deref(), Some("2026-05-21"));
        assert_eq!(record.submission_deadline.as_deref(), Some("2025-12-08"));
    }

    #[test]
    fn year_pattern_accepts_both_orders() {
        let forward = page_text("<p>Cavalcade 2026 registration is open.</p>");
        let reversed = page_text("<p>The 2027 Cavalcade moves west.</p>");
        assert_eq!(parse_page(&forward, 2026).len(), 1);
        assert_eq!(parse_page(&reversed, 2026).len(), 1);
    }
}
