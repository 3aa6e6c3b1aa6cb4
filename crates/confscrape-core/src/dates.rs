//! Free-form date parsing shared by the collectors and the status resolver.
//!
//! Conference pages spell dates every way imaginable ("March 3rd, 2026",
//! "Aug 10 2026", "June 21-24"). Everything here returns `Option`: an input
//! that matches no pattern yields `None`, never an error.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// First-three-letter month table, English only. Page text is matched against
/// this rather than any locale machinery.
const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub(crate) fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

fn ordinal_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)(st|nd|rd|th)").expect("ordinal pattern"))
}

/// `"3rd"` -> `"3"`, `"21st"` -> `"21"`. Leaves everything else alone.
fn strip_ordinal_suffixes(input: &str) -> String {
    ordinal_suffix_re().replace_all(input, "$1").into_owned()
}

/// ISO rendering used throughout the output document.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a single free-form date such as `"September 15, 2025"` or
/// `"Sep 15"`. Year-less forms take `fallback_year`. Formats are tried in a
/// fixed order and the first full match wins.
pub fn parse_single_date(input: &str, fallback_year: i32) -> Option<NaiveDate> {
    let cleaned = strip_ordinal_suffixes(input);
    let cleaned = cleaned.trim();

    const WITH_YEAR: [&str; 4] = ["%B %d, %Y", "%B %d %Y", "%b %d, %Y", "%b %d %Y"];
    for fmt in WITH_YEAR {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(date);
        }
    }

    const DAY_ONLY: [&str; 2] = ["%B %d %Y", "%b %d %Y"];
    let with_fallback = format!("{cleaned} {fallback_year}");
    for fmt in DAY_ONLY {
        if let Ok(date) = NaiveDate::parse_from_str(&with_fallback, fmt) {
            return Some(date);
        }
    }

    None
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Same-month ranges only: the month name captures once, and digits are
    // required on both sides of the dash. A cross-month form like
    // "January 30 - February 2, 2026" therefore fails to match and yields
    // no dates at all rather than a wrong pair.
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)\s+(\d{1,2})\s*[-\u{2013}]\s*(\d{1,2}),?\s*(\d{4})?")
            .expect("range pattern")
    })
}

/// Parse `"January 3-5, 2026"` (hyphen or en-dash) into a `(start, end)`
/// pair. A missing year takes `fallback_year` for both ends.
pub fn parse_date_range(input: &str, fallback_year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let caps = range_re().captures(input.trim())?;
    let month = month_number(caps.get(1)?.as_str())?;
    let start_day: u32 = caps[2].parse().ok()?;
    let end_day: u32 = caps[3].parse().ok()?;
    let year: i32 = caps
        .get(4)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(fallback_year);

    let start = NaiveDate::from_ymd_opt(year, month, start_day)?;
    let end = NaiveDate::from_ymd_opt(year, month, end_day)?;
    Some((start, end))
}

/// Normalize an already-recorded date value to a calendar date. Accepts ISO
/// dates, US slash dates and month-name forms; year-less strings fail here
/// because no fallback year is available.
pub fn normalize_date(input: &str) -> Option<NaiveDate> {
    let cleaned = strip_ordinal_suffixes(input);
    let cleaned = cleaned.trim();

    const FORMATS: [&str; 6] = [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%B %d %Y",
        "%b %d %Y",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}
