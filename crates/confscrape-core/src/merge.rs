//! Keyed merge of conference collections.

use std::collections::BTreeMap;

use crate::ConferenceRecord;

/// Combine two ordered collections into one keyed by `(short_name, year)`.
///
/// The base collection is inserted wholesale in iteration order, later
/// duplicates silently replacing earlier ones. Overlay records then either
/// field-merge into an existing entry (a `Some` value wins, a `None` never
/// erases) or insert as new. Output comes back in key order; the final
/// presentation order is imposed by the pipeline afterwards.
///
/// The pipeline calls this twice per run: existing + scraped, then that
/// result + manual, which makes manual the highest-precedence source.
pub fn merge_conferences(
    base: &[ConferenceRecord],
    overlay: &[ConferenceRecord],
) -> Vec<ConferenceRecord> {
    let mut merged: BTreeMap<(String, i32), ConferenceRecord> = BTreeMap::new();

    for record in base {
        merged.insert(record.key(), record.clone());
    }

    for record in overlay {
        match merged.get_mut(&record.key()) {
            Some(existing) => overlay_fields(existing, record),
            None => {
                merged.insert(record.key(), record.clone());
            }
        }
    }

    merged.into_values().collect()
}

fn overlay_fields(existing: &mut ConferenceRecord, overlay: &ConferenceRecord) {
    fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
        if src.is_some() {
            dst.clone_from(src);
        }
    }

    take(&mut existing.name, &overlay.name);
    take(&mut existing.short_name, &overlay.short_name);
    take(&mut existing.field, &overlay.field);
    take(&mut existing.category, &overlay.category);
    take(&mut existing.year, &overlay.year);
    take(&mut existing.conference_dates, &overlay.conference_dates);
    take(&mut existing.location, &overlay.location);
    take(&mut existing.submission_deadline, &overlay.submission_deadline);
    take(&mut existing.website, &overlay.website);
    take(&mut existing.cfp_url, &overlay.cfp_url);
    take(&mut existing.source, &overlay.source);
    take(&mut existing.notes, &overlay.notes);
    take(&mut existing.status, &overlay.status);
    take(&mut existing.last_verified, &overlay.last_verified);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConferenceDates;

    fn record(short_name: &str, year: i32) -> ConferenceRecord {
        ConferenceRecord {
            name: Some(format!("{short_name} Annual Meeting {year}")),
            short_name: Some(short_name.into()),
            year: Some(year),
            ..Default::default()
        }
    }

    #[test]
    fn overlay_some_values_win() {
        let mut base = record("AFA", 2026);
        base.location = Some("Boston, MA".into());
        base.submission_deadline = Some("2025-09-01".into());

        let mut manual = record("AFA", 2026);
        manual.location = Some("Chicago, IL".into());
        manual.submission_deadline = None;

        let merged = merge_conferences(&[base], &[manual]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].location.as_deref(), Some("Chicago, IL"));
    }

    #[test]
    fn overlay_none_never_erases() {
        let mut base = record("AFA", 2026);
        base.submission_deadline = Some("2025-09-01".into());
        base.website = Some("https://www.afajof.org/annual-meeting".into());

        let mut manual = record("AFA", 2026);
        manual.submission_deadline = None;
        manual.website = None;
        manual.notes = Some("Room block closes early.".into());

        let merged = merge_conferences(&[base], &[manual]);
        assert_eq!(merged[0].submission_deadline.as_deref(), Some("2025-09-01"));
        assert_eq!(
            merged[0].website.as_deref(),
            Some("https://www.afajof.org/annual-meeting")
        );
        assert_eq!(merged[0].notes.as_deref(), Some("Room block closes early."));
    }

    #[test]
    fn conference_dates_merge_wholesale() {
        let mut base = record("EFA", 2026);
        base.conference_dates = Some(ConferenceDates {
            start: Some("2026-08-19".into()),
            end: Some("2026-08-22".into()),
        });

        let mut overlay = record("EFA", 2026);
        overlay.conference_dates = Some(ConferenceDates {
            start: Some("2026-08-20".into()),
            end: None,
        });

        let merged = merge_conferences(&[base], &[overlay]);
        let dates = merged[0].conference_dates.as_ref().unwrap();
        // The pair is a single field; the override replaces it entirely.
        assert_eq!(dates.start.as_deref(), Some("2026-08-20"));
        assert_eq!(dates.end, None);
    }

    #[test]
    fn distinct_keys_coexist() {
        let merged = merge_conferences(
            &[record("AFA", 2026), record("AFA", 2027)],
            &[record("EFA", 2026)],
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn duplicate_keys_in_base_keep_the_later_record() {
        let mut early = record("SFS", 2026);
        early.location = Some("Nashville, TN".into());
        let mut late = record("SFS", 2026);
        late.location = Some("Toronto, ON".into());
        late.notes = None;

        let merged = merge_conferences(&[early, late], &[]);
        assert_eq!(merged.len(), 1);
        // Wholesale replacement within one sequence, not a field merge.
        assert_eq!(merged[0].location.as_deref(), Some("Toronto, ON"));
    }

    #[test]
    fn merge_with_self_is_idempotent_on_keys() {
        let records = vec![record("AFA", 2026), record("WFA", 2026)];
        let merged = merge_conferences(&records, &records);
        let mut keys: Vec<_> = merged.iter().map(ConferenceRecord::key).collect();
        keys.sort();
        assert_eq!(keys, vec![("AFA".to_string(), 2026), ("WFA".to_string(), 2026)]);
    }
}
