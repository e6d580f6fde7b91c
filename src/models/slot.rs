use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Upper bound on slots returned by any single source.
pub const MAX_SLOTS: usize = 50;

/// Which upstream path produced a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotSource {
    CalendarApi,
    Scraped,
    Synthetic,
}

/// How much a scraped slot's date can be trusted.
///
/// `Inferred` means the time of day came from the page but the date did not,
/// so the slot was placed on a day the page never confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConfidence {
    Verified,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub display_time: String,
    pub available: bool,
    pub source: SlotSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_confidence: Option<DateConfidence>,
}

impl Slot {
    pub fn new(
        id: impl Into<String>,
        start: DateTime<Tz>,
        duration: Duration,
        source: SlotSource,
    ) -> Self {
        let end = start + duration;
        Self {
            id: id.into(),
            start_time: start.fixed_offset(),
            end_time: end.fixed_offset(),
            display_time: display_time(&start),
            available: true,
            source,
            date_confidence: None,
        }
    }

    pub fn with_date_confidence(mut self, confidence: DateConfidence) -> Self {
        self.date_confidence = Some(confidence);
        self
    }
}

/// Renders a start time as e.g. `Monday, October 19th 2026 at 9:00 AM`.
pub fn display_time(start: &DateTime<Tz>) -> String {
    format!(
        "{}, {} {}{} {} at {}",
        start.format("%A"),
        start.format("%B"),
        start.day(),
        ordinal_suffix(start.day()),
        start.year(),
        start.format("%-I:%M %p"),
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Sorts ascending by start time, drops repeated start times and ids, and caps
/// the list at `cap` entries.
pub fn normalize_slots(mut slots: Vec<Slot>, cap: usize) -> Vec<Slot> {
    slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    slots.dedup_by(|next, prev| next.start_time == prev.start_time);

    let mut seen_ids = HashSet::new();
    slots.retain(|slot| seen_ids.insert(slot.id.clone()));

    slots.truncate(cap);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(2026, 10, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn display_time_uses_ordinals_and_twelve_hour_clock() {
        assert_eq!(
            display_time(&at(19, 9, 0)),
            "Monday, October 19th 2026 at 9:00 AM"
        );
        assert_eq!(
            display_time(&at(21, 18, 45)),
            "Wednesday, October 21st 2026 at 6:45 PM"
        );
        assert_eq!(
            display_time(&at(12, 12, 30)),
            "Monday, October 12th 2026 at 12:30 PM"
        );
        assert_eq!(
            display_time(&at(23, 10, 0)),
            "Friday, October 23rd 2026 at 10:00 AM"
        );
    }

    #[test]
    fn new_slot_spans_the_duration_in_business_offset() {
        let slot = Slot::new("a", at(19, 9, 0), Duration::minutes(30), SlotSource::Synthetic);
        assert_eq!(slot.end_time - slot.start_time, Duration::minutes(30));
        assert_eq!(slot.start_time.to_rfc3339(), "2026-10-19T09:00:00-04:00");
        assert!(slot.available);
    }

    #[test]
    fn serializes_with_kebab_source_and_skips_missing_confidence() {
        let slot = Slot::new("a", at(19, 9, 0), Duration::minutes(30), SlotSource::CalendarApi);
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["source"], "calendar-api");
        assert_eq!(json["startTime"], "2026-10-19T09:00:00-04:00");
        assert!(json.get("dateConfidence").is_none());

        let scraped = Slot::new("b", at(19, 9, 0), Duration::minutes(30), SlotSource::Scraped)
            .with_date_confidence(DateConfidence::Inferred);
        let json = serde_json::to_value(&scraped).unwrap();
        assert_eq!(json["dateConfidence"], "inferred");
    }

    #[test]
    fn normalize_sorts_dedupes_and_caps() {
        let d = Duration::minutes(30);
        let slots = vec![
            Slot::new("c", at(20, 10, 0), d, SlotSource::Scraped),
            Slot::new("a", at(19, 9, 0), d, SlotSource::Scraped),
            Slot::new("a-dup", at(19, 9, 0), d, SlotSource::Scraped),
            Slot::new("b", at(19, 9, 30), d, SlotSource::Scraped),
        ];

        let normalized = normalize_slots(slots.clone(), MAX_SLOTS);
        let ids: Vec<_> = normalized.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        assert_eq!(normalize_slots(slots, 2).len(), 2);
    }
}
