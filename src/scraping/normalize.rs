use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::models::business_hours::{at_local, upcoming_weekdays};
use crate::models::slot::{DateConfidence, MAX_SLOTS, Slot, SlotSource, normalize_slots};
use crate::scraping::constants::{INFERRED_BUSINESS_DAYS, INFERRED_HORIZON_DAYS};
use crate::scraping::strategies::{CandidateSet, DateHint};
use crate::scraping::time_parse::parse_time_of_day;

/// Resolves a date hint relative to `today`. A bare day of month means this
/// month, or next month once that day has passed.
pub fn resolve_date(hint: DateHint, today: NaiveDate) -> Option<NaiveDate> {
    match hint {
        DateHint::Date(date) => Some(date),
        DateHint::DayOfMonth(day) => {
            let this_month = today.with_day(day);
            match this_month {
                Some(date) if date >= today => Some(date),
                _ => today
                    .with_day(1)?
                    .checked_add_months(Months::new(1))?
                    .with_day(day),
            }
        }
    }
}

fn scraped_slot(tz: Tz, date: NaiveDate, time: NaiveTime, duration: Duration) -> Option<Slot> {
    let start = at_local(tz, date, time.hour(), time.minute())?;
    let id = format!(
        "slot-{}-{}-{}",
        date.format("%Y-%m-%d"),
        time.hour(),
        time.minute()
    );
    Some(Slot::new(id, start, duration, SlotSource::Scraped))
}

/// Turns the winning candidate set into bookable slots.
///
/// When at least half of the candidates carry a date, each time is placed on
/// its own date (undated stragglers go on today). Otherwise the page's date
/// context is treated as unusable: every distinct time of day is offered on
/// each of the next business days and marked as inferred.
pub fn build_slots(set: &CandidateSet, now: DateTime<Tz>, duration: Duration) -> Vec<Slot> {
    let tz = now.timezone();
    let today = now.date_naive();
    let dated = set.dated_count();
    let dates_reliable = dated > 0 && dated * 2 >= set.candidates.len();

    let mut slots = Vec::new();

    if dates_reliable {
        for candidate in &set.candidates {
            let Some(time) = parse_time_of_day(&candidate.time) else {
                debug!(time = %candidate.time, "Skipping unparsable scraped time");
                continue;
            };
            let (date, confidence) = match candidate.date.and_then(|h| resolve_date(h, today)) {
                Some(date) => (date, DateConfidence::Verified),
                None => (today, DateConfidence::Inferred),
            };
            if let Some(slot) = scraped_slot(tz, date, time, duration) {
                slots.push(slot.with_date_confidence(confidence));
            }
        }
    } else {
        let mut times: Vec<NaiveTime> = set
            .candidates
            .iter()
            .filter_map(|c| parse_time_of_day(&c.time))
            .collect();
        times.sort();
        times.dedup();

        let days = upcoming_weekdays(today, INFERRED_BUSINESS_DAYS, INFERRED_HORIZON_DAYS);
        warn!(
            strategy = set.strategy,
            times = times.len(),
            days = days.len(),
            "Scraped times have no reliable dates, spreading them over upcoming business days"
        );

        for date in days {
            for time in &times {
                if let Some(slot) = scraped_slot(tz, date, *time, duration) {
                    slots.push(slot.with_date_confidence(DateConfidence::Inferred));
                }
            }
        }
    }

    slots.retain(|slot| slot.start_time > now);
    normalize_slots(slots, MAX_SLOTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::strategies::TimeCandidate;
    use chrono::{TimeZone, Weekday};
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn now() -> DateTime<Tz> {
        // Friday afternoon
        New_York.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).single().unwrap()
    }

    fn candidate(time: &str, date: Option<DateHint>) -> TimeCandidate {
        TimeCandidate {
            time: time.to_string(),
            date,
        }
    }

    #[test]
    fn day_of_month_rolls_into_next_month() {
        let today = date(10, 16);
        assert_eq!(resolve_date(DateHint::DayOfMonth(20), today), Some(date(10, 20)));
        assert_eq!(resolve_date(DateHint::DayOfMonth(16), today), Some(date(10, 16)));
        assert_eq!(resolve_date(DateHint::DayOfMonth(3), today), Some(date(11, 3)));
        // November has no 31st, so the next one is in December
        assert_eq!(resolve_date(DateHint::DayOfMonth(31), date(11, 5)), Some(date(12, 31)));
    }

    #[test]
    fn dated_candidates_keep_their_dates() {
        let set = CandidateSet {
            strategy: "data-date-ancestry",
            confidence: 0.9,
            candidates: vec![
                candidate("6:15 PM", Some(DateHint::Date(date(10, 19)))),
                candidate("6:15 PM", Some(DateHint::Date(date(10, 19)))),
                candidate("9:00 AM", Some(DateHint::Date(date(10, 20)))),
                candidate("5:30 PM", None),
            ],
        };

        let slots = build_slots(&set, now(), Duration::minutes(30));
        let ids: Vec<_> = slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["slot-2026-10-16-17-30", "slot-2026-10-19-18-15", "slot-2026-10-20-9-0"]);
        assert_eq!(slots[0].date_confidence, Some(DateConfidence::Inferred));
        assert_eq!(slots[1].date_confidence, Some(DateConfidence::Verified));
    }

    #[test]
    fn undated_times_spread_over_five_business_days() {
        let set = CandidateSet {
            strategy: "visible-text",
            confidence: 0.2,
            candidates: vec![candidate("6:15 PM", None), candidate("7:45 PM", None)],
        };

        let slots = build_slots(&set, now(), Duration::minutes(30));
        // Friday plus the following Monday to Thursday
        assert_eq!(slots.len(), 10);
        assert!(slots.iter().all(|s| s.date_confidence == Some(DateConfidence::Inferred)));
        assert!(slots.iter().all(|s| {
            let day = s.start_time.weekday();
            day != Weekday::Sat && day != Weekday::Sun
        }));
        assert!(slots.windows(2).all(|w| w[0].start_time < w[1].start_time));
    }

    #[test]
    fn past_times_are_dropped() {
        let set = CandidateSet {
            strategy: "data-date-ancestry",
            confidence: 0.9,
            candidates: vec![
                candidate("9:00 AM", Some(DateHint::Date(date(10, 16)))),
                candidate("4:00 PM", Some(DateHint::Date(date(10, 16)))),
            ],
        };
        let slots = build_slots(&set, now(), Duration::minutes(30));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time.to_rfc3339(), "2026-10-16T16:00:00-04:00");
    }
}
