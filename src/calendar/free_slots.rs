use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::business_hours::{BusinessHoursTemplate, at_local};
use crate::models::slot::{Slot, SlotSource};

pub const SLOT_INTERVAL_MINUTES: u32 = 30;

/// Time already taken on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Walks each open day in `first_day..=last_day` and offers every half hour
/// from opening for which the whole service fits before closing, skipping
/// anything that overlaps a busy interval or doesn't start after `now`.
pub fn free_slots(
    hours: &BusinessHoursTemplate,
    first_day: NaiveDate,
    last_day: NaiveDate,
    busy: &[BusyInterval],
    duration: Duration,
    now: DateTime<Tz>,
    cap: usize,
) -> Vec<Slot> {
    let tz = now.timezone();
    let mut slots = Vec::new();

    for day in first_day.iter_days().take_while(|d| *d <= last_day) {
        let Some(open) = hours.open_on(day) else {
            continue;
        };
        let Some(close) = at_local(tz, day, open.close_hour, 0) else {
            continue;
        };

        let mut minutes = open.open_hour * 60;
        loop {
            let (hour, minute) = (minutes / 60, minutes % 60);
            minutes += SLOT_INTERVAL_MINUTES;
            if hour >= 24 {
                break;
            }
            // wall-clock times skipped by a DST jump have no slot
            let Some(start) = at_local(tz, day, hour, minute) else {
                continue;
            };
            let end = start + duration;
            if end > close {
                break;
            }

            let (start_utc, end_utc) = (start.with_timezone(&Utc), end.with_timezone(&Utc));
            if busy.iter().any(|b| b.overlaps(start_utc, end_utc)) || start <= now {
                continue;
            }

            let id = format!("{}-{:02}-{:02}", day.format("%Y-%m-%d"), start.hour(), start.minute());
            slots.push(Slot::new(id, start, duration, SlotSource::CalendarApi));
            if slots.len() >= cap {
                return slots;
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::MAX_SLOTS;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(2026, 10, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn open_monday_fills_every_half_hour_until_closing() {
        // Monday Oct 19, before opening
        let now = local(19, 8, 0);
        let slots = free_slots(
            &BusinessHoursTemplate::default(),
            date(19),
            date(19) + Duration::days(30),
            &[],
            Duration::minutes(30),
            now,
            MAX_SLOTS,
        );

        assert_eq!(slots.len(), 50);
        let monday: Vec<_> = slots
            .iter()
            .filter(|s| s.id.starts_with("2026-10-19"))
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(monday.len(), 20);
        assert_eq!(monday.first(), Some(&"2026-10-19-09-00"));
        assert_eq!(monday.last(), Some(&"2026-10-19-18-30"));
        assert_eq!(slots[20].id, "2026-10-20-09-00");
        assert!(slots.windows(2).all(|w| w[0].start_time < w[1].start_time));
    }

    #[test]
    fn busy_intervals_block_overlapping_slots_only() {
        let meeting = BusyInterval::new(
            local(19, 10, 15).with_timezone(&Utc),
            local(19, 11, 0).with_timezone(&Utc),
        );
        let slots = free_slots(
            &BusinessHoursTemplate::default(),
            date(19),
            date(19),
            &[meeting],
            Duration::minutes(30),
            local(19, 8, 0),
            MAX_SLOTS,
        );
        let ids: Vec<_> = slots.iter().take(4).map(|s| s.id.as_str()).collect();
        // 10:00 and 10:30 touch the meeting; 11:00 starts as it ends
        assert_eq!(
            ids,
            vec!["2026-10-19-09-00", "2026-10-19-09-30", "2026-10-19-11-00", "2026-10-19-11-30"]
        );
    }

    #[test]
    fn slot_at_now_is_not_offered() {
        let slots = free_slots(
            &BusinessHoursTemplate::default(),
            date(19),
            date(19),
            &[],
            Duration::minutes(30),
            local(19, 9, 0),
            MAX_SLOTS,
        );
        assert_eq!(slots[0].id, "2026-10-19-09-30");
    }

    #[test]
    fn holidays_and_closed_days_are_skipped() {
        let hours = BusinessHoursTemplate::default()
            .with_holidays([date(19)])
            .with_hours(chrono::Weekday::Tue, None);
        let slots = free_slots(
            &hours,
            date(19),
            date(21),
            &[],
            Duration::minutes(30),
            local(19, 8, 0),
            MAX_SLOTS,
        );
        assert_eq!(slots.len(), 20);
        assert!(slots.iter().all(|s| s.id.starts_with("2026-10-21")));
    }
}
