use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::models::business_hours::{at_local, is_weekend};
use crate::models::slot::{Slot, SlotSource};

pub const DEFAULT_SYNTHETIC_COUNT: usize = 20;
const WINDOW_DAYS: i64 = 10;
const SLOT_MINUTES: i64 = 30;

// evening slots the shop keeps open on weekdays
const KNOWN_TIMES: [(u32, u32); 8] = [
    (18, 15),
    (18, 45),
    (19, 15),
    (19, 45),
    (20, 15),
    (20, 45),
    (21, 15),
    (21, 45),
];

/// Last-resort schedule built from the shop's known weekday evening times.
///
/// Pure: the same `now` always yields the same slots.
pub fn generate_synthetic_slots(now: DateTime<Tz>, count: usize) -> Vec<Slot> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..WINDOW_DAYS)
        .map(|offset| today + Duration::days(offset))
        .filter(|date| !is_weekend(*date))
        .flat_map(|date| {
            KNOWN_TIMES
                .iter()
                .filter_map(move |&(hour, minute)| at_local(tz, date, hour, minute))
        })
        .filter(|start| *start > now)
        .take(count)
        .map(|start| {
            let id = format!("known-{}", start.format("%Y-%m-%d-%H-%M"));
            Slot::new(id, start, Duration::minutes(SLOT_MINUTES), SlotSource::Synthetic)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(2026, month, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn same_now_same_schedule() {
        let now = at(10, 19, 8, 0);
        assert_eq!(
            generate_synthetic_slots(now, DEFAULT_SYNTHETIC_COUNT),
            generate_synthetic_slots(now, DEFAULT_SYNTHETIC_COUNT)
        );
    }

    #[test]
    fn saturday_never_offers_weekend_slots() {
        let saturday = at(10, 17, 10, 0);
        let slots = generate_synthetic_slots(saturday, DEFAULT_SYNTHETIC_COUNT);

        assert_eq!(slots.len(), DEFAULT_SYNTHETIC_COUNT);
        assert!(slots.iter().all(|s| {
            let day = s.start_time.weekday();
            day != Weekday::Sat && day != Weekday::Sun
        }));
        assert_eq!(slots[0].id, "known-2026-10-19-18-15");
    }

    #[test]
    fn drops_times_already_past_and_keeps_order() {
        let now = at(10, 19, 19, 0);
        let slots = generate_synthetic_slots(now, 4);
        let ids: Vec<_> = slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "known-2026-10-19-19-15",
                "known-2026-10-19-19-45",
                "known-2026-10-19-20-15",
                "known-2026-10-19-20-45",
            ]
        );
        assert!(slots.iter().all(|s| s.source == SlotSource::Synthetic));
        assert!(slots.iter().all(|s| s.end_time - s.start_time == Duration::minutes(30)));
    }

    #[test]
    fn window_is_bounded_to_ten_days() {
        // two weeks of weekdays would be far more than 8 times x 8 days
        let slots = generate_synthetic_slots(at(10, 19, 8, 0), 500);
        assert_eq!(slots.len(), 8 * 8);
        let last = slots.last().unwrap();
        assert_eq!(last.id, "known-2026-10-28-21-45");
    }
}
