use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Weekday};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl DayHours {
    pub const fn new(open_hour: u32, close_hour: u32) -> Self {
        Self {
            open_hour,
            close_hour,
        }
    }
}

/// Weekly opening hours plus closed dates. Built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessHoursTemplate {
    // indexed by Weekday::num_days_from_monday
    hours: [Option<DayHours>; 7],
    holidays: HashSet<NaiveDate>,
}

impl Default for BusinessHoursTemplate {
    fn default() -> Self {
        let weekday = Some(DayHours::new(9, 19));
        Self {
            hours: [
                weekday,
                weekday,
                weekday,
                weekday,
                weekday,
                Some(DayHours::new(8, 18)),
                Some(DayHours::new(10, 16)),
            ],
            holidays: HashSet::new(),
        }
    }
}

impl BusinessHoursTemplate {
    pub fn with_hours(mut self, weekday: Weekday, hours: Option<DayHours>) -> Self {
        self.hours[weekday.num_days_from_monday() as usize] = hours;
        self
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    pub fn hours_for(&self, weekday: Weekday) -> Option<DayHours> {
        self.hours[weekday.num_days_from_monday() as usize]
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Opening hours for a date, or `None` when closed or a holiday.
    pub fn open_on(&self, date: NaiveDate) -> Option<DayHours> {
        if self.is_holiday(date) {
            return None;
        }
        self.hours_for(date.weekday())
    }
}

/// Resolves a wall-clock time in `tz`. On a DST fold the earlier instant wins;
/// times inside a DST gap yield `None`.
pub fn at_local(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Up to `count` Monday–Friday dates, starting at `from` and looking no further
/// than `horizon_days` ahead.
pub fn upcoming_weekdays(from: NaiveDate, count: usize, horizon_days: i64) -> Vec<NaiveDate> {
    (0..horizon_days)
        .map(|offset| from + Duration::days(offset))
        .filter(|date| !is_weekend(*date))
        .take(count)
        .collect()
}
