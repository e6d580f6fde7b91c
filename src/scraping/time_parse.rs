use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scraping::constants::{EARLIEST_PLAUSIBLE_HOUR, LATEST_PLAUSIBLE_HOUR};

/// Finds time-looking substrings in free text: `6:15 PM`, `7pm`, `18:30`.
pub static TIME_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::[0-5]\d)?\s*[ap]\.?m\b\.?|\b\d{1,2}:[0-5]\d\b")
        .expect("valid time candidate pattern")
});

static HOUR_MINUTE_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*([ap])\.?\s*m\.?").expect("valid h:mm am/pm pattern")
});

static HOUR_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})\s*([ap])\.?\s*m\.?").expect("valid h am/pm pattern")
});

static HOUR_MINUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})").expect("valid h:mm pattern"));

pub fn find_times(text: &str) -> impl Iterator<Item = &str> {
    TIME_CANDIDATE.find_iter(text).map(|m| m.as_str().trim())
}

fn to_24h(hour: u32, period: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = period.eq_ignore_ascii_case("p");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}

/// Parses a scraped time string into a time of day.
///
/// Tries `H:MM AM/PM`, then `H AM/PM`, then bare `H:MM`. A bare hour of 1–6 is
/// read as afternoon, and every result is pulled into the plausible opening
/// range so that a misread never lands a slot in the middle of the night.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = if let Some(caps) = HOUR_MINUTE_PERIOD.captures(text) {
        let hour = to_24h(caps[1].parse().ok()?, &caps[3])?;
        (hour, caps[2].parse().ok()?)
    } else if let Some(caps) = HOUR_PERIOD.captures(text) {
        (to_24h(caps[1].parse().ok()?, &caps[2])?, 0)
    } else if let Some(caps) = HOUR_MINUTE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let hour = match hour {
            1..=6 => hour + 12,
            h => h,
        };
        (hour, caps[2].parse().ok()?)
    } else {
        return None;
    };

    if hour > 23 || minute > 59 {
        return None;
    }
    let hour = hour.clamp(EARLIEST_PLAUSIBLE_HOUR, LATEST_PLAUSIBLE_HOUR);
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn parses_each_format() {
        assert_eq!(parse_time_of_day("6:15 PM"), hm(18, 15));
        assert_eq!(parse_time_of_day("9:45am"), hm(9, 45));
        assert_eq!(parse_time_of_day("12:30 p.m."), hm(12, 30));
        assert_eq!(parse_time_of_day("7 PM"), hm(19, 0));
        assert_eq!(parse_time_of_day("10:30"), hm(10, 30));
        assert_eq!(parse_time_of_day("3:00"), hm(15, 0));
    }

    #[test]
    fn clamps_implausible_hours() {
        assert_eq!(parse_time_of_day("12:15 AM"), hm(7, 15));
        assert_eq!(parse_time_of_day("11:30 PM"), hm(21, 30));
        assert_eq!(parse_time_of_day("0:45"), hm(7, 45));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_time_of_day("13 PM"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("book now"), None);
    }

    #[test]
    fn finds_times_in_running_text() {
        let text = "Available: 6:15 PM, 7pm and 18:30. Call 555-1234 anytime.";
        let found: Vec<_> = find_times(text).collect();
        assert_eq!(found, vec!["6:15 PM", "7pm", "18:30"]);
    }
}
