//! Ranked extractors that pull appointment times out of a rendered booking page.
//!
//! Each strategy looks at the DOM a different way and reports the times it found
//! together with whatever date it could tie them to. The scraper runs every
//! strategy and keeps the highest-confidence non-empty result, so selector churn
//! on the booking page only ever breaks one strategy at a time.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector, node::Node};

use crate::scraping::constants::{DATE_ATTRIBUTE, SELECTED_DAY_SELECTOR, TIME_ATTRIBUTES};
use crate::scraping::time_parse::find_times;

static SELECTED_DAY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(SELECTED_DAY_SELECTOR).expect("valid selected-day selector"));

static TIME_ATTRIBUTE_ELEMENTS: Lazy<Selector> = Lazy::new(|| {
    let selector = TIME_ATTRIBUTES
        .iter()
        .map(|attr| format!("[{attr}]"))
        .collect::<Vec<_>>()
        .join(", ");
    Selector::parse(&selector).expect("valid time attribute selector")
});

const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Date information attached to a scraped time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateHint {
    Date(NaiveDate),
    DayOfMonth(u32),
}

impl DateHint {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(prefix) = raw.get(..10) {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(DateHint::Date(date));
            }
        }
        if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
            return NaiveDate::parse_from_str(raw, "%Y%m%d").ok().map(DateHint::Date);
        }
        match raw.parse::<u32>() {
            Ok(day @ 1..=31) => Some(DateHint::DayOfMonth(day)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCandidate {
    pub time: String,
    pub date: Option<DateHint>,
}

impl TimeCandidate {
    fn new(time: &str, date: Option<DateHint>) -> Self {
        Self {
            time: time.to_string(),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    pub strategy: &'static str,
    pub confidence: f32,
    pub candidates: Vec<TimeCandidate>,
}

impl CandidateSet {
    pub fn dated_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.date.is_some()).count()
    }
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// How much the candidates from this strategy can be trusted, in `0.0..=1.0`.
    fn confidence(&self) -> f32;

    fn extract(&self, page: &Html) -> Vec<TimeCandidate>;
}

/// Times inside an element that (or whose ancestor) carries `data-date`.
pub struct DateAttributeAncestry;

/// Times in `aria-label`, `data-time` and `datetime` attributes.
pub struct TimeAttributes;

/// Visible times, dated by whichever calendar day is currently selected.
pub struct SelectedDayContext;

/// Every visible time on the page, without any date.
pub struct VisibleText;

impl ExtractionStrategy for DateAttributeAncestry {
    fn name(&self) -> &'static str {
        "data-date-ancestry"
    }

    fn confidence(&self) -> f32 {
        0.9
    }

    fn extract(&self, page: &Html) -> Vec<TimeCandidate> {
        visible_text_nodes(page)
            .flat_map(|(text, parent)| {
                let date = parent.and_then(date_from_ancestry);
                find_times(text)
                    .filter_map(move |time| date.map(|d| TimeCandidate::new(time, Some(d))))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl ExtractionStrategy for TimeAttributes {
    fn name(&self) -> &'static str {
        "time-attributes"
    }

    fn confidence(&self) -> f32 {
        0.7
    }

    fn extract(&self, page: &Html) -> Vec<TimeCandidate> {
        let mut candidates = Vec::new();
        for element in page.select(&TIME_ATTRIBUTE_ELEMENTS) {
            let ancestry_date = date_from_ancestry(element);
            for attr in TIME_ATTRIBUTES {
                let Some(value) = element.value().attr(attr) else {
                    continue;
                };
                if *attr == "datetime" {
                    if let Some(candidate) = candidate_from_datetime(value) {
                        candidates.push(candidate);
                        continue;
                    }
                }
                let date = DateHint::parse(value).or(ancestry_date);
                candidates.extend(find_times(value).map(|time| TimeCandidate::new(time, date)));
            }
        }
        candidates
    }
}

impl ExtractionStrategy for SelectedDayContext {
    fn name(&self) -> &'static str {
        "selected-day-context"
    }

    fn confidence(&self) -> f32 {
        0.5
    }

    fn extract(&self, page: &Html) -> Vec<TimeCandidate> {
        let selected_day = page
            .select(&SELECTED_DAY)
            .map(|el| el.text().collect::<String>())
            .find_map(|text| {
                let text = text.trim();
                (text.len() <= 2)
                    .then(|| DateHint::parse(text))
                    .flatten()
            });

        let Some(day) = selected_day else {
            return Vec::new();
        };

        visible_text_nodes(page)
            .flat_map(|(text, _)| find_times(text).map(move |t| TimeCandidate::new(t, Some(day))))
            .collect()
    }
}

impl ExtractionStrategy for VisibleText {
    fn name(&self) -> &'static str {
        "visible-text"
    }

    fn confidence(&self) -> f32 {
        0.2
    }

    fn extract(&self, page: &Html) -> Vec<TimeCandidate> {
        visible_text_nodes(page)
            .flat_map(|(text, _)| find_times(text).map(|t| TimeCandidate::new(t, None)))
            .collect()
    }
}

/// Strategies in descending order of trust.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(DateAttributeAncestry),
        Box::new(TimeAttributes),
        Box::new(SelectedDayContext),
        Box::new(VisibleText),
    ]
}

/// Runs every strategy and returns the highest-confidence non-empty set.
pub fn extract_best(html: &str, strategies: &[Box<dyn ExtractionStrategy>]) -> Option<CandidateSet> {
    let page = Html::parse_document(html);

    let mut sets: Vec<CandidateSet> = strategies
        .iter()
        .map(|strategy| CandidateSet {
            strategy: strategy.name(),
            confidence: strategy.confidence(),
            candidates: strategy.extract(&page),
        })
        .filter(|set| !set.candidates.is_empty())
        .collect();

    sets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sets.into_iter().next()
}

fn visible_text_nodes(page: &Html) -> impl Iterator<Item = (&str, Option<ElementRef<'_>>)> {
    page.tree.nodes().filter_map(|node| {
        let Node::Text(text) = node.value() else {
            return None;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| INVISIBLE_ELEMENTS.contains(&el.value().name()));
        if hidden {
            return None;
        }
        let parent = node.parent().and_then(ElementRef::wrap);
        Some((&**text, parent))
    })
}

fn date_from_ancestry(element: ElementRef<'_>) -> Option<DateHint> {
    std::iter::once(element)
        .chain((*element).ancestors().filter_map(ElementRef::wrap))
        .find_map(|el| el.value().attr(DATE_ATTRIBUTE).and_then(DateHint::parse))
}

fn candidate_from_datetime(value: &str) -> Option<TimeCandidate> {
    let value = value.trim();
    let parsed = chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()?;
    Some(TimeCandidate::new(
        &parsed.format("%H:%M").to_string(),
        Some(DateHint::Date(parsed.date())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> Option<DateHint> {
        NaiveDate::from_ymd_opt(2026, 10, d).map(DateHint::Date)
    }

    const DATED_PAGE: &str = r#"
        <html><head><script>var t = "9:00 AM";</script></head><body>
          <div data-date="2026-10-19">
            <ul><li><span>6:15 PM</span></li><li><span>6:45 PM</span></li></ul>
          </div>
          <div data-date="2026-10-20"><button>7:15 PM</button></div>
          <footer>Open until 9:45 PM</footer>
        </body></html>
    "#;

    #[test]
    fn date_ancestry_keeps_only_dated_times() {
        let page = Html::parse_document(DATED_PAGE);
        let found = DateAttributeAncestry.extract(&page);
        assert_eq!(
            found,
            vec![
                TimeCandidate::new("6:15 PM", date(19)),
                TimeCandidate::new("6:45 PM", date(19)),
                TimeCandidate::new("7:15 PM", date(20)),
            ]
        );
    }

    #[test]
    fn visible_text_ignores_scripts() {
        let page = Html::parse_document(DATED_PAGE);
        let times: Vec<_> = VisibleText
            .extract(&page)
            .into_iter()
            .map(|c| c.time)
            .collect();
        assert_eq!(times, vec!["6:15 PM", "6:45 PM", "7:15 PM", "9:45 PM"]);
    }

    #[test]
    fn time_attributes_read_labels_and_datetimes() {
        let page = Html::parse_document(
            r#"<body>
                <div data-date="19"><button aria-label="Book 6:15 PM">Book</button></div>
                <time datetime="2026-10-21T18:45">soon</time>
            </body>"#,
        );
        let found = TimeAttributes.extract(&page);
        assert_eq!(
            found,
            vec![
                TimeCandidate::new("6:15 PM", Some(DateHint::DayOfMonth(19))),
                TimeCandidate::new("18:45", date(21)),
            ]
        );
    }

    #[test]
    fn selected_day_dates_every_visible_time() {
        let page = Html::parse_document(
            r#"<body>
                <table><td>18</td><td aria-selected="true">19</td></table>
                <div>6:15 PM</div><div>6:45 PM</div>
            </body>"#,
        );
        let found = SelectedDayContext.extract(&page);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.date == Some(DateHint::DayOfMonth(19))));
    }

    #[test]
    fn extract_best_prefers_highest_confidence() {
        let best = extract_best(DATED_PAGE, &default_strategies()).unwrap();
        assert_eq!(best.strategy, "data-date-ancestry");
        assert_eq!(best.dated_count(), 3);

        let undated = extract_best("<p>Slots: 6:15 PM or 7 PM</p>", &default_strategies()).unwrap();
        assert_eq!(undated.strategy, "visible-text");
        assert_eq!(undated.dated_count(), 0);

        assert!(extract_best("<p>Fully booked</p>", &default_strategies()).is_none());
    }

    #[test]
    fn date_hints_accept_common_shapes() {
        assert_eq!(DateHint::parse("2026-10-19"), date(19));
        assert_eq!(DateHint::parse("20261019"), date(19));
        assert_eq!(DateHint::parse("7"), Some(DateHint::DayOfMonth(7)));
        assert_eq!(DateHint::parse("45"), None);
        assert_eq!(DateHint::parse("tomorrow"), None);
    }
}
