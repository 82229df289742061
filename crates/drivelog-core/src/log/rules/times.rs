//! Time token extraction.

use chrono::NaiveTime;
use regex::Captures;

use super::library::PatternLibrary;
use super::{ExtractionMatch, FieldExtractor};

/// Start/end times of a shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePair {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    pub confidence: f32,
}

/// Time extractor scanning every time pattern of the library.
pub struct TimeExtractor<'a> {
    library: &'a PatternLibrary,
}

impl<'a> TimeExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    /// First token is the start, second the end.
    pub fn extract_pair(&self, text: &str) -> Option<TimePair> {
        let mut tokens = self.extract_all(text).into_iter();
        let start = tokens.next()?;
        match tokens.next() {
            Some(end) => Some(TimePair {
                start: start.value,
                end: Some(end.value),
                confidence: 0.8,
            }),
            None => Some(TimePair {
                start: start.value,
                end: None,
                confidence: 0.6,
            }),
        }
    }
}

impl FieldExtractor for TimeExtractor<'_> {
    type Output = ExtractionMatch<NaiveTime>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Every valid time token in text order.
    ///
    /// Patterns are tried in library order; a match overlapping an earlier
    /// one is skipped, so `8:00 AM` is not read again as `00 AM`.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for regex in &self.library.times {
            for caps in regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                let (start, end) = (whole.start(), whole.end());

                let overlaps = results.iter().any(|r| {
                    r.position
                        .is_some_and(|(s, e)| start < e && s < end)
                });
                if overlaps || embedded_in_date(text, start, end) {
                    continue;
                }

                if let Some(time) = parse_time(&caps) {
                    results.push(
                        ExtractionMatch::new(time, 0.8, whole.as_str().trim())
                            .with_position(start, end),
                    );
                }
            }
        }

        results.sort_by_key(|r| r.position.map(|(s, _)| s));
        results
    }
}

/// Build a time from `hour`, `minute` and `meridiem` groups.
fn parse_time(caps: &Captures) -> Option<NaiveTime> {
    let mut hour: u32 = caps.name("hour")?.as_str().parse().ok()?;
    let minute: u32 = match caps.name("minute") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    if let Some(meridiem) = caps.name("meridiem") {
        let pm = meridiem.as_str().to_ascii_lowercase().starts_with('p');
        if pm && (1..=11).contains(&hour) {
            hour += 12;
        } else if !pm && hour == 12 {
            hour = 0;
        }
    }

    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Whether the token is glued to a date (`15.03.2024`, `2024-03-15`).
fn embedded_in_date(text: &str, start: usize, end: usize) -> bool {
    let separator = |c: char| matches!(c, '.' | '/' | '-');

    let mut before = text[..start].chars().rev();
    let glued_before = matches!(
        (before.next(), before.next()),
        (Some(sep), Some(digit)) if separator(sep) && digit.is_ascii_digit()
    );

    let mut after = text[end..].chars();
    let glued_after = matches!(
        (after.next(), after.next()),
        (Some(sep), Some(digit)) if separator(sep) && digit.is_ascii_digit()
    );

    glued_before || glued_after
}
