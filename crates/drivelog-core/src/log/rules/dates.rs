//! Log date extraction.

use chrono::NaiveDate;

use super::library::PatternLibrary;
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
///
/// Confidence reflects distance from `today`: recent dates are more likely
/// to be read correctly than ones far in the past or future.
pub struct DateExtractor<'a> {
    library: &'a PatternLibrary,
    today: NaiveDate,
}

impl<'a> DateExtractor<'a> {
    pub fn new(library: &'a PatternLibrary, today: NaiveDate) -> Self {
        Self { library, today }
    }

    fn confidence(&self, date: NaiveDate) -> f32 {
        match (self.today - date).num_days().abs() {
            0..=30 => 0.9,
            31..=365 => 0.7,
            _ => 0.5,
        }
    }
}

impl FieldExtractor for DateExtractor<'_> {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.library
            .date_matches(text)
            .into_iter()
            .map(|(date, whole)| {
                ExtractionMatch::new(date, self.confidence(date), whole.as_str())
                    .with_position(whole.start(), whole.end())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_confidence_by_age() {
        let library = PatternLibrary::default();
        let extractor = DateExtractor::new(&library, date(2024, 3, 20));

        let recent = extractor.extract("Date: 03/15/2024").unwrap();
        assert_eq!(recent.value, date(2024, 3, 15));
        assert_eq!(recent.confidence, 0.9);
        assert_eq!(recent.position, Some((6, 16)));

        assert_eq!(extractor.extract("2023-09-01").unwrap().confidence, 0.7);
        assert_eq!(extractor.extract("1 January 2020").unwrap().confidence, 0.5);
    }

    #[test]
    fn test_invalid_dates_skipped() {
        let library = PatternLibrary::default();
        let extractor = DateExtractor::new(&library, date(2024, 3, 20));

        assert!(extractor.extract("13/45/2024").is_none());
        assert_eq!(
            extractor.extract("02/30/2024 or 02/28/2024").unwrap().value,
            date(2024, 2, 28)
        );
    }

    #[test]
    fn test_day_first_fallback() {
        let library = PatternLibrary::default();
        let extractor = DateExtractor::new(&library, date(2024, 3, 20));
        assert_eq!(extractor.extract("25/12/2023").unwrap().value, date(2023, 12, 25));
        assert_eq!(extractor.extract("15.03.2024").unwrap().value, date(2024, 3, 15));
    }
}
