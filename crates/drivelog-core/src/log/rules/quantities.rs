//! Distance and fuel extraction.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use super::library::PatternLibrary;
use super::{ExtractionMatch, FieldExtractor};

/// Accepted range and confidence cutoff of a quantity.
struct QuantityBounds {
    max: Decimal,
    /// Values above this are plausible but less likely to be read right.
    typical_max: Decimal,
}

fn extract_quantities(
    patterns: &[Regex],
    bounds: &QuantityBounds,
    text: &str,
) -> Vec<ExtractionMatch<Decimal>> {
    let mut results: Vec<ExtractionMatch<Decimal>> = Vec::new();

    for regex in patterns {
        for caps in regex.captures_iter(text) {
            let Some(group) = caps.get(1) else {
                continue;
            };
            let Some(value) = parse_quantity(group.as_str()) else {
                continue;
            };
            // Out of range values are discarded, not clamped
            if value < Decimal::ZERO || value > bounds.max {
                continue;
            }
            if results.iter().any(|r| r.position == Some((group.start(), group.end()))) {
                continue;
            }

            let confidence = if value <= bounds.typical_max { 0.8 } else { 0.6 };
            let whole = caps.get(0).map_or(group.as_str(), |m| m.as_str());
            results.push(
                ExtractionMatch::new(value, confidence, whole).with_position(group.start(), group.end()),
            );
        }
    }

    results
}

/// Parse `245.5` or `245.` into a decimal.
pub fn parse_quantity(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Distance driven, in `0..=1000`.
pub struct DistanceExtractor<'a> {
    library: &'a PatternLibrary,
}

impl<'a> DistanceExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }
}

impl FieldExtractor for DistanceExtractor<'_> {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let bounds = QuantityBounds {
            max: Decimal::from(1000),
            typical_max: Decimal::from(500),
        };
        extract_quantities(&self.library.distances, &bounds, text)
    }
}

/// Fuel used, in `0..=100`.
pub struct FuelExtractor<'a> {
    library: &'a PatternLibrary,
}

impl<'a> FuelExtractor<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }
}

impl FieldExtractor for FuelExtractor<'_> {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let bounds = QuantityBounds {
            max: Decimal::from(100),
            typical_max: Decimal::from(50),
        };
        extract_quantities(&self.library.fuel, &bounds, text)
    }
}
