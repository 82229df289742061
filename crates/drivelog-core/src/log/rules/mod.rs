//! Rule-based field extractors for driver logs.

pub mod dates;
pub mod library;
pub mod locations;
pub mod matching;
pub mod names;
pub mod normalize;
pub mod notes;
pub mod patterns;
pub mod quantities;
pub mod times;
pub mod vehicles;

pub use dates::DateExtractor;
pub use library::{DateLayout, DatePattern, PatternLibrary, PatternSpec};
pub use locations::{LocationExtractor, LocationPair};
pub use matching::{
    best_match, partial_ratio, ratio, resolve, Casing, Correction, CorrectionTable, Resolution,
    Scorer,
};
pub use names::NameExtractor;
pub use normalize::normalize;
pub use notes::extract_notes;
pub use quantities::{DistanceExtractor, FuelExtractor};
pub use times::{TimeExtractor, TimePair};
pub use vehicles::VehicleExtractor;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Highest-confidence match; the earliest candidate wins ties.
pub(crate) fn most_confident<T>(candidates: Vec<ExtractionMatch<T>>) -> Option<ExtractionMatch<T>> {
    let mut best: Option<ExtractionMatch<T>> = None;
    for candidate in candidates {
        match &best {
            Some(top) if candidate.confidence <= top.confidence => {}
            _ => best = Some(candidate),
        }
    }
    best
}
