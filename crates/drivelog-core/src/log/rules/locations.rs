//! Start/end location extraction.

use super::matching::{is_word_boundary, resolve};
use super::patterns::{cut_at_label, END_LOCATION_ANCHOR, LOCATION_ANCHOR, START_LOCATION_ANCHOR};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::MatchPolicy;
use crate::models::reference::ReferenceData;

/// Start and end locations of a shift.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPair {
    pub start: ExtractionMatch<String>,
    pub end: Option<ExtractionMatch<String>>,
    /// Mean confidence of the chosen locations.
    pub confidence: f32,
}

/// Location extractor resolving against the known locations.
pub struct LocationExtractor<'a> {
    reference: &'a ReferenceData,
    policy: MatchPolicy,
}

impl<'a> LocationExtractor<'a> {
    pub fn new(reference: &'a ReferenceData, policy: MatchPolicy) -> Self {
        Self { reference, policy }
    }

    /// First two distinct resolved locations become start and end.
    pub fn extract_pair(&self, text: &str) -> Option<LocationPair> {
        let mut chosen: Vec<ExtractionMatch<String>> = Vec::with_capacity(2);
        for candidate in self.extract_all(text) {
            if chosen.iter().any(|c| c.value == candidate.value) {
                continue;
            }
            chosen.push(candidate);
            if chosen.len() == 2 {
                break;
            }
        }

        let confidence = chosen.iter().map(|c| c.confidence).sum::<f32>() / chosen.len().max(1) as f32;
        let mut chosen = chosen.into_iter();
        let start = chosen.next()?;
        Some(LocationPair {
            start,
            end: chosen.next(),
            confidence,
        })
    }

    /// Every literal occurrence of a known location, ignoring case.
    pub fn known_occurrences<'t>(&self, text: &'t str) -> Vec<(&'t str, usize, usize)> {
        let haystack = text.to_ascii_lowercase();
        let mut hits = Vec::new();
        for location in self.reference.locations() {
            let needle = location.trim().to_ascii_lowercase();
            if needle.is_empty() {
                continue;
            }
            for (start, _) in haystack.match_indices(&needle) {
                let end = start + needle.len();
                if is_word_boundary(&haystack, start, end) {
                    hits.push((&text[start..end], start, end));
                }
            }
        }
        hits.sort_by_key(|(_, start, _)| *start);
        hits
    }

    fn candidates<'t>(&self, text: &'t str) -> Vec<(&'t str, usize, usize)> {
        let mut candidates = Vec::new();

        for anchor in [&*START_LOCATION_ANCHOR, &*END_LOCATION_ANCHOR, &*LOCATION_ANCHOR] {
            for caps in anchor.captures_iter(text) {
                let Some(group) = caps.get(1) else {
                    continue;
                };
                let value = cut_at_label(group.as_str());
                if value.len() > 2 {
                    let start = group.start() + group.as_str().find(value).unwrap_or(0);
                    candidates.push((value, start, start + value.len()));
                }
            }
        }

        candidates.extend(self.known_occurrences(text));

        for (start, end, _) in self.reference.location_corrections().occurrences(text) {
            candidates.push((&text[start..end], start, end));
        }

        candidates
    }
}

impl FieldExtractor for LocationExtractor<'_> {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text)
            .into_iter()
            .filter_map(|(raw, start, end)| {
                let resolution = resolve(
                    raw,
                    self.reference.location_corrections(),
                    self.reference.locations(),
                    &self.policy,
                )?;
                let confidence = resolution.confidence();
                let value = resolution.into_value()?;
                Some(ExtractionMatch::new(value, confidence, raw).with_position(start, end))
            })
            .collect()
    }
}
