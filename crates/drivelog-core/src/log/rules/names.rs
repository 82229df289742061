//! Driver and labor name extraction.

use super::matching::resolve;
use super::patterns::{
    cut_at_label, CAPITALIZED_WORD, DRIVER_ANCHOR, FIELD_LABEL, LABOR_ANCHOR, NAME_ANCHOR,
    OPERATOR_ANCHOR,
};
use super::{most_confident, ExtractionMatch, FieldExtractor};
use crate::models::config::MatchPolicy;
use crate::models::reference::ReferenceData;

/// Which name a [`NameExtractor`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameRole {
    Driver,
    Labor,
}

/// Person name extractor resolving against the known names.
pub struct NameExtractor<'a> {
    reference: &'a ReferenceData,
    policy: MatchPolicy,
    role: NameRole,
}

impl<'a> NameExtractor<'a> {
    /// Driver names: anchors, correction hits and capitalized word pairs.
    pub fn driver(reference: &'a ReferenceData, policy: MatchPolicy) -> Self {
        Self {
            reference,
            policy,
            role: NameRole::Driver,
        }
    }

    /// Labor names: `Labor Name:` anchors only.
    pub fn labor(reference: &'a ReferenceData, policy: MatchPolicy) -> Self {
        Self {
            reference,
            policy,
            role: NameRole::Labor,
        }
    }

    /// Raw candidates in precedence order.
    fn candidates<'t>(&self, text: &'t str) -> Vec<(&'t str, usize, usize)> {
        let mut candidates = Vec::new();

        if self.role == NameRole::Labor {
            for caps in LABOR_ANCHOR.captures_iter(text) {
                if let Some(group) = caps.get(1) {
                    push_cut(&mut candidates, group);
                }
            }
            return candidates;
        }

        for anchor in [&*DRIVER_ANCHOR, &*NAME_ANCHOR, &*OPERATOR_ANCHOR] {
            for caps in anchor.captures_iter(text) {
                let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if follows_labor_label(text, whole.start()) {
                    continue;
                }
                push_cut(&mut candidates, group);
            }
        }

        for (start, end, _) in self.reference.name_corrections().occurrences(text) {
            candidates.push((&text[start..end], start, end));
        }

        // Adjacent capitalized words on one line, neither of them a label
        let words: Vec<_> = CAPITALIZED_WORD
            .find_iter(text)
            .filter(|w| w.as_str().len() > 2 && !FIELD_LABEL.is_match(w.as_str()))
            .collect();
        for pair in words.windows(2) {
            let gap = &text[pair[0].end()..pair[1].start()];
            if !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t') {
                candidates.push((&text[pair[0].start()..pair[1].end()], pair[0].start(), pair[1].end()));
            }
        }

        candidates
    }
}

fn push_cut<'t>(candidates: &mut Vec<(&'t str, usize, usize)>, group: regex::Match<'t>) {
    let value = cut_at_label(group.as_str());
    if !value.is_empty() {
        let start = group.start() + group.as_str().find(value).unwrap_or(0);
        candidates.push((value, start, start + value.len()));
    }
}

/// `Labor Name:` also matches the bare `Name:` anchor.
fn follows_labor_label(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end().to_ascii_lowercase();
    before.ends_with("labor") || before.ends_with("labour")
}

impl FieldExtractor for NameExtractor<'_> {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        most_confident(self.extract_all(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text)
            .into_iter()
            .filter_map(|(raw, start, end)| {
                let resolution = resolve(
                    raw,
                    self.reference.name_corrections(),
                    self.reference.names(),
                    &self.policy,
                )?;
                let confidence = resolution.confidence();
                let value = resolution.into_value()?;
                Some(ExtractionMatch::new(value, confidence, raw).with_position(start, end))
            })
            .collect()
    }
}
