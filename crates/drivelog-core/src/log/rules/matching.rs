//! Correction tables and fuzzy matching against reference sets.
//!
//! Every raw candidate (a name, a vehicle id, a location) goes through
//! [`resolve`]: an exact correction lookup first, then similarity scoring
//! against the known values, and finally a cleaned passthrough with a low
//! fixed confidence.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::ConfigError;
use crate::models::config::MatchPolicy;

/// Confidence of a value taken from a correction table.
pub const CORRECTION_CONFIDENCE: f32 = 0.95;

/// Similarity function used to compare a candidate with a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Whole-string similarity.
    Ratio,
    /// Best similarity of the shorter string against any window of the longer.
    PartialRatio,
}

impl Scorer {
    /// Score two strings (0-100).
    pub fn score(self, a: &str, b: &str) -> u8 {
        match self {
            Scorer::Ratio => ratio(a, b),
            Scorer::PartialRatio => partial_ratio(a, b),
        }
    }
}

/// Case normalization applied to candidates that match nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    /// `john SMITH` -> `John Smith`.
    Title,
    /// `trk 001` -> `TRK001`.
    Upper,
    /// Whitespace collapsed, letters untouched.
    Preserve,
}

impl Casing {
    /// Trim, collapse inner whitespace and apply the casing rule.
    pub fn apply(self, raw: &str) -> String {
        let words: Vec<&str> = raw.split_whitespace().collect();
        match self {
            Casing::Title => words
                .iter()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first
                            .to_uppercase()
                            .chain(chars.flat_map(char::to_lowercase))
                            .collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" "),
            Casing::Upper => words.concat().to_uppercase(),
            Casing::Preserve => words.join(" "),
        }
    }
}

/// Lowercase, map non-alphanumerics to spaces and collapse whitespace.
fn comparable(s: &str) -> Vec<char> {
    let mapped: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .chars()
        .collect()
}

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let lcs = lcs_len(a, b);
    ((200 * lcs) as f64 / total as f64).round() as u8
}

/// Whole-string similarity (0-100): `2 * LCS / (|a| + |b|)`.
pub fn ratio(a: &str, b: &str) -> u8 {
    ratio_chars(&comparable(a), &comparable(b))
}

/// Best [`ratio`] of the shorter string against every equal-length window
/// of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = comparable(a);
    let b = comparable(b);
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return 0;
    }

    let mut best = 0;
    for window in long.windows(short.len()) {
        let score = ratio_chars(&short, window);
        if score > best {
            best = score;
            if best == 100 {
                break;
            }
        }
    }
    best
}

/// Index and score of the best-scoring choice; the first one wins ties.
pub fn best_match(query: &str, choices: &[String], scorer: Scorer) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;
    for (index, choice) in choices.iter().enumerate() {
        let score = scorer.score(query, choice);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best
}

/// One `mistake -> correction` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// The OCR misreading as written in the table.
    pub mistake: String,
    /// Canonical value; empty means "delete this text".
    pub correction: String,
    key: String,
}

impl Correction {
    pub fn new(mistake: impl Into<String>, correction: impl Into<String>) -> Self {
        let mistake = mistake.into();
        Self {
            key: mistake.to_ascii_lowercase(),
            mistake,
            correction: correction.into(),
        }
    }

    /// Whether this entry removes the matched text.
    pub fn is_deletion(&self) -> bool {
        self.correction.is_empty()
    }
}

/// Ordered correction table. Entry order is lookup precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionTable {
    entries: Vec<Correction>,
}

impl CorrectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry (builder style).
    pub fn with(mut self, mistake: impl Into<String>, correction: impl Into<String>) -> Self {
        self.push(mistake, correction);
        self
    }

    pub fn push(&mut self, mistake: impl Into<String>, correction: impl Into<String>) {
        self.entries.push(Correction::new(mistake, correction));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.entries.iter()
    }

    /// Reject empty mistake keys; an empty key would match every candidate.
    pub fn validate(&self, table: &'static str) -> Result<(), ConfigError> {
        if self.entries.iter().any(|e| e.key.trim().is_empty()) {
            return Err(ConfigError::EmptyCorrectionKey { table });
        }
        Ok(())
    }

    /// First entry whose mistake occurs in the candidate, ignoring case.
    pub fn lookup(&self, candidate: &str) -> Option<&Correction> {
        let haystack = candidate.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|e| !e.key.is_empty() && haystack.contains(&e.key))
    }

    /// Every occurrence of a mistake in `text`, ignoring case, in text order.
    ///
    /// Occurrences may be glued to surrounding characters. Where two entries
    /// overlap, the earlier entry keeps the span. Returns `(start, end, entry)`;
    /// offsets are byte offsets into `text`.
    pub fn occurrences<'a>(&'a self, text: &str) -> Vec<(usize, usize, &'a Correction)> {
        let haystack = text.to_ascii_lowercase();
        let mut hits: Vec<(usize, usize, &'a Correction)> = Vec::new();

        for entry in self.entries.iter().filter(|e| !e.key.is_empty()) {
            for (start, _) in haystack.match_indices(&entry.key) {
                let end = start + entry.key.len();
                if !hits.iter().any(|&(s, e, _)| start < e && s < end) {
                    hits.push((start, end, entry));
                }
            }
        }

        hits.sort_by_key(|(start, _, _)| *start);
        hits
    }
}

/// Whether `text[start..end]` is not glued to surrounding letters or digits.
pub(crate) fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

impl Serialize for CorrectionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.mistake, &entry.correction)?;
        }
        map.end()
    }
}

struct CorrectionTableVisitor;

impl<'de> Visitor<'de> for CorrectionTableVisitor {
    type Value = CorrectionTable;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object mapping OCR mistakes to corrected strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = CorrectionTable::new();
        while let Some((mistake, correction)) = access.next_entry::<String, String>()? {
            table.push(mistake, correction);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for CorrectionTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CorrectionTableVisitor)
    }
}

/// Outcome of resolving a raw candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A correction table entry matched.
    Corrected(String),
    /// A deletion entry matched; the candidate has no value.
    Deleted,
    /// A reference member scored at or above the threshold.
    Matched { value: String, score: u8 },
    /// Nothing matched; the cleaned candidate is kept.
    Unverified { value: String, confidence: f32 },
}

impl Resolution {
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Corrected(value)
            | Resolution::Matched { value, .. }
            | Resolution::Unverified { value, .. } => Some(value),
            Resolution::Deleted => None,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            Resolution::Corrected(_) => CORRECTION_CONFIDENCE,
            Resolution::Deleted => 0.0,
            Resolution::Matched { score, .. } => *score as f32 / 100.0,
            Resolution::Unverified { confidence, .. } => *confidence,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Resolution::Corrected(value)
            | Resolution::Matched { value, .. }
            | Resolution::Unverified { value, .. } => Some(value),
            Resolution::Deleted => None,
        }
    }
}

/// Resolve a raw candidate against a correction table and a reference set.
///
/// Returns `None` for a blank candidate.
pub fn resolve(
    candidate: &str,
    corrections: &CorrectionTable,
    reference: &[String],
    policy: &MatchPolicy,
) -> Option<Resolution> {
    let cleaned = policy.casing.apply(candidate);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(entry) = corrections.lookup(candidate) {
        debug!("Correction `{}` -> `{}` for `{}`", entry.mistake, entry.correction, candidate);
        if entry.is_deletion() {
            return Some(Resolution::Deleted);
        }
        return Some(Resolution::Corrected(entry.correction.clone()));
    }

    if let Some((index, score)) = best_match(candidate, reference, policy.scorer) {
        if score as f32 >= min_score(policy.threshold) {
            debug!("Matched `{}` to `{}` ({})", candidate, reference[index], score);
            return Some(Resolution::Matched {
                value: reference[index].clone(),
                score,
            });
        }
    }

    Some(Resolution::Unverified {
        value: cleaned,
        confidence: policy.unverified_confidence,
    })
}

/// Threshold on the 0-100 scale, tolerant of `0.7 * 100.0 != 70.0`.
fn min_score(threshold: f32) -> f32 {
    (threshold * 100.0 - 1e-3).ceil()
}
