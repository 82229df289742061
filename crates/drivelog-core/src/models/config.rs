//! Configuration structures for the extraction engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::log::rules::matching::{Casing, Scorer};

/// Main configuration for drivelog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveLogConfig {
    /// Extraction thresholds and match policies.
    pub extraction: ExtractionConfig,

    /// Reference data file (names, vehicles, locations, corrections).
    pub reference_file: Option<PathBuf>,
}

/// Thresholds that drive record acceptance and reference matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum aggregate confidence for a log entry to be accepted.
    pub min_record_confidence: f32,

    /// Number of form indicators needed to treat a document as a structured form.
    pub form_indicator_threshold: usize,

    /// Matching of driver names against known names.
    pub driver: MatchPolicy,

    /// Matching of labor names against known names.
    pub labor: MatchPolicy,

    /// Matching of vehicle ids against known vehicles.
    pub vehicle: MatchPolicy,

    /// Matching of locations against known locations.
    pub location: MatchPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_record_confidence: 0.3,
            form_indicator_threshold: 3,
            driver: MatchPolicy::names(),
            labor: MatchPolicy::names(),
            vehicle: MatchPolicy::vehicles(),
            location: MatchPolicy::locations(),
        }
    }
}

/// How a raw candidate is resolved against a reference set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Minimum similarity (0.0 - 1.0) for a reference match.
    pub threshold: f32,

    /// Similarity function.
    pub scorer: Scorer,

    /// Confidence given to a candidate that matched nothing.
    pub unverified_confidence: f32,

    /// Casing applied to unmatched candidates.
    pub casing: Casing,
}

impl MatchPolicy {
    /// Driver and labor names: whole-string ratio.
    pub fn names() -> Self {
        Self {
            threshold: 0.8,
            scorer: Scorer::Ratio,
            unverified_confidence: 0.3,
            casing: Casing::Title,
        }
    }

    /// Vehicle ids: whole-string ratio with a strict threshold.
    pub fn vehicles() -> Self {
        Self {
            threshold: 0.85,
            scorer: Scorer::Ratio,
            unverified_confidence: 0.4,
            casing: Casing::Upper,
        }
    }

    /// Locations: partial ratio, since OCR embeds them in surrounding words.
    pub fn locations() -> Self {
        Self {
            threshold: 0.7,
            scorer: Scorer::PartialRatio,
            unverified_confidence: 0.3,
            casing: Casing::Preserve,
        }
    }
}

impl DriveLogConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
