//! Driver log record models.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Driver name used when a record has a date but no recognizable driver.
pub const UNKNOWN_DRIVER: &str = "Unknown Driver";

/// Category assigned to locations with no configured owner.
pub const OTHER_CATEGORY: &str = "Other";

/// One shift record extracted from an entry block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Driver name (canonical when matched against the reference list).
    pub driver_name: String,

    /// Date of the shift.
    pub log_date: NaiveDate,

    /// Vehicle identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    /// Shift start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,

    /// Shift end time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,

    /// Starting location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_location: Option<String>,

    /// Ending location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_location: Option<String>,

    /// Labor/helper name when the log names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_name: Option<String>,

    /// Distance driven, always within `0..=1000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Decimal>,

    /// Fuel used, always within `0..=100`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_used: Option<Decimal>,

    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Aggregate confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Per-field confidence breakdown.
    pub field_confidence: FieldConfidence,
}

/// Confidence of every scored field in a log entry.
///
/// A zero means the field was not found and does not count towards the
/// aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    pub driver_name: f32,
    pub log_date: f32,
    pub vehicle_id: f32,
    pub times: f32,
    pub locations: f32,
    pub distance: f32,
    pub fuel: f32,
}

impl FieldConfidence {
    fn scores(&self) -> [f32; 7] {
        [
            self.driver_name,
            self.log_date,
            self.vehicle_id,
            self.times,
            self.locations,
            self.distance,
            self.fuel,
        ]
    }

    /// Mean of the non-zero field confidences, or 0.0 when nothing scored.
    pub fn overall(&self) -> f32 {
        let observed: Vec<f32> = self.scores().into_iter().filter(|c| *c > 0.0).collect();
        if observed.is_empty() {
            return 0.0;
        }
        observed.iter().sum::<f32>() / observed.len() as f32
    }
}

/// Everything extracted from one source document's shift records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Caller-supplied document identifier (usually the image file name).
    pub document_id: String,

    /// Date the extraction ran.
    pub extraction_date: NaiveDate,

    /// OCR confidence reported for the source image (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,

    /// Accepted entries in document order.
    pub entries: Vec<LogEntry>,

    /// One line per entry attempt, plus document-level notes.
    pub processing_notes: Vec<String>,
}

impl DocumentResult {
    /// Create an empty result for a document.
    pub fn new(document_id: impl Into<String>, extraction_date: NaiveDate) -> Self {
        Self {
            document_id: document_id.into(),
            extraction_date,
            ocr_confidence: None,
            entries: Vec::new(),
            processing_notes: Vec::new(),
        }
    }

    /// Distinct driver names in first-seen order.
    pub fn unique_drivers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.driver_name.as_str()) {
                names.push(&entry.driver_name);
            }
        }
        names
    }

    /// Distinct labor names in first-seen order.
    pub fn unique_labor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for labor in self.entries.iter().filter_map(|e| e.labor_name.as_deref()) {
            if !names.contains(&labor) {
                names.push(labor);
            }
        }
        names
    }

    /// Mean confidence of the accepted entries.
    pub fn average_confidence(&self) -> Option<f32> {
        if self.entries.is_empty() {
            return None;
        }
        let total: f32 = self.entries.iter().map(|e| e.confidence).sum();
        Some(total / self.entries.len() as f32)
    }
}

/// How a location visit was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitSource {
    /// Data row of a structured arrival/departure form.
    FormTable,
    /// Location/time combination pattern in free text.
    PatternScan,
    /// Positional pairing of separately found locations and times.
    PositionalFallback,
}

/// One stop at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationVisit {
    /// Driver name inherited from the document header.
    pub driver_name: String,

    /// Date inherited from the document header.
    pub visit_date: NaiveDate,

    /// Location name, never empty.
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<NaiveTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_name: Option<String>,

    /// Owning chain/company of the location.
    pub location_category: String,

    /// Source document identifier.
    pub document_id: String,

    /// 1-based position of this visit within the document.
    pub visit_sequence: u32,

    /// Reference numbers or other row details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Confidence of the location resolution (0.0 - 1.0).
    pub confidence: f32,

    /// Extraction path that produced this visit.
    pub source: VisitSource,
}
