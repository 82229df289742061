//! Core library for extracting driver log records from OCR text.
//!
//! This crate provides:
//! - Text normalization for OCR output
//! - Correction tables and fuzzy matching against reference data
//! - Field extractors (driver, labor, date, vehicle, times, locations, distance, fuel)
//! - Entry segmentation and confidence-scored shift records
//! - Per-stop location visits from structured forms and free text

pub mod error;
pub mod log;
pub mod models;

pub use error::{ConfigError, DriveLogError, Rejection, Result};
pub use log::rules::{CorrectionTable, PatternLibrary, PatternSpec};
pub use log::DriverLogExtractor;
pub use models::config::{DriveLogConfig, ExtractionConfig, MatchPolicy};
pub use models::log::{DocumentResult, FieldConfidence, LocationVisit, LogEntry, VisitSource};
pub use models::reference::{ReferenceData, ReferenceFile, SharedReference};
