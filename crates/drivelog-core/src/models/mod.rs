//! Data models for driver logs, reference data and configuration.

pub mod config;
pub mod log;
pub mod reference;

pub use config::{DriveLogConfig, ExtractionConfig, MatchPolicy};
pub use log::{
    DocumentResult, FieldConfidence, LocationVisit, LogEntry, VisitSource, OTHER_CATEGORY,
    UNKNOWN_DRIVER,
};
pub use reference::{ReferenceData, ReferenceDataBuilder, ReferenceFile, SharedReference};
