//! Driver log extractor: shift records and location visits from OCR text.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::Rejection;
use crate::models::config::ExtractionConfig;
use crate::models::log::{DocumentResult, FieldConfidence, LocationVisit, LogEntry, UNKNOWN_DRIVER};
use crate::models::reference::ReferenceData;

use super::rules::{
    extract_notes, normalize, patterns::FORM_INDICATORS, DateExtractor, DistanceExtractor,
    ExtractionMatch, FieldExtractor, FuelExtractor, LocationExtractor, NameExtractor,
    TimeExtractor, VehicleExtractor,
};
use super::segment::segment;
use super::{form, visits};

/// Values taken from the text before the first entry block.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderFields {
    pub driver: Option<ExtractionMatch<String>>,
    pub vehicle: Option<ExtractionMatch<String>>,
    pub labor: Option<ExtractionMatch<String>>,
}

/// Rule-based driver log extractor.
///
/// Holds immutable reference data and thresholds; every call is independent,
/// so one extractor can serve many threads.
#[derive(Debug, Clone)]
pub struct DriverLogExtractor {
    reference: Arc<ReferenceData>,
    config: ExtractionConfig,
    today: NaiveDate,
}

impl DriverLogExtractor {
    /// Create an extractor with default thresholds, dated today.
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            config: ExtractionConfig::default(),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Set extraction thresholds and match policies.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the date used for date confidence and missing log dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Set minimum record confidence threshold.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.config.min_record_confidence = confidence;
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Extract every shift record of a document.
    ///
    /// Never fails: blocks that do not yield a record are reported in
    /// `processing_notes`.
    pub fn extract_document(
        &self,
        text: &str,
        document_id: &str,
        ocr_confidence: Option<f32>,
    ) -> DocumentResult {
        info!("Extracting driver log from {} ({} chars)", document_id, text.len());

        let mut result = DocumentResult::new(document_id, self.today);
        match ocr_confidence {
            Some(c) if (0.0..=1.0).contains(&c) => result.ocr_confidence = Some(c),
            Some(c) => result
                .processing_notes
                .push(format!("OCR confidence {} outside [0, 1], ignored", c)),
            None => {}
        }

        let normalized = normalize(text);
        let segmentation = segment(&normalized, self.reference.patterns());
        let header = self.header_fields(segmentation.preamble.as_deref());

        if segmentation.blocks.is_empty() {
            result.processing_notes.push("No entry blocks found".to_string());
        }

        for (i, block) in segmentation.blocks.iter().enumerate() {
            let number = i + 1;
            match self.build_entry(&block.text, &header) {
                Ok(entry) => {
                    result.processing_notes.push(format!(
                        "Entry {}: extracted with {:.2} confidence",
                        number, entry.confidence
                    ));
                    result.entries.push(entry);
                }
                Err(rejection) => {
                    debug!("Entry {} at offset {} rejected: {}", number, block.offset, rejection);
                    result
                        .processing_notes
                        .push(format!("Entry {}: rejected ({})", number, rejection));
                }
            }
        }

        info!(
            "Extracted {} of {} entries from {}",
            result.entries.len(),
            segmentation.blocks.len(),
            document_id
        );

        result
    }

    /// Run every field extractor on one block and score the record.
    pub(crate) fn build_entry(&self, block: &str, header: &HeaderFields) -> Result<LogEntry, Rejection> {
        let block = block.trim();
        if block.is_empty() {
            return Err(Rejection::EmptyBlock);
        }

        let reference = self.reference.as_ref();
        let library = reference.patterns();

        let driver = NameExtractor::driver(reference, self.config.driver)
            .extract(block)
            .or_else(|| header.driver.clone());
        let date = DateExtractor::new(library, self.today).extract(block);

        if driver.is_none() && date.is_none() {
            return Err(Rejection::MissingRequired);
        }

        let vehicle = VehicleExtractor::new(reference, self.config.vehicle)
            .extract(block)
            .or_else(|| header.vehicle.clone());
        let labor = NameExtractor::labor(reference, self.config.labor)
            .extract(block)
            .or_else(|| header.labor.clone());
        let times = TimeExtractor::new(library).extract_pair(block);
        let locations = LocationExtractor::new(reference, self.config.location).extract_pair(block);
        let distance = DistanceExtractor::new(library).extract(block);
        let fuel = FuelExtractor::new(library).extract(block);

        let field_confidence = FieldConfidence {
            driver_name: driver.as_ref().map_or(0.0, |m| m.confidence),
            log_date: date.as_ref().map_or(0.0, |m| m.confidence),
            vehicle_id: vehicle.as_ref().map_or(0.0, |m| m.confidence),
            times: times.map_or(0.0, |t| t.confidence),
            locations: locations.as_ref().map_or(0.0, |l| l.confidence),
            distance: distance.as_ref().map_or(0.0, |m| m.confidence),
            fuel: fuel.as_ref().map_or(0.0, |m| m.confidence),
        };

        let confidence = field_confidence.overall();
        let minimum = self.config.min_record_confidence;
        if confidence < minimum {
            return Err(Rejection::LowConfidence { confidence, minimum });
        }

        let (start_location, end_location) = match locations {
            Some(pair) => (Some(pair.start.value), pair.end.map(|m| m.value)),
            None => (None, None),
        };

        Ok(LogEntry {
            driver_name: driver.map_or_else(|| UNKNOWN_DRIVER.to_string(), |m| m.value),
            log_date: date.map_or(self.today, |m| m.value),
            vehicle_id: vehicle.map(|m| m.value),
            start_time: times.map(|t| t.start),
            end_time: times.and_then(|t| t.end),
            start_location,
            end_location,
            labor_name: labor.map(|m| m.value),
            distance: distance.map(|m| m.value),
            fuel_used: fuel.map(|m| m.value),
            notes: extract_notes(block),
            confidence,
            field_confidence,
        })
    }

    fn header_fields(&self, preamble: Option<&str>) -> HeaderFields {
        let Some(preamble) = preamble else {
            return HeaderFields::default();
        };
        let reference = self.reference.as_ref();
        HeaderFields {
            driver: NameExtractor::driver(reference, self.config.driver).extract(preamble),
            vehicle: VehicleExtractor::new(reference, self.config.vehicle).extract(preamble),
            labor: NameExtractor::labor(reference, self.config.labor).extract(preamble),
        }
    }

    /// Whether the text looks like a printed daily time log form.
    pub fn is_structured_form(&self, text: &str) -> bool {
        let lowered = normalize(text).to_lowercase();
        let hits = FORM_INDICATORS
            .iter()
            .filter(|indicator| lowered.contains(&indicator.to_lowercase()))
            .count();
        debug!("Structured form indicators: {}", hits);
        hits >= self.config.form_indicator_threshold
    }

    /// Location visits from free text via pattern scan, then positional pairing.
    pub fn extract_location_visits(&self, text: &str, document_id: &str) -> Vec<LocationVisit> {
        let normalized = normalize(text);
        info!("Extracting location visits from {}", document_id);
        visits::extract(self, &normalized, document_id)
    }

    /// Location visits from a structured form's table rows.
    ///
    /// Falls back to [`Self::extract_location_visits`] when no row is found.
    pub fn extract_from_structured_form(&self, text: &str, document_id: &str) -> Vec<LocationVisit> {
        let normalized = normalize(text);
        info!("Extracting structured form visits from {}", document_id);

        let found = form::extract(self, &normalized, document_id);
        if !found.is_empty() {
            return found;
        }

        debug!("No table rows in {}, falling back to pattern scan", document_id);
        visits::extract(self, &normalized, document_id)
    }

    /// Location visits, choosing the form or free-text path by form detection.
    pub fn extract_visits(&self, text: &str, document_id: &str) -> Vec<LocationVisit> {
        if self.is_structured_form(text) {
            self.extract_from_structured_form(text, document_id)
        } else {
            self.extract_location_visits(text, document_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn extractor(reference: ReferenceData) -> DriverLogExtractor {
        DriverLogExtractor::new(Arc::new(reference))
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
    }

    #[test]
    fn test_extractor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DriverLogExtractor>();
    }

    #[test]
    fn test_build_entry_requires_driver_or_date() {
        let extractor = extractor(ReferenceData::default());
        let header = HeaderFields::default();

        assert_eq!(
            extractor.build_entry("fuel 20 gallons", &header),
            Err(Rejection::MissingRequired)
        );
        assert_eq!(extractor.build_entry("   ", &header), Err(Rejection::EmptyBlock));
    }

    #[test]
    fn test_missing_driver_defaults() {
        let extractor = extractor(ReferenceData::default());
        let entry = extractor
            .build_entry("03/19/2024 Miles: 120", &HeaderFields::default())
            .unwrap();

        assert_eq!(entry.driver_name, UNKNOWN_DRIVER);
        assert_eq!(entry.distance, Some(Decimal::from(120)));
        assert_eq!(entry.field_confidence.driver_name, 0.0);
        assert!((entry.confidence - (0.9 + 0.8) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_confidence_rejected() {
        let extractor = extractor(ReferenceData::default()).with_min_confidence(0.95);
        let rejection = extractor
            .build_entry("Driver: nobody known", &HeaderFields::default())
            .unwrap_err();
        assert!(matches!(rejection, Rejection::LowConfidence { minimum, .. } if minimum == 0.95));
    }

    #[test]
    fn test_invalid_ocr_confidence_dropped() {
        let extractor = extractor(ReferenceData::default());
        let result = extractor.extract_document("03/19/2024 Driver: Sorwar", "doc", Some(1.7));
        assert_eq!(result.ocr_confidence, None);
        assert!(result.processing_notes[0].contains("outside [0, 1]"));

        let result = extractor.extract_document("03/19/2024 Driver: Sorwar", "doc", Some(0.82));
        assert_eq!(result.ocr_confidence, Some(0.82));
    }

    #[test]
    fn test_notes_per_block() {
        let extractor = extractor(ReferenceData::builder().names(["Sorwar"]).build().unwrap());
        let text = "03/18/2024 Driver: Sorwar 8:00 AM 4:00 PM\n03/19/2024 ...";
        let result = extractor.extract_document(text, "doc", None);

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.processing_notes.len(), 2);
        assert!(result.processing_notes[0].starts_with("Entry 1: extracted with"));
        assert_eq!(result.entries[1].driver_name, UNKNOWN_DRIVER);
    }

    #[test]
    fn test_leading_lines_noted_as_entry() {
        let extractor = extractor(ReferenceData::builder().names(["Sorwar", "Kabir"]).build().unwrap());
        let text = "Company header\nDriver: Sorwar\nVehicle 12345\nName: Kabir\nFuel 20 gallons";
        let result = extractor.extract_document(text, "doc", None);

        assert_eq!(result.processing_notes.len(), 3);
        assert_eq!(
            result.processing_notes[0],
            "Entry 1: rejected (insufficient data (no driver name or date found))"
        );
        assert!(result.processing_notes[1].starts_with("Entry 2:"));
        assert!(result.processing_notes[2].starts_with("Entry 3:"));
    }

    #[test]
    fn test_is_structured_form() {
        let extractor = extractor(ReferenceData::default());
        let form = "Driver's Daily Time Log\nDriver Name: Sorwar\nTime Arrived Time Departed Location";
        assert!(extractor.is_structured_form(form));
        assert!(!extractor.is_structured_form("Driver Name: Sorwar"));
    }
}
