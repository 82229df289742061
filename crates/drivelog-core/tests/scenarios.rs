//! End-to-end extraction scenarios.

use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveTime};
use drivelog_core::log::rules::{best_match, resolve, CorrectionTable, Resolution, Scorer};
use drivelog_core::log::segment;
use drivelog_core::{
    DriverLogExtractor, MatchPolicy, PatternLibrary, ReferenceData, SharedReference, VisitSource,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn reference() -> ReferenceData {
    ReferenceData::from_json(
        r#"{
            "names": ["Sorwar", "Kabir", "Masud"],
            "vehicles": ["54321", "67890"],
            "locations": ["Al Khor", "Lulu Hypermarket", "Doha Port"],
            "location_categories": {"Lulu": ["Lulu Hypermarket"], "Port Authority": ["Doha Port"]},
            "name_corrections": {"Sonwar": "Sorwar"},
            "location_corrections": {"Sonwan": "Sorwar"}
        }"#,
    )
    .unwrap()
}

fn extractor(reference: ReferenceData) -> DriverLogExtractor {
    DriverLogExtractor::new(Arc::new(reference)).with_today(today())
}

#[test]
fn test_single_line_shift_record() {
    let extractor = extractor(ReferenceData::default());
    let text = "Driver: John Smith Date: 03/15/2024 Vehicle ID: TRK001 \
                Start Time: 8:00 AM End Time: 5:30 PM Miles: 245.5";

    let result = extractor.extract_document(text, "scan-001.jpg", Some(0.91));

    assert_eq!(result.entries.len(), 1);
    let entry = &result.entries[0];
    assert_eq!(entry.driver_name, "John Smith");
    assert_eq!(entry.log_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(entry.vehicle_id.as_deref(), Some("TRK001"));
    assert_eq!(entry.start_time, Some(hm(8, 0)));
    assert_eq!(entry.end_time, Some(hm(17, 30)));
    assert_eq!(entry.distance, Some(Decimal::from_str("245.5").unwrap()));
    assert_eq!(entry.fuel_used, None);
    assert!(entry.confidence >= 0.3);

    assert_eq!(result.ocr_confidence, Some(0.91));
    assert_eq!(result.processing_notes.len(), 1);
    assert!(result.processing_notes[0].starts_with("Entry 1: extracted with"));
}

#[test]
fn test_location_correction_in_record_and_visits() {
    let extractor = extractor(reference());

    let result = extractor.extract_document(
        "Driver: Kabir 03/18/2024 delivered to Sonwan 9:00 AM",
        "doc",
        None,
    );
    let entry = &result.entries[0];
    assert_eq!(entry.driver_name, "Kabir");
    assert_eq!(entry.start_location.as_deref(), Some("Sorwar"));
    assert_eq!(entry.field_confidence.locations, 0.95);

    let visits = extractor.extract_location_visits("Sonwan 9:00 AM 10:30 AM", "doc");
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].location, "Sorwar");
    assert_eq!(visits[0].confidence, 0.95);
}

#[test]
fn test_location_correction_glued_to_digits() {
    let extractor = extractor(reference());

    let result = extractor.extract_document(
        "03/18/2024 Driver: Kabir unloaded at Sonwan2 yard 9:00 AM",
        "doc",
        None,
    );
    let entry = &result.entries[0];
    assert_eq!(entry.start_location.as_deref(), Some("Sorwar"));
    assert_eq!(entry.field_confidence.locations, 0.95);
}

#[test]
fn test_single_line_visits_keep_every_stop() {
    let extractor = extractor(reference());
    let visits = extractor.extract_location_visits(
        "Al Khor 7:00 AM 7:30 AM Doha Port 9:15 AM Lulu Hypermarket 10:00 AM 10:30 AM",
        "doc",
    );

    let locations: Vec<&str> = visits.iter().map(|v| v.location.as_str()).collect();
    assert_eq!(locations, vec!["Al Khor", "Doha Port", "Lulu Hypermarket"]);
    assert_eq!(visits[1].arrival_time, Some(hm(9, 15)));
    assert_eq!(visits[1].location_category, "Port Authority");
}

#[test]
fn test_structured_form_row() {
    let extractor = extractor(reference());
    let text = "Driver Name: Sonwar Labor Name: Masud\n\
                Vehicle ID / Plate: 54321 Date: 18/03/2024\n\
                7:45 AM 9:40 AM Al Khor 123456";

    assert!(extractor.is_structured_form(text));

    for visits in [
        extractor.extract_from_structured_form(text, "form.jpg"),
        extractor.extract_visits(text, "form.jpg"),
    ] {
        assert_eq!(visits.len(), 1);
        let visit = &visits[0];
        assert_eq!(visit.arrival_time, Some(hm(7, 45)));
        assert_eq!(visit.departure_time, Some(hm(9, 40)));
        assert_eq!(visit.location, "Al Khor");
        assert_eq!(visit.location_category, "Other");
        assert!(visit.notes.as_deref().unwrap_or_default().contains("123456"));
        assert_eq!(visit.driver_name, "Sorwar");
        assert_eq!(visit.labor_name.as_deref(), Some("Masud"));
        assert_eq!(visit.vehicle_id.as_deref(), Some("54321"));
        assert_eq!(visit.visit_date, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
        assert_eq!(visit.visit_sequence, 1);
        assert_eq!(visit.source, VisitSource::FormTable);
    }
}

#[test]
fn test_structured_form_without_rows_falls_back() {
    let extractor = extractor(reference());
    let text = "Driver's Daily Time Log\nDriver Name: Sorwar\nTime Arrived Time Departed\n\
                stopped at doha port, later al khor\n08:00 09:00";

    let visits = extractor.extract_from_structured_form(text, "doc");
    assert_eq!(visits.len(), 2);
    assert_eq!(visits[0].location, "Doha Port");
    assert_eq!(visits[0].location_category, "Port Authority");
    assert_eq!(visits[0].arrival_time, Some(hm(8, 0)));
    assert_eq!(visits[1].location, "Al Khor");
    assert_eq!(visits[1].arrival_time, None);
    assert!(visits.iter().all(|v| v.source == VisitSource::PositionalFallback));
}

#[test]
fn test_noise_yields_rejection_note() {
    let extractor = extractor(reference());
    let result = extractor.extract_document("lorem ipsum dolor sit amet, consectetur", "noise", None);

    assert!(result.entries.is_empty());
    assert_eq!(
        result.processing_notes,
        vec!["Entry 1: rejected (insufficient data (no driver name or date found))".to_string()]
    );
    assert!(extractor.extract_visits("lorem ipsum dolor", "noise").is_empty());
}

#[test]
fn test_empty_document() {
    let extractor = extractor(reference());
    let result = extractor.extract_document("   \n  ", "blank", None);
    assert!(result.entries.is_empty());
    assert_eq!(result.processing_notes, vec!["No entry blocks found".to_string()]);
}

#[test]
fn test_one_block_per_date_occurrence() {
    let library = PatternLibrary::default();
    let text = "Weekly sheet\n03/11/2024 Driver: Sorwar 8:00 AM\n\
                03/12/2024 Driver: Kabir 9:00 AM\n03/13/2024 Driver: Masud";
    let expected: Vec<usize> = text.match_indices("03/1").map(|(i, _)| i).collect();

    let segmentation = segment(text, &library);
    let offsets: Vec<usize> = segmentation.blocks.iter().map(|b| b.offset).collect();
    assert_eq!(offsets, expected);

    let result = extractor(reference()).extract_document(text, "weekly", None);
    let drivers: Vec<&str> = result.entries.iter().map(|e| e.driver_name.as_str()).collect();
    assert_eq!(result.processing_notes.len(), 3);
    assert_eq!(drivers, vec!["Sorwar", "Kabir", "Masud"]);
}

#[test]
fn test_fuzzy_match_is_best_above_threshold() {
    let reference = reference();
    let policy = MatchPolicy::names();
    let names = reference.names();

    for candidate in ["Sorwer", "Kabeer", "Masood", "Zzyzx"] {
        let resolution = resolve(candidate, &CorrectionTable::new(), names, &policy).unwrap();
        match resolution {
            Resolution::Matched { ref value, score } => {
                assert!(score as f32 / 100.0 >= policy.threshold);
                for other in names {
                    assert!(Scorer::Ratio.score(candidate, other) <= score, "{} beat {}", other, value);
                }
                assert_eq!(best_match(candidate, names, Scorer::Ratio).map(|(_, s)| s), Some(score));
            }
            Resolution::Unverified { confidence, .. } => {
                assert_eq!(confidence, policy.unverified_confidence);
                let (_, best) = best_match(candidate, names, Scorer::Ratio).unwrap();
                assert!((best as f32) < policy.threshold * 100.0);
            }
            other => panic!("unexpected resolution {:?}", other),
        }
    }
}

#[test]
fn test_visit_sequence_is_contiguous() {
    let extractor = extractor(reference());
    let text = "Al Khor 7:00 AM 7:30 AM\nthen Doha Port 9:15 AM\n11:00 AM Lulu Hypermarket 11:45 AM";
    let visits = extractor.extract_location_visits(text, "doc");

    let sequence: Vec<u32> = visits.iter().map(|v| v.visit_sequence).collect();
    assert_eq!(sequence, (1..=visits.len() as u32).collect::<Vec<_>>());
    let locations: Vec<&str> = visits.iter().map(|v| v.location.as_str()).collect();
    assert_eq!(locations, vec!["Al Khor", "Doha Port", "Lulu Hypermarket"]);
}

#[test]
fn test_shared_reference_across_threads() {
    let shared = Arc::new(SharedReference::new(reference()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let extractor = DriverLogExtractor::new(shared.snapshot()).with_today(today());
                let text = format!("Driver: Sonwar 03/1{}/2024 8:00 AM 4:00 PM", i);
                extractor.extract_document(&text, "doc", None).entries.len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }

    shared.replace(ReferenceData::default());
    assert!(shared.snapshot().names().is_empty());
}
