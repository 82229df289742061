//! Structured daily time log forms: header fields plus one visit per table row.

use chrono::NaiveTime;
use tracing::debug;

use crate::models::log::{LocationVisit, VisitSource, UNKNOWN_DRIVER};

use super::parser::DriverLogExtractor;
use super::rules::library::{DateLayout, PatternLibrary};
use super::rules::matching::resolve;
use super::rules::patterns::{
    cut_at_label, FORM_DATE, FORM_DRIVER, FORM_LABOR, FORM_VEHICLE, FORM_VEHICLE_PLATE,
    REFERENCE_NUMBER, TABLE_BETWEEN_LOCATION, TABLE_HEADER_TOKENS, TABLE_TRAILING_LOCATION,
};
use super::rules::{FieldExtractor, TimeExtractor};
use super::visits::{finish, plausible_location, resolve_location, DocumentHeader, VisitDraft};

/// One data row of the arrival/departure table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableRow {
    /// Byte offset of the row's line.
    pub offset: usize,
    pub arrival: NaiveTime,
    pub departure: Option<NaiveTime>,
    pub location: String,
    pub notes: Option<String>,
}

/// Visits from the form's table rows; empty when no row has a location.
pub(crate) fn extract(extractor: &DriverLogExtractor, text: &str, document_id: &str) -> Vec<LocationVisit> {
    let rows = table_rows(text, extractor.reference().patterns());
    debug!("Found {} table rows in {}", rows.len(), document_id);

    let drafts: Vec<VisitDraft> = rows
        .into_iter()
        .filter_map(|row| {
            let (location, confidence) = resolve_location(extractor, &row.location)?;
            Some(VisitDraft {
                position: row.offset,
                location,
                confidence,
                arrival: Some(row.arrival),
                departure: row.departure,
                notes: row.notes,
                source: VisitSource::FormTable,
            })
        })
        .collect();

    if drafts.is_empty() {
        return Vec::new();
    }

    let header = form_header(extractor, text);
    finish(extractor, &header, document_id, drafts)
}

/// Header fields from the form's labelled cells, each falling back to the
/// general extractor.
pub(crate) fn form_header(extractor: &DriverLogExtractor, text: &str) -> DocumentHeader {
    let reference = extractor.reference();
    let config = extractor.config();
    let general = DocumentHeader::from_text(extractor, text);

    let labelled = |caps: Option<regex::Captures>| {
        caps.and_then(|c| c.get(1))
            .map(|m| cut_at_label(m.as_str()).to_string())
            .filter(|s| !s.is_empty())
    };

    let driver_name = labelled(FORM_DRIVER.captures(text))
        .and_then(|raw| resolve(&raw, reference.name_corrections(), reference.names(), &config.driver))
        .and_then(|r| r.into_value())
        .unwrap_or(general.driver_name);

    let labor_name = labelled(FORM_LABOR.captures(text))
        .and_then(|raw| resolve(&raw, reference.name_corrections(), reference.names(), &config.labor))
        .and_then(|r| r.into_value())
        .or(general.labor_name);

    let vehicle_id = labelled(FORM_VEHICLE_PLATE.captures(text).or_else(|| FORM_VEHICLE.captures(text)))
        .and_then(|raw| {
            resolve(&raw, reference.vehicle_corrections(), reference.vehicles(), &config.vehicle)
        })
        .and_then(|r| r.into_value())
        .or(general.vehicle_id);

    let date = FORM_DATE
        .captures(text)
        .and_then(|caps| DateLayout::MonthDayYear.parse(&caps[1], &caps[2], &caps[3]))
        .unwrap_or(general.date);

    DocumentHeader {
        driver_name: if driver_name.is_empty() {
            UNKNOWN_DRIVER.to_string()
        } else {
            driver_name
        },
        date,
        vehicle_id,
        labor_name,
    }
}

/// Parse data rows: lines with at least one time token and a location.
pub(crate) fn table_rows(text: &str, library: &PatternLibrary) -> Vec<TableRow> {
    let times = TimeExtractor::new(library);
    let mut rows = Vec::new();
    let mut offset = 0;

    for line in text.split('\n') {
        let line_offset = offset;
        offset += line.len() + 1;

        let lowered = line.to_lowercase();
        if line.trim().is_empty() || TABLE_HEADER_TOKENS.iter().any(|h| lowered.contains(h)) {
            continue;
        }

        // Distinct time tokens with their spans, in order
        let mut tokens: Vec<(NaiveTime, usize, usize)> = Vec::new();
        for m in times.extract_all(line) {
            let Some((start, end)) = m.position else {
                continue;
            };
            if !tokens.iter().any(|(t, _, _)| *t == m.value) {
                tokens.push((m.value, start, end));
            }
        }

        let row = match tokens.as_slice() {
            [] => None,
            [(arrival, _, end)] => {
                trailing_location(&line[*end..]).map(|(location, rest)| TableRow {
                    offset: line_offset,
                    arrival: *arrival,
                    departure: None,
                    location,
                    notes: row_notes(rest),
                })
            }
            [(arrival, _, first_end), (departure, second_start, second_end), ..] => {
                let after = &line[*second_end..];
                trailing_location(after)
                    .or_else(|| {
                        between_location(&line[*first_end..*second_start]).map(|l| (l, after))
                    })
                    .map(|(location, rest)| TableRow {
                        offset: line_offset,
                        arrival: *arrival,
                        departure: Some(*departure),
                        location,
                        notes: row_notes(rest),
                    })
            }
        };

        if let Some(row) = row {
            rows.push(row);
        }
    }

    rows
}

/// Location at the start of `after`, and the text that follows it.
fn trailing_location(after: &str) -> Option<(String, &str)> {
    let caps = TABLE_TRAILING_LOCATION.captures(after)?;
    let group = caps.get(1)?;
    let location = plausible_location(group.as_str())?;
    Some((location, &after[group.end()..]))
}

fn between_location(between: &str) -> Option<String> {
    let caps = TABLE_BETWEEN_LOCATION.captures(between)?;
    plausible_location(caps.get(1)?.as_str())
}

/// Reference number first, then any leftover text.
fn row_notes(rest: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut leftover = rest.to_string();

    if let Some(m) = REFERENCE_NUMBER.find(rest) {
        parts.push(m.as_str().to_string());
        leftover.replace_range(m.range(), " ");
    }

    let leftover = leftover.split_whitespace().collect::<Vec<&str>>().join(" ");
    if !leftover.is_empty() {
        parts.push(leftover);
    }

    (!parts.is_empty()).then(|| parts.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference::ReferenceData;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    const FORM: &str = "Driver's Daily Time Log\n\
        Driver Name: Sonwar Labor Name: Masud\n\
        Vehicle ID / Plate: 54321 Date: 18/03/2024\n\
        Time Arrived Time Departed Location & Purpose Instructions\n\
        7:45 AM 9:40 AM Al Khor 123456\n\
        10:05 AM Lulu Hyper 11:30 AM\n\
        12:00 PM 1:15 PM 2:00 PM\n\
        3:30 PM Doha Port unloading";

    fn extractor() -> DriverLogExtractor {
        let reference = ReferenceData::builder()
            .names(["Sorwar", "Masud"])
            .vehicles(["54321"])
            .locations(["Al Khor", "Lulu Hypermarket", "Doha Port"])
            .name_correction("Sonwar", "Sorwar")
            .build()
            .unwrap();
        DriverLogExtractor::new(Arc::new(reference))
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
    }

    #[test]
    fn test_table_rows() {
        let rows = table_rows(FORM, &PatternLibrary::default());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].arrival, hm(7, 45));
        assert_eq!(rows[0].departure, Some(hm(9, 40)));
        assert_eq!(rows[0].location, "Al Khor");
        assert_eq!(rows[0].notes.as_deref(), Some("123456"));

        assert_eq!(rows[1].location, "Lulu Hyper");
        assert_eq!(rows[1].notes, None);

        assert_eq!(rows[2].arrival, hm(15, 30));
        assert_eq!(rows[2].departure, None);
        assert_eq!(rows[2].location, "Doha Port unloading");
    }

    #[test]
    fn test_row_notes() {
        assert_eq!(row_notes(" 123456 left at gate").as_deref(), Some("123456 | left at gate"));
        assert_eq!(row_notes("  "), None);
    }

    #[test]
    fn test_form_header() {
        let extractor = extractor();
        let header = form_header(&extractor, FORM);

        assert_eq!(header.driver_name, "Sorwar");
        assert_eq!(header.labor_name.as_deref(), Some("Masud"));
        assert_eq!(header.vehicle_id.as_deref(), Some("54321"));
        assert_eq!(header.date, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
    }

    #[test]
    fn test_extract_visits() {
        let extractor = extractor();
        let visits = extract(&extractor, FORM, "form-1");

        let locations: Vec<&str> = visits.iter().map(|v| v.location.as_str()).collect();
        assert_eq!(locations, vec!["Al Khor", "Lulu Hypermarket", "Doha Port"]);
        let sequence: Vec<u32> = visits.iter().map(|v| v.visit_sequence).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
        assert!(visits.iter().all(|v| v.source == VisitSource::FormTable));
        assert!(visits.iter().all(|v| v.labor_name.as_deref() == Some("Masud")));
    }

    #[test]
    fn test_no_rows() {
        let extractor = extractor();
        assert!(extract(&extractor, "Driver Name: Sorwar\nno table here", "doc").is_empty());
    }
}
