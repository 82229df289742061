//! Location visits from free text.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use tracing::debug;

use crate::models::log::{LocationVisit, VisitSource, UNKNOWN_DRIVER};

use super::parser::DriverLogExtractor;
use super::rules::matching::resolve;
use super::rules::patterns::{
    FIELD_LABEL, LEADING_MERIDIEM, MERIDIEM_WORD, VISIT_LOCATION_ONE_TIME,
    VISIT_LOCATION_TWO_TIMES, VISIT_TIME_LOCATION_TIME,
};
use super::rules::{
    DateExtractor, FieldExtractor, LocationExtractor, NameExtractor, TimeExtractor, VehicleExtractor,
};

/// Document-level fields every visit inherits.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DocumentHeader {
    pub driver_name: String,
    pub date: NaiveDate,
    pub vehicle_id: Option<String>,
    pub labor_name: Option<String>,
}

impl DocumentHeader {
    /// Header fields from the general extractors run on the whole text.
    pub fn from_text(extractor: &DriverLogExtractor, text: &str) -> Self {
        let reference = extractor.reference();
        let config = extractor.config();
        Self {
            driver_name: NameExtractor::driver(reference, config.driver)
                .extract(text)
                .map_or_else(|| UNKNOWN_DRIVER.to_string(), |m| m.value),
            date: DateExtractor::new(reference.patterns(), extractor.today())
                .extract(text)
                .map_or(extractor.today(), |m| m.value),
            vehicle_id: VehicleExtractor::new(reference, config.vehicle)
                .extract(text)
                .map(|m| m.value),
            labor_name: NameExtractor::labor(reference, config.labor)
                .extract(text)
                .map(|m| m.value),
        }
    }
}

/// A visit before sequence numbering.
#[derive(Debug, Clone)]
pub(crate) struct VisitDraft {
    pub position: usize,
    pub location: String,
    pub confidence: f32,
    pub arrival: Option<NaiveTime>,
    pub departure: Option<NaiveTime>,
    pub notes: Option<String>,
    pub source: VisitSource,
}

/// Resolve a raw location against the reference set; deletions yield `None`.
pub(crate) fn resolve_location(extractor: &DriverLogExtractor, raw: &str) -> Option<(String, f32)> {
    let reference = extractor.reference();
    let resolution = resolve(
        raw,
        reference.location_corrections(),
        reference.locations(),
        &extractor.config().location,
    )?;
    let confidence = resolution.confidence();
    resolution.into_value().map(|value| (value, confidence))
}

/// Strip bare `AM`/`PM` words and reject captures made only of field labels.
pub(crate) fn plausible_location(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .skip_while(|w| MERIDIEM_WORD.is_match(w))
        .collect();
    let end = words
        .iter()
        .rposition(|w| !MERIDIEM_WORD.is_match(w))
        .map_or(0, |i| i + 1);
    let words = &words[..end];

    if words.iter().all(|w| is_label(w)) {
        return None;
    }
    let location = words.join(" ");
    (location.len() >= 3).then_some(location)
}

fn is_label(word: &str) -> bool {
    FIELD_LABEL
        .find(word)
        .is_some_and(|m| m.start() == 0 && m.end() == word.len())
}

/// Number drafts in text order and attach the document header.
pub(crate) fn finish(
    extractor: &DriverLogExtractor,
    header: &DocumentHeader,
    document_id: &str,
    mut drafts: Vec<VisitDraft>,
) -> Vec<LocationVisit> {
    drafts.sort_by_key(|d| d.position);
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| LocationVisit {
            driver_name: header.driver_name.clone(),
            visit_date: header.date,
            location_category: extractor.reference().category_of(&draft.location).to_string(),
            location: draft.location,
            arrival_time: draft.arrival,
            departure_time: draft.departure,
            vehicle_id: header.vehicle_id.clone(),
            labor_name: header.labor_name.clone(),
            document_id: document_id.to_string(),
            visit_sequence: (i + 1) as u32,
            notes: draft.notes,
            confidence: draft.confidence,
            source: draft.source,
        })
        .collect()
}

/// Pattern scan, then positional pairing when the scan finds nothing.
pub(crate) fn extract(extractor: &DriverLogExtractor, text: &str, document_id: &str) -> Vec<LocationVisit> {
    let header = DocumentHeader::from_text(extractor, text);

    let mut drafts = scan(extractor, text);
    if drafts.is_empty() {
        debug!("No location/time patterns in {}, pairing positionally", document_id);
        drafts = pair_positionally(extractor, text);
    }

    finish(extractor, &header, document_id, drafts)
}

/// Capture group numbers of a visit pattern.
struct VisitGroups {
    location: usize,
    arrival: usize,
    departure: Option<usize>,
}

fn scan(extractor: &DriverLogExtractor, text: &str) -> Vec<VisitDraft> {
    let known = extractor.reference().known_location_pattern();
    let mut patterns: Vec<(&Regex, VisitGroups)> = vec![
        (
            &*VISIT_LOCATION_TWO_TIMES,
            VisitGroups { location: 1, arrival: 2, departure: Some(3) },
        ),
        (
            &*VISIT_TIME_LOCATION_TIME,
            VisitGroups { location: 2, arrival: 1, departure: Some(3) },
        ),
        (
            &*VISIT_LOCATION_ONE_TIME,
            VisitGroups { location: 1, arrival: 2, departure: None },
        ),
    ];
    if let Some(known) = known {
        patterns.push((known, VisitGroups { location: 1, arrival: 2, departure: Some(3) }));
    }

    let times = TimeExtractor::new(extractor.reference().patterns());
    let parse_time = |s: &str| times.extract(s).map(|m| m.value);

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut drafts = Vec::new();

    for (regex, groups) in patterns {
        for caps in regex.captures_iter(text) {
            let (Some(whole), Some(location), Some(arrival)) =
                (caps.get(0), caps.get(groups.location), caps.get(groups.arrival))
            else {
                continue;
            };
            // Skip meridiem words borrowed from the previous time
            let lead = LEADING_MERIDIEM.find(location.as_str()).map_or(0, |m| m.end());
            let start = (location.start() + lead).min(arrival.start());
            let end = whole.end();
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }

            let Some(raw) = plausible_location(location.as_str()) else {
                continue;
            };
            let Some((location, confidence)) = resolve_location(extractor, &raw) else {
                continue;
            };

            claimed.push((start, end));
            drafts.push(VisitDraft {
                position: start,
                location,
                confidence,
                arrival: parse_time(arrival.as_str()),
                departure: groups
                    .departure
                    .and_then(|g| caps.get(g))
                    .and_then(|m| parse_time(m.as_str())),
                notes: None,
                source: VisitSource::PatternScan,
            });
        }
    }

    drafts
}

/// Distinct known/corrected locations in text order, paired with times
/// `(2i, 2i + 1)`.
fn pair_positionally(extractor: &DriverLogExtractor, text: &str) -> Vec<VisitDraft> {
    let reference = extractor.reference();
    let locations = LocationExtractor::new(reference, extractor.config().location);

    let mut hits = locations.known_occurrences(text);
    hits.extend(
        reference
            .location_corrections()
            .occurrences(text)
            .into_iter()
            .map(|(start, end, _)| (&text[start..end], start, end)),
    );
    hits.sort_by_key(|(_, start, _)| *start);

    let mut found: Vec<(usize, String, f32)> = Vec::new();
    for (raw, start, _) in hits {
        if let Some((location, confidence)) = resolve_location(extractor, raw) {
            if !found.iter().any(|(_, l, _)| *l == location) {
                found.push((start, location, confidence));
            }
        }
    }

    let times: Vec<NaiveTime> = TimeExtractor::new(reference.patterns())
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .collect();

    found
        .into_iter()
        .enumerate()
        .map(|(i, (position, location, confidence))| VisitDraft {
            position,
            location,
            confidence,
            arrival: times.get(2 * i).copied(),
            departure: times.get(2 * i + 1).copied(),
            notes: None,
            source: VisitSource::PositionalFallback,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference::ReferenceData;
    use std::sync::Arc;

    fn extractor() -> DriverLogExtractor {
        let reference = ReferenceData::builder()
            .names(["Sorwar"])
            .locations(["Al Khor", "Lulu Hypermarket", "Doha Port"])
            .category("Lulu", ["Lulu Hypermarket"])
            .location_correction("Sonwan", "Sorwar")
            .build()
            .unwrap();
        DriverLogExtractor::new(Arc::new(reference))
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_plausible_location() {
        assert_eq!(plausible_location("AM Al Khor").as_deref(), Some("Al Khor"));
        assert_eq!(plausible_location("Start Time"), None);
        assert_eq!(plausible_location("PM"), None);
        assert_eq!(plausible_location("Loading to Doha"), Some("Loading to Doha".to_string()));
    }

    #[test]
    fn test_pattern_scan_in_text_order() {
        let extractor = extractor();
        let text = "Driver: Sorwar 03/18/2024\nLulu Hyper 7:45 AM 9:40 AM\n10:15 AM Doha Port 11:00 AM";
        let visits = extract(&extractor, text, "doc-7");

        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].location, "Lulu Hypermarket");
        assert_eq!(visits[0].location_category, "Lulu");
        assert_eq!(visits[0].arrival_time, Some(hm(7, 45)));
        assert_eq!(visits[0].departure_time, Some(hm(9, 40)));
        assert_eq!(visits[1].location, "Doha Port");
        assert_eq!(visits[1].location_category, "Other");
        assert_eq!(visits[1].arrival_time, Some(hm(10, 15)));

        for (i, visit) in visits.iter().enumerate() {
            assert_eq!(visit.visit_sequence, i as u32 + 1);
            assert_eq!(visit.driver_name, "Sorwar");
            assert_eq!(visit.visit_date, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
            assert_eq!(visit.document_id, "doc-7");
            assert_eq!(visit.source, VisitSource::PatternScan);
        }
    }

    #[test]
    fn test_single_line_stops() {
        let extractor = extractor();
        let text = "Al Khor 7:00 AM 7:30 AM Doha Port 9:15 AM Lulu Hypermarket 10:00 AM 10:30 AM";
        let visits = extract(&extractor, text, "doc");

        let stops: Vec<(&str, Option<NaiveTime>, Option<NaiveTime>)> = visits
            .iter()
            .map(|v| (v.location.as_str(), v.arrival_time, v.departure_time))
            .collect();
        assert_eq!(
            stops,
            vec![
                ("Al Khor", Some(hm(7, 0)), Some(hm(7, 30))),
                ("Doha Port", Some(hm(9, 15)), None),
                ("Lulu Hypermarket", Some(hm(10, 0)), Some(hm(10, 30))),
            ]
        );
        let sequence: Vec<u32> = visits.iter().map(|v| v.visit_sequence).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
    }

    #[test]
    fn test_single_line_unknown_stop_kept() {
        let extractor = extractor();
        let text = "Al Khor 7:00 AM 7:30 AM Warehouse Nine 9:15 AM Lulu Hypermarket 10:00 AM";
        let visits = extract(&extractor, text, "doc");

        let locations: Vec<&str> = visits.iter().map(|v| v.location.as_str()).collect();
        assert_eq!(locations, vec!["Al Khor", "Warehouse Nine", "Lulu Hypermarket"]);
        assert_eq!(visits[1].arrival_time, Some(hm(9, 15)));
        assert_eq!(visits[1].confidence, 0.3);
    }

    #[test]
    fn test_positional_fallback() {
        let extractor = extractor();
        let text = "stops: al khor, doha port\n07:00, 08:00, 09:30";
        let visits = extract(&extractor, text, "doc");

        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].location, "Al Khor");
        assert_eq!(visits[0].arrival_time, Some(hm(7, 0)));
        assert_eq!(visits[0].departure_time, Some(hm(8, 0)));
        assert_eq!(visits[1].location, "Doha Port");
        assert_eq!(visits[1].arrival_time, Some(hm(9, 30)));
        assert_eq!(visits[1].departure_time, None);
        assert!(visits.iter().all(|v| v.source == VisitSource::PositionalFallback));
    }

    #[test]
    fn test_nothing_found() {
        let extractor = extractor();
        assert!(extract(&extractor, "nothing to see", "doc").is_empty());
    }
}
