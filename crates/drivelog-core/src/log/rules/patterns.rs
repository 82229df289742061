//! Fixed regex patterns for driver log extraction.
//!
//! Field pattern *libraries* (dates, times, vehicles, distances, fuel) are
//! configurable and live in [`super::library`]; the anchors here are structural
//! and shared by every configuration.

use lazy_static::lazy_static;
use regex::Regex;

/// Time fragment used inside the visit and table patterns.
pub const TIME_FRAGMENT: &str = r"\d{1,2}[:.]\d{2}(?:\s*[AaPp]\.?[Mm]\b\.?)?";

/// Header cells of the arrival/departure table; lines containing them are skipped.
pub const TABLE_HEADER_TOKENS: &[&str] = &["time arrived", "time departed", "location", "instructions"];

/// Phrases that identify a structured daily time log form.
pub const FORM_INDICATORS: &[&str] = &[
    "Driver's Daily Time Log",
    "Time Log & Run Sheet",
    "Time Arrived",
    "Time Departed",
    "Location & Purpose",
    "Daily Movement & Stop Log",
    "Vehicle ID / Plate",
    "Driver Name:",
    "Labor Name:",
    "Time Started Work:",
    "Time Ended Work:",
];

lazy_static! {
    // Field labels; anchored captures are cut at the first one they contain
    pub static ref FIELD_LABEL: Regex = Regex::new(
        r"(?i)\b(?:date|vehicle|truck|unit|plate|id|time|start(?:ed)?|end(?:ed)?|labou?r|name|driver|operator|employee|location|instructions?|purpose|miles?|km|distance|fuel|gas|gallons?|lit(?:er|re)s?|notes?|comments?|remarks?|from|to|arrived|departed|signature|daily|log|sheet|run|helper|work|shift)\b"
    ).unwrap();

    // Driver name anchors
    pub static ref DRIVER_ANCHOR: Regex = Regex::new(
        r"(?i)\bdriver(?:'s)?(?:[ \t]+name)?[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    pub static ref NAME_ANCHOR: Regex = Regex::new(
        r"(?i)\bname[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    pub static ref OPERATOR_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:operator|employee)[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    // Labor name anchor
    pub static ref LABOR_ANCHOR: Regex = Regex::new(
        r"(?i)\blabou?r(?:[ \t]+name)?[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    // Bare vehicle numbers
    pub static ref BARE_VEHICLE_NUMBER: Regex = Regex::new(
        r"\b(\d{5,6})\b"
    ).unwrap();

    // Location anchors
    pub static ref START_LOCATION_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:start(?:ing)?(?:[ \t]+location)?|from)\b[ \t]*[:\-]?[ \t]*([A-Za-z0-9][A-Za-z0-9 \t,.\-]{4,49})"
    ).unwrap();

    pub static ref END_LOCATION_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:end(?:ing)?(?:[ \t]+location)?|to)\b[ \t]*[:\-]?[ \t]*([A-Za-z0-9][A-Za-z0-9 \t,.\-]{4,49})"
    ).unwrap();

    pub static ref LOCATION_ANCHOR: Regex = Regex::new(
        r"(?i)\blocation\b[ \t]*[:\-]?[ \t]*([A-Za-z0-9][A-Za-z0-9 \t,.\-]{4,49})"
    ).unwrap();

    // Notes anchors
    pub static ref NOTES_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:notes?|comments?|remarks?)[ \t]*[:\-]?[ \t]*([A-Za-z0-9][A-Za-z0-9 \t,.\-]{9,199})"
    ).unwrap();

    // Line-oriented segmentation: lines that open a new entry
    pub static ref ENTRY_HEADER_WORD: Regex = Regex::new(
        r"(?i)\b(?:driver|name)\b"
    ).unwrap();

    // Structured form header fields, stopping at the next header keyword
    pub static ref FORM_DRIVER: Regex = Regex::new(
        r"(?i)\bdriver(?:'s)?[ \t]*name[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    pub static ref FORM_LABOR: Regex = Regex::new(
        r"(?i)\blabou?r[ \t]*name[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z \t]{1,29})"
    ).unwrap();

    pub static ref FORM_VEHICLE_PLATE: Regex = Regex::new(
        r"(?i)\bvehicle[ \t]*id[ \t]*/?[ \t]*plate[ \t]*[:#]?[ \t]*([0-9]{5,6})\b"
    ).unwrap();

    pub static ref FORM_VEHICLE: Regex = Regex::new(
        r"(?i)\b(?:vehicle|plate)[ \t]*[:#]?[ \t]*([0-9]{5,6})\b"
    ).unwrap();

    pub static ref FORM_DATE: Regex = Regex::new(
        r"(?i)\bdate[ \t]*[:\-]?[ \t]*(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b"
    ).unwrap();

    // Table rows
    pub static ref TABLE_TRAILING_LOCATION: Regex = Regex::new(
        r"^[ \t]*([A-Za-z][A-Za-z \t\-&'/]{2,29})"
    ).unwrap();

    pub static ref TABLE_BETWEEN_LOCATION: Regex = Regex::new(
        r"^[ \t]*([A-Za-z][A-Za-z \t\-&'/]{2,29}?)[ \t]*$"
    ).unwrap();

    pub static ref REFERENCE_NUMBER: Regex = Regex::new(
        r"\b(\d{6,10})\b"
    ).unwrap();

    // Free-text visit patterns, in precedence order
    pub static ref VISIT_LOCATION_TWO_TIMES: Regex = Regex::new(&format!(
        r"([A-Za-z][A-Za-z \t]{{2,24}})[ \t]+({t})[ \t]+({t})",
        t = TIME_FRAGMENT
    )).unwrap();

    pub static ref VISIT_TIME_LOCATION_TIME: Regex = Regex::new(&format!(
        r"({t})[ \t]+([A-Za-z][A-Za-z \t]{{2,24}})[ \t]+({t})",
        t = TIME_FRAGMENT
    )).unwrap();

    pub static ref VISIT_LOCATION_ONE_TIME: Regex = Regex::new(&format!(
        r"([A-Za-z][A-Za-z \t]{{2,24}})[ \t]+({t})",
        t = TIME_FRAGMENT
    )).unwrap();

    // Capitalized alphabetic word, for name pairs
    pub static ref CAPITALIZED_WORD: Regex = Regex::new(
        r"\b[A-Z][a-z]+\b"
    ).unwrap();

    // Meridiem words a location group picked up from the preceding time
    pub static ref LEADING_MERIDIEM: Regex = Regex::new(
        r"(?i)^(?:[ap]\.?m\.?[ \t]+)+"
    ).unwrap();

    // Bare meridiem words left at the edges of a captured location
    pub static ref MERIDIEM_WORD: Regex = Regex::new(
        r"(?i)^(?:[ap]\.?m\.?)$"
    ).unwrap();
}

/// Cut a captured value at the first field label it contains.
///
/// `"John Smith Date"` becomes `"John Smith"`; a capture that starts with a
/// label (`"Time"`) becomes empty.
pub fn cut_at_label(capture: &str) -> &str {
    let cut = match FIELD_LABEL.find(capture) {
        Some(m) => &capture[..m.start()],
        None => capture,
    };
    cut.trim().trim_end_matches([',', '.', '-']).trim()
}
