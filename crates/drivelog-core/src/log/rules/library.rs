//! Ordered, typed pattern libraries for dates, times, vehicles and quantities.
//!
//! List order is precedence. The library compiles from a [`PatternSpec`] so
//! reference files can override any list; a pattern that does not compile or
//! lacks the capture groups its field needs fails at load time.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the three captures of a date pattern map to year, month and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateLayout {
    /// `03/15/2024`; day-first is tried when month-first is not a valid date.
    MonthDayYear,
    /// `2024-03-15`
    YearMonthDay,
    /// `15.03.2024`
    DayMonthYear,
    /// `15 Mar 2024`
    DayMonthNameYear,
    /// `Mar 15, 2024`
    MonthNameDayYear,
}

impl DateLayout {
    /// Build a date from the three captured groups.
    pub fn parse(self, first: &str, second: &str, third: &str) -> Option<NaiveDate> {
        match self {
            DateLayout::MonthDayYear => {
                let month: u32 = first.parse().ok()?;
                let day: u32 = second.parse().ok()?;
                let year = parse_year(third)?;
                NaiveDate::from_ymd_opt(year, month, day)
                    .or_else(|| NaiveDate::from_ymd_opt(year, day, month))
            }
            DateLayout::YearMonthDay => {
                let year = parse_year(first)?;
                NaiveDate::from_ymd_opt(year, second.parse().ok()?, third.parse().ok()?)
            }
            DateLayout::DayMonthYear => {
                let year = parse_year(third)?;
                NaiveDate::from_ymd_opt(year, second.parse().ok()?, first.parse().ok()?)
            }
            DateLayout::DayMonthNameYear => {
                let year = parse_year(third)?;
                NaiveDate::from_ymd_opt(year, month_from_name(second)?, first.parse().ok()?)
            }
            DateLayout::MonthNameDayYear => {
                let year = parse_year(third)?;
                NaiveDate::from_ymd_opt(year, month_from_name(first)?, second.parse().ok()?)
            }
        }
    }
}

/// Parse a four-digit year, or a two-digit one as 2000-2099.
pub fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        4 => Some(year),
        2 => Some(2000 + year),
        _ => None,
    }
}

/// English month name or abbreviation to number.
pub fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// A date pattern with the layout of its three capture groups.
#[derive(Debug, Clone)]
pub struct DatePattern {
    pub layout: DateLayout,
    pub regex: Regex,
}

/// Serializable date pattern source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatePatternSpec {
    pub layout: DateLayout,
    pub pattern: String,
}

const MONTHS: &str = "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec";

/// Pattern sources, one ordered list per field type.
///
/// Missing lists in a reference file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSpec {
    pub dates: Vec<DatePatternSpec>,
    /// Named groups: `hour` (required), `minute`, `meridiem`.
    pub times: Vec<String>,
    pub vehicles: Vec<String>,
    pub distances: Vec<String>,
    pub fuel: Vec<String>,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            dates: vec![
                DatePatternSpec {
                    layout: DateLayout::MonthDayYear,
                    pattern: r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b".to_string(),
                },
                DatePatternSpec {
                    layout: DateLayout::YearMonthDay,
                    pattern: r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b".to_string(),
                },
                DatePatternSpec {
                    layout: DateLayout::DayMonthNameYear,
                    pattern: format!(r"(?i)\b(\d{{1,2}})\s+((?:{MONTHS})[a-z]*)\.?\s+(\d{{4}})\b"),
                },
                DatePatternSpec {
                    layout: DateLayout::MonthNameDayYear,
                    pattern: format!(r"(?i)\b((?:{MONTHS})[a-z]*)\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\b"),
                },
                DatePatternSpec {
                    layout: DateLayout::DayMonthYear,
                    pattern: r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b".to_string(),
                },
            ],
            times: vec![
                r"(?i)\b(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<meridiem>[ap])\.?m\b\.?".to_string(),
                r"(?i)\b(?P<hour>\d{1,2})\.(?P<minute>\d{2})\s*(?P<meridiem>[ap])\.?m\b\.?".to_string(),
                r"(?i)\b(?P<hour>\d{1,2})\s*(?P<meridiem>[ap])\.?m\b\.?".to_string(),
                r"\b(?P<hour>\d{1,2}):(?P<minute>\d{2})\b".to_string(),
            ],
            vehicles: vec![
                r"(?i)\b(?:vehicle|truck|unit|car|van|bus|plate)\b(?:[ \t]*(?:id|no|number)\b\.?)?[ \t]*(?:/[ \t]*plate)?[ \t]*[#:\-]*[ \t]*(?-i:([A-Z]{0,4}-?\d{2,6}[A-Z]?))\b".to_string(),
                r"\b([A-Z]{2,4}-?\d{2,4})\b".to_string(),
            ],
            distances: vec![
                r"(?i)\b(\d+\.?\d*)\s*miles?\b".to_string(),
                r"(?i)\bmiles?[:\s]*(\d+\.?\d*)".to_string(),
                r"(?i)\bdistance[:\s]*(\d+\.?\d*)".to_string(),
                r"(?i)\bkm[:\s]*(\d+\.?\d*)".to_string(),
                r"(?i)\b(\d+\.?\d*)\s*km\b".to_string(),
            ],
            fuel: vec![
                r"(?i)\b(\d+\.?\d*)\s*gal(?:lon)?s?\b".to_string(),
                r"(?i)\bfuel[:\s]*(\d+\.?\d*)".to_string(),
                r"(?i)\bgas[:\s]*(\d+\.?\d*)".to_string(),
                r"(?i)\b(\d+\.?\d*)\s*lit(?:er|re)s?\b".to_string(),
                r"(?i)\b(\d+\.?\d*)\s*l\b".to_string(),
            ],
        }
    }
}

/// Compiled pattern lists.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    pub dates: Vec<DatePattern>,
    pub times: Vec<Regex>,
    pub vehicles: Vec<Regex>,
    pub distances: Vec<Regex>,
    pub fuel: Vec<Regex>,
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

fn require_groups(field: &'static str, regex: &Regex, groups: usize) -> Result<(), ConfigError> {
    // captures_len counts the implicit whole-match group
    if regex.captures_len() - 1 < groups {
        return Err(ConfigError::MissingCaptureGroup {
            field,
            pattern: regex.as_str().to_string(),
            group: groups.to_string(),
        });
    }
    Ok(())
}

fn compile_list(field: &'static str, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            let regex = compile(field, pattern)?;
            require_groups(field, &regex, 1)?;
            Ok(regex)
        })
        .collect()
}

impl PatternLibrary {
    /// Compile and validate every list of a spec.
    pub fn compile(spec: &PatternSpec) -> Result<Self, ConfigError> {
        let dates = spec
            .dates
            .iter()
            .map(|date| {
                let regex = compile("date", &date.pattern)?;
                require_groups("date", &regex, 3)?;
                Ok(DatePattern {
                    layout: date.layout,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let times = spec
            .times
            .iter()
            .map(|pattern| {
                let regex = compile("time", pattern)?;
                if !regex.capture_names().any(|name| name == Some("hour")) {
                    return Err(ConfigError::MissingCaptureGroup {
                        field: "time",
                        pattern: pattern.clone(),
                        group: "hour".to_string(),
                    });
                }
                Ok(regex)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            dates,
            times,
            vehicles: compile_list("vehicle", &spec.vehicles)?,
            distances: compile_list("distance", &spec.distances)?,
            fuel: compile_list("fuel", &spec.fuel)?,
        })
    }

    /// First date pattern (library order) that has a valid match, with its
    /// valid matches in text order.
    pub fn date_matches<'t>(&self, text: &'t str) -> Vec<(NaiveDate, regex::Match<'t>)> {
        for pattern in &self.dates {
            let found: Vec<_> = pattern
                .regex
                .captures_iter(text)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let date = pattern.layout.parse(
                        caps.get(1)?.as_str(),
                        caps.get(2)?.as_str(),
                        caps.get(3)?.as_str(),
                    )?;
                    Some((date, whole))
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

lazy_static! {
    static ref DEFAULT_LIBRARY: PatternLibrary = PatternLibrary::compile(&PatternSpec::default())
        .expect("built-in patterns compile");
}

impl Default for PatternLibrary {
    fn default() -> Self {
        DEFAULT_LIBRARY.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_compiles() {
        let library = PatternLibrary::default();
        assert_eq!(library.dates.len(), 5);
        assert_eq!(library.times.len(), 4);
    }

    #[test]
    fn test_date_layouts() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(DateLayout::MonthDayYear.parse("03", "15", "2024"), Some(date(2024, 3, 15)));
        // 15/03 is not a valid month-first date
        assert_eq!(DateLayout::MonthDayYear.parse("15", "03", "2024"), Some(date(2024, 3, 15)));
        assert_eq!(DateLayout::MonthDayYear.parse("31", "31", "2024"), None);
        assert_eq!(DateLayout::DayMonthNameYear.parse("15", "March", "2024"), Some(date(2024, 3, 15)));
        assert_eq!(DateLayout::MonthNameDayYear.parse("Feb", "30", "2024"), None);
    }

    #[test]
    fn test_date_matches_uses_first_matching_pattern() {
        let library = PatternLibrary::default();
        let found = library.date_matches("Date: 2024-03-15 then 03/16/2024");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());

        let found = library.date_matches("Shift on Mar 15, 2024");
        assert_eq!(found[0].1.as_str(), "Mar 15, 2024");
    }

    #[test]
    fn test_rejects_invalid_regex() {
        let spec = PatternSpec {
            fuel: vec![r"(\d+".to_string()],
            ..PatternSpec::default()
        };
        assert!(matches!(
            PatternLibrary::compile(&spec),
            Err(ConfigError::InvalidPattern { field: "fuel", .. })
        ));
    }

    #[test]
    fn test_rejects_missing_groups() {
        let spec = PatternSpec {
            times: vec![r"\d{1,2}:\d{2}".to_string()],
            ..PatternSpec::default()
        };
        assert!(matches!(
            PatternLibrary::compile(&spec),
            Err(ConfigError::MissingCaptureGroup { field: "time", .. })
        ));

        let spec = PatternSpec {
            dates: vec![DatePatternSpec {
                layout: DateLayout::YearMonthDay,
                pattern: r"(\d{4})-(\d{2})".to_string(),
            }],
            ..PatternSpec::default()
        };
        assert!(matches!(
            PatternLibrary::compile(&spec),
            Err(ConfigError::MissingCaptureGroup { field: "date", .. })
        ));
    }
}
