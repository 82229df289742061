//! Reference data: known values, correction tables and pattern libraries.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::log::rules::library::{PatternLibrary, PatternSpec};
use crate::log::rules::matching::CorrectionTable;
use crate::log::rules::patterns::TIME_FRAGMENT;
use crate::models::log::OTHER_CATEGORY;

/// On-disk reference file format.
///
/// Correction objects keep their key order; it is lookup precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceFile {
    pub names: Vec<String>,
    pub vehicles: Vec<String>,
    pub locations: Vec<String>,
    /// Category (owning chain/company) -> its locations.
    pub location_categories: BTreeMap<String, Vec<String>>,
    pub name_corrections: CorrectionTable,
    pub vehicle_corrections: CorrectionTable,
    pub location_corrections: CorrectionTable,
    /// Pattern overrides; absent lists keep the built-in ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternSpec>,
}

/// Validated, immutable reference data shared by every extraction call.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    names: Vec<String>,
    vehicles: Vec<String>,
    locations: Vec<String>,
    categories: HashMap<String, String>,
    name_corrections: CorrectionTable,
    vehicle_corrections: CorrectionTable,
    location_corrections: CorrectionTable,
    patterns: PatternLibrary,
    known_location_pattern: Option<Regex>,
}

impl ReferenceData {
    /// Start building reference data in code.
    pub fn builder() -> ReferenceDataBuilder {
        ReferenceDataBuilder::default()
    }

    /// Parse and validate a reference file's JSON.
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        let file: ReferenceFile = serde_json::from_str(json)?;
        Self::from_reference_file(file)
    }

    /// Load and validate a reference file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let data = Self::from_json(&content)?;
        info!(
            "Loaded reference data from {}: {} names, {} vehicles, {} locations",
            path.display(),
            data.names.len(),
            data.vehicles.len(),
            data.locations.len()
        );
        Ok(data)
    }

    /// Validate a parsed reference file and derive the cached patterns.
    pub fn from_reference_file(file: ReferenceFile) -> std::result::Result<Self, ConfigError> {
        file.name_corrections.validate("name")?;
        file.vehicle_corrections.validate("vehicle")?;
        file.location_corrections.validate("location")?;

        let mut categories: HashMap<String, String> = HashMap::new();
        for (category, members) in &file.location_categories {
            for location in members {
                if let Some(first) = categories.get(location) {
                    if first != category {
                        return Err(ConfigError::DuplicateCategory {
                            location: location.clone(),
                            first: first.clone(),
                            second: category.clone(),
                        });
                    }
                    continue;
                }
                categories.insert(location.clone(), category.clone());
            }
        }

        let patterns = match &file.patterns {
            Some(spec) => PatternLibrary::compile(spec)?,
            None => PatternLibrary::default(),
        };

        let known_location_pattern = build_known_location_pattern(&file.locations)?;

        Ok(Self {
            names: file.names,
            vehicles: file.vehicles,
            locations: file.locations,
            categories,
            name_corrections: file.name_corrections,
            vehicle_corrections: file.vehicle_corrections,
            location_corrections: file.location_corrections,
            patterns,
            known_location_pattern,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn vehicles(&self) -> &[String] {
        &self.vehicles
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn name_corrections(&self) -> &CorrectionTable {
        &self.name_corrections
    }

    pub fn vehicle_corrections(&self) -> &CorrectionTable {
        &self.vehicle_corrections
    }

    pub fn location_corrections(&self) -> &CorrectionTable {
        &self.location_corrections
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Known location followed by one or two times, derived at load.
    pub fn known_location_pattern(&self) -> Option<&Regex> {
        self.known_location_pattern.as_ref()
    }

    /// Category of a location, `"Other"` when unmapped.
    pub fn category_of(&self, location: &str) -> &str {
        self.categories
            .get(location)
            .map(String::as_str)
            .unwrap_or(OTHER_CATEGORY)
    }
}

/// `(?i)(loc1|loc2|...)[ \t]*(TIME)(?:[ \t]+(TIME))?`, longest names first.
fn build_known_location_pattern(
    locations: &[String],
) -> std::result::Result<Option<Regex>, ConfigError> {
    let mut names: Vec<&str> = locations
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(None);
    }
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let alternatives: Vec<String> = names.iter().map(|name| regex::escape(name)).collect();
    let pattern = format!(
        r"(?i)({})[ \t]*({t})(?:[ \t]+({t}))?",
        alternatives.join("|"),
        t = TIME_FRAGMENT
    );

    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| ConfigError::InvalidPattern {
            field: "known location",
            pattern,
            source,
        })
}

/// Builder for [`ReferenceData`].
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataBuilder {
    file: ReferenceFile,
}

impl ReferenceDataBuilder {
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn vehicles<I, S>(mut self, vehicles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file.vehicles.extend(vehicles.into_iter().map(Into::into));
        self
    }

    pub fn locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file.locations.extend(locations.into_iter().map(Into::into));
        self
    }

    /// Map locations to a category.
    pub fn category<I, S>(mut self, category: impl Into<String>, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file
            .location_categories
            .entry(category.into())
            .or_default()
            .extend(locations.into_iter().map(Into::into));
        self
    }

    pub fn name_correction(mut self, mistake: impl Into<String>, correction: impl Into<String>) -> Self {
        self.file.name_corrections.push(mistake, correction);
        self
    }

    pub fn vehicle_correction(mut self, mistake: impl Into<String>, correction: impl Into<String>) -> Self {
        self.file.vehicle_corrections.push(mistake, correction);
        self
    }

    pub fn location_correction(mut self, mistake: impl Into<String>, correction: impl Into<String>) -> Self {
        self.file.location_corrections.push(mistake, correction);
        self
    }

    pub fn patterns(mut self, spec: PatternSpec) -> Self {
        self.file.patterns = Some(spec);
        self
    }

    pub fn build(self) -> std::result::Result<ReferenceData, ConfigError> {
        ReferenceData::from_reference_file(self.file)
    }
}

/// Reference data that can be swapped while extractions run.
///
/// Each call takes an `Arc` snapshot, so a swap never changes the tables
/// under an in-flight extraction.
#[derive(Debug, Default)]
pub struct SharedReference {
    current: RwLock<Arc<ReferenceData>>,
}

impl SharedReference {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// The reference data in effect right now.
    pub fn snapshot(&self) -> Arc<ReferenceData> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in new reference data, returning the previous table.
    pub fn replace(&self, data: ReferenceData) -> Arc<ReferenceData> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(data))
    }
}
