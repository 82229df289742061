//! Vehicle id extraction.

use super::matching::resolve;
use super::patterns::BARE_VEHICLE_NUMBER;
use super::{most_confident, ExtractionMatch, FieldExtractor};
use crate::models::config::MatchPolicy;
use crate::models::reference::ReferenceData;

/// Vehicle id extractor resolving against the known vehicles.
pub struct VehicleExtractor<'a> {
    reference: &'a ReferenceData,
    policy: MatchPolicy,
}

impl<'a> VehicleExtractor<'a> {
    pub fn new(reference: &'a ReferenceData, policy: MatchPolicy) -> Self {
        Self { reference, policy }
    }

    /// Anchored ids first, then correction hits, then bare 5-6 digit numbers.
    fn candidates<'t>(&self, text: &'t str) -> Vec<(&'t str, usize, usize)> {
        let mut candidates = Vec::new();

        for regex in &self.reference.patterns().vehicles {
            for caps in regex.captures_iter(text) {
                if let Some(group) = caps.get(1) {
                    candidates.push((group.as_str(), group.start(), group.end()));
                }
            }
        }

        for (start, end, _) in self.reference.vehicle_corrections().occurrences(text) {
            candidates.push((&text[start..end], start, end));
        }

        for m in BARE_VEHICLE_NUMBER.find_iter(text) {
            if !candidates.iter().any(|(_, s, e)| m.start() < *e && *s < m.end()) {
                candidates.push((m.as_str(), m.start(), m.end()));
            }
        }

        candidates
    }
}

impl FieldExtractor for VehicleExtractor<'_> {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        most_confident(self.extract_all(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text)
            .into_iter()
            .filter_map(|(raw, start, end)| {
                let resolution = resolve(
                    raw,
                    self.reference.vehicle_corrections(),
                    self.reference.vehicles(),
                    &self.policy,
                )?;
                let confidence = resolution.confidence();
                let value = resolution.into_value()?;
                Some(ExtractionMatch::new(value, confidence, raw).with_position(start, end))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_unverified() {
        let reference = ReferenceData::default();
        let extractor = VehicleExtractor::new(&reference, MatchPolicy::vehicles());
        let vehicle = extractor.extract("Vehicle ID: TRK001 Start Time: 8:00 AM").unwrap();
        assert_eq!(vehicle.value, "TRK001");
        assert_eq!(vehicle.confidence, 0.4);
    }

    #[test]
    fn test_known_vehicle() {
        let reference = ReferenceData::builder()
            .vehicles(["54321", "TRK-001"])
            .build()
            .unwrap();
        let extractor = VehicleExtractor::new(&reference, MatchPolicy::vehicles());

        let vehicle = extractor.extract("Vehicle ID / Plate: 54321").unwrap();
        assert_eq!(vehicle.value, "54321");
        assert_eq!(vehicle.confidence, 1.0);

        let vehicle = extractor.extract("truck # TRK001").unwrap();
        assert_eq!(vehicle.value, "TRK-001");
    }

    #[test]
    fn test_bare_number_and_correction() {
        let reference = ReferenceData::builder()
            .vehicles(["54321"])
            .vehicle_correction("S4321", "54321")
            .build()
            .unwrap();
        let extractor = VehicleExtractor::new(&reference, MatchPolicy::vehicles());

        assert_eq!(extractor.extract("plate s4321 parked").unwrap().value, "54321");
        assert_eq!(extractor.extract("parked at bay 98765").unwrap().value, "98765");
        assert!(extractor.extract("no vehicle here").is_none());
    }
}
