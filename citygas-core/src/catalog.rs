//! Static methodology configuration keyed by GPC slot reference number.
//!
//! The catalog is built once at start-up and handed by reference to whatever
//! needs it; lookups never fail, an unknown reference simply offers direct
//! measurement only.

use crate::error::CityGasError;
use citygas_schemas::{
    file_formats::CatalogFile,
    methodology::{CatalogEntry, Methodology, SuggestedActivity},
    reference::GpcReference,
};
use std::collections::{BTreeMap, HashSet};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

pub const DIRECT_MEASURE_ID: &str = "direct-measure";

/// Methodologies offered for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodologyOptions<'a> {
    pub methodologies: &'a [Methodology],
    pub direct_measure: &'a Methodology,
}

#[derive(Debug, Clone)]
pub struct MethodologyCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    fallback_direct_measure: Methodology,
}

impl Default for MethodologyCatalog {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback_direct_measure: default_direct_measure(),
        }
    }
}

fn default_direct_measure() -> Methodology {
    Methodology {
        id: DIRECT_MEASURE_ID.to_string(),
        disabled: false,
        activities: Vec::new(),
        input_required: Vec::new(),
        formula: None,
        extra_fields: Vec::new(),
        suggested_activities: Vec::new(),
        suggested_activities_id: None,
    }
}

/// Any methodology id mentioning direct measurement is stored as `direct-measure`.
pub fn input_methodology(methodology_id: &str) -> &str {
    if is_direct_measure(methodology_id) {
        DIRECT_MEASURE_ID
    } else {
        methodology_id
    }
}

pub fn is_direct_measure(methodology_id: &str) -> bool {
    methodology_id.contains(DIRECT_MEASURE_ID)
}

fn validate_entry(reference: &str, entry: &CatalogEntry) -> Result<(), CityGasError> {
    let mut seen = HashSet::new();
    for methodology in &entry.methodologies {
        if methodology.id.trim().is_empty() {
            return Err(CityGasError::Configuration(format!(
                "methodology without id under '{}'",
                reference
            )));
        }
        if is_direct_measure(&methodology.id) {
            return Err(CityGasError::Configuration(format!(
                "'{}' under '{}' must be declared as the direct measure",
                methodology.id, reference
            )));
        }
        if !seen.insert(methodology.id.as_str()) {
            return Err(CityGasError::Configuration(format!(
                "duplicate methodology '{}' under '{}'",
                methodology.id, reference
            )));
        }
    }
    if let Some(direct) = &entry.direct_measure {
        if !is_direct_measure(&direct.id) {
            return Err(CityGasError::Configuration(format!(
                "direct measure '{}' under '{}' is not a direct-measure id",
                direct.id, reference
            )));
        }
    }
    Ok(())
}

impl MethodologyCatalog {
    /// Builds a catalog from raw entries. Malformed entries are logged and
    /// reduced to direct measurement only; entries keyed by something that is
    /// not a slot reference number are dropped.
    pub fn from_entries(entries: BTreeMap<String, CatalogEntry>) -> Self {
        let mut catalog = Self::default();
        for (reference, mut entry) in entries {
            match reference.parse::<GpcReference>() {
                Ok(parsed) if parsed.is_slot() => {}
                _ => {
                    let err = CityGasError::Configuration(format!(
                        "catalog key '{}' is not a slot reference number",
                        reference
                    ));
                    warn!("{}; entry ignored", err);
                    continue;
                }
            }
            if let Err(err) = validate_entry(&reference, &entry) {
                warn!("{}; offering direct measurement only", err);
                entry.methodologies.clear();
                if entry
                    .direct_measure
                    .as_ref()
                    .map_or(false, |direct| !is_direct_measure(&direct.id))
                {
                    entry.direct_measure = None;
                }
            }
            catalog.entries.insert(reference, entry);
        }
        catalog
    }

    /// Loads and merges every `*.yaml`/`*.yml` catalog file in a directory.
    /// A reference number defined twice keeps the entry read last.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CityGasError> {
        let dir = dir.as_ref();
        let display = dir.display().to_string();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| CityGasError::FileIO(display.clone(), e))? {
            let path = entry
                .map_err(|e| CityGasError::FileIO(display.clone(), e))?
                .path();
            if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut merged = BTreeMap::new();
        for path in paths {
            let path_str = path.display().to_string();
            let content =
                fs::read_to_string(&path).map_err(|e| CityGasError::FileIO(path_str.clone(), e))?;
            let file: CatalogFile = serde_yaml::from_str(&content)
                .map_err(|e| CityGasError::YamlParsing(path_str.clone(), e))?;
            debug!(
                "catalog file {} (schema {}) has {} entries",
                path_str,
                file.schema_version,
                file.entries.len()
            );
            merged.extend(file.entries);
        }

        let catalog = Self::from_entries(merged);
        info!("methodology catalog loaded with {} slots", catalog.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn methodologies_for(&self, reference: &str) -> MethodologyOptions<'_> {
        match self.entries.get(reference) {
            Some(entry) => MethodologyOptions {
                methodologies: &entry.methodologies,
                direct_measure: entry
                    .direct_measure
                    .as_ref()
                    .unwrap_or(&self.fallback_direct_measure),
            },
            None => {
                debug!("no catalog entry for '{}'", reference);
                MethodologyOptions {
                    methodologies: &[],
                    direct_measure: &self.fallback_direct_measure,
                }
            }
        }
    }

    /// Finds a methodology (or direct measure) by id, either under one
    /// reference number or, when `reference` is `None`, anywhere in the catalog.
    pub fn find_methodology(&self, methodology_id: &str, reference: Option<&str>) -> Option<&Methodology> {
        match reference {
            Some(reference) => {
                let options = self.methodologies_for(reference);
                options
                    .methodologies
                    .iter()
                    .find(|m| m.id == methodology_id)
                    .or_else(|| (options.direct_measure.id == methodology_id).then_some(options.direct_measure))
            }
            None => self
                .entries
                .values()
                .flat_map(|entry| entry.methodologies.iter().chain(entry.direct_measure.iter()))
                .find(|m| m.id == methodology_id)
                .or_else(|| {
                    (self.fallback_direct_measure.id == methodology_id)
                        .then_some(&self.fallback_direct_measure)
                }),
        }
    }

    /// Starter activities for a chosen methodology of a slot.
    pub fn suggested_activities(&self, reference: &str, methodology_id: &str) -> &[SuggestedActivity] {
        let options = self.methodologies_for(reference);
        let methodology = if is_direct_measure(methodology_id) {
            Some(options.direct_measure)
        } else {
            options.methodologies.iter().find(|m| m.id == methodology_id)
        };
        methodology
            .map(|m| m.suggested_activities.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citygas_schemas::methodology::Prefill;

    fn methodology(id: &str) -> Methodology {
        Methodology {
            id: id.to_string(),
            input_required: vec!["fuel-type".to_string()],
            ..default_direct_measure()
        }
    }

    fn catalog() -> MethodologyCatalog {
        let mut direct = default_direct_measure();
        direct.id = "direct-measure-stationary".to_string();
        let mut fuel = methodology("fuel-combustion-consumption");
        fuel.suggested_activities = vec![SuggestedActivity {
            id: "commercial-building-natural-gas".to_string(),
            prefills: vec![Prefill {
                key: "fuel-type".to_string(),
                value: "natural-gas".to_string(),
            }],
        }];
        let mut entries = BTreeMap::new();
        entries.insert(
            "I.1.1".to_string(),
            CatalogEntry {
                methodologies: vec![fuel, methodology("sampling-scaled-data")],
                direct_measure: Some(direct),
            },
        );
        entries.insert(
            "II.1.1".to_string(),
            CatalogEntry {
                methodologies: vec![methodology("fuel-sales"), methodology("fuel-sales")],
                direct_measure: None,
            },
        );
        entries.insert("not-a-ref".to_string(), CatalogEntry::default());
        MethodologyCatalog::from_entries(entries)
    }

    #[test]
    fn known_reference_lists_methodologies_and_direct_measure() {
        let catalog = catalog();
        let options = catalog.methodologies_for("I.1.1");
        let ids: Vec<_> = options.methodologies.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["fuel-combustion-consumption", "sampling-scaled-data"]);
        assert_eq!(options.direct_measure.id, "direct-measure-stationary");
    }

    #[test]
    fn unknown_reference_offers_only_direct_measure() {
        let catalog = catalog();
        let options = catalog.methodologies_for("VI.9.9");
        assert!(options.methodologies.is_empty());
        assert_eq!(options.direct_measure.id, DIRECT_MEASURE_ID);
    }

    #[test]
    fn malformed_entry_degrades_to_direct_measure() {
        let catalog = catalog();
        let options = catalog.methodologies_for("II.1.1");
        assert!(options.methodologies.is_empty());
        assert_eq!(options.direct_measure.id, DIRECT_MEASURE_ID);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn finds_methodologies_with_and_without_reference() {
        let catalog = catalog();
        assert!(catalog.find_methodology("sampling-scaled-data", Some("I.1.1")).is_some());
        assert!(catalog.find_methodology("sampling-scaled-data", Some("II.1.1")).is_none());
        assert!(catalog.find_methodology("direct-measure-stationary", None).is_some());
        assert!(catalog.find_methodology("does-not-exist", None).is_none());
    }

    #[test]
    fn suggested_activities_follow_the_selected_methodology() {
        let catalog = catalog();
        let suggested = catalog.suggested_activities("I.1.1", "fuel-combustion-consumption");
        assert_eq!(suggested.len(), 1);
        assert_eq!(suggested[0].prefills[0].value, "natural-gas");
        assert!(catalog.suggested_activities("I.1.1", "direct-measure-stationary").is_empty());
    }

    #[test]
    fn direct_measure_ids_are_normalised() {
        assert_eq!(input_methodology("direct-measure-stationary"), "direct-measure");
        assert_eq!(input_methodology("fuel-sales"), "fuel-sales");
    }

    #[test]
    fn loads_and_merges_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("stationary.yaml"),
            "schema_version: \"1\"\nentries:\n  I.1.1:\n    methodologies:\n      - id: fuel-combustion-consumption\n        input_required: [fuel-type]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("waste.yml"),
            "schema_version: \"1\"\nentries:\n  III.1.1:\n    direct_measure:\n      id: direct-measure-waste\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = MethodologyCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.methodologies_for("III.1.1").direct_measure.id,
            "direct-measure-waste"
        );
    }
}
