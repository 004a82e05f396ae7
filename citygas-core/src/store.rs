//! The persistence collaborator and the per-request snapshot read from it.

use crate::error::CityGasError;
use citygas_schemas::{
    file_formats::{DatasetFile, EmissionsFactorRecord},
    inventory::{ActivityValue, DataSource, EmissionsFactor, Gas, Inventory, InventoryValue},
    taxonomy::{Sector, SubSector},
};
use std::collections::{HashMap, HashSet};
use std::{fs, path::Path};
use tracing::{info, warn};

/// Read access to persisted inventories. Writes belong to the CRUD layer.
pub trait InventoryStore {
    fn find_inventory(&self, inventory_id: &str) -> Result<Option<Inventory>, CityGasError>;
    fn find_inventory_values(&self, inventory_id: &str) -> Result<Vec<InventoryValue>, CityGasError>;
    fn find_activity_values(&self, inventory_id: &str) -> Result<Vec<ActivityValue>, CityGasError>;
    fn find_sectors(&self) -> Result<Vec<Sector>, CityGasError>;
    fn find_subsectors(&self) -> Result<Vec<SubSector>, CityGasError>;
    fn find_emissions_factors(&self) -> Result<Vec<EmissionsFactor>, CityGasError>;
    fn find_data_sources(&self) -> Result<Vec<DataSource>, CityGasError>;
}

/// Everything one aggregation or report needs, read once up front.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub inventory: Inventory,
    pub inventory_values: Vec<InventoryValue>,
    pub activity_values: Vec<ActivityValue>,
    pub sectors: Vec<Sector>,
    pub subsectors: Vec<SubSector>,
    pub emissions_factors: HashMap<String, EmissionsFactor>,
    pub data_sources: HashMap<String, DataSource>,
}

impl InventorySnapshot {
    pub fn fetch<S: InventoryStore + ?Sized>(store: &S, inventory_id: &str) -> Result<Self, CityGasError> {
        let inventory = store
            .find_inventory(inventory_id)?
            .ok_or_else(|| CityGasError::InventoryNotFound(inventory_id.to_string()))?;
        let snapshot = Self {
            inventory,
            inventory_values: store.find_inventory_values(inventory_id)?,
            activity_values: store.find_activity_values(inventory_id)?,
            sectors: store.find_sectors()?,
            subsectors: store.find_subsectors()?,
            emissions_factors: store
                .find_emissions_factors()?
                .into_iter()
                .map(|factor| (factor.id.clone(), factor))
                .collect(),
            data_sources: store
                .find_data_sources()?
                .into_iter()
                .map(|source| (source.datasource_id.clone(), source))
                .collect(),
        };
        info!(
            "fetched inventory {} with {} slots and {} activity values",
            inventory_id,
            snapshot.inventory_values.len(),
            snapshot.activity_values.len()
        );
        Ok(snapshot)
    }

    pub fn activities_of<'s>(&'s self, inventory_value_id: &'s str) -> impl Iterator<Item = &'s ActivityValue> + 's {
        self.activity_values
            .iter()
            .filter(move |activity| activity.inventory_value_id == inventory_value_id)
    }
}

/// A store backed by a dataset file exported from the relational store.
#[derive(Debug, Default)]
pub struct DatasetStore {
    dataset: DatasetFile,
}

impl DatasetStore {
    /// Reads a dataset from YAML, or JSON when the file ends in `.json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CityGasError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| CityGasError::FileIO(path_str.clone(), e))?;
        let dataset: DatasetFile = if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content).map_err(|e| CityGasError::YamlParsing(path_str.clone(), e))?
        };
        info!(
            "dataset {} (schema {}) loaded with {} inventories",
            path_str,
            dataset.schema_version,
            dataset.inventories.len()
        );
        Ok(Self { dataset })
    }

    /// Merges emissions factors from a seed CSV; rows replace factors with the same id.
    pub fn with_emissions_factor_csv<P: AsRef<Path>>(mut self, path: P) -> Result<Self, CityGasError> {
        let path_str = path.as_ref().display().to_string();
        let mut reader =
            csv::Reader::from_path(path.as_ref()).map_err(|e| CityGasError::CsvError(path_str.clone(), e))?;
        let mut loaded = 0;
        for result in reader.deserialize() {
            let record: EmissionsFactorRecord = result.map_err(|e| CityGasError::CsvError(path_str.clone(), e))?;
            let Some(gas) = Gas::parse(&record.gas) else {
                warn!("{}: factor {} has unknown gas '{}', skipped", path_str, record.id, record.gas);
                continue;
            };
            let factor = EmissionsFactor {
                id: record.id,
                gas,
                gpc_reference_number: record.gpc_reference_number,
                emissions_per_activity: record.emissions_per_activity,
                units: record.units,
                region: record.region,
                data_source_id: record.data_source_id,
            };
            self.dataset.emissions_factors.retain(|existing| existing.id != factor.id);
            self.dataset.emissions_factors.push(factor);
            loaded += 1;
        }
        info!("loaded {} emissions factors from {}", loaded, path_str);
        Ok(self)
    }

    pub fn dataset(&self) -> &DatasetFile {
        &self.dataset
    }

    /// Copies the derived caches of a recomputed snapshot back into the dataset.
    pub fn apply_snapshot(&mut self, snapshot: &InventorySnapshot) {
        if let Some(inventory) = self
            .dataset
            .inventories
            .iter_mut()
            .find(|inventory| inventory.inventory_id == snapshot.inventory.inventory_id)
        {
            inventory.total_emissions = snapshot.inventory.total_emissions;
        }
        let value_totals: HashMap<&str, Option<f64>> = snapshot
            .inventory_values
            .iter()
            .map(|value| (value.id.as_str(), value.co2eq))
            .collect();
        for value in self.dataset.inventory_values.iter_mut() {
            if let Some(co2eq) = value_totals.get(value.id.as_str()) {
                value.co2eq = *co2eq;
            }
        }
        let activity_totals: HashMap<&str, Option<f64>> = snapshot
            .activity_values
            .iter()
            .map(|activity| (activity.id.as_str(), activity.co2eq))
            .collect();
        for activity in self.dataset.activity_values.iter_mut() {
            if let Some(co2eq) = activity_totals.get(activity.id.as_str()) {
                activity.co2eq = *co2eq;
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CityGasError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let content = if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::to_string_pretty(&self.dataset)?
        } else {
            serde_yaml::to_string(&self.dataset).map_err(|e| CityGasError::YamlParsing(path_str.clone(), e))?
        };
        fs::write(path, content).map_err(|e| CityGasError::FileIO(path_str, e))
    }
}

impl InventoryStore for DatasetStore {
    fn find_inventory(&self, inventory_id: &str) -> Result<Option<Inventory>, CityGasError> {
        Ok(self
            .dataset
            .inventories
            .iter()
            .find(|inventory| inventory.inventory_id == inventory_id)
            .cloned())
    }

    fn find_inventory_values(&self, inventory_id: &str) -> Result<Vec<InventoryValue>, CityGasError> {
        Ok(self
            .dataset
            .inventory_values
            .iter()
            .filter(|value| value.inventory_id == inventory_id)
            .cloned()
            .collect())
    }

    fn find_activity_values(&self, inventory_id: &str) -> Result<Vec<ActivityValue>, CityGasError> {
        let owned: HashSet<&str> = self
            .dataset
            .inventory_values
            .iter()
            .filter(|value| value.inventory_id == inventory_id)
            .map(|value| value.id.as_str())
            .collect();
        Ok(self
            .dataset
            .activity_values
            .iter()
            .filter(|activity| owned.contains(activity.inventory_value_id.as_str()))
            .cloned()
            .collect())
    }

    fn find_sectors(&self) -> Result<Vec<Sector>, CityGasError> {
        Ok(self.dataset.sectors.clone())
    }

    fn find_subsectors(&self) -> Result<Vec<SubSector>, CityGasError> {
        Ok(self.dataset.subsectors.clone())
    }

    fn find_emissions_factors(&self) -> Result<Vec<EmissionsFactor>, CityGasError> {
        Ok(self.dataset.emissions_factors.clone())
    }

    fn find_data_sources(&self) -> Result<Vec<DataSource>, CityGasError> {
        Ok(self.dataset.data_sources.clone())
    }
}
