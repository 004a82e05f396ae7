use crate::{
    inventory::{ActivityValue, DataSource, EmissionsFactor, Inventory, InventoryValue},
    methodology::CatalogEntry,
    taxonomy::{Sector, SubCategory, SubSector},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A methodology catalog file: entries keyed by slot reference number.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub schema_version: String,
    pub entries: BTreeMap<String, CatalogEntry>,
}

/// A full inventory dataset as exported from the relational store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    pub schema_version: String,
    #[serde(default)]
    pub inventories: Vec<Inventory>,
    #[serde(default)]
    pub inventory_values: Vec<InventoryValue>,
    #[serde(default)]
    pub activity_values: Vec<ActivityValue>,
    #[serde(default)]
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub subsectors: Vec<SubSector>,
    #[serde(default)]
    pub subcategories: Vec<SubCategory>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub emissions_factors: Vec<EmissionsFactor>,
}

/// One row of the emissions factor seed CSV.
#[derive(Debug, Deserialize)]
pub struct EmissionsFactorRecord {
    pub id: String,
    pub gas: String,
    pub gpc_reference_number: Option<String>,
    pub emissions_per_activity: Option<f64>,
    pub units: Option<String>,
    pub region: Option<String>,
    pub data_source_id: Option<String>,
}
