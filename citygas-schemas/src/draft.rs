//! Draft values for one subcategory/scope slot as typed by a user, before
//! they are saved as inventory and activity values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emission factor type that requires hand-entered per-gas factors.
pub const CUSTOM_EMISSION_FACTOR_TYPE: &str = "Add custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub activity_data_amount: Option<f64>,
    pub activity_data_unit: Option<String>,
    #[serde(default)]
    pub emission_factor_type: String,
    #[serde(default)]
    pub co2_emission_factor: f64,
    #[serde(default)]
    pub n2o_emission_factor: f64,
    #[serde(default)]
    pub ch4_emission_factor: f64,
    #[serde(default)]
    pub data_quality: String,
    #[serde(default)]
    pub source_reference: String,
    /// Methodology specific inputs keyed by field id.
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectMeasureDraft {
    #[serde(default)]
    pub co2_emissions: f64,
    #[serde(default)]
    pub ch4_emissions: f64,
    #[serde(default)]
    pub n2o_emissions: f64,
    #[serde(default)]
    pub data_quality: String,
    #[serde(default)]
    pub source_reference: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotDraft {
    #[serde(default)]
    pub methodology: String,
    pub activity: Option<ActivityDraft>,
    pub direct: Option<DirectMeasureDraft>,
}
