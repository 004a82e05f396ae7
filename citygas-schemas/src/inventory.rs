use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One city-year GHG inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub inventory_id: String,
    pub inventory_name: Option<String>,
    pub city_id: String,
    pub city_name: Option<String>,
    pub year: i32,
    pub population: Option<u64>,
    /// Cached grand total in kg CO2e. Derived from the activity values.
    pub total_emissions: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gas {
    Co2,
    Ch4,
    N2o,
}

impl Gas {
    pub const ALL: [Gas; 3] = [Gas::Co2, Gas::Ch4, Gas::N2o];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gas::Co2 => "CO2",
            Gas::Ch4 => "CH4",
            Gas::N2o => "N2O",
        }
    }

    /// Key used for the gas mass inside free-form activity data, e.g. `co2_amount`.
    pub fn amount_key(&self) -> &'static str {
        match self {
            Gas::Co2 => "co2_amount",
            Gas::Ch4 => "ch4_amount",
            Gas::N2o => "n2o_amount",
        }
    }

    pub fn parse(raw: &str) -> Option<Gas> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CO2" => Some(Gas::Co2),
            "CH4" => Some(Gas::Ch4),
            "N2O" => Some(Gas::N2o),
            _ => None,
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a GPC slot carries no estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotationKey {
    /// Not occurring.
    NO,
    /// Not estimated.
    NE,
    /// Confidential.
    C,
    /// Included elsewhere.
    IE,
}

impl NotationKey {
    pub fn code(&self) -> &'static str {
        match self {
            NotationKey::NO => "NO",
            NotationKey::NE => "NE",
            NotationKey::C => "C",
            NotationKey::IE => "IE",
        }
    }

    /// The form persisted in `InventoryValue::unavailable_reason`.
    pub fn as_unavailable_reason(&self) -> String {
        format!("reason_{}", self.code())
    }

    /// Accepts the stored `reason_<CODE>` form as well as the long form
    /// produced by the data entry forms (`not-estimated`, ...).
    pub fn from_unavailable_reason(raw: &str) -> Option<NotationKey> {
        let raw = raw.trim();
        let code = raw.strip_prefix("reason_").unwrap_or(raw);
        match code {
            "NO" | "no-occurrance" | "no-occurrence" => Some(NotationKey::NO),
            "NE" | "not-estimated" => Some(NotationKey::NE),
            "C" | "confidential-information" => Some(NotationKey::C),
            "IE" | "presented-elsewhere" => Some(NotationKey::IE),
            _ => None,
        }
    }
}

impl fmt::Display for NotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One (inventory, GPC slot) data record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryValue {
    pub id: String,
    pub inventory_id: String,
    pub gpc_reference_number: String,
    pub input_methodology: Option<String>,
    pub unavailable_reason: Option<String>,
    pub unavailable_explanation: Option<String>,
    /// Cached sum of the owned activity values, kg CO2e.
    pub co2eq: Option<f64>,
    pub datasource_id: Option<String>,
}

impl InventoryValue {
    pub fn is_unavailable(&self) -> bool {
        self.unavailable_reason
            .as_deref()
            .map_or(false, |reason| !reason.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityMetadata {
    /// Name of the activity data key holding the amount, e.g. `fuel-consumption`.
    /// The unit is then stored under `<title>-unit`.
    pub activity_title: Option<String>,
    pub data_quality: Option<String>,
    pub data_source: Option<String>,
}

/// One recorded activity under an `InventoryValue`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityValue {
    pub id: String,
    pub inventory_value_id: String,
    pub gpc_reference_number: Option<String>,
    #[serde(default)]
    pub activity_data: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: ActivityMetadata,
    /// Computed kg CO2e; never entered by hand.
    pub co2eq: Option<f64>,
    pub datasource_id: Option<String>,
    #[serde(default)]
    pub gas_values: Vec<GasValue>,
}

/// One gas's contribution within an activity value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasValue {
    pub id: String,
    pub gas: Gas,
    /// Gas mass in kilograms.
    pub gas_amount: Option<f64>,
    pub emissions_factor_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsFactor {
    pub id: String,
    pub gas: Gas,
    pub gpc_reference_number: Option<String>,
    pub emissions_per_activity: Option<f64>,
    pub units: Option<String>,
    pub region: Option<String>,
    pub data_source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSource {
    pub datasource_id: String,
    pub source_type: Option<String>,
    pub data_quality: Option<String>,
    pub notes: Option<String>,
    pub source_reference: Option<String>,
}
