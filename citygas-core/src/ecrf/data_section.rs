//! The per-reference data dictionary fed into the template.

use super::fields::{CellValue, FieldKey};
use crate::store::InventorySnapshot;
use citygas_schemas::inventory::{ActivityValue, Gas, InventoryValue, NotationKey};
use std::collections::BTreeMap;
use tracing::warn;

/// Fields that hold for every row rendered for one reference number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedFields {
    pub inventory_year: i32,
    pub gpc_reference_number: String,
    /// Set for any slot with an unavailable reason, recognised or not.
    pub unavailable: bool,
    pub notation_key: Option<NotationKey>,
    pub unavailable_explanation: Option<String>,
    pub input_methodology: Option<String>,
    pub total_co2e: Option<f64>,
}

/// Fields of one activity, rendered on its own row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFields {
    pub ghg_co2: Option<f64>,
    pub ghg_ch4: Option<f64>,
    pub ghg_n2o: Option<f64>,
    pub emission_factor_unit: Option<String>,
    pub emission_co2: Option<f64>,
    pub emission_ch4: Option<f64>,
    pub emission_n2o: Option<f64>,
    pub activity_amount: Option<CellValue>,
    pub activity_unit: Option<String>,
    pub data_quality: Option<String>,
    pub data_source: Option<String>,
    pub total_co2e: Option<f64>,
}

impl ActivityFields {
    fn set_gas(&mut self, gas: Gas, amount: Option<f64>, factor: Option<f64>) {
        match gas {
            Gas::Co2 => {
                self.ghg_co2 = amount;
                self.emission_co2 = factor;
            }
            Gas::Ch4 => {
                self.ghg_ch4 = amount;
                self.emission_ch4 = factor;
            }
            Gas::N2o => {
                self.ghg_n2o = amount;
                self.emission_n2o = factor;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSection {
    pub shared: SharedFields,
    pub activities: Vec<ActivityFields>,
}

impl DataSection {
    pub fn is_unavailable(&self) -> bool {
        self.shared.unavailable
    }

    /// Looks a field up, preferring the activity row over the shared fields.
    pub fn resolve(&self, key: FieldKey, activity: Option<&ActivityFields>) -> Option<CellValue> {
        let shared = &self.shared;
        let number = |value: Option<f64>| value.map(CellValue::Number);
        let text = |value: Option<&String>| value.map(|v| CellValue::Text(v.clone()));
        match key {
            FieldKey::InventoryYear => Some(CellValue::Number(f64::from(shared.inventory_year))),
            FieldKey::GpcReferenceNumber => Some(CellValue::Text(shared.gpc_reference_number.clone())),
            FieldKey::NotationKey => shared
                .notation_key
                .map(|key| CellValue::Text(key.code().to_string())),
            FieldKey::UnavailableExplanation => text(shared.unavailable_explanation.as_ref()),
            FieldKey::InputMethodology | FieldKey::Methodology => text(shared.input_methodology.as_ref()),
            FieldKey::TotalCo2e => number(activity.and_then(|a| a.total_co2e).or(shared.total_co2e)),
            _ => {
                let activity = activity?;
                match key {
                    FieldKey::GhgCo2 => number(activity.ghg_co2),
                    FieldKey::GhgCh4 => number(activity.ghg_ch4),
                    FieldKey::GhgN2o => number(activity.ghg_n2o),
                    FieldKey::EmissionFactorUnit => text(activity.emission_factor_unit.as_ref()),
                    FieldKey::EmissionCo2 => number(activity.emission_co2),
                    FieldKey::EmissionCh4 => number(activity.emission_ch4),
                    FieldKey::EmissionN2o => number(activity.emission_n2o),
                    FieldKey::ActivityAmount => activity.activity_amount.clone(),
                    FieldKey::ActivityUnit => text(activity.activity_unit.as_ref()),
                    FieldKey::ActivityDataQuality => text(activity.data_quality.as_ref()),
                    FieldKey::ActivityDataSource => text(activity.data_source.as_ref()),
                    _ => None,
                }
            }
        }
    }
}

fn shared_fields(year: i32, value: &InventoryValue) -> SharedFields {
    let unavailable = value.is_unavailable();
    let notation_key = value.unavailable_reason.as_deref().and_then(|reason| {
        let key = NotationKey::from_unavailable_reason(reason);
        if key.is_none() && unavailable {
            warn!(
                "slot {} has unknown unavailable reason '{}'; notation key left blank",
                value.gpc_reference_number, reason
            );
        }
        key
    });
    SharedFields {
        inventory_year: year,
        gpc_reference_number: value.gpc_reference_number.trim().to_string(),
        unavailable,
        unavailable_explanation: if unavailable {
            value.unavailable_explanation.clone()
        } else {
            None
        },
        input_methodology: if unavailable {
            None
        } else {
            value.input_methodology.clone()
        },
        total_co2e: if unavailable { None } else { value.co2eq },
        notation_key,
    }
}

fn activity_fields(snapshot: &InventorySnapshot, slot: &InventoryValue, activity: &ActivityValue) -> ActivityFields {
    let mut fields = ActivityFields {
        total_co2e: activity.co2eq,
        ..ActivityFields::default()
    };

    let title = activity.metadata.activity_title.as_deref();
    fields.activity_amount = title
        .and_then(|title| activity.activity_data.get(title))
        .or_else(|| activity.activity_data.get("amount"))
        .and_then(CellValue::from_json);
    fields.activity_unit = title
        .and_then(|title| activity.activity_data.get(&format!("{}-unit", title)))
        .or_else(|| activity.activity_data.get("unit"))
        .and_then(|value| value.as_str())
        .map(str::to_string);

    let source = activity
        .datasource_id
        .as_ref()
        .or(slot.datasource_id.as_ref())
        .and_then(|id| snapshot.data_sources.get(id));
    fields.data_quality = activity
        .metadata
        .data_quality
        .clone()
        .or_else(|| source.and_then(|s| s.data_quality.clone()));
    fields.data_source = activity
        .metadata
        .data_source
        .clone()
        .or_else(|| source.and_then(|s| s.source_reference.clone().or_else(|| s.notes.clone())));

    for gas in Gas::ALL {
        let gas_value = activity.gas_values.iter().find(|g| g.gas == gas);
        let amount = gas_value
            .and_then(|g| g.gas_amount)
            .or_else(|| activity.activity_data.get(gas.amount_key()).and_then(json_number));
        let factor = gas_value
            .and_then(|g| g.emissions_factor_id.as_ref())
            .and_then(|id| snapshot.emissions_factors.get(id));
        if gas == Gas::Co2 {
            fields.emission_factor_unit = factor.and_then(|f| f.units.clone());
        }
        fields.set_gas(gas, amount, factor.and_then(|f| f.emissions_per_activity));
    }
    fields
}

fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Builds one data section per reference number present in the inventory.
///
/// Activities of a slot marked unavailable are not rendered; the slot is
/// reported through its notation key instead.
pub fn build_data_dictionary(snapshot: &InventorySnapshot) -> BTreeMap<String, DataSection> {
    let year = snapshot.inventory.year;
    let mut dictionary: BTreeMap<String, DataSection> = BTreeMap::new();
    for value in &snapshot.inventory_values {
        let shared = shared_fields(year, value);
        let activities = if shared.unavailable {
            let stale = snapshot.activities_of(&value.id).count();
            if stale > 0 {
                warn!(
                    "slot {} is unavailable but still has {} activity values; they are not reported",
                    value.gpc_reference_number, stale
                );
            }
            Vec::new()
        } else {
            snapshot
                .activities_of(&value.id)
                .map(|activity| activity_fields(snapshot, value, activity))
                .collect()
        };
        let reference = shared.gpc_reference_number.clone();
        if dictionary.contains_key(&reference) {
            warn!("reference {} has more than one slot; keeping the first", reference);
            continue;
        }
        dictionary.insert(reference, DataSection { shared, activities });
    }
    dictionary
}
