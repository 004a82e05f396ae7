//! CO2-equivalent conversion of recorded gas masses.
//!
//! `co2e = sum over gases of gas_amount * emissions_per_activity * GWP(gas)`.
//! A missing or unusable factor contributes zero and is logged; it never
//! blocks a report.

use crate::catalog::is_direct_measure;
use crate::store::InventorySnapshot;
use citygas_schemas::inventory::{ActivityValue, EmissionsFactor, Gas, GasValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GwpPreset {
    Ar4,
    #[default]
    Ar5,
    Ar6,
}

/// 100-year global warming potentials, CO2 fixed at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GwpTable {
    pub ch4: f64,
    pub n2o: f64,
}

impl GwpTable {
    pub fn from_preset(preset: GwpPreset) -> Self {
        match preset {
            GwpPreset::Ar4 => Self { ch4: 25.0, n2o: 298.0 },
            GwpPreset::Ar5 => Self { ch4: 28.0, n2o: 265.0 },
            GwpPreset::Ar6 => Self { ch4: 27.9, n2o: 273.0 },
        }
    }

    pub fn factor(&self, gas: Gas) -> f64 {
        match gas {
            Gas::Co2 => 1.0,
            Gas::Ch4 => self.ch4,
            Gas::N2o => self.n2o,
        }
    }
}

impl Default for GwpTable {
    fn default() -> Self {
        Self::from_preset(GwpPreset::default())
    }
}

pub struct EmissionsCalculator<'a> {
    gwp: &'a GwpTable,
    factors: &'a HashMap<String, EmissionsFactor>,
}

impl<'a> EmissionsCalculator<'a> {
    pub fn new(gwp: &'a GwpTable, factors: &'a HashMap<String, EmissionsFactor>) -> Self {
        Self { gwp, factors }
    }

    /// CO2e of one gas value in kg. `direct` marks a direct-measure slot, where
    /// a gas value without a factor is already the measured gas mass.
    pub fn gas_co2e(&self, activity: &ActivityValue, gas_value: &GasValue, direct: bool) -> f64 {
        let amount = match gas_value.gas_amount.or_else(|| amount_from_activity_data(activity, gas_value.gas)) {
            Some(amount) => amount,
            None => {
                warn!(
                    "activity value {}: no {} amount recorded, counted as zero",
                    activity.id, gas_value.gas
                );
                return 0.0;
            }
        };

        let Some(per_activity) = self.emissions_per_activity(activity, gas_value, direct) else {
            return 0.0;
        };

        let co2e = amount * per_activity * self.gwp.factor(gas_value.gas);
        if co2e.is_finite() {
            co2e
        } else {
            warn!(
                "activity value {}: {} contribution is not a finite number, counted as zero",
                activity.id, gas_value.gas
            );
            0.0
        }
    }

    fn emissions_per_activity(&self, activity: &ActivityValue, gas_value: &GasValue, direct: bool) -> Option<f64> {
        let Some(factor_id) = gas_value.emissions_factor_id.as_deref() else {
            if direct {
                return Some(1.0);
            }
            warn!(
                "activity value {}: {} has no emissions factor, counted as zero",
                activity.id, gas_value.gas
            );
            return None;
        };
        let Some(factor) = self.factors.get(factor_id) else {
            warn!(
                "activity value {}: emissions factor '{}' not found, {} counted as zero",
                activity.id, factor_id, gas_value.gas
            );
            return None;
        };
        if factor.gas != gas_value.gas {
            warn!(
                "activity value {}: emissions factor '{}' is for {} not {}, counted as zero",
                activity.id, factor_id, factor.gas, gas_value.gas
            );
            return None;
        }
        if factor.emissions_per_activity.is_none() {
            warn!(
                "activity value {}: emissions factor '{}' has no rate, {} counted as zero",
                activity.id, factor_id, gas_value.gas
            );
        }
        factor.emissions_per_activity
    }

    /// Total CO2e of an activity value in kg. Depends only on its gas values,
    /// the factor table and the GWP table.
    pub fn activity_co2e(&self, activity: &ActivityValue, direct: bool) -> f64 {
        activity
            .gas_values
            .iter()
            .map(|gas_value| self.gas_co2e(activity, gas_value, direct))
            .sum()
    }
}

fn amount_from_activity_data(activity: &ActivityValue, gas: Gas) -> Option<f64> {
    activity.activity_data.get(gas.amount_key()).and_then(|value| match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecomputeSummary {
    pub activity_values: usize,
    pub inventory_values: usize,
    pub total_emissions: f64,
}

/// Refreshes every derived cache in the snapshot: activity `co2eq`, the
/// per-slot `co2eq` and the inventory's `total_emissions`.
pub fn recompute_totals(snapshot: &mut InventorySnapshot, gwp: &GwpTable) -> RecomputeSummary {
    let direct_slots = direct_slots(snapshot);
    let calculator = EmissionsCalculator::new(gwp, &snapshot.emissions_factors);
    let mut slot_totals: HashMap<String, f64> = HashMap::new();
    let mut updated = Vec::with_capacity(snapshot.activity_values.len());
    for activity in &snapshot.activity_values {
        let direct = direct_slots.get(&activity.inventory_value_id).copied().unwrap_or(false);
        let co2e = calculator.activity_co2e(activity, direct);
        *slot_totals.entry(activity.inventory_value_id.clone()).or_insert(0.0) += co2e;
        updated.push(co2e);
    }

    for (activity, co2e) in snapshot.activity_values.iter_mut().zip(updated) {
        activity.co2eq = Some(co2e);
    }

    let mut total = 0.0;
    for value in snapshot.inventory_values.iter_mut() {
        if value.is_unavailable() {
            value.co2eq = None;
            continue;
        }
        let slot_total = slot_totals.get(&value.id).copied().unwrap_or(0.0);
        value.co2eq = Some(slot_total);
        total += slot_total;
    }
    snapshot.inventory.total_emissions = Some(total);
    debug!(
        "recomputed {} activity values in inventory {}",
        snapshot.activity_values.len(),
        snapshot.inventory.inventory_id
    );

    RecomputeSummary {
        activity_values: snapshot.activity_values.len(),
        inventory_values: snapshot.inventory_values.len(),
        total_emissions: total,
    }
}

fn direct_slots(snapshot: &InventorySnapshot) -> HashMap<String, bool> {
    snapshot
        .inventory_values
        .iter()
        .map(|value| {
            let direct = value.input_methodology.as_deref().map_or(false, is_direct_measure);
            (value.id.clone(), direct)
        })
        .collect()
}

/// Derives `co2eq` for activity values that carry no usable cache, then
/// refreshes the slot and inventory totals they feed. Activity values that
/// already have a cached figure are left alone. Returns how many were derived.
pub fn fill_missing_co2eq(snapshot: &mut InventorySnapshot, gwp: &GwpTable) -> usize {
    let needs_cache = |activity: &ActivityValue| !activity.co2eq.map_or(false, f64::is_finite);
    if !snapshot.activity_values.iter().any(needs_cache) {
        return 0;
    }

    let direct_slots = direct_slots(snapshot);
    let calculator = EmissionsCalculator::new(gwp, &snapshot.emissions_factors);
    let derived: Vec<Option<f64>> = snapshot
        .activity_values
        .iter()
        .map(|activity| {
            needs_cache(activity).then(|| {
                let direct = direct_slots.get(&activity.inventory_value_id).copied().unwrap_or(false);
                calculator.activity_co2e(activity, direct)
            })
        })
        .collect();

    let mut filled = 0;
    let mut touched_slots = HashSet::new();
    for (activity, co2e) in snapshot.activity_values.iter_mut().zip(derived) {
        if let Some(co2e) = co2e {
            activity.co2eq = Some(co2e);
            touched_slots.insert(activity.inventory_value_id.clone());
            filled += 1;
        }
    }

    let mut slot_totals: HashMap<&str, f64> = HashMap::new();
    for activity in &snapshot.activity_values {
        *slot_totals.entry(activity.inventory_value_id.as_str()).or_insert(0.0) += activity.co2eq.unwrap_or(0.0);
    }
    let mut total = 0.0;
    for value in snapshot.inventory_values.iter_mut() {
        if value.is_unavailable() {
            value.co2eq = None;
            continue;
        }
        if touched_slots.contains(&value.id) || value.co2eq.is_none() {
            value.co2eq = Some(slot_totals.get(value.id.as_str()).copied().unwrap_or(0.0));
        }
        total += value.co2eq.unwrap_or(0.0);
    }
    snapshot.inventory.total_emissions = Some(total);
    info!(
        "derived co2eq for {} activity values of inventory {} with no cached figure",
        filled, snapshot.inventory.inventory_id
    );
    filled
}
