//! Inventory-wide CO2e roll-ups: grand total, per-sector breakdown and the
//! top emitting subsector slots.

use crate::error::CityGasError;
use crate::store::{InventorySnapshot, InventoryStore};
use citygas_schemas::{
    inventory::{ActivityValue, InventoryValue},
    reference::GpcReference,
    taxonomy::{Sector, SubSector},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const TOP_EMISSIONS_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorEmissions {
    pub sector_name: String,
    pub reference_number: String,
    pub co2eq: f64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSectorEmissions {
    pub subsector_name: String,
    pub sector_name: String,
    pub scope_name: String,
    pub reference_number: String,
    pub co2eq: f64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalEmissions {
    pub total: f64,
    pub by_sector: Vec<SectorEmissions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEmissions {
    pub by_sub_sector: Vec<SubSectorEmissions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResults {
    pub total_emissions: TotalEmissions,
    pub top_emissions: TopEmissions,
}

/// Share of `part` in `total` as a whole percentage; 0 when there is no total.
pub fn percentage_of(part: f64, total: f64) -> i64 {
    if total == 0.0 {
        return 0;
    }
    (part / total * 100.0).round() as i64
}

/// Fetches the inventory once and aggregates it.
pub fn compute_results<S: InventoryStore + ?Sized>(store: &S, inventory_id: &str) -> Result<InventoryResults, CityGasError> {
    let snapshot = InventorySnapshot::fetch(store, inventory_id)?;
    Ok(aggregate(&snapshot))
}

struct Qualified<'s> {
    slot: GpcReference,
    sector: &'s Sector,
    subsector: Option<&'s SubSector>,
    co2eq: f64,
}

fn qualify<'s>(
    activity: &ActivityValue,
    values: &HashMap<&str, &'s InventoryValue>,
    sectors: &HashMap<&str, &'s Sector>,
    subsectors: &HashMap<&str, &'s SubSector>,
) -> Option<Qualified<'s>> {
    let Some(parent) = values.get(activity.inventory_value_id.as_str()) else {
        warn!(
            "activity value {} belongs to unknown inventory value {}, skipped",
            activity.id, activity.inventory_value_id
        );
        return None;
    };
    if parent.is_unavailable() {
        warn!(
            "activity value {} belongs to slot {} marked unavailable, skipped",
            activity.id, parent.gpc_reference_number
        );
        return None;
    }
    let co2eq = match activity.co2eq {
        Some(co2eq) if co2eq.is_finite() => co2eq,
        _ => {
            warn!("activity value {} has no usable co2eq, skipped", activity.id);
            return None;
        }
    };
    let slot = match parent.gpc_reference_number.parse::<GpcReference>() {
        Ok(slot) if slot.is_slot() => slot,
        _ => {
            warn!(
                "activity value {}: '{}' is not a slot reference number, skipped",
                activity.id, parent.gpc_reference_number
            );
            return None;
        }
    };
    if let Some(own) = activity.gpc_reference_number.as_deref() {
        if own.trim() != parent.gpc_reference_number.trim() {
            warn!(
                "activity value {} is filed under {} but its slot is {}, skipped",
                activity.id, own, parent.gpc_reference_number
            );
            return None;
        }
    }
    let Some(sector) = sectors.get(slot.sector()).copied() else {
        warn!("activity value {}: no sector '{}', skipped", activity.id, slot.sector());
        return None;
    };
    let subsector = slot
        .subsector_reference()
        .and_then(|reference| subsectors.get(reference.to_string().as_str()).copied());
    Some(Qualified {
        slot,
        sector,
        subsector,
        co2eq,
    })
}

fn by_co2eq_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Aggregates an already fetched snapshot. Activity values that cannot be
/// attributed are logged and left out; they never abort the aggregation.
pub fn aggregate(snapshot: &InventorySnapshot) -> InventoryResults {
    let values: HashMap<&str, &InventoryValue> = snapshot
        .inventory_values
        .iter()
        .map(|value| (value.id.as_str(), value))
        .collect();
    let sectors: HashMap<&str, &Sector> = snapshot
        .sectors
        .iter()
        .map(|sector| (sector.reference_number.as_str(), sector))
        .collect();
    let subsectors: HashMap<&str, &SubSector> = snapshot
        .subsectors
        .iter()
        .map(|subsector| (subsector.reference_number.as_str(), subsector))
        .collect();

    let mut total = 0.0;
    let mut sector_totals: BTreeMap<String, (&Sector, f64)> = BTreeMap::new();
    let mut slot_totals: BTreeMap<GpcReference, (&Sector, Option<&SubSector>, f64)> = BTreeMap::new();

    for activity in &snapshot.activity_values {
        let Some(qualified) = qualify(activity, &values, &sectors, &subsectors) else {
            continue;
        };
        total += qualified.co2eq;
        sector_totals
            .entry(qualified.sector.reference_number.clone())
            .or_insert((qualified.sector, 0.0))
            .1 += qualified.co2eq;
        slot_totals
            .entry(qualified.slot)
            .or_insert((qualified.sector, qualified.subsector, 0.0))
            .2 += qualified.co2eq;
    }

    let mut by_sector: Vec<SectorEmissions> = sector_totals
        .into_values()
        .map(|(sector, co2eq)| SectorEmissions {
            sector_name: sector.sector_name.clone(),
            reference_number: sector.reference_number.clone(),
            co2eq,
            percentage: percentage_of(co2eq, total),
        })
        .collect();
    by_sector.sort_by(|a, b| by_co2eq_desc(a.co2eq, b.co2eq).then_with(|| a.sector_name.cmp(&b.sector_name)));

    let mut by_sub_sector: Vec<SubSectorEmissions> = slot_totals
        .into_iter()
        .map(|(slot, (sector, subsector, co2eq))| SubSectorEmissions {
            subsector_name: subsector.map_or_else(
                || slot.subsector_reference().map_or_else(|| slot.to_string(), |r| r.to_string()),
                |s| s.subsector_name.clone(),
            ),
            sector_name: sector.sector_name.clone(),
            scope_name: slot.scope().map(|scope| scope.to_string()).unwrap_or_default(),
            reference_number: slot.to_string(),
            co2eq,
            percentage: percentage_of(co2eq, total),
        })
        .collect();
    by_sub_sector.sort_by(|a, b| {
        by_co2eq_desc(a.co2eq, b.co2eq)
            .then_with(|| a.subsector_name.cmp(&b.subsector_name))
            .then_with(|| a.reference_number.cmp(&b.reference_number))
    });
    by_sub_sector.truncate(TOP_EMISSIONS_LIMIT);

    InventoryResults {
        total_emissions: TotalEmissions { total, by_sector },
        top_emissions: TopEmissions { by_sub_sector },
    }
}
