//! Snapshot builders shared by the unit tests.

use crate::store::InventorySnapshot;
use citygas_schemas::{
    inventory::{ActivityMetadata, ActivityValue, EmissionsFactor, Gas, GasValue, Inventory, InventoryValue},
    taxonomy::{Sector, SubSector},
};
use std::collections::{BTreeMap, HashMap};

pub const INVENTORY_ID: &str = "inv-2023";

pub fn sector(reference: &str, name: &str) -> Sector {
    Sector {
        sector_id: format!("sector-{}", reference),
        sector_name: name.to_string(),
        reference_number: reference.to_string(),
    }
}

pub fn subsector(reference: &str, name: &str) -> SubSector {
    SubSector {
        subsector_id: format!("subsector-{}", reference),
        subsector_name: name.to_string(),
        sector_id: format!("sector-{}", reference.split('.').next().unwrap_or_default()),
        reference_number: reference.to_string(),
    }
}

pub fn slot(id: &str, reference: &str, methodology: &str) -> InventoryValue {
    InventoryValue {
        id: id.to_string(),
        inventory_id: INVENTORY_ID.to_string(),
        gpc_reference_number: reference.to_string(),
        input_methodology: Some(methodology.to_string()),
        ..InventoryValue::default()
    }
}

pub fn activity(id: &str, slot: &InventoryValue, co2eq: f64) -> ActivityValue {
    ActivityValue {
        id: id.to_string(),
        inventory_value_id: slot.id.clone(),
        gpc_reference_number: Some(slot.gpc_reference_number.clone()),
        activity_data: BTreeMap::new(),
        metadata: ActivityMetadata::default(),
        co2eq: Some(co2eq),
        datasource_id: None,
        gas_values: Vec::new(),
    }
}

pub fn gas(id: &str, gas: Gas, amount: f64, factor: Option<&str>) -> GasValue {
    GasValue {
        id: id.to_string(),
        gas,
        gas_amount: Some(amount),
        emissions_factor_id: factor.map(str::to_string),
    }
}

pub fn factor(id: &str, gas: Gas, per_activity: f64) -> EmissionsFactor {
    EmissionsFactor {
        id: id.to_string(),
        gas,
        gpc_reference_number: None,
        emissions_per_activity: Some(per_activity),
        units: Some("kg/m3".to_string()),
        region: None,
        data_source_id: None,
    }
}

pub fn empty_snapshot() -> InventorySnapshot {
    InventorySnapshot {
        inventory: Inventory {
            inventory_id: INVENTORY_ID.to_string(),
            inventory_name: Some("Test city 2023".to_string()),
            city_id: "city-1".to_string(),
            city_name: Some("Test city".to_string()),
            year: 2023,
            population: Some(100_000),
            total_emissions: None,
        },
        inventory_values: Vec::new(),
        activity_values: Vec::new(),
        sectors: vec![
            sector("I", "Stationary Energy"),
            sector("II", "Transportation"),
            sector("III", "Waste"),
        ],
        subsectors: vec![
            subsector("I.1", "Residential buildings"),
            subsector("I.2", "Commercial and institutional buildings and facilities"),
            subsector("II.1", "On-road transportation"),
            subsector("II.2", "Railways"),
            subsector("III.1", "Solid waste disposal"),
        ],
        emissions_factors: HashMap::new(),
        data_sources: HashMap::new(),
    }
}

/// Transportation 40399, Stationary Energy 22388, Waste 16948 (total 79735).
pub fn results_snapshot() -> InventorySnapshot {
    let mut snapshot = empty_snapshot();
    let on_road = slot("iv-on-road", "II.1.1", "fuel-sales");
    let rail = slot("iv-rail", "II.2.1", "fuel-sales");
    let residential = slot("iv-residential", "I.1.1", "fuel-combustion-consumption");
    let commercial = slot("iv-commercial", "I.2.1", "fuel-combustion-consumption");
    let landfill = slot("iv-landfill", "III.1.1", "methane-commitment");
    snapshot.activity_values = vec![
        activity("av-1", &on_road, 21453.0),
        activity("av-2", &on_road, 12903.0),
        activity("av-3", &rail, 6043.0),
        activity("av-4", &residential, 15662.0),
        activity("av-5", &commercial, 6726.0),
        activity("av-6", &landfill, 16948.0),
    ];
    snapshot.inventory_values = vec![on_road, rail, residential, commercial, landfill];
    snapshot
}
