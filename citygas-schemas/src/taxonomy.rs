use serde::{Deserialize, Serialize};

/// A top-level GPC sector (Stationary Energy, Transportation, Waste, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub sector_id: String,
    pub sector_name: String,
    pub reference_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSector {
    pub subsector_id: String,
    pub subsector_name: String,
    pub sector_id: String,
    pub reference_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategory {
    pub subcategory_id: String,
    pub subcategory_name: String,
    pub subsector_id: String,
    pub reference_number: String,
    pub scope: u32,
}
