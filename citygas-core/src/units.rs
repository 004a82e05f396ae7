//! Presentation boundary: stored masses are kilograms, displayed emissions
//! are tonnes CO2e bucketed by magnitude.

pub const KG_PER_TONNE: f64 = 1000.0;

pub fn kg_to_tonnes(kg: f64) -> f64 {
    kg / KG_PER_TONNE
}

pub fn tonnes_to_kg(tonnes: f64) -> f64 {
    tonnes * KG_PER_TONNE
}

/// Formats a tonnage as `kgCO2e`, `tCO2e`, `ktCO2e` or `MtCO2e`.
pub fn format_tonnes(tonnes: f64) -> String {
    let magnitude = tonnes.abs();
    if magnitude >= 1e6 {
        format!("{:.0} MtCO2e", tonnes / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.0} ktCO2e", tonnes / 1e3)
    } else if magnitude < 1.0 {
        format!("{:.0} kgCO2e", tonnes_to_kg(tonnes))
    } else {
        format!("{:.2} tCO2e", tonnes)
    }
}

pub fn format_kg(kg: f64) -> String {
    format_tonnes(kg_to_tonnes(kg))
}

/// Tonnes CO2e per inhabitant.
pub fn per_capita_tonnes(total_kg: f64, population: Option<u64>) -> Option<f64> {
    match population {
        Some(population) if population > 0 => Some(kg_to_tonnes(total_kg) / population as f64),
        _ => None,
    }
}
