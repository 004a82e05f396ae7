//! Placeholder field names understood by the ECRF template.

use std::fmt;

/// A value written into a report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn blank() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.is_empty())
    }

    pub fn from_json(value: &serde_json::Value) -> Option<CellValue> {
        match value {
            serde_json::Value::Number(number) => number.as_f64().map(CellValue::Number),
            serde_json::Value::String(text) => Some(CellValue::Text(text.clone())),
            serde_json::Value::Bool(flag) => Some(CellValue::Text(flag.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    InventoryYear,
    GpcReferenceNumber,
    /// The NO/NE/C/IE code of an unavailable slot.
    NotationKey,
    UnavailableExplanation,
    InputMethodology,
    Methodology,
    GhgCo2,
    GhgCh4,
    GhgN2o,
    EmissionFactorUnit,
    EmissionCo2,
    EmissionCh4,
    EmissionN2o,
    ActivityAmount,
    ActivityUnit,
    ActivityDataQuality,
    ActivityDataSource,
    TotalCo2e,
}

const FIELD_NAMES: &[(&str, FieldKey)] = &[
    ("inventory_year", FieldKey::InventoryYear),
    ("gpc_reference_number", FieldKey::GpcReferenceNumber),
    ("no_key", FieldKey::NotationKey),
    ("notation_key", FieldKey::NotationKey),
    ("unavailable_explanation", FieldKey::UnavailableExplanation),
    ("input_methodology", FieldKey::InputMethodology),
    ("methodology", FieldKey::Methodology),
    ("ghg_co2", FieldKey::GhgCo2),
    ("ghg_ch4", FieldKey::GhgCh4),
    ("ghg_n2o", FieldKey::GhgN2o),
    ("emission_factor_unit", FieldKey::EmissionFactorUnit),
    ("emission_co2", FieldKey::EmissionCo2),
    ("emission_ch4", FieldKey::EmissionCh4),
    ("emission_n2o", FieldKey::EmissionN2o),
    ("activity_amount", FieldKey::ActivityAmount),
    ("activity_unit", FieldKey::ActivityUnit),
    ("activity_data_quality", FieldKey::ActivityDataQuality),
    ("activity_data_source", FieldKey::ActivityDataSource),
    ("total_co2e", FieldKey::TotalCo2e),
];

impl FieldKey {
    pub fn from_placeholder(name: &str) -> Option<FieldKey> {
        let name = name.trim();
        FIELD_NAMES
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, key)| *key)
    }

    pub fn name(&self) -> &'static str {
        FIELD_NAMES
            .iter()
            .find(|(_, key)| key == self)
            .map_or("", |(field, _)| *field)
    }
}
