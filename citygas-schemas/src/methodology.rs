use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraField {
    pub id: String,
    pub r#type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub exclusive: Option<String>,
    #[serde(default)]
    pub multiselect: bool,
    #[serde(default)]
    pub required: bool,
    pub total_required: Option<f64>,
    #[serde(default)]
    pub subtypes: Vec<String>,
}

/// An activity form a methodology accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySpec {
    pub id: String,
    #[serde(default)]
    pub unique_by: Vec<String>,
    pub activity_title: Option<String>,
    pub minimum: Option<f64>,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
    #[serde(default)]
    pub units: Vec<String>,
    pub formula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefill {
    pub key: String,
    pub value: String,
}

/// A prefilled activity template offered as a starting point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedActivity {
    pub id: String,
    #[serde(default)]
    pub prefills: Vec<Prefill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    pub id: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub activities: Vec<ActivitySpec>,
    #[serde(default)]
    pub input_required: Vec<String>,
    pub formula: Option<String>,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
    #[serde(default)]
    pub suggested_activities: Vec<SuggestedActivity>,
    pub suggested_activities_id: Option<String>,
}

/// Catalog entry for one GPC slot reference number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub methodologies: Vec<Methodology>,
    pub direct_measure: Option<Methodology>,
}
