use thiserror::Error;

#[derive(Debug, Error)]
pub enum CityGasError {
    #[error("Inventory '{0}' not found")]
    InventoryNotFound(String),

    #[error("'{0}' is not a GPC reference number")]
    InvalidReference(String),

    /// Unknown or malformed methodology catalog content.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing emissions factor or activity field.
    #[error("Data gap: {0}")]
    DataGap(String),

    #[error("ECRF template '{path}' could not be processed: {reason}")]
    TemplateIo { path: String, reason: String },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to export results: {0}")]
    Export(#[from] anyhow::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
