use anyhow::{Context, Result};
use citygas_core::{
    catalog::MethodologyCatalog,
    ecrf::{EcrfRenderer, EcrfRendererBuilder, WorksheetSelector},
    emissions::{GwpPreset, GwpTable},
    store::DatasetStore,
};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// Everything `citygas.yaml` configures for one run.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub dataset: PathBuf,
    #[serde(default)]
    pub emissions_factors: Option<PathBuf>,
    pub catalog_dir: PathBuf,
    pub ecrf: EcrfConfig,
    #[serde(default)]
    pub gwp: GwpConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data/runs")
}

#[derive(Debug, Deserialize)]
pub struct EcrfConfig {
    pub template: PathBuf,
    #[serde(default)]
    pub worksheet: WorksheetSelector,
    pub reference_column: Option<u32>,
    pub header_rows: Option<u32>,
}

/// A GWP preset, optionally with explicit CH4/N2O values on top.
#[derive(Debug, Default, Deserialize)]
pub struct GwpConfig {
    #[serde(default)]
    pub preset: GwpPreset,
    pub ch4: Option<f64>,
    pub n2o: Option<f64>,
}

impl GwpConfig {
    pub fn table(&self) -> GwpTable {
        let mut table = GwpTable::from_preset(self.preset);
        if let Some(ch4) = self.ch4 {
            table.ch4 = ch4;
        }
        if let Some(n2o) = self.n2o {
            table.n2o = n2o;
        }
        table
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        println!("Loading configuration from '{}'...", path.display());
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        Ok(config)
    }

    /// Opens the dataset, with the emissions factor CSV merged in when configured.
    pub fn open_store(&self) -> Result<DatasetStore> {
        let store = DatasetStore::load(&self.dataset)
            .with_context(|| format!("Failed to load dataset {:?}", self.dataset))?;
        match &self.emissions_factors {
            Some(csv_path) => store
                .with_emissions_factor_csv(csv_path)
                .with_context(|| format!("Failed to load emissions factors {:?}", csv_path)),
            None => Ok(store),
        }
    }

    pub fn load_catalog(&self) -> Result<MethodologyCatalog> {
        MethodologyCatalog::load_dir(&self.catalog_dir)
            .with_context(|| format!("Failed to load methodology catalog from {:?}", self.catalog_dir))
    }

    pub fn renderer(&self) -> Result<EcrfRenderer> {
        let mut builder = EcrfRendererBuilder::new()
            .with_template(&self.ecrf.template)
            .with_worksheet(self.ecrf.worksheet.clone())
            .with_gwp(self.gwp.table());
        if let Some(column) = self.ecrf.reference_column {
            builder = builder.with_reference_column(column);
        }
        if let Some(rows) = self.ecrf.header_rows {
            builder = builder.with_header_rows(rows);
        }
        builder.build().context("Invalid ECRF configuration")
    }
}
