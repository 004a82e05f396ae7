use super::{
    build_data_dictionary,
    template::{plan_rows, PlanOptions},
    workbook, EcrfReport, WorksheetSelector, DEFAULT_HEADER_ROWS, DEFAULT_REFERENCE_COLUMN,
};
use crate::{
    emissions::{fill_missing_co2eq, GwpTable},
    error::CityGasError,
    store::{InventorySnapshot, InventoryStore},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// A fluent builder for constructing an `EcrfRenderer`.
///
/// Only the template path is required; the worksheet, reference column and
/// header row count default to the layout of the published ECRF template.
#[derive(Default)]
pub struct EcrfRendererBuilder {
    template: Option<PathBuf>,
    worksheet: WorksheetSelector,
    reference_column: Option<u32>,
    header_rows: Option<u32>,
    gwp: GwpTable,
}

impl EcrfRendererBuilder {
    /// Creates a new, empty `EcrfRendererBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `.xlsx` template the report is rendered from.
    pub fn with_template<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.template = Some(path.as_ref().to_path_buf());
        self
    }

    /// Selects the worksheet holding the reference-numbered rows.
    pub fn with_worksheet(mut self, worksheet: WorksheetSelector) -> Self {
        self.worksheet = worksheet;
        self
    }

    /// Sets the 1-based column that holds each row's GPC reference number.
    pub fn with_reference_column(mut self, column: u32) -> Self {
        self.reference_column = Some(column);
        self
    }

    /// Sets how many leading rows are headers and never rendered.
    pub fn with_header_rows(mut self, rows: u32) -> Self {
        self.header_rows = Some(rows);
        self
    }

    /// Sets the GWP table used when an inventory read from a store has no
    /// cached CO2e figures.
    pub fn with_gwp(mut self, gwp: GwpTable) -> Self {
        self.gwp = gwp;
        self
    }

    /// Consumes the builder and returns a configured `EcrfRenderer`.
    ///
    /// # Errors
    ///
    /// Returns a `CityGasError` if no template was given or the reference
    /// column is zero.
    pub fn build(self) -> Result<EcrfRenderer, CityGasError> {
        let template = self
            .template
            .ok_or_else(|| CityGasError::Configuration("ECRF template path not set".to_string()))?;
        let reference_column = self.reference_column.unwrap_or(DEFAULT_REFERENCE_COLUMN);
        if reference_column == 0 {
            return Err(CityGasError::Configuration(
                "ECRF reference column is 1-based".to_string(),
            ));
        }
        Ok(EcrfRenderer {
            template,
            worksheet: self.worksheet,
            options: PlanOptions {
                reference_column,
                header_rows: self.header_rows.unwrap_or(DEFAULT_HEADER_ROWS),
            },
            gwp: self.gwp,
        })
    }
}

/// Fills the ECRF template with one inventory's data.
#[derive(Debug, Clone)]
pub struct EcrfRenderer {
    template: PathBuf,
    worksheet: WorksheetSelector,
    options: PlanOptions,
    gwp: GwpTable,
}

impl EcrfRenderer {
    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Renders a fetched inventory. The template file itself is never modified.
    pub fn render(&self, snapshot: &InventorySnapshot) -> Result<EcrfReport, CityGasError> {
        let mut book = workbook::open(&self.template)?;
        let sheet = workbook::worksheet_mut(&mut book, &self.worksheet, &self.template)?;

        let dictionary = build_data_dictionary(snapshot);
        let template = workbook::scan(sheet);
        let plan = plan_rows(&template, &dictionary, self.options)?;
        workbook::materialize(sheet, &plan);

        let bytes = workbook::to_bytes(&book, &self.template)?;
        info!(
            "ECRF for inventory {}: {} rows filled, {} cloned, {} not estimated, {} blank fields",
            snapshot.inventory.inventory_id,
            plan.stats.filled_rows,
            plan.stats.cloned_rows,
            plan.stats.not_estimated_rows,
            plan.stats.blank_fields
        );
        Ok(EcrfReport {
            bytes,
            stats: plan.stats,
        })
    }

    /// Fetches an inventory from the store and renders it, deriving any
    /// CO2e figure the store has not cached.
    pub fn render_inventory<S: InventoryStore + ?Sized>(
        &self,
        store: &S,
        inventory_id: &str,
    ) -> Result<Vec<u8>, CityGasError> {
        let mut snapshot = InventorySnapshot::fetch(store, inventory_id)?;
        fill_missing_co2eq(&mut snapshot, &self.gwp);
        Ok(self.render(&snapshot)?.bytes)
    }

    /// Renders and writes the workbook to `output`.
    pub fn render_to_file<P: AsRef<Path>>(
        &self,
        snapshot: &InventorySnapshot,
        output: P,
    ) -> Result<EcrfReport, CityGasError> {
        let report = self.render(snapshot)?;
        let output = output.as_ref();
        fs::write(output, &report.bytes).map_err(|e| CityGasError::TemplateIo {
            path: output.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("ECRF written to {}", output.display());
        Ok(report)
    }
}
