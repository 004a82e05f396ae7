use crate::{config::AppConfig, plotting};
use anyhow::{Context, Result};
use citygas_core::{
    aggregation::{aggregate, InventoryResults},
    catalog::MethodologyCatalog,
    completion::CompletionEvaluator,
    ecrf::EcrfRenderer,
    emissions::{fill_missing_co2eq, recompute_totals, GwpTable},
    export::ResultsCsvWriter,
    store::InventorySnapshot,
    units::{format_kg, per_capita_tonnes},
};
use citygas_schemas::{draft::SlotDraft, inventory::Inventory};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Creates `<output_dir>/<inventory>_<timestamp>` for one run's artefacts.
pub fn create_run_dir(base: &Path, inventory_id: &str) -> Result<PathBuf> {
    let run_dir = base.join(format!(
        "{}_{}",
        inventory_id,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create output directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Aggregates an inventory and writes the CSV, JSON and chart outputs.
pub fn run_results(config: &AppConfig, gwp: &GwpTable, inventory_id: &str, recompute: bool) -> Result<PathBuf> {
    println!("\n--- [Workflow] Computing results for inventory {} ---", inventory_id);
    let store = config.open_store()?;
    let mut snapshot = InventorySnapshot::fetch(&store, inventory_id)?;
    if recompute {
        let summary = recompute_totals(&mut snapshot, gwp);
        info!("recomputed {} activity values before aggregating", summary.activity_values);
    } else {
        fill_missing_co2eq(&mut snapshot, gwp);
    }
    let results = aggregate(&snapshot);

    let run_dir = create_run_dir(&config.output_dir, inventory_id)?;
    let csv_path = run_dir.join("results.csv");
    let mut writer = ResultsCsvWriter::create(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    writer.write_results(&results)?;

    let json_path = run_dir.join("results.json");
    let json = serde_json::to_string_pretty(&results)?;
    fs::write(&json_path, json).with_context(|| format!("Failed to write {}", json_path.display()))?;

    plotting::generate_all_plots(&run_dir, &results)?;
    print_summary_report(&snapshot.inventory, &results);
    Ok(run_dir)
}

/// Fills the ECRF template; the workbook goes to `output` or into a new run directory.
pub fn run_ecrf(
    config: &AppConfig,
    renderer: &EcrfRenderer,
    gwp: &GwpTable,
    inventory_id: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    println!("\n--- [Workflow] Rendering ECRF for inventory {} ---", inventory_id);
    let store = config.open_store()?;
    let mut snapshot = InventorySnapshot::fetch(&store, inventory_id)?;
    fill_missing_co2eq(&mut snapshot, gwp);
    let output = match output {
        Some(path) => path,
        None => create_run_dir(&config.output_dir, inventory_id)?.join(format!("ecrf_{}.xlsx", inventory_id)),
    };
    let report = renderer
        .render_to_file(&snapshot, &output)
        .with_context(|| format!("Failed to render {}", renderer.template().display()))?;

    println!("  - Rows filled:          {}", report.stats.filled_rows);
    println!("  - Rows added:           {}", report.stats.cloned_rows);
    println!("  - Rows not estimated:   {}", report.stats.not_estimated_rows);
    println!("  - Fields left blank:    {}", report.stats.blank_fields);
    Ok(output)
}

/// Refreshes every cached total and writes the dataset back unless `dry_run`.
pub fn run_recompute(config: &AppConfig, gwp: &GwpTable, inventory_id: &str, dry_run: bool) -> Result<()> {
    println!("\n--- [Workflow] Recomputing totals for inventory {} ---", inventory_id);
    let mut store = config.open_store()?;
    let mut snapshot = InventorySnapshot::fetch(&store, inventory_id)?;
    let summary = recompute_totals(&mut snapshot, gwp);
    println!(
        "  - {} activity values across {} slots, total {}",
        summary.activity_values,
        summary.inventory_values,
        format_kg(summary.total_emissions)
    );
    if dry_run {
        println!("  - Dry run: dataset left unchanged.");
        return Ok(());
    }
    store.apply_snapshot(&snapshot);
    store
        .save(&config.dataset)
        .with_context(|| format!("Failed to save dataset {:?}", config.dataset))?;
    println!("  - Dataset saved to {:?}", config.dataset);
    Ok(())
}

pub fn list_methodologies(catalog: &MethodologyCatalog, reference: &str) {
    let options = catalog.methodologies_for(reference);
    println!("\nMethodologies for {}:", reference);
    if options.methodologies.is_empty() {
        println!("  (none configured)");
    }
    for methodology in options.methodologies {
        let status = if methodology.disabled { " [disabled]" } else { "" };
        println!("  - {}{}", methodology.id, status);
        if !methodology.input_required.is_empty() {
            println!("      requires: {}", methodology.input_required.join(", "));
        }
        for suggested in catalog.suggested_activities(reference, &methodology.id) {
            println!("      suggested activity: {}", suggested.id);
        }
    }
    println!("  - {} (direct measure)", options.direct_measure.id);
}

/// Loads a draft from YAML and reports whether the slot is complete.
pub fn check_draft(catalog: &MethodologyCatalog, reference: &str, draft_path: &Path) -> Result<bool> {
    let content = fs::read_to_string(draft_path)
        .with_context(|| format!("Failed to read draft file: {:?}", draft_path))?;
    let draft: SlotDraft = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from {:?}", draft_path))?;
    let complete = CompletionEvaluator::new(catalog).is_complete(reference, &draft);
    println!(
        "{} with methodology '{}' is {}",
        reference,
        draft.methodology,
        if complete { "complete" } else { "incomplete" }
    );
    Ok(complete)
}

fn print_summary_report(inventory: &Inventory, results: &InventoryResults) {
    let total = results.total_emissions.total;
    println!("\n\n--- [Inventory Summary Report] ---");
    println!("========================================");
    println!(
        "Inventory: {} ({})",
        inventory.inventory_name.as_deref().unwrap_or(&inventory.inventory_id),
        inventory.year
    );
    if let Some(city) = &inventory.city_name {
        println!("City: {}", city);
    }
    println!("Total Emissions: {}", format_kg(total));
    if let Some(per_capita) = per_capita_tonnes(total, inventory.population) {
        println!("Per Capita: {:.2} tCO2e", per_capita);
    }
    println!("----------------------------------------");

    println!("\nEmissions by Sector:");
    for sector in &results.total_emissions.by_sector {
        println!(
            "  - {:<40} {:>14} {:>4}%",
            sector.sector_name,
            format_kg(sector.co2eq),
            sector.percentage
        );
    }

    println!("\nTop Emitting Sub-sectors:");
    for (rank, subsector) in results.top_emissions.by_sub_sector.iter().enumerate() {
        println!(
            "  {}. {} / {} (scope {}) {} {}%",
            rank + 1,
            subsector.sector_name,
            subsector.subsector_name,
            subsector.scope_name,
            format_kg(subsector.co2eq),
            subsector.percentage
        );
    }
    println!("========================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dirs_are_created_under_the_output_dir() {
        let base = tempfile::tempdir().unwrap();
        let run_dir = create_run_dir(base.path(), "inv-2023").unwrap();
        assert!(run_dir.is_dir());
        assert!(run_dir
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with("inv-2023_")));
    }

    #[test]
    fn draft_files_are_checked_for_completion() {
        let dir = tempfile::tempdir().unwrap();
        let draft_path = dir.path().join("draft.yaml");
        fs::write(
            &draft_path,
            "methodology: direct-measure\ndirect:\n  co2_emissions: 1200\n  data_quality: high\n  source_reference: Plant meter\n",
        )
        .unwrap();
        let catalog = MethodologyCatalog::default();
        assert!(check_draft(&catalog, "I.1.1", &draft_path).unwrap());

        fs::write(&draft_path, "methodology: direct-measure\ndirect:\n  co2_emissions: 0\n").unwrap();
        assert!(!check_draft(&catalog, "I.1.1", &draft_path).unwrap());
    }
}
