//! Charts of an inventory's emissions breakdown.

use anyhow::Result;
use citygas_core::{aggregation::InventoryResults, units::kg_to_tonnes};
use plotters::prelude::*;
use std::path::Path;

/// Saves the sector and top sub-sector charts for one set of results.
pub fn generate_all_plots(output_dir: &Path, results: &InventoryResults) -> Result<()> {
    println!("[Plotting] Generating emission charts...");

    let sectors: Vec<(String, f64)> = results
        .total_emissions
        .by_sector
        .iter()
        .map(|s| (s.sector_name.clone(), kg_to_tonnes(s.co2eq)))
        .collect();
    if sectors.is_empty() {
        println!("[Plotting] Warning: No emissions to plot.");
        return Ok(());
    }
    plot_horizontal_bars(
        &output_dir.join("1_emissions_by_sector.png"),
        "Emissions by Sector",
        &sectors,
        &BLUE,
    )?;

    let top: Vec<(String, f64)> = results
        .top_emissions
        .by_sub_sector
        .iter()
        .map(|s| {
            (
                format!("{} ({})", s.subsector_name, s.reference_number),
                kg_to_tonnes(s.co2eq),
            )
        })
        .collect();
    plot_horizontal_bars(
        &output_dir.join("2_top_emitting_subsectors.png"),
        "Top Emitting Sub-sectors",
        &top,
        &RED,
    )?;

    println!("[Plotting] Charts have been saved to '{}'.", output_dir.display());
    Ok(())
}

/// One bar per label, in the given order from the top, values in tCO2e.
fn plot_horizontal_bars(path: &Path, title: &str, bars: &[(String, f64)], color: &RGBColor) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_value = bars.iter().map(|(_, value)| *value).fold(0.0, f64::max);
    let min_value = bars.iter().map(|(_, value)| *value).fold(0.0, f64::min);
    let upper = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };
    let lower = min_value * 1.1;
    let count = bars.len() as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(320)
        .build_cartesian_2d(lower..upper, (0u32..count).into_segmented())?;

    let label = |segment: &SegmentValue<u32>| match segment {
        SegmentValue::CenterOf(index) => count
            .checked_sub(index + 1)
            .and_then(|position| bars.get(position as usize))
            .map(|(name, _)| name.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(bars.len())
        .y_label_formatter(&label)
        .x_desc("Emissions (tCO2e)")
        .draw()?;

    // The first bar is drawn at the top.
    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let slot = count - 1 - i as u32;
        Rectangle::new(
            [(0.0, SegmentValue::Exact(slot)), (*value, SegmentValue::Exact(slot + 1))],
            color.mix(0.7).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
