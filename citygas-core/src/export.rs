use crate::aggregation::InventoryResults;
use crate::units::kg_to_tonnes;
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    breakdown: &'a str,
    reference_number: &'a str,
    sector_name: &'a str,
    subsector_name: &'a str,
    scope_name: &'a str,
    co2eq_kg: f64,
    co2eq_t: f64,
    percentage: i64,
}

/// Writes the sector breakdown and top emitters as flat CSV rows.
pub struct ResultsCsvWriter<W: io::Write> {
    writer: Writer<W>,
}

impl ResultsCsvWriter<fs::File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }
}

impl<W: io::Write> ResultsCsvWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
        }
    }

    pub fn write_results(&mut self, results: &InventoryResults) -> Result<(), anyhow::Error> {
        for sector in &results.total_emissions.by_sector {
            self.writer.serialize(ResultRow {
                breakdown: "sector",
                reference_number: &sector.reference_number,
                sector_name: &sector.sector_name,
                subsector_name: "",
                scope_name: "",
                co2eq_kg: sector.co2eq,
                co2eq_t: kg_to_tonnes(sector.co2eq),
                percentage: sector.percentage,
            })?;
        }
        for subsector in &results.top_emissions.by_sub_sector {
            self.writer.serialize(ResultRow {
                breakdown: "top_subsector",
                reference_number: &subsector.reference_number,
                sector_name: &subsector.sector_name,
                subsector_name: &subsector.subsector_name,
                scope_name: &subsector.scope_name,
                co2eq_kg: subsector.co2eq,
                co2eq_t: kg_to_tonnes(subsector.co2eq),
                percentage: subsector.percentage,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, anyhow::Error> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("results CSV could not be flushed: {}", e.error()))
    }
}
