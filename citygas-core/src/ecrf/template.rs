//! Row planning for the ECRF worksheet.
//!
//! The worksheet is first read into a plain grid, then every template row is
//! classified and turned into a list of planned output rows. Nothing here
//! touches the workbook; see `workbook` for materialisation.

use super::data_section::{ActivityFields, DataSection};
use super::fields::{CellValue, FieldKey};
use crate::error::CityGasError;
use citygas_schemas::{inventory::NotationKey, reference::GpcReference};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

const PLACEHOLDER_PATTERN: &str = r"\{\{(.*?)\}\}";

/// Matcher for `{{name}}` tokens.
#[derive(Debug, Clone)]
pub struct Placeholders {
    pattern: Regex,
}

impl Placeholders {
    pub fn new() -> Result<Self, CityGasError> {
        let pattern = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| CityGasError::Configuration(format!("placeholder pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    pub fn contains(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replaces every token in `text`. A cell holding exactly one token
    /// takes the value as is, keeping numbers numeric. Tokens inside a
    /// substituted value are reduced to their bare name.
    pub fn substitute<F>(&self, text: &str, mut lookup: F) -> CellValue
    where
        F: FnMut(&str) -> CellValue,
    {
        let trimmed = text.trim();
        if let Some(captures) = self.pattern.captures(trimmed) {
            if captures.get(0).map_or(false, |m| m.as_str() == trimmed) {
                return match lookup(captures.get(1).map_or("", |m| m.as_str())) {
                    CellValue::Text(value) => CellValue::Text(self.strip(&value)),
                    number => number,
                };
            }
        }
        let replaced = self.pattern.replace_all(text, |captures: &Captures<'_>| {
            self.strip(&lookup(captures.get(1).map_or("", |m| m.as_str())).to_string())
        });
        CellValue::Text(replaced.into_owned())
    }

    fn strip(&self, value: &str) -> String {
        self.pattern.replace_all(value, "$1").into_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCell {
    pub column: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRow {
    pub number: u32,
    pub cells: Vec<TemplateCell>,
}

impl TemplateRow {
    pub fn text_at(&self, column: u32) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.column == column)
            .map(|cell| cell.text.as_str())
    }

    fn placeholder_cells<'r>(&'r self, placeholders: &'r Placeholders) -> impl Iterator<Item = &'r TemplateCell> + 'r {
        self.cells.iter().filter(move |cell| placeholders.contains(&cell.text))
    }
}

/// The non-empty cells of a worksheet, by row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSheet {
    pub rows: Vec<TemplateRow>,
}

impl TemplateSheet {
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, String)>,
    {
        let mut rows: BTreeMap<u32, Vec<TemplateCell>> = BTreeMap::new();
        for (column, row, text) in cells {
            if !text.is_empty() {
                rows.entry(row).or_default().push(TemplateCell { column, text });
            }
        }
        Self {
            rows: rows
                .into_iter()
                .map(|(number, mut cells)| {
                    cells.sort_by_key(|cell| cell.column);
                    TemplateRow { number, cells }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// The template row itself, rewritten in place.
    Template,
    /// A copy of the most recent template row, inserted right below it.
    Clone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub column: u32,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRow {
    pub source_row: u32,
    pub origin: RowOrigin,
    pub edits: Vec<CellEdit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub filled_rows: usize,
    pub cloned_rows: usize,
    pub not_estimated_rows: usize,
    pub untouched_rows: usize,
    pub blank_fields: usize,
}

/// Output rows in template order; clones directly follow their template row.
/// Rows that stay as they are in the template are not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPlan {
    pub rows: Vec<PlannedRow>,
    pub stats: RenderStats,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub reference_column: u32,
    pub header_rows: u32,
}

/// How a recognised template row is rendered.
enum RowState<'d> {
    /// The reference has data: one row per activity.
    Fill(&'d DataSection),
    /// The reference was already rendered by an earlier template row.
    Refill(&'d DataSection),
    /// The reference is absent from the inventory.
    NotEstimated,
}

struct Planner<'d> {
    placeholders: Placeholders,
    dictionary: &'d BTreeMap<String, DataSection>,
    visited: HashSet<String>,
    plan: RenderPlan,
}

pub fn plan_rows(
    sheet: &TemplateSheet,
    dictionary: &BTreeMap<String, DataSection>,
    options: PlanOptions,
) -> Result<RenderPlan, CityGasError> {
    let mut planner = Planner {
        placeholders: Placeholders::new()?,
        dictionary,
        visited: HashSet::new(),
        plan: RenderPlan::default(),
    };
    for row in &sheet.rows {
        if row.number <= options.header_rows {
            planner.plan.stats.untouched_rows += 1;
            continue;
        }
        let reference = row
            .text_at(options.reference_column)
            .map(str::trim)
            .filter(|text| text.parse::<GpcReference>().is_ok());
        match reference {
            Some(reference) => planner.plan_row(row, reference),
            None => planner.plan.stats.untouched_rows += 1,
        }
    }
    Ok(planner.plan)
}

impl<'d> Planner<'d> {
    fn state(&mut self, reference: &str) -> RowState<'d> {
        match self.dictionary.get(reference) {
            Some(section) if self.visited.insert(reference.to_string()) => RowState::Fill(section),
            Some(section) => RowState::Refill(section),
            None => RowState::NotEstimated,
        }
    }

    fn plan_row(&mut self, row: &TemplateRow, reference: &str) {
        match self.state(reference) {
            RowState::Fill(section) => {
                let copies = if row.placeholder_cells(&self.placeholders).next().is_some() {
                    section.activities.len().max(1)
                } else {
                    1
                };
                for index in 0..copies {
                    let origin = if index == 0 { RowOrigin::Template } else { RowOrigin::Clone };
                    let edits = self.fill_edits(row, section, section.activities.get(index));
                    self.plan.rows.push(PlannedRow {
                        source_row: row.number,
                        origin,
                        edits,
                    });
                }
                self.plan.stats.filled_rows += 1;
                self.plan.stats.cloned_rows += copies - 1;
            }
            RowState::Refill(section) => {
                debug!("reference {} repeats at row {}", reference, row.number);
                let edits = self.fill_edits(row, section, section.activities.first());
                self.push_in_place(row, edits);
                self.plan.stats.filled_rows += 1;
            }
            RowState::NotEstimated => {
                let edits = self.not_estimated_edits(row);
                self.push_in_place(row, edits);
                self.plan.stats.not_estimated_rows += 1;
            }
        }
    }

    fn push_in_place(&mut self, row: &TemplateRow, edits: Vec<CellEdit>) {
        if !edits.is_empty() {
            self.plan.rows.push(PlannedRow {
                source_row: row.number,
                origin: RowOrigin::Template,
                edits,
            });
        }
    }

    fn fill_edits(
        &mut self,
        row: &TemplateRow,
        section: &DataSection,
        activity: Option<&ActivityFields>,
    ) -> Vec<CellEdit> {
        let placeholders = &self.placeholders;
        let blank_fields = &mut self.plan.stats.blank_fields;
        row.placeholder_cells(placeholders)
            .map(|cell| CellEdit {
                column: cell.column,
                value: placeholders.substitute(&cell.text, |name| {
                    resolve_field(section, activity, name, row.number).unwrap_or_else(|| {
                        *blank_fields += 1;
                        CellValue::blank()
                    })
                }),
            })
            .collect()
    }

    /// Every placeholder blanked except the notation key, which reads `NE`.
    fn not_estimated_edits(&self, row: &TemplateRow) -> Vec<CellEdit> {
        row.placeholder_cells(&self.placeholders)
            .map(|cell| CellEdit {
                column: cell.column,
                value: self.placeholders.substitute(&cell.text, |name| match FieldKey::from_placeholder(name) {
                    Some(FieldKey::NotationKey) => CellValue::Text(NotationKey::NE.code().to_string()),
                    _ => CellValue::blank(),
                }),
            })
            .collect()
    }
}

fn resolve_field(
    section: &DataSection,
    activity: Option<&ActivityFields>,
    name: &str,
    row: u32,
) -> Option<CellValue> {
    let Some(key) = FieldKey::from_placeholder(name) else {
        let gap = CityGasError::DataGap(format!("unknown placeholder '{}'", name.trim()));
        warn!("row {}: {}; cell left blank", row, gap);
        return None;
    };
    let value = section.resolve(key, activity);
    if value.is_none() && key != FieldKey::NotationKey && key != FieldKey::UnavailableExplanation {
        let gap = CityGasError::DataGap(format!(
            "no '{}' for {}",
            key.name(),
            section.shared.gpc_reference_number
        ));
        warn!("row {}: {}; cell left blank", row, gap);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecrf::data_section::SharedFields;

    const OPTIONS: PlanOptions = PlanOptions {
        reference_column: 2,
        header_rows: 1,
    };

    fn sheet() -> TemplateSheet {
        let cells = vec![
            (2, 1, "Reference".to_string()),
            (3, 1, "{{not_a_header}}".to_string()),
            (2, 2, "I.1.1".to_string()),
            (3, 2, "{{no_key}}".to_string()),
            (4, 2, "{{activity_amount}}".to_string()),
            (5, 2, "{{total_co2e}} kg".to_string()),
            (2, 3, "Subtotal".to_string()),
            (2, 4, "II.2.1".to_string()),
            (3, 4, "{{no_key}}".to_string()),
            (4, 4, "{{activity_amount}}".to_string()),
            (2, 5, "III.1.1".to_string()),
            (3, 5, "{{no_key}}".to_string()),
            (4, 5, "{{activity_amount}}".to_string()),
        ];
        TemplateSheet::from_cells(cells)
    }

    fn section(reference: &str, amounts: &[f64]) -> DataSection {
        DataSection {
            shared: SharedFields {
                inventory_year: 2023,
                gpc_reference_number: reference.to_string(),
                total_co2e: Some(amounts.iter().sum()),
                ..SharedFields::default()
            },
            activities: amounts
                .iter()
                .map(|amount| ActivityFields {
                    activity_amount: Some(CellValue::Number(*amount)),
                    total_co2e: Some(*amount),
                    ..ActivityFields::default()
                })
                .collect(),
        }
    }

    fn edit<'p>(row: &'p PlannedRow, column: u32) -> &'p CellValue {
        &row.edits.iter().find(|e| e.column == column).unwrap().value
    }

    #[test]
    fn one_output_row_per_activity() {
        let mut dictionary = BTreeMap::new();
        dictionary.insert("I.1.1".to_string(), section("I.1.1", &[10.0, 20.0, 30.0]));
        let plan = plan_rows(&sheet(), &dictionary, OPTIONS).unwrap();

        let filled: Vec<_> = plan.rows.iter().filter(|r| r.source_row == 2).collect();
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[0].origin, RowOrigin::Template);
        assert_eq!(filled[1].origin, RowOrigin::Clone);
        assert_eq!(filled[2].origin, RowOrigin::Clone);
        let amounts: Vec<_> = filled.iter().map(|r| edit(r, 4).clone()).collect();
        assert_eq!(
            amounts,
            [CellValue::Number(10.0), CellValue::Number(20.0), CellValue::Number(30.0)]
        );
        assert_eq!(edit(filled[1], 5), &CellValue::Text("20 kg".to_string()));
        assert_eq!(edit(filled[0], 3), &CellValue::blank());
        assert_eq!(plan.stats.cloned_rows, 2);
    }

    #[test]
    fn missing_reference_reads_not_estimated() {
        let plan = plan_rows(&sheet(), &BTreeMap::new(), OPTIONS).unwrap();
        let row = plan.rows.iter().find(|r| r.source_row == 4).unwrap();
        assert_eq!(edit(row, 3), &CellValue::Text("NE".to_string()));
        assert_eq!(edit(row, 4), &CellValue::blank());
        assert_eq!(plan.stats.not_estimated_rows, 3);
    }

    #[test]
    fn unavailable_reference_reports_its_notation_key() {
        let mut unavailable = section("II.2.1", &[]);
        unavailable.shared.unavailable = true;
        unavailable.shared.notation_key = Some(NotationKey::NO);
        unavailable.shared.total_co2e = None;
        let mut dictionary = BTreeMap::new();
        dictionary.insert("II.2.1".to_string(), unavailable);
        let plan = plan_rows(&sheet(), &dictionary, OPTIONS).unwrap();

        let rows: Vec<_> = plan.rows.iter().filter(|r| r.source_row == 4).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(edit(rows[0], 3), &CellValue::Text("NO".to_string()));
        assert_eq!(edit(rows[0], 4), &CellValue::blank());
    }

    #[test]
    fn header_and_unrecognised_rows_are_left_alone() {
        let plan = plan_rows(&sheet(), &BTreeMap::new(), OPTIONS).unwrap();
        assert!(plan.rows.iter().all(|r| r.source_row != 1 && r.source_row != 3));
        assert_eq!(plan.stats.untouched_rows, 2);
    }

    #[test]
    fn repeated_reference_is_filled_without_cloning() {
        let mut cells: Vec<(u32, u32, String)> = vec![
            (2, 2, "I.1.1".to_string()),
            (4, 2, "{{activity_amount}}".to_string()),
            (2, 3, "I.1.1".to_string()),
            (4, 3, "{{activity_amount}}".to_string()),
        ];
        cells.push((3, 3, "{{methodology}}".to_string()));
        let mut dictionary = BTreeMap::new();
        dictionary.insert("I.1.1".to_string(), section("I.1.1", &[5.0, 6.0]));
        let plan = plan_rows(&TemplateSheet::from_cells(cells), &dictionary, OPTIONS).unwrap();

        assert_eq!(plan.rows.len(), 3);
        let repeated = plan.rows.iter().find(|r| r.source_row == 3).unwrap();
        assert_eq!(repeated.origin, RowOrigin::Template);
        assert_eq!(edit(repeated, 4), &CellValue::Number(5.0));
        assert_eq!(edit(repeated, 3), &CellValue::blank());
    }

    #[test]
    fn no_placeholder_survives_planning() {
        let mut dictionary = BTreeMap::new();
        dictionary.insert("I.1.1".to_string(), section("I.1.1", &[1.0]));
        let plan = plan_rows(&sheet(), &dictionary, OPTIONS).unwrap();
        let placeholders = Placeholders::new().unwrap();
        for row in &plan.rows {
            for edit in &row.edits {
                assert!(!placeholders.contains(&edit.value.to_string()), "{:?}", edit);
            }
        }
    }

    #[test]
    fn mixed_text_cells_substitute_every_token() {
        let placeholders = Placeholders::new().unwrap();
        let value = placeholders.substitute("{{a}} of {{b}}", |name| CellValue::Text(name.to_uppercase()));
        assert_eq!(value, CellValue::Text("A of B".to_string()));
        let single = placeholders.substitute(" {{a}} ", |_| CellValue::Number(3.0));
        assert_eq!(single, CellValue::Number(3.0));
    }

    #[test]
    fn tokens_inside_values_are_not_written_out() {
        let placeholders = Placeholders::new().unwrap();
        let source = |_: &str| CellValue::Text("see {{appendix}}".to_string());
        assert_eq!(
            placeholders.substitute("{{activity_data_source}}", source),
            CellValue::Text("see appendix".to_string())
        );
        assert_eq!(
            placeholders.substitute("Source: {{activity_data_source}}", source),
            CellValue::Text("Source: see appendix".to_string())
        );
    }
}
