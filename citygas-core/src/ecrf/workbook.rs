//! Reading the ECRF template and writing the planned rows back with
//! umya-spreadsheet, keeping the template's styles and row heights.

use super::fields::CellValue;
use super::template::{RenderPlan, RowOrigin, TemplateSheet};
use super::WorksheetSelector;
use crate::error::CityGasError;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

fn template_error(path: &Path, reason: impl ToString) -> CityGasError {
    CityGasError::TemplateIo {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub fn open(path: &Path) -> Result<Spreadsheet, CityGasError> {
    umya_spreadsheet::reader::xlsx::read(path).map_err(|e| template_error(path, e))
}

pub fn worksheet_mut<'b>(
    book: &'b mut Spreadsheet,
    selector: &WorksheetSelector,
    path: &Path,
) -> Result<&'b mut Worksheet, CityGasError> {
    let index = match selector {
        WorksheetSelector::Index(index) => *index,
        WorksheetSelector::Name(name) => book
            .get_sheet_collection()
            .iter()
            .position(|sheet| sheet.get_name() == name.as_str())
            .ok_or_else(|| template_error(path, format!("no worksheet named '{}'", name)))?,
    };
    book.get_sheet_mut(&index)
        .ok_or_else(|| template_error(path, format!("no worksheet at index {}", index)))
}

pub fn scan(sheet: &Worksheet) -> TemplateSheet {
    TemplateSheet::from_cells(sheet.get_cell_collection().into_iter().map(|cell| {
        let coordinate = cell.get_coordinate();
        (
            *coordinate.get_col_num(),
            *coordinate.get_row_num(),
            cell.get_value().into_owned(),
        )
    }))
}

/// Applies a plan in row order. Each clone is inserted directly below the
/// rows already written for its template row and takes that row's values,
/// styles and height before its own edits are applied.
pub fn materialize(sheet: &mut Worksheet, plan: &RenderPlan) {
    let highest_column = sheet.get_highest_column();
    let mut inserted = 0u32;
    let mut template_row = 0u32;
    let mut last_row = 0u32;
    for planned in &plan.rows {
        let target = match planned.origin {
            RowOrigin::Template => {
                template_row = planned.source_row + inserted;
                template_row
            }
            RowOrigin::Clone => {
                let target = last_row + 1;
                sheet.insert_new_row(&target, &1);
                copy_row(sheet, template_row, target, highest_column);
                inserted += 1;
                target
            }
        };
        for edit in &planned.edits {
            let cell = sheet.get_cell_mut((edit.column, target));
            match &edit.value {
                CellValue::Number(number) => {
                    cell.set_value_number(*number);
                }
                CellValue::Text(text) => {
                    cell.set_value(text.clone());
                }
            }
        }
        last_row = target;
    }
    debug!("materialised {} planned rows, {} inserted", plan.rows.len(), inserted);
}

fn copy_row(sheet: &mut Worksheet, source: u32, target: u32, highest_column: u32) {
    for column in 1..=highest_column {
        let Some((value, formula, style)) = sheet.get_cell((column, source)).map(|cell| {
            (
                cell.get_value().into_owned(),
                cell.get_formula().to_string(),
                cell.get_style().clone(),
            )
        }) else {
            continue;
        };
        let cell = sheet.get_cell_mut((column, target));
        cell.set_style(style);
        if !formula.is_empty() {
            cell.set_formula(formula);
        } else if !value.is_empty() {
            cell.set_value(value);
        }
    }
    if let Some(height) = sheet.get_row_dimension(&source).map(|row| *row.get_height()) {
        if height > 0.0 {
            sheet.get_row_dimension_mut(&target).set_height(height);
        }
    }
}

pub fn to_bytes(book: &Spreadsheet, path: &Path) -> Result<Vec<u8>, CityGasError> {
    let mut buffer = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut buffer).map_err(|e| template_error(path, e))?;
    Ok(buffer.into_inner())
}
