//! ECRF report rendering.
//!
//! A report is rendered in two passes: the template worksheet is scanned and
//! turned into a row plan from the inventory's data dictionary, then the plan
//! is written into a copy of the workbook.

pub mod builder;
pub mod data_section;
pub mod fields;
pub mod template;
pub mod workbook;

pub use builder::{EcrfRenderer, EcrfRendererBuilder};
pub use data_section::{build_data_dictionary, DataSection};
pub use fields::{CellValue, FieldKey};
pub use template::RenderStats;

use serde::{Deserialize, Serialize};

/// The template worksheet to render, by zero-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorksheetSelector {
    Index(usize),
    Name(String),
}

impl Default for WorksheetSelector {
    fn default() -> Self {
        WorksheetSelector::Index(DEFAULT_WORKSHEET_INDEX)
    }
}

/// The fourth worksheet of the published ECRF template holds the inventory.
pub const DEFAULT_WORKSHEET_INDEX: usize = 3;
pub const DEFAULT_REFERENCE_COLUMN: u32 = 2;
pub const DEFAULT_HEADER_ROWS: u32 = 1;

/// A rendered workbook and what happened while rendering it.
#[derive(Debug, Clone)]
pub struct EcrfReport {
    pub bytes: Vec<u8>,
    pub stats: RenderStats,
}
