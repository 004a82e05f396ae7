use citygas_core::{
    ecrf::{EcrfRendererBuilder, WorksheetSelector},
    emissions::{recompute_totals, GwpTable},
    store::{DatasetStore, InventorySnapshot},
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use umya_spreadsheet::Worksheet;

const INVENTORY_ID: &str = "inv-2023";

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn store() -> DatasetStore {
    DatasetStore::load(data("inventory.yaml"))
        .unwrap()
        .with_emissions_factor_csv(data("emissions_factors.csv"))
        .unwrap()
}

fn snapshot() -> InventorySnapshot {
    let mut snapshot = InventorySnapshot::fetch(&store(), INVENTORY_ID).unwrap();
    recompute_totals(&mut snapshot, &GwpTable::default());
    snapshot
}

/// A cover sheet followed by an inventory sheet laid out like the ECRF:
/// references in column B, one header row.
fn write_template(path: &Path) {
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_mut(&0).unwrap().get_cell_mut("A1").set_value("Cover");
    let sheet = book.new_sheet("Inventory").unwrap();
    let rows: [&[(&str, &str)]; 7] = [
        &[("B1", "GPC ref"), ("C1", "Notation key"), ("D1", "CO2"), ("E1", "Total CO2e")],
        &[
            ("B2", "I.1.1"),
            ("C2", "{{no_key}}"),
            ("D2", "{{ghg_co2}}"),
            ("E2", "{{total_co2e}}"),
            ("F2", "{{activity_amount}} {{activity_unit}}"),
            ("G2", "{{activity_data_source}}"),
        ],
        &[
            ("B3", "II.1.1"),
            ("C3", "{{no_key}}"),
            ("D3", "{{ghg_co2}}"),
            ("E3", "{{total_co2e}}"),
            ("F3", "{{methodology}}"),
        ],
        &[("B4", "II.2.1"), ("C4", "{{no_key}}"), ("D4", "{{ghg_co2}}")],
        &[("B5", "III.1.2"), ("C5", "{{no_key}}"), ("D5", "{{ghg_co2}}")],
        &[("B6", "IV.1.1"), ("C6", "{{no_key}}"), ("D6", "{{ghg_co2}}"), ("E6", "{{mystery}}")],
        &[("A7", "Total"), ("E7", "see summary")],
    ];
    for row in rows {
        for (coordinate, value) in row {
            sheet.get_cell_mut(*coordinate).set_value(*value);
        }
    }
    sheet.get_cell_mut("G3").set_formula("D3*2");
    sheet.get_style_mut("D3").get_font_mut().set_bold(true);
    sheet.get_row_dimension_mut(&3).set_height(30.0);
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn number(sheet: &Worksheet, coordinate: &str) -> f64 {
    sheet
        .get_value(coordinate)
        .parse()
        .unwrap_or_else(|_| panic!("{} is not numeric: {:?}", coordinate, sheet.get_value(coordinate)))
}

struct Rendered {
    _dir: tempfile::TempDir,
    template: PathBuf,
    output: PathBuf,
}

fn render() -> Rendered {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("ecrf_template.xlsx");
    let output = dir.path().join("ecrf.xlsx");
    write_template(&template);

    let renderer = EcrfRendererBuilder::new()
        .with_template(&template)
        .with_worksheet(WorksheetSelector::Name("Inventory".to_string()))
        .build()
        .unwrap();
    let report = renderer.render_to_file(&snapshot(), &output).unwrap();
    assert_eq!(report.stats.cloned_rows, 1);
    assert_eq!(report.stats.not_estimated_rows, 1);
    Rendered {
        _dir: dir,
        template,
        output,
    }
}

#[test]
fn fills_rows_and_clones_one_per_activity() {
    let rendered = render();
    let book = umya_spreadsheet::reader::xlsx::read(&rendered.output).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();

    assert_eq!(sheet.get_value("B1"), "GPC ref");
    assert_eq!(sheet.get_value("C2"), "");
    assert_eq!(number(sheet, "D2"), 7831.0);
    assert_eq!(number(sheet, "E2"), 15662.0);
    assert_eq!(sheet.get_value("F2"), "7831 m3");
    assert_eq!(sheet.get_value("G2"), "Riverton Gas & Power billing records");

    assert_eq!(sheet.get_value("B3"), "II.1.1");
    assert_eq!(sheet.get_value("B4"), "II.1.1");
    assert_eq!(number(sheet, "D3"), 21453.0);
    assert_eq!(number(sheet, "D4"), 12903.0);
    assert_eq!(sheet.get_value("F4"), "direct-measure");
    assert_eq!(number(sheet, "D5"), 6043.0);
}

#[test]
fn notation_keys_and_missing_references() {
    let rendered = render();
    let book = umya_spreadsheet::reader::xlsx::read(&rendered.output).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();

    assert_eq!(sheet.get_value("B6"), "III.1.2");
    assert_eq!(sheet.get_value("C6"), "NO");
    assert_eq!(sheet.get_value("D6"), "");

    assert_eq!(sheet.get_value("B7"), "IV.1.1");
    assert_eq!(sheet.get_value("C7"), "NE");
    assert_eq!(sheet.get_value("D7"), "");
    assert_eq!(sheet.get_value("E7"), "");

    assert_eq!(sheet.get_value("A8"), "Total");
    assert_eq!(sheet.get_value("E8"), "see summary");
}

#[test]
fn cloned_rows_keep_style_and_height() {
    let rendered = render();
    let book = umya_spreadsheet::reader::xlsx::read(&rendered.output).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();

    let bold = |coordinate: &str| {
        sheet
            .get_cell(coordinate)
            .and_then(|cell| cell.get_style().get_font())
            .map_or(false, |font| *font.get_bold())
    };
    assert!(bold("D3"));
    assert!(bold("D4"));
    assert_eq!(sheet.get_row_dimension(&4).map(|row| *row.get_height()), Some(30.0));
}

#[test]
fn cloned_rows_keep_formulas() {
    let rendered = render();
    let book = umya_spreadsheet::reader::xlsx::read(&rendered.output).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();

    let formula = |coordinate: &str| sheet.get_cell(coordinate).map(|cell| cell.get_formula().to_string());
    assert_eq!(formula("G3").as_deref(), Some("D3*2"));
    assert_eq!(formula("G4").as_deref(), Some("D3*2"));
    assert_eq!(formula("G5").as_deref().unwrap_or_default(), "");
}

#[test]
fn no_placeholder_survives_and_template_is_untouched() {
    let rendered = render();
    let book = umya_spreadsheet::reader::xlsx::read(&rendered.output).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();
    for cell in sheet.get_cell_collection() {
        assert!(!cell.get_value().contains("{{"), "placeholder left in {:?}", cell.get_coordinate());
    }
    assert_eq!(book.get_sheet(&0).unwrap().get_value("A1"), "Cover");

    let template = umya_spreadsheet::reader::xlsx::read(&rendered.template).unwrap();
    let original = template.get_sheet_by_name("Inventory").unwrap();
    assert_eq!(original.get_value("C2"), "{{no_key}}");
    assert_eq!(original.get_value("B4"), "II.2.1");
}

#[test]
fn missing_worksheet_is_a_template_error() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("ecrf_template.xlsx");
    write_template(&template);
    let renderer = EcrfRendererBuilder::new()
        .with_template(&template)
        .with_worksheet(WorksheetSelector::Index(7))
        .build()
        .unwrap();
    let err = renderer.render(&snapshot()).unwrap_err();
    assert!(matches!(err, citygas_core::CityGasError::TemplateIo { .. }));
}

#[test]
fn renders_an_inventory_straight_from_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("ecrf_template.xlsx");
    write_template(&template);
    let renderer = EcrfRendererBuilder::new()
        .with_template(&template)
        .with_worksheet(WorksheetSelector::Name("Inventory".to_string()))
        .build()
        .unwrap();

    let bytes = renderer.render_inventory(&store(), INVENTORY_ID).unwrap();
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
    let sheet = book.get_sheet_by_name("Inventory").unwrap();
    assert_eq!(number(sheet, "D2"), 7831.0);
    assert_eq!(number(sheet, "E2"), 15662.0);
    assert_eq!(sheet.get_value("C6"), "NO");

    let err = renderer.render_inventory(&store(), "inv-missing").unwrap_err();
    assert!(matches!(err, citygas_core::CityGasError::InventoryNotFound(_)));
}
