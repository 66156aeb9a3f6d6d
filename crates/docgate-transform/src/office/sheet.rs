//! Workbooks: reading via calamine, minimal SpreadsheetML generation.

use std::path::Path;

use calamine::{Data, Range, Reader};

use crate::error::{TransformError, TransformResult};
use crate::office::{create_package, finish_package, write_part, xml_escape};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// One worksheet flattened to stringly-typed rows.
#[derive(Debug, Clone)]
pub struct SheetData {
    /// Worksheet name.
    pub name: String,
    /// Row-major cell contents; rows are normalised to equal width.
    pub rows: Vec<Vec<String>>,
}

/// Read every worksheet of a workbook (`.xlsx` or legacy `.xls`).
///
/// # Errors
///
/// Returns [`TransformError::Workbook`] when the workbook cannot be parsed.
pub fn read_workbook(path: &Path) -> TransformResult<Vec<SheetData>> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(|err| {
        TransformError::Workbook {
            operation: "sheet.open",
            detail: err.to_string(),
        }
    })?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| TransformError::Workbook {
                operation: "sheet.range",
                detail: err.to_string(),
            })?;
        sheets.push(SheetData {
            rows: flatten_range(&range),
            name,
        });
    }
    Ok(sheets)
}

fn flatten_range(range: &Range<Data>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut max_width = 0usize;

    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        if cells.iter().any(|cell| !cell.is_empty()) {
            max_width = max_width.max(cells.len());
            rows.push(cells);
        }
    }
    for row in &mut rows {
        row.resize(max_width, String::new());
    }
    rows
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => {
            if value.fract() == 0.0 {
                format!("{value:.0}")
            } else {
                format!("{value:.2}")
            }
        }
        Data::Bool(value) => value.to_string(),
        Data::Error(err) => format!("{err:?}"),
        Data::DateTime(value) => value.as_f64().to_string(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
    }
}

/// Write rows into a minimal single-sheet `.xlsx` using inline strings.
///
/// # Errors
///
/// Returns an error when the package cannot be written.
pub fn write_workbook(rows: &[Vec<String>], output: &Path) -> TransformResult<()> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>"#,
    );
    for (row_index, row) in rows.iter().enumerate() {
        let row_number = row_index + 1;
        sheet.push_str(&format!("<row r=\"{row_number}\">"));
        for (column_index, cell) in row.iter().enumerate() {
            let reference = format!("{}{row_number}", column_letters(column_index));
            sheet.push_str(&format!(
                "<c r=\"{reference}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                xml_escape(cell)
            ));
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let mut package = create_package(output)?;
    write_part(&mut package, "[Content_Types].xml", CONTENT_TYPES)?;
    write_part(&mut package, "_rels/.rels", ROOT_RELS)?;
    write_part(&mut package, "xl/workbook.xml", WORKBOOK)?;
    write_part(&mut package, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS)?;
    write_part(&mut package, "xl/worksheets/sheet1.xml", &sheet)?;
    finish_package(package)
}

/// Spreadsheet column letters for a 0-based column index (A, B, ..., AA).
fn column_letters(mut index: usize) -> String {
    let mut letters = String::new();
    loop {
        let remainder = index % 26;
        letters.insert(0, (b'A' + remainder as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn column_letters_cover_single_and_double_width() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(52), "BA");
    }

    #[test]
    fn written_workbook_reads_back_through_calamine() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("table.xlsx");
        let rows = vec![
            vec!["Name".to_string(), "Amount".to_string()],
            vec!["Widget <A>".to_string(), "12".to_string()],
        ];

        write_workbook(&rows, &path)?;
        let sheets = read_workbook(&path)?;
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].rows.len(), 2);
        assert_eq!(sheets[0].rows[1][0], "Widget <A>");
        assert_eq!(sheets[0].rows[1][1], "12");
        Ok(())
    }

    #[test]
    fn float_cells_format_without_noise() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(3.14159)), "3.14");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
