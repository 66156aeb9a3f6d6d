//! PDF text extraction.
//!
//! Thin wrapper over `pdf-extract`; the library owns layout reconstruction,
//! this module only normalises its output for the downstream writers.

use std::path::Path;

use crate::error::{TransformError, TransformResult};

/// Extract the document's text, one string per page.
///
/// # Errors
///
/// Returns [`TransformError::Extract`] when the document cannot be parsed.
pub fn text_by_pages(path: &Path) -> TransformResult<Vec<String>> {
    pdf_extract::extract_text_by_pages(path).map_err(|err| TransformError::Extract {
        operation: "extract.by_pages",
        detail: err.to_string(),
    })
}

/// Extract the document's text as non-empty trimmed lines.
///
/// # Errors
///
/// Returns [`TransformError::Extract`] when the document cannot be parsed.
pub fn text_lines(path: &Path) -> TransformResult<Vec<String>> {
    let pages = text_by_pages(path)?;
    Ok(pages
        .iter()
        .flat_map(|page| page.lines())
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Split one extracted line into spreadsheet cells.
///
/// Cells are delimited by tabs or runs of two and more spaces, the closest
/// recoverable signal for tabular structure in flattened PDF text.
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    line.split(['\t'])
        .flat_map(split_on_space_runs)
        .filter(|cell| !cell.is_empty())
        .collect()
}

fn split_on_space_runs(fragment: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    for c in fragment.chars() {
        if c == ' ' {
            spaces += 1;
            continue;
        }
        if spaces >= 2 && !current.is_empty() {
            cells.push(std::mem::take(&mut current));
        } else if spaces == 1 && !current.is_empty() {
            current.push(' ');
        }
        spaces = 0;
        current.push(c);
    }
    if !current.is_empty() {
        cells.push(current);
    }
    cells.into_iter().map(|cell| cell.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_split_on_tabs_and_space_runs() {
        assert_eq!(
            split_cells("Name\tAmount   Currency"),
            vec!["Name", "Amount", "Currency"]
        );
    }

    #[test]
    fn single_spaces_stay_inside_one_cell() {
        assert_eq!(split_cells("Grand total  12 units"), vec!["Grand total", "12 units"]);
    }

    #[test]
    fn empty_line_yields_no_cells() {
        assert!(split_cells("   ").is_empty());
    }
}
