use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook as XlsxWriter;
use std::path::Path;

use super::{Sheet, Workbook};
use crate::error::InventoryError;

fn xlsx_error(path: &Path, e: impl std::fmt::Display) -> InventoryError {
    InventoryError::Xlsx {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Cell text as the user sees it; whole floats print without a decimal point
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Load every worksheet as rows of cell text, anchored at A1
pub fn read_xlsx(path: &Path) -> Result<Workbook, InventoryError> {
    let mut book: Xlsx<_> = open_workbook(path).map_err(|e| xlsx_error(path, e))?;

    let mut sheets = Vec::new();
    for name in book.sheet_names() {
        let range = book.worksheet_range(&name).map_err(|e| xlsx_error(path, e))?;
        let mut rows: Vec<Vec<String>> = Vec::new();
        if let Some((first_row, first_col)) = range.start() {
            rows.resize(first_row as usize, Vec::new());
            for cells in range.rows() {
                let mut row = vec![String::new(); first_col as usize];
                row.extend(cells.iter().map(cell_text));
                while row.last().is_some_and(|c| c.is_empty()) {
                    row.pop();
                }
                rows.push(row);
            }
        }
        sheets.push(Sheet { name, rows });
    }
    Ok(Workbook { sheets })
}

pub fn write_xlsx(workbook: &Workbook, path: &Path) -> Result<(), InventoryError> {
    let mut book = XlsxWriter::new();
    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(|e| xlsx_error(path, e))?;
        for (r, cells) in sheet.rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                let (Ok(row), Ok(col)) = (u32::try_from(r), u16::try_from(c)) else {
                    return Err(InventoryError::InvalidCoordinates {
                        row: r as u32 + 1,
                        column: c as u32 + 1,
                    });
                };
                worksheet
                    .write_string(row, col, value)
                    .map_err(|e| xlsx_error(path, e))?;
            }
        }
    }
    book.save(path).map_err(|e| xlsx_error(path, e))
}
