use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::InventoryStore;
use crate::error::InventoryError;

/// One named sheet; rows of cells, row 1 first, column A first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// File formats a workbook can be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Json,
}

impl WorkbookFormat {
    /// `.json` files are JSON documents, anything else is treated as xlsx
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => WorkbookFormat::Json,
            _ => WorkbookFormat::Xlsx,
        }
    }
}

/// Port matrix workbook: every sheet held as rows of cell text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            return Err(InventoryError::NotFound(path.display().to_string()));
        }
        let workbook = match WorkbookFormat::from_path(path) {
            WorkbookFormat::Xlsx => super::xlsx::read_xlsx(path)?,
            WorkbookFormat::Json => {
                let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&content)?
            }
        };
        tracing::debug!(
            "Loaded workbook {} with {} sheets",
            path.display(),
            workbook.sheets.len()
        );
        Ok(workbook)
    }

    pub fn save(&self, path: &Path) -> Result<(), InventoryError> {
        let write_err = |source| InventoryError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        match WorkbookFormat::from_path(path) {
            WorkbookFormat::Xlsx => super::xlsx::write_xlsx(self, path)?,
            WorkbookFormat::Json => {
                let content = serde_json::to_string_pretty(self)?;
                std::fs::write(path, content).map_err(write_err)?;
            }
        }
        tracing::info!("Workbook saved to {}", path.display());
        Ok(())
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl InventoryStore for Workbook {
    fn list_sheets(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_cell(&self, sheet: &str, row: u32, column: u32) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        self.sheet(sheet)?
            .rows
            .get(row as usize - 1)?
            .get(column as usize - 1)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn read_row(&self, sheet: &str, row: u32) -> BTreeMap<u32, String> {
        let cells = row
            .checked_sub(1)
            .and_then(|idx| self.sheet(sheet)?.rows.get(idx as usize));
        cells
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(i, v)| (i as u32 + 1, v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn row_count(&self, sheet: &str) -> u32 {
        self.sheet(sheet).map(|s| s.rows.len() as u32).unwrap_or(0)
    }

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        column: u32,
        value: &str,
    ) -> Result<(), InventoryError> {
        if row == 0 || column == 0 {
            return Err(InventoryError::InvalidCoordinates { row, column });
        }
        let target = self
            .sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| InventoryError::SheetNotFound(sheet.to_string()))?;

        let (r, c) = (row as usize - 1, column as usize - 1);
        if target.rows.len() <= r {
            target.rows.resize(r + 1, Vec::new());
        }
        let cells = &mut target.rows[r];
        if cells.len() <= c {
            cells.resize(c + 1, String::new());
        }
        cells[c] = value.to_string();
        Ok(())
    }
}
