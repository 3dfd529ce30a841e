mod workbook;
mod xlsx;

use std::collections::BTreeMap;

use crate::error::{ConfigurationError, InventoryError};
use crate::models::{ClaimedAdjacency, DeviceFamily, DeviceTarget};

pub use workbook::{Sheet, Workbook};

pub const SETTINGS_SHEET: &str = "Settings";

const SETTINGS_TEMPLATE_NAME_COLUMN: u32 = 1;
const SETTINGS_TEMPLATE_BODY_COLUMN: u32 = 2;
const SETTINGS_IGNORE_COLUMN: u32 = 4;

pub const HEADER_LOCAL_INTERFACE: &str = "Local Interface";
pub const HEADER_NEIGHBOR: &str = "Neighbor";
pub const HEADER_REMOTE_INTERFACE: &str = "Remote Interface";
pub const HEADER_VERIFICATION: &str = "Verification";
pub const HEADER_TEMPLATE: &str = "Template";
pub const HEADER_CONFIGURATION: &str = "Configuration";

/// Tabular workbook access. Rows and columns are 1-based.
pub trait InventoryStore {
    fn list_sheets(&self) -> Vec<String>;

    /// Cell text; empty cells read as `None`
    fn read_cell(&self, sheet: &str, row: u32, column: u32) -> Option<String>;

    /// Non-empty cells of one row keyed by column
    fn read_row(&self, sheet: &str, row: u32) -> BTreeMap<u32, String>;

    fn row_count(&self, sheet: &str) -> u32;

    fn write_cell(&mut self, sheet: &str, row: u32, column: u32, value: &str) -> Result<(), InventoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub column: u32,
}

impl CellRef {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Fixed cell positions of a device sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub host: CellRef,
    pub username: CellRef,
    pub password: CellRef,
    pub secret: CellRef,
    pub family: CellRef,
    pub status: CellRef,
    pub hostname: CellRef,
    pub version: CellRef,
    pub model: CellRef,
    pub serial: CellRef,
    pub boot_image: CellRef,
    pub comments: CellRef,
    pub header_row: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            host: CellRef::new(1, 2),
            username: CellRef::new(2, 2),
            password: CellRef::new(3, 2),
            secret: CellRef::new(4, 2),
            family: CellRef::new(5, 2),
            status: CellRef::new(1, 5),
            hostname: CellRef::new(2, 5),
            version: CellRef::new(3, 5),
            model: CellRef::new(4, 5),
            serial: CellRef::new(5, 5),
            boot_image: CellRef::new(1, 8),
            comments: CellRef::new(2, 8),
            header_row: 6,
        }
    }
}

impl SheetLayout {
    pub fn with_header_row(header_row: u32) -> Self {
        Self {
            header_row,
            ..Self::default()
        }
    }
}

/// Helpers shared by everything reading or writing through a store
pub trait InventoryStoreExt: InventoryStore {
    fn read_ref(&self, sheet: &str, cell: CellRef) -> Option<String> {
        self.read_cell(sheet, cell.row, cell.column)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn write_ref(&mut self, sheet: &str, cell: CellRef, value: &str) -> Result<(), InventoryError> {
        self.write_cell(sheet, cell.row, cell.column, value)
    }
}

impl<T: InventoryStore + ?Sized> InventoryStoreExt for T {}

/// Build a device target from the credential cells of one sheet
pub fn read_target<S: InventoryStore + ?Sized>(
    store: &S,
    sheet: &str,
    layout: &SheetLayout,
) -> Result<DeviceTarget, ConfigurationError> {
    let required = |cell: CellRef, field: &'static str| {
        store
            .read_ref(sheet, cell)
            .ok_or_else(|| ConfigurationError::MissingField {
                sheet: sheet.to_string(),
                field,
            })
    };

    let host = required(layout.host, "host")?;
    let username = required(layout.username, "username")?;
    let password = required(layout.password, "password")?;
    let family_tag = required(layout.family, "device family")?;
    let family =
        DeviceFamily::from_tag(&family_tag).ok_or_else(|| ConfigurationError::UnknownFamily {
            sheet: sheet.to_string(),
            value: family_tag.clone(),
        })?;

    Ok(DeviceTarget {
        host,
        username,
        password,
        secret: store.read_ref(sheet, layout.secret),
        family,
        record_id: sheet.to_string(),
    })
}

/// Column positions found on the header row of a device sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableColumns {
    pub headers: BTreeMap<u32, String>,
    pub local_interface: Option<u32>,
    pub neighbor: Option<u32>,
    pub remote_interface: Option<u32>,
    pub verification: Option<u32>,
    pub template: Option<u32>,
    pub configuration: Option<u32>,
}

impl TableColumns {
    pub fn locate<S: InventoryStore + ?Sized>(store: &S, sheet: &str, header_row: u32) -> Self {
        let headers: BTreeMap<u32, String> = store
            .read_row(sheet, header_row)
            .into_iter()
            .map(|(col, text)| (col, text.trim().to_string()))
            .filter(|(_, text)| !text.is_empty())
            .collect();

        let find = |name: &str| {
            headers
                .iter()
                .find(|(_, text)| text.eq_ignore_ascii_case(name))
                .map(|(col, _)| *col)
        };

        Self {
            local_interface: find(HEADER_LOCAL_INTERFACE),
            neighbor: find(HEADER_NEIGHBOR),
            remote_interface: find(HEADER_REMOTE_INTERFACE),
            verification: find(HEADER_VERIFICATION),
            template: find(HEADER_TEMPLATE),
            configuration: find(HEADER_CONFIGURATION),
            headers,
        }
    }

    /// Whether the sheet carries everything needed to verify adjacencies
    pub fn supports_verification(&self) -> bool {
        self.local_interface.is_some()
            && self.neighbor.is_some()
            && self.remote_interface.is_some()
            && self.verification.is_some()
    }

    /// Claim for one table row; `None` when the sheet has no verification columns
    pub fn claim_at<S: InventoryStore + ?Sized>(
        &self,
        store: &S,
        sheet: &str,
        row: u32,
    ) -> Option<ClaimedAdjacency> {
        let cell = |column: Option<u32>| -> Option<String> {
            let text = store.read_cell(sheet, row, column?).unwrap_or_default();
            Some(text.trim().to_string())
        };
        Some(ClaimedAdjacency {
            row,
            local_interface: cell(self.local_interface)?,
            neighbor: cell(self.neighbor)?,
            remote_interface: cell(self.remote_interface)?,
        })
    }
}

/// Contents of the Settings sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// (name, body) pairs in sheet order, duplicates kept
    pub templates: Vec<(String, String)>,
    pub ignore_sheets: Vec<String>,
}

pub fn read_settings<S: InventoryStore + ?Sized>(store: &S) -> WorkbookSettings {
    if !store.list_sheets().iter().any(|s| s == SETTINGS_SHEET) {
        tracing::debug!("Workbook has no {} sheet", SETTINGS_SHEET);
        return WorkbookSettings::default();
    }

    let mut settings = WorkbookSettings::default();
    for row in 1..=store.row_count(SETTINGS_SHEET) {
        let name = store.read_ref(SETTINGS_SHEET, CellRef::new(row, SETTINGS_TEMPLATE_NAME_COLUMN));
        if let Some(name) = name {
            let body = store
                .read_cell(SETTINGS_SHEET, row, SETTINGS_TEMPLATE_BODY_COLUMN)
                .unwrap_or_default();
            settings.templates.push((name, body));
        }

        // Row 1 of the ignore column is its heading
        if row >= 2 {
            if let Some(sheet) = store.read_ref(SETTINGS_SHEET, CellRef::new(row, SETTINGS_IGNORE_COLUMN)) {
                settings.ignore_sheets.push(sheet);
            }
        }
    }
    settings
}

/// Sheets describing devices, in workbook order
pub fn device_sheets<S: InventoryStore + ?Sized>(store: &S, ignore: &[String]) -> Vec<String> {
    store
        .list_sheets()
        .into_iter()
        .filter(|name| name != SETTINGS_SHEET)
        .filter(|name| !ignore.iter().any(|i| i == name))
        .collect()
}
