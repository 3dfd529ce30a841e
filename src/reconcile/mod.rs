use std::fmt;

use crate::error::{ErrorKind, InventoryError};
use crate::inventory::*;
use crate::models::*;
use crate::neighbors::{canonicalize_claim, verify_claim};
use crate::session::{ManagedDevice, SessionSettings};
use crate::transport::Connector;

/// Tally of one verification run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub devices_processed: usize,
    pub devices_failed: usize,
    pub devices_skipped: usize,
    pub rows_verified: usize,
    pub rows_unverified: usize,
    pub rows_skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "devices: {} processed, {} failed, {} skipped | rows: {} verified, {} unverified, {} skipped",
            self.devices_processed,
            self.devices_failed,
            self.devices_skipped,
            self.rows_verified,
            self.rows_unverified,
            self.rows_skipped
        )
    }
}

/// Walks every device sheet, collects live neighbor data and writes the results back
pub struct Reconciler<C: Connector> {
    connector: C,
    layout: SheetLayout,
    settings: SessionSettings,
    ignore_sheets: Vec<String>,
}

impl<C: Connector> Reconciler<C> {
    pub fn new(connector: C, layout: SheetLayout, settings: SessionSettings) -> Self {
        Self {
            connector,
            layout,
            settings,
            ignore_sheets: Vec::new(),
        }
    }

    /// Sheets to leave alone on top of the ones listed on the Settings sheet
    pub fn with_ignore_sheets(mut self, sheets: Vec<String>) -> Self {
        self.ignore_sheets = sheets;
        self
    }

    /// Process every device sheet in workbook order, one device at a time.
    /// Only workbook writes can fail the run.
    pub async fn run<S: InventoryStore + ?Sized>(&self, store: &mut S) -> Result<RunSummary, InventoryError> {
        let mut ignore = read_settings(&*store).ignore_sheets;
        ignore.extend(self.ignore_sheets.iter().cloned());

        let mut summary = RunSummary::default();
        for sheet in device_sheets(&*store, &ignore) {
            let target = match read_target(&*store, &sheet, &self.layout) {
                Ok(target) => target,
                Err(e) => {
                    tracing::debug!("{} | {} | {}", sheet, ErrorKind::Configuration, e);
                    summary.devices_skipped += 1;
                    continue;
                }
            };

            tracing::info!("{} | Processing sheet {}", target.host, sheet);
            let mut device = ManagedDevice::new(target, self.settings.clone());
            device.collect(&self.connector).await;

            self.write_device(store, &sheet, &device, &mut summary)?;
        }

        tracing::info!("Run complete: {}", summary);
        Ok(summary)
    }

    fn write_device<S: InventoryStore + ?Sized>(
        &self,
        store: &mut S,
        sheet: &str,
        device: &ManagedDevice,
        summary: &mut RunSummary,
    ) -> Result<(), InventoryError> {
        let layout = &self.layout;
        store.write_ref(sheet, layout.status, device.status().as_str())?;
        let comments = device
            .annotations()
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        store.write_ref(sheet, layout.comments, &comments)?;

        if device.status() != DeviceStatus::Complete {
            summary.devices_failed += 1;
            return Ok(());
        }
        summary.devices_processed += 1;

        let identity = device.identity();
        store.write_ref(sheet, layout.hostname, &identity.hostname)?;
        store.write_ref(sheet, layout.version, &identity.version)?;
        store.write_ref(sheet, layout.model, &identity.model.joined())?;
        store.write_ref(sheet, layout.serial, &identity.serial_number.joined())?;
        store.write_ref(sheet, layout.boot_image, &identity.boot_image)?;

        self.write_verifications(store, sheet, device, summary)
    }

    fn write_verifications<S: InventoryStore + ?Sized>(
        &self,
        store: &mut S,
        sheet: &str,
        device: &ManagedDevice,
        summary: &mut RunSummary,
    ) -> Result<(), InventoryError> {
        let host = &device.target().host;
        let columns = TableColumns::locate(&*store, sheet, self.layout.header_row);
        let Some(verification_col) = columns.verification.filter(|_| columns.supports_verification()) else {
            tracing::debug!("{} | Sheet {} has no adjacency table", host, sheet);
            return Ok(());
        };

        for row in self.layout.header_row + 1..=store.row_count(sheet) {
            let Some(claim) = columns.claim_at(&*store, sheet, row) else {
                continue;
            };
            if !claim.is_eligible() {
                summary.rows_skipped += 1;
                continue;
            }

            let canonical = match canonicalize_claim(&claim, device.target().family) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("{} | {} | row {}: {}", host, ErrorKind::MalformedInterfaceName, row, e);
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            let result = verify_claim(&canonical, device.cdp_neighbors(), device.lldp_neighbors());
            match result.annotation() {
                Some(text) => {
                    store.write_cell(sheet, row, verification_col, &text)?;
                    summary.rows_verified += 1;
                }
                None => {
                    tracing::debug!(
                        "{} | {} -> {} {} not seen by CDP or LLDP",
                        host,
                        claim.local_interface,
                        claim.neighbor,
                        claim.remote_interface
                    );
                    summary.rows_unverified += 1;
                }
            }
        }
        Ok(())
    }
}
