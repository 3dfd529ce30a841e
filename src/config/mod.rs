use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::inventory::SheetLayout;
use crate::session::{RetryPolicy, SessionSettings};
use crate::transport::SshOptions;

pub const DEFAULT_WORKBOOK: &str = "PortMatrix.xlsx";

/// Config holds all application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workbook: String,
    pub raw_log_dir: String,
    pub backup_dir: String,
    pub reconnect_tries: u32,
    pub reconnect_wait_secs: u64,
    pub ssh_port: u16,
    pub ssh_timeout_secs: u64,
    pub header_row: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            workbook: get_env("PORTMATRIX_FILE", DEFAULT_WORKBOOK),
            raw_log_dir: get_env("RAW_LOG_DIR", "raw_logs"),
            backup_dir: get_env("BACKUP_DIR", ""),
            reconnect_tries: get_env("RECONNECT_TRIES", "3").parse().unwrap_or(3),
            reconnect_wait_secs: get_env("RECONNECT_WAIT_SECS", "10").parse().unwrap_or(10),
            ssh_port: get_env("SSH_PORT", "22").parse().unwrap_or(22),
            ssh_timeout_secs: get_env("SSH_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            header_row: get_env("HEADER_ROW", "6")
                .parse()
                .ok()
                .filter(|row| *row > 0)
                .unwrap_or(6),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            retry: RetryPolicy {
                tries: self.reconnect_tries,
                wait: Duration::from_secs(self.reconnect_wait_secs),
            },
            raw_log_dir: non_empty_path(&self.raw_log_dir),
            backup_dir: non_empty_path(&self.backup_dir),
        }
    }

    pub fn ssh_options(&self) -> SshOptions {
        SshOptions {
            port: self.ssh_port,
            timeout_secs: self.ssh_timeout_secs,
        }
    }

    pub fn sheet_layout(&self) -> SheetLayout {
        SheetLayout::with_header_row(self.header_row)
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

/// Workbook path with the `.xlsx` extension added unless it already names
/// an xlsx or JSON workbook
pub fn workbook_path(name: &str) -> PathBuf {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".json") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.xlsx", name))
    }
}
