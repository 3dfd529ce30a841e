use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::transport::Session;
use crate::utils::FILE_TIMESTAMP_FORMAT;

pub const RUNNING_CONFIG_COMMAND: &str = "show running-config";

/// Save the device's running configuration to
/// `<backup_dir>/<host>_<hostname>_<timestamp>_run_conf.cfg`
pub async fn save_running_config(
    session: &mut dyn Session,
    backup_dir: &Path,
    host: &str,
    hostname: &str,
) -> Result<PathBuf> {
    tracing::debug!("{} | Saving a copy of the running configuration", host);

    let config = session
        .send_command(RUNNING_CONFIG_COMMAND)
        .await
        .context("Failed to read running configuration")?;

    if config.trim().is_empty() {
        anyhow::bail!("Device returned an empty running configuration");
    }

    // Ensure backup directory exists
    tokio::fs::create_dir_all(backup_dir)
        .await
        .with_context(|| format!("Failed to create backup directory {}", backup_dir.display()))?;

    let file_path = backup_dir.join(backup_filename(host, hostname));
    tokio::fs::write(&file_path, &config)
        .await
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    tracing::info!("{} | Running configuration saved to {}", host, file_path.display());
    Ok(file_path)
}

fn backup_filename(host: &str, hostname: &str) -> String {
    let timestamp = Local::now().format(FILE_TIMESTAMP_FORMAT);
    let safe_host = host.replace(['/', ':'], "_");
    let safe_name = hostname.replace(['/', ':'], "_");
    format!("{}_{}_{}_run_conf.cfg", safe_host, safe_name, timestamp)
}
