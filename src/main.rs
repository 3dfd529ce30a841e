mod backup;
mod cli;
mod config;
mod error;
mod inventory;
mod models;
mod neighbors;
mod parsers;
mod reconcile;
mod session;
mod templates;
mod transport;
mod utils;

use anyhow::Context;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{CommandLine, Commands, RunArgs};
use config::{workbook_path, Config};
use error::InventoryError;
use inventory::{read_settings, Workbook};
use reconcile::Reconciler;
use templates::{generate_configurations, TemplateSet};
use transport::SshConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| commands.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut cfg = Config::load();
    let input = workbook_path(commands.input.as_deref().unwrap_or(&cfg.workbook));
    let output = commands
        .output
        .as_deref()
        .map(workbook_path)
        .unwrap_or_else(|| input.clone());

    let mut workbook = match Workbook::open(&input) {
        Ok(wb) => wb,
        Err(InventoryError::NotFound(path)) => {
            anyhow::bail!(
                "Workbook '{}' does not exist. Pass the port matrix file with -i/--input.",
                path
            );
        }
        Err(e) => return Err(e).context("Failed to load the port matrix"),
    };
    tracing::info!("Port matrix: {}", input.display());

    match commands.command {
        Commands::Generate => {
            generate(&mut workbook, &cfg, &[])?;
        }
        Commands::Verify(args) => {
            args.apply(&mut cfg);
            verify(&mut workbook, &cfg, &args).await?;
        }
        Commands::All(args) => {
            args.apply(&mut cfg);
            generate(&mut workbook, &cfg, &args.ignore_sheets)?;
            save(&workbook, &output)?;
            verify(&mut workbook, &cfg, &args).await?;
        }
    }

    save(&workbook, &output)
}

/// Render configurations, skipping the Settings ignore list plus `extra_ignore`
fn generate(workbook: &mut Workbook, cfg: &Config, extra_ignore: &[String]) -> anyhow::Result<()> {
    tracing::info!("Generating configurations");
    let mut settings = read_settings(&*workbook);
    settings.ignore_sheets.extend(extra_ignore.iter().cloned());
    let templates = TemplateSet::from_entries(&settings.templates)
        .context("Failed to load templates from the Settings sheet")?;
    if templates.is_empty() {
        tracing::warn!("No templates on the Settings sheet, nothing to generate");
        return Ok(());
    }

    let summary = generate_configurations(workbook, &templates, &cfg.sheet_layout(), &settings.ignore_sheets)?;
    tracing::info!("Generate complete: {}", summary);
    Ok(())
}

async fn verify(workbook: &mut Workbook, cfg: &Config, args: &RunArgs) -> anyhow::Result<()> {
    tracing::info!("Verifying claimed adjacencies");
    let connector = SshConnector::new(cfg.ssh_options());
    let reconciler = Reconciler::new(connector, cfg.sheet_layout(), cfg.session_settings())
        .with_ignore_sheets(args.ignore_sheets.clone());
    let summary = reconciler.run(workbook).await?;
    if summary.devices_failed > 0 {
        tracing::warn!(
            "{} devices could not be verified, see their comments cell",
            summary.devices_failed
        );
    }
    Ok(())
}

fn save(workbook: &Workbook, path: &Path) -> anyhow::Result<()> {
    workbook
        .save(path)
        .with_context(|| format!("Failed to save the port matrix to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory::tests::device_sheet;
    use inventory::{InventoryStore, Sheet, SETTINGS_SHEET};

    fn workbook() -> Workbook {
        let mut sheets = vec![Sheet {
            name: SETTINGS_SHEET.into(),
            rows: vec![vec!["uplink".into(), "interface {Local Interface}".into()]],
        }];
        for name in ["SW1", "Lab"] {
            let mut sheet = device_sheet(
                name,
                ["10.0.0.1", "admin", "secret", "", "ios"],
                &[["Gi0/1", "core-sw", "Gi0/2", ""]],
            );
            sheet.rows[6].push("uplink".into());
            sheets.push(sheet);
        }
        Workbook { sheets }
    }

    #[test]
    fn test_generate_skips_command_line_ignored_sheets() {
        let cfg = Config::load();
        let mut wb = workbook();
        generate(&mut wb, &cfg, &["Lab".to_string()]).unwrap();

        assert_eq!(wb.read_cell("SW1", 7, 6).as_deref(), Some("interface Gi0/1"));
        assert_eq!(wb.read_cell("Lab", 7, 6), None);
    }

    #[test]
    fn test_generate_without_extra_ignore_covers_every_sheet() {
        let cfg = Config::load();
        let mut wb = workbook();
        generate(&mut wb, &cfg, &[]).unwrap();

        assert_eq!(wb.read_cell("Lab", 7, 6).as_deref(), Some("interface Gi0/1"));
    }
}
