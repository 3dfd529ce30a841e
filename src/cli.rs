use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "port-matrix")]
#[command(about = "Generate interface configurations and verify cabling against CDP/LLDP.")]
pub struct CommandLine {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Port matrix workbook to read
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Where to save the updated workbook (defaults to the input file)
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the Configuration column from the Settings templates
    #[command(alias = "g")]
    Generate,
    /// Log into every device and verify the claimed adjacencies
    #[command(alias = "v")]
    Verify(RunArgs),
    /// Generate configurations, then verify
    #[command(alias = "a")]
    All(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Directory for raw session logs
    #[arg(long)]
    pub raw_log_dir: Option<String>,

    /// Save each device's running configuration here
    #[arg(long)]
    pub backup_dir: Option<String>,

    /// Reconnect attempts before giving up on a device
    #[arg(long)]
    pub tries: Option<u32>,

    /// Seconds to wait before each reconnect attempt
    #[arg(long)]
    pub wait_secs: Option<u64>,

    /// Sheet to leave alone (repeatable)
    #[arg(long = "ignore-sheet")]
    pub ignore_sheets: Vec<String>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "port_matrix=info",
            1 => "port_matrix=debug",
            _ => "port_matrix=trace",
        }
    }
}

impl RunArgs {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.raw_log_dir {
            cfg.raw_log_dir = dir.clone();
        }
        if let Some(dir) = &self.backup_dir {
            cfg.backup_dir = dir.clone();
        }
        if let Some(tries) = self.tries {
            cfg.reconnect_tries = tries;
        }
        if let Some(wait) = self.wait_secs {
            cfg.reconnect_wait_secs = wait;
        }
    }
}
