//! Command-session capability used by the device session manager.

mod ssh;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use std::path::Path;

use crate::error::SessionError;
use crate::models::{DeviceTarget, Record};

pub use ssh::{SshConnector, SshOptions};

/// Opens authenticated sessions to devices
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn Session>, SessionError>;
}

/// An authenticated command channel to one device
#[async_trait]
pub trait Session: Send {
    /// Run a command and return its output parsed into records
    async fn run_command(&mut self, command: &str) -> Result<Vec<Record>, SessionError>;

    /// Run a command and return its raw text
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError>;

    /// Enter privileged mode (no-op when already privileged)
    async fn enable(&mut self) -> Result<(), SessionError>;

    /// Keep-alive probe
    async fn is_alive(&mut self) -> bool;

    /// Re-establish the underlying connection with the same credentials
    async fn reconnect(&mut self) -> Result<(), SessionError>;

    async fn disconnect(&mut self);

    /// Append everything read from the device to `path`
    fn enable_logging(&mut self, path: &Path) -> Result<(), SessionError>;
}
