//! Scripted in-memory sessions for tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{Connector, Session};
use crate::error::SessionError;
use crate::models::{DeviceTarget, FieldValue, Record};
use crate::parsers::ParsedCommand;

/// How a scripted device behaves
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub connect_error: Option<SessionError>,
    pub enable_error: Option<SessionError>,
    pub records: HashMap<&'static str, Vec<Record>>,
    pub raw: HashMap<&'static str, String>,
    pub command_errors: HashMap<&'static str, SessionError>,
    /// Liveness right after connecting
    pub alive: bool,
    /// Number of reconnects after which the session is alive again; `None` never recovers
    pub alive_after_reconnects: Option<usize>,
    /// The first run of this command drops the session with a transport error
    pub drop_on: Option<&'static str>,
    /// Returned by successive reconnect calls before they start succeeding
    pub reconnect_errors: Vec<SessionError>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self {
            connect_error: None,
            enable_error: None,
            records: HashMap::new(),
            raw: HashMap::new(),
            command_errors: HashMap::new(),
            alive: true,
            alive_after_reconnects: None,
            drop_on: None,
            reconnect_errors: Vec::new(),
        }
    }
}

impl MockDevice {
    pub fn with_records(mut self, command: &'static str, records: Vec<Record>) -> Self {
        self.records.insert(command, records);
        self
    }

    pub fn with_raw(mut self, command: &'static str, raw: &str) -> Self {
        self.raw.insert(command, raw.to_string());
        self
    }

    pub fn with_command_error(mut self, command: &'static str, err: SessionError) -> Self {
        self.command_errors.insert(command, err);
        self
    }
}

/// What the session saw, shared with the test after the device is done
#[derive(Debug, Default)]
pub struct MockJournal {
    pub commands: Vec<String>,
    pub connects: usize,
    pub enables: usize,
    pub reconnects: usize,
    pub disconnects: usize,
    pub log_paths: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct MockConnector {
    device: MockDevice,
    pub journal: Arc<Mutex<MockJournal>>,
}

impl MockConnector {
    pub fn new(device: MockDevice) -> Self {
        Self {
            device,
            journal: Arc::new(Mutex::new(MockJournal::default())),
        }
    }

    pub fn journal(&self) -> std::sync::MutexGuard<'_, MockJournal> {
        self.journal.lock().unwrap()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _target: &DeviceTarget) -> Result<Box<dyn Session>, SessionError> {
        self.journal.lock().unwrap().connects += 1;
        if let Some(err) = &self.device.connect_error {
            return Err(err.clone());
        }
        Ok(Box::new(MockSession {
            alive: self.device.alive,
            dropped: false,
            reconnect_errors: self.device.reconnect_errors.iter().cloned().collect(),
            device: self.device.clone(),
            journal: self.journal.clone(),
        }))
    }
}

pub struct MockSession {
    device: MockDevice,
    alive: bool,
    dropped: bool,
    reconnect_errors: VecDeque<SessionError>,
    journal: Arc<Mutex<MockJournal>>,
}

impl MockSession {
    fn lookup(&self, command: &str) -> Option<&'static str> {
        let parsed = ParsedCommand::identify(command);
        self.device
            .records
            .keys()
            .chain(self.device.raw.keys())
            .chain(self.device.command_errors.keys())
            .copied()
            .find(|key| *key == command || (parsed.is_some() && ParsedCommand::identify(key) == parsed))
    }

    /// Record the command and fail it if it is scripted to drop or error
    fn execute(&mut self, command: &str) -> Result<Option<&'static str>, SessionError> {
        self.journal.lock().unwrap().commands.push(command.to_string());
        if !self.dropped && self.device.drop_on == Some(command) {
            self.dropped = true;
            self.alive = false;
            return Err(SessionError::Transport("channel closed by device".into()));
        }
        let key = self.lookup(command);
        if let Some(err) = key.and_then(|k| self.device.command_errors.get(k)) {
            return Err(err.clone());
        }
        Ok(key)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn run_command(&mut self, command: &str) -> Result<Vec<Record>, SessionError> {
        let key = self.execute(command)?;
        Ok(key
            .and_then(|k| self.device.records.get(k))
            .cloned()
            .unwrap_or_default())
    }

    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        let key = self.execute(command)?;
        Ok(key
            .and_then(|k| self.device.raw.get(k))
            .cloned()
            .unwrap_or_default())
    }

    async fn enable(&mut self) -> Result<(), SessionError> {
        self.journal.lock().unwrap().enables += 1;
        match &self.device.enable_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn is_alive(&mut self) -> bool {
        self.alive
    }

    async fn reconnect(&mut self) -> Result<(), SessionError> {
        let mut journal = self.journal.lock().unwrap();
        journal.reconnects += 1;
        if let Some(err) = self.reconnect_errors.pop_front() {
            return Err(err);
        }
        if let Some(needed) = self.device.alive_after_reconnects {
            if journal.reconnects >= needed {
                self.alive = true;
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.journal.lock().unwrap().disconnects += 1;
        self.alive = false;
    }

    fn enable_logging(&mut self, path: &Path) -> Result<(), SessionError> {
        self.journal.lock().unwrap().log_paths.push(path.to_path_buf());
        Ok(())
    }
}

pub fn record(fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
        .collect()
}

pub fn cdp_record(host: &str, local: &str, remote: &str) -> Record {
    record(&[
        ("destination_host", host),
        ("local_interface", local),
        ("remote_interface", remote),
    ])
}

pub fn lldp_record(host: &str, local: &str, remote: &str) -> Record {
    record(&[
        ("neighbor", host),
        ("local_interface", local),
        ("remote_interface", remote),
    ])
}

pub fn ios_version_record(hostname: &str, models: &[&str], serials: &[&str]) -> Record {
    let mut r = record(&[
        ("hostname", hostname),
        ("version", "15.2(7)E2"),
        ("running_image", "flash:c2960x-universalk9-mz.152-7.E2.bin"),
    ]);
    r.insert(
        "hardware".to_string(),
        FieldValue::List(models.iter().map(|s| s.to_string()).collect()),
    );
    r.insert(
        "serial".to_string(),
        FieldValue::List(serials.iter().map(|s| s.to_string()).collect()),
    );
    r
}
