use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DeviceFailure, ErrorKind, SessionError, Step};
use crate::models::*;
use crate::neighbors::fetch_neighbors;
use crate::transport::{Connector, Session};

const DISABLE_PAGING_COMMAND: &str = "terminal length 0";
const VERSION_COMMAND: &str = "show version";
const RECONNECT_ADVICE: &str = "Issue with reestablishing connection to the device. \
Please attempt to access the device and correct issues.";

/// Why a collection run stopped early
enum Halt {
    /// A step failed; recorded as one annotation
    Failed(DeviceFailure),
    /// The reconnect policy gave up and already annotated the device
    Abandoned,
}

impl From<DeviceFailure> for Halt {
    fn from(failure: DeviceFailure) -> Self {
        Halt::Failed(failure)
    }
}

/// Bounded reconnect policy: `tries` attempts, each after waiting `wait`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub tries: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            tries: 3,
            wait: Duration::from_secs(10),
        }
    }
}

/// Per-run knobs shared by every device
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub retry: RetryPolicy,
    pub raw_log_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
}

/// One managed device: connection lifecycle plus the facts collected from it
pub struct ManagedDevice {
    target: DeviceTarget,
    settings: SessionSettings,
    status: DeviceStatus,
    identity: DeviceIdentity,
    cdp_neighbors: Vec<NeighborRecord>,
    lldp_neighbors: Vec<NeighborRecord>,
    annotations: Vec<Annotation>,
    session: Option<Box<dyn Session>>,
    collected_at: Option<DateTime<Local>>,
}

impl ManagedDevice {
    pub fn new(target: DeviceTarget, settings: SessionSettings) -> Self {
        Self {
            target,
            settings,
            status: DeviceStatus::NotStarted,
            identity: DeviceIdentity::default(),
            cdp_neighbors: Vec::new(),
            lldp_neighbors: Vec::new(),
            annotations: Vec::new(),
            session: None,
            collected_at: None,
        }
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn cdp_neighbors(&self) -> &[NeighborRecord] {
        &self.cdp_neighbors
    }

    pub fn lldp_neighbors(&self) -> &[NeighborRecord] {
        &self.lldp_neighbors
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn collected_at(&self) -> Option<DateTime<Local>> {
        self.collected_at
    }

    /// Connect, collect identity and both neighbor tables, then disconnect.
    /// Failures end up as annotations and an `Error` status, never as a return value.
    pub async fn collect(&mut self, connector: &dyn Connector) {
        match self.run_collection(connector).await {
            Ok(()) => {
                if self.settings.backup_dir.is_some() {
                    self.backup_running_config().await;
                }
            }
            Err(Halt::Failed(failure)) => self.record_failure(failure),
            // reestablish_connection already annotated and set the status
            Err(Halt::Abandoned) => self.clear_collected(),
        }
        self.end_connection().await;
    }

    async fn run_collection(&mut self, connector: &dyn Connector) -> Result<(), Halt> {
        self.start_connection(connector).await?;
        self.ensure_connected().await?;
        self.collect_neighbors().await
    }

    async fn start_connection(&mut self, connector: &dyn Connector) -> Result<(), Halt> {
        let host = self.target.host.clone();
        self.status = DeviceStatus::Connecting;
        tracing::info!("{} | Starting connection", host);

        let session = self.connect_with_retry(connector).await?;
        self.session = Some(session);
        self.start_connection_log();
        self.prepare_session().await?;
        self.collect_identity().await?;

        self.status = DeviceStatus::Active;
        tracing::info!(
            "{} | Connection established, hostname is: {}",
            host,
            self.identity.hostname
        );
        Ok(())
    }

    /// Open the session; transport failures are retried per the retry policy
    async fn connect_with_retry(&mut self, connector: &dyn Connector) -> Result<Box<dyn Session>, DeviceFailure> {
        let host = self.target.host.clone();
        let tries = self.settings.retry.tries;
        let mut attempt = 0;
        loop {
            match connector.connect(&self.target).await {
                Ok(session) => return Ok(session),
                Err(SessionError::Transport(msg)) if attempt < tries => {
                    attempt += 1;
                    tracing::warn!("{} | Connection failed ({}), retry {} of {}", host, msg, attempt, tries);
                    tokio::time::sleep(self.settings.retry.wait).await;
                }
                Err(e) => return Err(DeviceFailure::from_session(&host, Step::Connect, &e)),
            }
        }
    }

    /// Privileged mode and paging off; needed on every fresh shell
    async fn prepare_session(&mut self) -> Result<(), DeviceFailure> {
        let host = self.target.host.clone();
        let session = self.active_session(Step::Enable)?;
        session
            .enable()
            .await
            .map_err(|e| DeviceFailure::from_session(&host, Step::Enable, &e))?;
        session
            .send_command(DISABLE_PAGING_COMMAND)
            .await
            .map_err(|e| DeviceFailure::from_session(&host, Step::DisablePaging, &e))?;
        Ok(())
    }

    /// Bring a dead session back through the reconnect policy
    async fn ensure_connected(&mut self) -> Result<(), Halt> {
        if self.reestablish_connection().await {
            Ok(())
        } else {
            Err(Halt::Abandoned)
        }
    }

    /// Transport failures during a collection step go through the reconnect
    /// policy and the step is retried once on the restored session.
    async fn retry_after_transport(&mut self, step: Step, err: SessionError, retried: &mut bool) -> Result<(), Halt> {
        let host = self.target.host.clone();
        match err {
            SessionError::Transport(msg) if !*retried => {
                tracing::warn!("{} | Session lost during {}: {}", host, step, msg);
                *retried = true;
                self.ensure_connected().await
            }
            e => Err(Halt::Failed(DeviceFailure::from_session(&host, step, &e))),
        }
    }

    async fn collect_identity(&mut self) -> Result<(), Halt> {
        let mut retried = false;
        loop {
            match self.update_identity().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.retry_after_transport(Step::CollectIdentity, e, &mut retried)
                        .await?
                }
            }
        }
    }

    /// Read `show version` through the family's field map
    async fn update_identity(&mut self) -> Result<(), SessionError> {
        let fields = self.target.family.identity_fields();
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| SessionError::Transport("no active session".to_string()))?;

        let records = session.run_command(VERSION_COMMAND).await?;
        let record = records.first().ok_or_else(|| {
            SessionError::Command("show version returned no parsable output".to_string())
        })?;

        let required = |field: &str| {
            record_text(record, field).map(str::to_string).ok_or_else(|| {
                SessionError::Command(format!("show version output has no '{}' field", field))
            })
        };

        self.identity = DeviceIdentity {
            hostname: required(fields.hostname)?,
            version: required(fields.version)?,
            model: record.get(fields.model).cloned().unwrap_or_default(),
            boot_image: record_text(record, fields.boot_image)
                .unwrap_or_default()
                .to_string(),
            serial_number: record.get(fields.serial).cloned().unwrap_or_default(),
        };
        Ok(())
    }

    async fn collect_neighbors(&mut self) -> Result<(), Halt> {
        self.cdp_neighbors = self.fetch_table(Protocol::Cdp, Step::CollectCdp).await?;
        self.lldp_neighbors = self.fetch_table(Protocol::Lldp, Step::CollectLldp).await?;
        Ok(())
    }

    async fn fetch_table(&mut self, protocol: Protocol, step: Step) -> Result<Vec<NeighborRecord>, Halt> {
        let host = self.target.host.clone();
        let family = self.target.family;
        let mut retried = false;
        loop {
            let session = self.active_session(step)?;
            match fetch_neighbors(session, protocol, family, &host).await {
                Ok(table) => return Ok(table),
                Err(e) => self.retry_after_transport(step, e, &mut retried).await?,
            }
        }
    }

    async fn backup_running_config(&mut self) {
        let Some(dir) = self.settings.backup_dir.clone() else {
            return;
        };
        let host = self.target.host.clone();
        let hostname = self.identity.hostname.clone();

        let Ok(session) = self.active_session(Step::Backup) else {
            return;
        };
        if let Err(e) = crate::backup::save_running_config(session, &dir, &host, &hostname).await {
            let failure = DeviceFailure {
                kind: ErrorKind::Command,
                step: Step::Backup,
                host: host.clone(),
                message: format!("{:#}", e),
            };
            tracing::warn!("{}", failure);
            self.add_annotation(failure.to_string(), Severity::Error);
        }
    }

    fn active_session(&mut self, step: Step) -> Result<&mut dyn Session, DeviceFailure> {
        match self.session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(DeviceFailure {
                kind: ErrorKind::Transport,
                step,
                host: self.target.host.clone(),
                message: "no active session".to_string(),
            }),
        }
    }

    /// Keep-alive check; false when no session was ever opened
    pub async fn is_alive(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => session.is_alive().await,
            None => false,
        }
    }

    /// Re-establish a dropped session following the retry policy. Returns whether
    /// the session is usable again. Exhausting the attempts leaves one annotation
    /// asking for manual intervention.
    pub async fn reestablish_connection(&mut self) -> bool {
        if self.is_alive().await {
            return true;
        }
        let host = self.target.host.clone();
        let tries = self.settings.retry.tries;

        if self.session.is_some() {
            self.status = DeviceStatus::Reconnecting;
            for attempt in 1..=tries {
                tokio::time::sleep(self.settings.retry.wait).await;
                tracing::info!("{} | Reconnect attempt {} of {}", host, attempt, tries);
                self.start_connection_log();

                let Some(session) = self.session.as_mut() else {
                    break;
                };
                match session.reconnect().await {
                    Ok(()) => {
                        if !self.is_alive().await {
                            continue;
                        }
                        // A fresh shell starts unprivileged with paging on
                        match self.prepare_session().await {
                            Ok(()) => {
                                self.status = DeviceStatus::Active;
                                tracing::info!("{} | Connection reestablished", host);
                                self.add_annotation(
                                    format!("Connection reestablished after {} attempt(s)", attempt),
                                    Severity::Info,
                                );
                                return true;
                            }
                            Err(failure) if failure.kind == ErrorKind::Auth => {
                                tracing::warn!("{}", failure);
                                break;
                            }
                            Err(failure) => tracing::warn!("{}", failure),
                        }
                    }
                    Err(SessionError::Auth(msg)) => {
                        tracing::warn!("{} | Reconnect rejected credentials: {}", host, msg);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("{} | Reconnect attempt {} failed: {}", host, attempt, e);
                    }
                }
            }
        }

        let failure = DeviceFailure {
            kind: ErrorKind::Transport,
            step: Step::Reconnect,
            host,
            message: RECONNECT_ADVICE.to_string(),
        };
        tracing::error!("{}", failure);
        self.add_annotation(failure.to_string(), Severity::Error);
        self.status = DeviceStatus::Error;
        false
    }

    /// Disconnect if the session is still alive. Only an `Active` device becomes
    /// `Complete`; an errored device keeps its status.
    pub async fn end_connection(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.is_alive().await {
            session.disconnect().await;
            self.collected_at = Some(Local::now());
            if self.status == DeviceStatus::Active {
                self.status = DeviceStatus::Complete;
            }
            tracing::debug!("{} | Ending connection", self.target.host);
        }
    }

    /// Append a timestamp banner to the raw session log and point the session at it
    fn start_connection_log(&mut self) {
        let Some(dir) = self.settings.raw_log_dir.as_ref() else {
            return;
        };
        let path = dir.join(format!("{}_raw_cli.log", self.target.host));
        if let Err(e) = crate::utils::append_timestamp_banner(&path) {
            tracing::warn!("{} | Could not write session log {}: {}", self.target.host, path.display(), e);
            return;
        }
        if let Some(session) = self.session.as_mut() {
            match session.enable_logging(&path) {
                Ok(()) => tracing::debug!("{} | Session logging has been enabled", self.target.host),
                Err(e) => tracing::warn!("{} | Could not enable session logging: {}", self.target.host, e),
            }
        }
    }

    pub fn add_annotation(&mut self, message: String, severity: Severity) {
        self.annotations.push(Annotation {
            index: self.annotations.len() + 1,
            message,
            timestamp: Local::now(),
            severity,
        });
    }

    fn record_failure(&mut self, failure: DeviceFailure) {
        tracing::error!("{} | Unable to collect device data: {}", self.target.host, failure);
        self.add_annotation(failure.to_string(), Severity::Error);
        self.status = DeviceStatus::Error;
        self.clear_collected();
    }

    fn clear_collected(&mut self) {
        self.identity = DeviceIdentity::default();
        self.cdp_neighbors.clear();
        self.lldp_neighbors.clear();
    }
}
