use std::fmt;

/// Broad classification of everything that can go wrong while working a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Transport,
    Command,
    MalformedInterfaceName,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Auth => "AuthError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Command => "CommandError",
            ErrorKind::MalformedInterfaceName => "MalformedInterfaceName",
            ErrorKind::Configuration => "ConfigurationError",
        };
        f.write_str(name)
    }
}

/// Errors raised by a command session (SSH or otherwise)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("command error: {0}")]
    Command(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Auth(_) => ErrorKind::Auth,
            SessionError::Transport(_) => ErrorKind::Transport,
            SessionError::Command(_) => ErrorKind::Command,
        }
    }
}

/// An interface name without a letter prefix or a numeric suffix
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed interface name '{name}': {reason}")]
pub struct MalformedInterfaceName {
    pub name: String,
    pub reason: &'static str,
}

impl MalformedInterfaceName {
    pub fn new(name: &str, reason: &'static str) -> Self {
        Self {
            name: name.to_string(),
            reason,
        }
    }
}

/// A device sheet that cannot be turned into a device target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("sheet '{sheet}' is missing required field '{field}'")]
    MissingField { sheet: String, field: &'static str },
    #[error("sheet '{sheet}' has unknown device family '{value}'")]
    UnknownFamily { sheet: String, value: String },
}

/// Workbook load/save/write failures
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("workbook file does not exist: {0}")]
    NotFound(String),
    #[error("failed to read workbook {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write workbook {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid workbook document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("invalid xlsx workbook {path}: {message}")]
    Xlsx { path: String, message: String },
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error("invalid cell coordinates ({row}, {column}): rows and columns start at 1")]
    InvalidCoordinates { row: u32, column: u32 },
}

/// Template lookup and rendering failures
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("a template named '{0}' already exists, template names must be unique")]
    Duplicate(String),
    #[error("no template named '{0}' on the Settings sheet")]
    Unknown(String),
    #[error("unbalanced brace in template '{name}' at byte {position}")]
    Unbalanced { name: String, position: usize },
    #[error("failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

/// Where in the device sequence a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Enable,
    DisablePaging,
    CollectIdentity,
    CollectCdp,
    CollectLldp,
    Reconnect,
    Backup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Connect => "connect",
            Step::Enable => "enable",
            Step::DisablePaging => "disable paging",
            Step::CollectIdentity => "collect identity",
            Step::CollectCdp => "collect cdp neighbors",
            Step::CollectLldp => "collect lldp neighbors",
            Step::Reconnect => "reconnect",
            Step::Backup => "backup running config",
        };
        f.write_str(name)
    }
}

/// Structured diagnostic recorded against a device when a step fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailure {
    pub kind: ErrorKind,
    pub step: Step,
    pub host: String,
    pub message: String,
}

impl DeviceFailure {
    pub fn from_session(host: &str, step: Step, err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            step,
            host: host.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | at step: {} | {}",
            self.host, self.kind, self.step, self.message
        )
    }
}

impl std::error::Error for DeviceFailure {}
