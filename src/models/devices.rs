use chrono::{DateTime, Local};
use std::fmt;

use super::FieldValue;

/// Vendor/OS variant of a managed device. Selected once when the device is read
/// from the workbook and carried as data from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    Ios,
    Nxos,
    Xr,
}

/// Field names of the parsed `show version` record for one family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityFieldMap {
    pub hostname: &'static str,
    pub model: &'static str,
    pub boot_image: &'static str,
    pub version: &'static str,
    pub serial: &'static str,
}

const IOS_IDENTITY_FIELDS: IdentityFieldMap = IdentityFieldMap {
    hostname: "hostname",
    model: "hardware",
    boot_image: "running_image",
    version: "version",
    serial: "serial",
};

const NXOS_IDENTITY_FIELDS: IdentityFieldMap = IdentityFieldMap {
    hostname: "hostname",
    model: "platform",
    boot_image: "boot_image",
    version: "os",
    serial: "serial_number",
};

impl DeviceFamily {
    /// Parse a workbook family tag. Accepts the bare name or the `cisco_` prefixed form.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_lowercase();
        let bare = lower.strip_prefix("cisco_").unwrap_or(&lower);
        match bare {
            "ios" | "ios_xe" | "iosxe" => Some(DeviceFamily::Ios),
            "nxos" | "nx-os" => Some(DeviceFamily::Nxos),
            "xr" | "ios_xr" | "iosxr" => Some(DeviceFamily::Xr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceFamily::Ios => "ios",
            DeviceFamily::Nxos => "nxos",
            DeviceFamily::Xr => "xr",
        }
    }

    pub fn identity_fields(&self) -> &'static IdentityFieldMap {
        match self {
            DeviceFamily::Ios | DeviceFamily::Xr => &IOS_IDENTITY_FIELDS,
            DeviceFamily::Nxos => &NXOS_IDENTITY_FIELDS,
        }
    }

    /// Number of prefix letters kept when shortening an interface name.
    /// `lower3` is the lowercase first three letters of the name.
    pub fn interface_prefix_len(&self, lower3: &str) -> usize {
        match self {
            DeviceFamily::Ios => 2,
            DeviceFamily::Nxos | DeviceFamily::Xr => match lower3 {
                "eth" => 3,
                "vla" | "mgm" => 4,
                _ => 2,
            },
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a device during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceStatus {
    #[default]
    NotStarted,
    Connecting,
    Active,
    Reconnecting,
    Error,
    Complete,
}

impl DeviceStatus {
    /// Text written to the workbook status cell
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::NotStarted => "Connection Not Started",
            DeviceStatus::Connecting => "Connecting",
            DeviceStatus::Active => "Active",
            DeviceStatus::Reconnecting => "Reconnecting",
            DeviceStatus::Error => "Error",
            DeviceStatus::Complete => "Complete",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to open a session to one device
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub host: String,
    pub username: String,
    pub password: String,
    pub secret: Option<String>,
    pub family: DeviceFamily,
    /// Sheet the device was read from
    pub record_id: String,
}

// Credentials stay out of logs.
impl fmt::Debug for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTarget")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("family", &self.family)
            .field("record_id", &self.record_id)
            .finish_non_exhaustive()
    }
}

/// Identity facts collected from `show version`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub hostname: String,
    pub model: FieldValue,
    pub boot_image: String,
    pub version: String,
    pub serial_number: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Timestamped comment attached to a device and written back to its sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub index: usize,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.index,
            self.timestamp.format(crate::utils::FILE_TIMESTAMP_FORMAT),
            self.message
        )
    }
}
