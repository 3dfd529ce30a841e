//! Turn raw CLI text into structured records.
//!
//! Each supported command has a regex-driven parser per device family. The field
//! names of the produced records are what the rest of the crate reads (see
//! `DeviceFamily::identity_fields` and `Protocol::remote_host_field`).

mod neighbors;
mod version;

use regex_lite::Regex;

use crate::error::SessionError;
use crate::models::{DeviceFamily, Record};

pub use neighbors::{parse_cdp_detail, parse_lldp_detail};
pub use version::parse_show_version;

/// Commands with a structured parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    ShowVersion,
    CdpNeighborsDetail,
    LldpNeighborsDetail,
}

impl ParsedCommand {
    const CANONICAL: [(ParsedCommand, &'static [&'static str]); 3] = [
        (ParsedCommand::ShowVersion, &["show", "version"]),
        (ParsedCommand::CdpNeighborsDetail, &["show", "cdp", "neighbors", "detail"]),
        (ParsedCommand::LldpNeighborsDetail, &["show", "lldp", "neighbors", "detail"]),
    ];

    /// Identify a command, accepting CLI abbreviations ("sh cdp neigh det")
    pub fn identify(command: &str) -> Option<Self> {
        let words: Vec<String> = command
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        Self::CANONICAL.iter().find_map(|(cmd, canonical)| {
            let matches = words.len() == canonical.len()
                && words
                    .iter()
                    .zip(canonical.iter())
                    .all(|(w, c)| !w.is_empty() && c.starts_with(w.as_str()));
            matches.then_some(*cmd)
        })
    }
}

/// Parse the output of `command` as reported by a device of `family`
pub fn parse_output(
    family: DeviceFamily,
    command: &str,
    raw: &str,
) -> Result<Vec<Record>, SessionError> {
    let parsed = ParsedCommand::identify(command).ok_or_else(|| {
        SessionError::Command(format!("no output parser for command '{}'", command))
    })?;

    check_cli_error(command, raw)?;

    Ok(match parsed {
        ParsedCommand::ShowVersion => parse_show_version(family, raw),
        ParsedCommand::CdpNeighborsDetail => parse_cdp_detail(raw),
        ParsedCommand::LldpNeighborsDetail => parse_lldp_detail(family, raw),
    })
}

/// Reject output carrying a CLI error marker
pub fn check_cli_error(command: &str, raw: &str) -> Result<(), SessionError> {
    const MARKERS: [&str; 4] = ["% Invalid", "% Incomplete", "% Ambiguous", "% Unknown"];
    for line in raw.lines() {
        let line = line.trim();
        if MARKERS.iter().any(|m| line.starts_with(m)) {
            return Err(SessionError::Command(format!(
                "'{}' was rejected by the device: {}",
                command, line
            )));
        }
    }
    Ok(())
}

/// Compile a parser pattern. Patterns are fixed, so a failure here is logged and
/// the pattern simply never matches.
fn pattern(re: &str) -> Option<Regex> {
    match Regex::new(re) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid parser pattern {}: {}", re, e);
            None
        }
    }
}

/// All first-group captures of `re` in `text`
fn capture_all(re: &str, text: &str) -> Vec<String> {
    let Some(re) = pattern(re) else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// First first-group capture of `re` in `text`
fn capture_first(re: &str, text: &str) -> Option<String> {
    capture_all(re, text).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_commands() {
        assert_eq!(ParsedCommand::identify("show version"), Some(ParsedCommand::ShowVersion));
        assert_eq!(ParsedCommand::identify("sh ver"), Some(ParsedCommand::ShowVersion));
        assert_eq!(
            ParsedCommand::identify("show cdp neigh detail"),
            Some(ParsedCommand::CdpNeighborsDetail)
        );
        assert_eq!(
            ParsedCommand::identify("SHOW LLDP NEIGHBORS DETAIL"),
            Some(ParsedCommand::LldpNeighborsDetail)
        );
        assert_eq!(ParsedCommand::identify("show cdp neighbors"), None);
        assert_eq!(ParsedCommand::identify("show running-config"), None);
    }

    #[test]
    fn test_cli_error_is_command_error() {
        let raw = "show cdp nei detail\n% Invalid input detected at '^' marker.\n";
        let err = parse_output(DeviceFamily::Ios, "show cdp neighbors detail", raw).unwrap_err();
        assert!(matches!(err, SessionError::Command(_)));
    }

    #[test]
    fn test_unknown_command_is_command_error() {
        let err = parse_output(DeviceFamily::Ios, "show clock", "10:00:00").unwrap_err();
        assert!(matches!(err, SessionError::Command(_)));
    }

    #[test]
    fn test_disabled_protocol_is_empty_table() {
        let records =
            parse_output(DeviceFamily::Ios, "show cdp neighbors detail", "% CDP is not enabled\n")
                .unwrap();
        assert!(records.is_empty());
    }
}
