use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use crate::error::{MalformedInterfaceName, SessionError};
use crate::models::DeviceFamily;

/// Timestamp format used in annotations and file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%Hh%Mm%Ss";

/// Timestamp format used in log banners
pub const BANNER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Shorten an interface name to its canonical comparison form.
///
/// The first alphabetic run is the prefix and everything from the first digit on
/// is the suffix. The prefix is truncated to the family's length for that kind of
/// port and lowercased; the suffix is kept as is, so slot/port separators survive.
/// e.g., "GigabitEthernet0/1" (ios) -> "gi0/1", "Ethernet1/2" (nxos) -> "eth1/2"
pub fn shorten_interface(
    interface: &str,
    family: DeviceFamily,
) -> Result<String, MalformedInterfaceName> {
    let interface = interface.trim();

    let prefix: String = interface
        .chars()
        .skip_while(|c| !c.is_ascii_alphabetic())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if prefix.is_empty() {
        return Err(MalformedInterfaceName::new(interface, "no letter prefix"));
    }

    let suffix = match interface.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &interface[idx..],
        None => return Err(MalformedInterfaceName::new(interface, "no numeric suffix")),
    };

    let lower = prefix.to_lowercase();
    let lower3: String = lower.chars().take(3).collect();
    let keep = family.interface_prefix_len(&lower3);
    let short: String = lower.chars().take(keep).collect();

    Ok(format!("{}{}", short, suffix))
}

/// Host name without any domain suffix
/// e.g., "core-sw.example.com" -> "core-sw"
pub fn short_hostname(host: &str) -> String {
    host.trim().split('.').next().unwrap_or_default().to_string()
}

/// Append a timestamp banner to a log file, creating it (and its directory) if needed
pub fn append_timestamp_banner(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let stamp = chrono::Local::now().format(BANNER_TIMESTAMP_FORMAT).to_string();
    let rule = "#".repeat(80);
    let pad = " ".repeat(30);
    write!(file, "\n{}\n{}{}{}\n{}\n", rule, pad, stamp, pad, rule)
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Uses the ssh2 crate (libssh2).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<ssh2::Session, SessionError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| SessionError::Transport(format!("Invalid address {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| SessionError::Transport(format!("No address found for {}", host)))?;

    let tcp = TcpStream::connect_timeout(&addr, Duration::from_secs(timeout_secs))
        .map_err(|e| SessionError::Transport(format!("TCP connection failed: {}", e)))?;

    tcp.set_read_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();
    tcp.set_write_timeout(Some(Duration::from_secs(timeout_secs)))
        .ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| SessionError::Transport(format!("Failed to create SSH session: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_millis(timeout_secs));
    session
        .handshake()
        .map_err(|e| SessionError::Transport(format!("SSH handshake failed: {}", e)))?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Try keyboard-interactive auth (needed for devices that only offer it)
    let mut prompter = PasswordPrompt { password: pass.to_string() };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err(SessionError::Auth(format!(
            "all methods exhausted for user {}",
            user
        )))
    }
}

/// ssh2 takes its blocking timeout in milliseconds as a u32
fn timeout_millis(secs: u64) -> u32 {
    u32::try_from(secs.saturating_mul(1000)).unwrap_or(u32::MAX)
}
