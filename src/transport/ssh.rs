use async_trait::async_trait;
use regex_lite::Regex;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::{Connector, Session};
use crate::error::SessionError;
use crate::models::{DeviceTarget, Record};
use crate::parsers::{self, ParsedCommand};

/// A CLI prompt at the end of the buffer: "sw1>", "sw1#", "sw1(config)#", "RP/0/RSP0/CPU0:pe1#"
const PROMPT_PATTERN: &str = r"^[A-Za-z0-9_.\-/:()@]+[>#]\s*$";
const PASSWORD_PATTERN: &str = r"(?i)password:\s*$";
const MORE_MARKER: &str = "--More--";

#[derive(Debug, Clone)]
pub struct SshOptions {
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            port: 22,
            timeout_secs: 30,
        }
    }
}

/// Opens interactive SSH shells to network devices
pub struct SshConnector {
    options: SshOptions,
}

impl SshConnector {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn Session>, SessionError> {
        let shell_target = target.clone();
        let options = self.options.clone();

        let shell = tokio::task::spawn_blocking(move || Shell::open(&shell_target, &options, None))
            .await
            .map_err(|e| SessionError::Transport(format!("Task join error: {}", e)))??;

        Ok(Box::new(SshSession {
            target: target.clone(),
            options: self.options.clone(),
            shell: Some(shell),
            log_path: None,
        }))
    }
}

/// Session over an interactive PTY shell. The blocking shell is moved onto the
/// blocking pool for every operation and handed back afterwards.
pub struct SshSession {
    target: DeviceTarget,
    options: SshOptions,
    shell: Option<Shell>,
    log_path: Option<PathBuf>,
}

impl SshSession {
    async fn with_shell<T, F>(&mut self, op: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Shell) -> Result<T, SessionError> + Send + 'static,
        T: Send + 'static,
    {
        let mut shell = self
            .shell
            .take()
            .ok_or_else(|| SessionError::Transport("session is closed".to_string()))?;

        let (shell, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut shell);
            (shell, result)
        })
        .await
        .map_err(|e| SessionError::Transport(format!("Task join error: {}", e)))?;

        self.shell = Some(shell);
        result
    }
}

#[async_trait]
impl Session for SshSession {
    async fn run_command(&mut self, command: &str) -> Result<Vec<Record>, SessionError> {
        let raw = self.send_command(command).await?;
        let mut records = parsers::parse_output(self.target.family, command, &raw)?;

        // Some show version layouts carry no hostname; the prompt always does.
        if ParsedCommand::identify(command) == Some(ParsedCommand::ShowVersion) {
            if let Some(shell) = self.shell.as_ref() {
                let hostname = prompt_hostname(&shell.prompt);
                for record in records.iter_mut() {
                    if !record.contains_key("hostname") && !hostname.is_empty() {
                        record.insert("hostname".to_string(), hostname.clone().into());
                    }
                }
            }
        }
        Ok(records)
    }

    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        let command = command.to_string();
        self.with_shell(move |shell| shell.command(&command)).await
    }

    async fn enable(&mut self) -> Result<(), SessionError> {
        let secret = self.target.secret.clone();
        let host = self.target.host.clone();
        self.with_shell(move |shell| shell.enable(&host, secret.as_deref()))
            .await
    }

    async fn is_alive(&mut self) -> bool {
        if self.shell.is_none() {
            return false;
        }
        self.with_shell(|shell| Ok(shell.probe())).await.unwrap_or(false)
    }

    async fn reconnect(&mut self) -> Result<(), SessionError> {
        if let Some(mut old) = self.shell.take() {
            let _ = tokio::task::spawn_blocking(move || old.close()).await;
        }

        let target = self.target.clone();
        let options = self.options.clone();
        let log_path = self.log_path.clone();
        let shell = tokio::task::spawn_blocking(move || {
            Shell::open(&target, &options, log_path.as_deref())
        })
        .await
        .map_err(|e| SessionError::Transport(format!("Task join error: {}", e)))??;

        self.shell = Some(shell);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut shell) = self.shell.take() {
            if let Err(e) = tokio::task::spawn_blocking(move || shell.close()).await {
                tracing::warn!("{} | Failed to close session: {}", self.target.host, e);
            }
        }
    }

    fn enable_logging(&mut self, path: &Path) -> Result<(), SessionError> {
        self.log_path = Some(path.to_path_buf());
        if let Some(shell) = self.shell.as_mut() {
            shell.open_log(path)?;
        }
        Ok(())
    }
}

/// Blocking interactive shell on top of an ssh2 session
struct Shell {
    session: ssh2::Session,
    channel: ssh2::Channel,
    prompt_re: Regex,
    password_re: Regex,
    prompt: String,
    log: Option<std::fs::File>,
}

impl Shell {
    fn open(
        target: &DeviceTarget,
        options: &SshOptions,
        log_path: Option<&Path>,
    ) -> Result<Self, SessionError> {
        let session = crate::utils::ssh_connect(
            &target.host,
            options.port,
            &target.username,
            &target.password,
            options.timeout_secs,
        )?;

        let mut channel = session
            .channel_session()
            .map_err(|e| SessionError::Transport(format!("Failed to open channel: {}", e)))?;
        channel
            .request_pty("vt100", None, Some((511, 24, 0, 0)))
            .map_err(|e| SessionError::Transport(format!("Failed to request pty: {}", e)))?;
        channel
            .shell()
            .map_err(|e| SessionError::Transport(format!("Failed to start shell: {}", e)))?;

        let prompt_re = Regex::new(PROMPT_PATTERN)
            .map_err(|e| SessionError::Transport(format!("Invalid prompt pattern: {}", e)))?;
        let password_re = Regex::new(PASSWORD_PATTERN)
            .map_err(|e| SessionError::Transport(format!("Invalid password pattern: {}", e)))?;

        let mut shell = Shell {
            session,
            channel,
            prompt_re,
            password_re,
            prompt: String::new(),
            log: None,
        };
        if let Some(path) = log_path {
            shell.open_log(path)?;
        }

        // Banner/MOTD up to the first prompt
        shell.read_until_prompt()?;
        Ok(shell)
    }

    fn open_log(&mut self, path: &Path) -> Result<(), SessionError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SessionError::Transport(format!(
                    "Failed to open session log {}: {}",
                    path.display(),
                    e
                ))
            })?;
        self.log = Some(file);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.channel
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| self.channel.flush())
            .map_err(|e| SessionError::Transport(format!("Failed to send '{}': {}", line, e)))
    }

    /// Read until the last line satisfies `done`, answering pagers on the way
    fn read_until(&mut self, done: impl Fn(&Self, &str) -> bool) -> Result<String, SessionError> {
        let mut output = String::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = self
                .channel
                .read(&mut chunk)
                .map_err(|e| SessionError::Transport(format!("Failed to read output: {}", e)))?;
            if n == 0 {
                return Err(SessionError::Transport(
                    "channel closed by device".to_string(),
                ));
            }

            let text = String::from_utf8_lossy(&chunk[..n]).replace('\r', "");
            if let Some(log) = self.log.as_mut() {
                // Logging must never break the session
                let _ = log.write_all(text.as_bytes());
            }
            output.push_str(&text);

            let last_line = output.rsplit('\n').next().unwrap_or_default().to_string();
            if last_line.contains(MORE_MARKER) {
                output.truncate(output.len() - last_line.len());
                self.channel
                    .write_all(b" ")
                    .map_err(|e| SessionError::Transport(format!("Failed to page output: {}", e)))?;
                continue;
            }
            if done(self, last_line.trim_end()) {
                return Ok(output);
            }
        }
    }

    fn read_until_prompt(&mut self) -> Result<String, SessionError> {
        let output = self.read_until(|shell, line| shell.prompt_re.is_match(line))?;
        self.prompt = output
            .rsplit('\n')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(output)
    }

    fn is_privileged(&self) -> bool {
        self.prompt.ends_with('#')
    }

    fn enable(&mut self, host: &str, secret: Option<&str>) -> Result<(), SessionError> {
        if self.is_privileged() {
            return Ok(());
        }
        let Some(secret) = secret else {
            tracing::debug!("{} | No enable secret configured, staying in user mode", host);
            return Ok(());
        };

        self.write_line("enable")?;
        let output = self.read_until(|shell, line| {
            shell.password_re.is_match(line) || shell.prompt_re.is_match(line)
        })?;
        let last_line = output.rsplit('\n').next().unwrap_or_default().trim().to_string();
        if self.password_re.is_match(&last_line) {
            self.write_line(secret)?;
        }
        self.read_until_prompt()?;

        if self.is_privileged() {
            Ok(())
        } else {
            Err(SessionError::Auth(
                "enable secret was not accepted".to_string(),
            ))
        }
    }

    /// Run one command and return its output without the echoed command and prompt
    fn command(&mut self, command: &str) -> Result<String, SessionError> {
        self.write_line(command)?;
        let output = self.read_until_prompt()?;
        Ok(strip_echo_and_prompt(&output, command))
    }

    fn probe(&mut self) -> bool {
        if self.channel.eof() {
            return false;
        }
        self.write_line("").is_ok() && self.read_until_prompt().is_ok()
    }

    fn close(&mut self) {
        let _ = self.write_line("exit");
        let _ = self.channel.close();
        let _ = self.session.disconnect(None, "session closed", None);
    }
}

fn strip_echo_and_prompt(output: &str, command: &str) -> String {
    let mut lines: Vec<&str> = output.lines().collect();
    if lines
        .first()
        .map(|l| l.trim().ends_with(command.trim()))
        .unwrap_or(false)
    {
        lines.remove(0);
    }
    lines.pop();
    lines.join("\n")
}

/// Device name from its prompt: "RP/0/RSP0/CPU0:pe1#" -> "pe1", "sw1(config)#" -> "sw1"
fn prompt_hostname(prompt: &str) -> String {
    let trimmed = prompt.trim().trim_end_matches(['#', '>']);
    let name = trimmed.rsplit(':').next().unwrap_or(trimmed);
    name.split('(').next().unwrap_or(name).to_string()
}
