//! The custom pseudo-terminal: line editing plus a small command interpreter.
//!
//! A session owns its [`LineEditor`] and [`OutputChannel`]. Committed lines
//! are interpreted according to [`SessionConfig`]:
//!
//! - plain mode (`command_prefix: None`): the whole line is the request
//! - prefixed mode: the line must read `<prefix> <request>`
//!
//! In single-shot mode the session closes once its first request has been
//! dispatched, whatever the result; lines that are not requests only get a
//! hint. In persistent mode it stays open, redrawing the prompt after every
//! line, until `exit` (`<prefix> exit` in prefixed mode) or the host closes it.

use crate::dispatcher::{Dispatcher, Origin};
use crate::line_editor::{CARRIAGE_RETURN, LineEditor, OutputChannel, write_line};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info};

pub const PROMPT: &str = "> ";
const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    /// Handle one line, then close.
    SingleShot,
    /// Keep accepting lines until closed.
    #[default]
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: SessionMode,
    /// Literal that must start every command line. `None` selects plain mode.
    #[serde(default)]
    pub command_prefix: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Persistent,
            command_prefix: Some("dawn".to_string()),
        }
    }
}

impl SessionConfig {
    /// Plain mode: every line is a request and the session closes afterwards.
    pub fn plain() -> Self {
        Self {
            mode: SessionMode::SingleShot,
            command_prefix: None,
        }
    }

    fn usage(&self) -> String {
        match &self.command_prefix {
            Some(prefix) => format!("Usage: {} <what you want to do>", prefix),
            None => "Type what you want to do and press Enter.".to_string(),
        }
    }
}

/// Meaning of one committed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Request(String),
    Exit,
    /// The prefix was given without a request.
    Usage,
    Unknown(String),
}

/// Interprets a committed line.
///
/// The prefix match is case-sensitive and must be followed by a space; the
/// request is whatever follows that space, trimmed. `exit` takes the prefix
/// like any other command, so a bare `exit` in prefixed mode is unknown.
pub fn interpret(line: &str, config: &SessionConfig) -> Command {
    let Some(prefix) = config.command_prefix.as_deref() else {
        return match line.trim() {
            EXIT_COMMAND => Command::Exit,
            request => Command::Request(request.to_string()),
        };
    };

    if line.trim_end() == prefix {
        return Command::Usage;
    }

    match line.strip_prefix(prefix).and_then(|rest| rest.strip_prefix(' ')) {
        Some(request) => match request.trim() {
            "" => Command::Usage,
            EXIT_COMMAND => Command::Exit,
            request => Command::Request(request.to_string()),
        },
        None => Command::Unknown(line.to_string()),
    }
}

/// One open pseudo-terminal session.
pub struct PseudoTerminal<W: Write + Send> {
    editor: LineEditor,
    output: OutputChannel<W>,
    config: SessionConfig,
}

impl<W: Write + Send> PseudoTerminal<W> {
    pub fn new(writer: W, config: SessionConfig) -> Self {
        Self {
            editor: LineEditor::new(),
            output: OutputChannel::new(writer),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.output.is_open()
    }

    /// The output channel, for inspecting what the session wrote.
    pub fn output(&self) -> &OutputChannel<W> {
        &self.output
    }

    /// Writes the greeting and the first prompt.
    pub fn open(&mut self) -> Result<()> {
        info!("Pseudo-terminal opened in {:?} mode", self.config.mode);
        write_line(&mut self.output, "Welcome to CodeDawn.")?;
        write_line(&mut self.output, &self.config.usage())?;
        self.output.write_str(PROMPT)?;
        self.output.flush()?;
        Ok(())
    }

    /// Ends the session and invalidates its output channel.
    pub fn close(&mut self) -> Option<W> {
        if self.output.is_open() {
            info!("Pseudo-terminal closed");
        }
        self.output.close()
    }

    /// Feeds host input to the session, one unit at a time in arrival order.
    /// Each committed line is fully handled before the next unit is looked at.
    pub async fn handle_input(&mut self, data: &str, dispatcher: &Dispatcher) -> Result<()> {
        for ch in data.chars() {
            if !self.is_open() {
                debug!("Ignoring input for a closed pseudo-terminal");
                break;
            }
            match self.editor.feed(ch, &mut self.output)? {
                Some(line) => self.handle_line(&line, dispatcher).await?,
                None if ch == CARRIAGE_RETURN => self.output.write_str(PROMPT)?,
                None => {}
            }
        }
        self.output.flush()?;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str, dispatcher: &Dispatcher) -> Result<()> {
        debug!("Committed line: {:?}", line);
        match interpret(line, &self.config) {
            Command::Exit => {
                self.close();
                return Ok(());
            }
            Command::Usage => {
                write_line(&mut self.output, &self.config.usage())?;
            }
            Command::Unknown(line) => {
                write_line(&mut self.output, &format!("Unknown command: {}", line))?;
                write_line(&mut self.output, &self.config.usage())?;
            }
            Command::Request(prompt) => {
                let outcome = dispatcher
                    .dispatch(&prompt, Origin::PseudoTerminal(&mut self.output))
                    .await;
                debug!("Pseudo-terminal request finished as {:?}", outcome.state());
                if self.config.mode == SessionMode::SingleShot {
                    self.close();
                    return Ok(());
                }
            }
        }

        self.output.write_str(PROMPT)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixed() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn test_prefixed_request() {
        assert_eq!(
            interpret("dawn list files in this folder", &prefixed()),
            Command::Request("list files in this folder".to_string())
        );
    }

    #[test]
    fn test_prefix_is_case_sensitive_and_needs_space() {
        assert_eq!(
            interpret("Dawn list files", &prefixed()),
            Command::Unknown("Dawn list files".to_string())
        );
        assert_eq!(
            interpret("dawnlist files", &prefixed()),
            Command::Unknown("dawnlist files".to_string())
        );
        assert_eq!(
            interpret("ls -la", &prefixed()),
            Command::Unknown("ls -la".to_string())
        );
    }

    #[test]
    fn test_bare_prefix_prints_usage() {
        assert_eq!(interpret("dawn", &prefixed()), Command::Usage);
        assert_eq!(interpret("dawn   ", &prefixed()), Command::Usage);
    }

    #[test]
    fn test_plain_mode_takes_whole_line() {
        assert_eq!(
            interpret("git status", &SessionConfig::plain()),
            Command::Request("git status".to_string())
        );
    }

    #[test]
    fn test_exit() {
        assert_eq!(interpret("dawn exit", &prefixed()), Command::Exit);
        assert_eq!(interpret(" exit ", &SessionConfig::plain()), Command::Exit);
    }

    #[test]
    fn test_bare_exit_needs_prefix() {
        assert_eq!(
            interpret("exit", &prefixed()),
            Command::Unknown("exit".to_string())
        );
    }

    #[test]
    fn test_session_mode_serde_names() {
        let config: SessionConfig =
            toml::from_str("mode = \"single-shot\"\ncommand_prefix = \"ai\"").unwrap();
        assert_eq!(config.mode, SessionMode::SingleShot);
        assert_eq!(config.command_prefix.as_deref(), Some("ai"));

        let config: SessionConfig = toml::from_str("").unwrap();
        assert_eq!(config.mode, SessionMode::Persistent);
        assert_eq!(config.command_prefix, None);
    }
}
