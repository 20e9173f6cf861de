//! Standalone console host used by the `dawn` binary.
//!
//! - the active document is an optional file named on the command line, with
//!   an optional line selection
//! - the "standard terminal" is stdout: generated commands are printed for
//!   the user to run, never executed
//! - notifications and remediation dialogs go to stderr
//! - the pseudo-terminal runs on the controlling terminal in raw mode

use crate::config::Config;
use crate::dispatcher::{DispatchOutcome, Dispatcher, HostSurfaces, Origin};
use crate::host::{
    ActiveDocument, EditorSurface, Notifier, RemediationAction, TerminalSurface, TextRange,
};
use crate::line_editor::{CARRIAGE_RETURN, DELETE};
use crate::prompt_ui::PromptUI;
use crate::pseudo_terminal::{PseudoTerminal, SessionConfig};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 1-based, inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSelection {
    pub first: usize,
    pub last: usize,
}

impl LineSelection {
    /// Parses `START:END` or a single line number.
    pub fn parse(spec: &str) -> Result<Self> {
        let (first, last) = match spec.split_once(':') {
            Some((first, last)) => (first.trim(), last.trim()),
            None => (spec.trim(), spec.trim()),
        };
        let first: usize = first
            .parse()
            .with_context(|| format!("invalid start line in selection '{}'", spec))?;
        let last: usize = last
            .parse()
            .with_context(|| format!("invalid end line in selection '{}'", spec))?;
        if first == 0 || last < first {
            bail!("selection '{}' must be START:END with 1 <= START <= END", spec);
        }
        Ok(Self { first, last })
    }
}

/// Guesses a language tag from a file extension.
pub fn language_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js" | "mjs" | "cjs") => "javascript",
        Some("ts") => "typescript",
        Some("tsx") => "typescriptreact",
        Some("jsx") => "javascriptreact",
        Some("go") => "go",
        Some("java") => "java",
        Some("c" | "h") => "c",
        Some("cpp" | "cc" | "hpp") => "cpp",
        Some("rb") => "ruby",
        Some("sh" | "bash" | "zsh") => "shellscript",
        Some("md") => "markdown",
        Some("json") => "json",
        Some("toml") => "toml",
        Some("yaml" | "yml") => "yaml",
        Some("html") => "html",
        Some("css") => "css",
        _ => "plaintext",
    }
}

/// A file on disk acting as the active document.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    language_tag: String,
    selection: Option<LineSelection>,
}

impl FileDocument {
    pub fn new(path: PathBuf, language_tag: Option<String>, selection: Option<LineSelection>) -> Self {
        let language_tag = language_tag.unwrap_or_else(|| language_for_path(&path).to_string());
        Self {
            path,
            language_tag,
            selection,
        }
    }

    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Character range covered by the selected lines, excluding the final
    /// line break. Without a selection, or past the end of the file, this is
    /// an insertion point at the end.
    fn selection_range(&self, content: &str) -> TextRange {
        let total = content.chars().count();
        let Some(selection) = self.selection else {
            return TextRange::new(total, total);
        };

        let mut offset = 0;
        let mut start = None;
        let mut end = total;
        for (index, line) in content.split_inclusive('\n').enumerate() {
            let number = index + 1;
            let length = line.chars().count();
            if number == selection.first {
                start = Some(offset);
            }
            if number == selection.last {
                end = offset + line.trim_end_matches('\n').trim_end_matches('\r').chars().count();
                break;
            }
            offset += length;
        }

        match start {
            Some(start) => TextRange::new(start, end),
            None => TextRange::new(total, total),
        }
    }
}

/// Editor surface backed by an optional [`FileDocument`].
pub struct ConsoleEditor {
    document: Option<FileDocument>,
}

impl ConsoleEditor {
    pub fn new(document: Option<FileDocument>) -> Self {
        Self { document }
    }
}

fn char_to_byte(content: &str, index: usize) -> Option<usize> {
    if index == content.chars().count() {
        return Some(content.len());
    }
    content.char_indices().nth(index).map(|(byte, _)| byte)
}

#[async_trait]
impl EditorSurface for ConsoleEditor {
    fn active_document(&self) -> Option<ActiveDocument> {
        let document = self.document.as_ref()?;
        let content = match document.read() {
            Ok(content) => content,
            Err(e) => {
                warn!("{:#}", e);
                return None;
            }
        };
        let selection = document.selection_range(&content);
        let selected_text = content
            .chars()
            .skip(selection.start)
            .take(selection.end - selection.start)
            .collect();
        Some(ActiveDocument {
            language_tag: document.language_tag.clone(),
            selection,
            selected_text,
        })
    }

    async fn replace_range(&self, range: TextRange, text: &str) -> Result<()> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| anyhow!("no active document"))?;
        let mut content = document.read()?;

        let start = char_to_byte(&content, range.start);
        let end = char_to_byte(&content, range.end);
        let (Some(start), Some(end)) = (start, end) else {
            bail!(
                "range {}..{} is outside {}",
                range.start,
                range.end,
                document.path.display()
            );
        };

        content.replace_range(start..end, text);
        tokio::fs::write(&document.path, content)
            .await
            .with_context(|| format!("failed to write {}", document.path.display()))?;
        info!("Updated {}", document.path.display());
        Ok(())
    }
}

/// Prints generated commands on stdout so they can be copied or captured.
pub struct StdoutTerminal;

impl TerminalSurface for StdoutTerminal {
    fn send_text(&self, text: &str, execute: bool) -> Result<()> {
        if execute {
            warn!("Console terminal never executes commands; printing instead");
        }
        eprintln!("💡 Suggested command (not executed):");
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Notifications on stderr with numbered remediation prompts.
pub struct ConsoleNotifier {
    ui: PromptUI,
    interactive: bool,
}

impl ConsoleNotifier {
    /// Remediation choices are only offered when stdin is a terminal.
    pub fn new() -> Self {
        Self {
            ui: PromptUI::new(),
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn show_info(&self, message: &str) {
        eprintln!("ℹ️  {}", message);
    }

    async fn show_error(
        &self,
        message: &str,
        actions: &[RemediationAction],
    ) -> Option<RemediationAction> {
        let actions = if self.interactive { actions } else { &[] };
        match self.ui.choose_remediation(message, actions) {
            Ok(choice) => choice,
            Err(e) => {
                error!("Remediation prompt failed: {}", e);
                None
            }
        }
    }

    fn progress_started(&self, title: &str) {
        eprintln!("⏳ {}", title);
    }

    fn progress_finished(&self) {
        debug!("Progress finished");
    }

    async fn open_configuration(&self) -> Result<()> {
        Config::show_config_info()
    }
}

/// Wires the console host around `config`.
pub fn host_surfaces(config: Config, document: Option<FileDocument>) -> HostSurfaces {
    HostSurfaces {
        editor: Arc::new(ConsoleEditor::new(document)),
        terminal: Arc::new(StdoutTerminal),
        notifier: Arc::new(ConsoleNotifier::new()),
        config: Arc::new(config),
    }
}

/// Runs one request from the modal prompt. With no `prompt`, asks for one.
pub async fn run_modal(
    dispatcher: &Dispatcher,
    notifier: &dyn Notifier,
    prompt: Option<String>,
) -> Result<Option<DispatchOutcome>> {
    let prompt = match prompt {
        Some(prompt) => Some(prompt),
        None => PromptUI::new().ask_for_request()?,
    };
    let Some(prompt) = prompt.filter(|p| !p.trim().is_empty()) else {
        notifier.show_info("CodeDawn command cancelled.");
        return Ok(None);
    };

    info!("Modal request: {}", prompt);
    Ok(Some(dispatcher.dispatch(&prompt, Origin::Modal).await))
}

/// What a key press means to the pseudo-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Unit(char),
    Close,
}

/// Maps a terminal event to a pseudo-terminal input unit.
pub fn key_to_input(event: &Event) -> Option<KeyInput> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if *kind != KeyEventKind::Press {
        return None;
    }

    match code {
        KeyCode::Char('c' | 'd') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyInput::Close)
        }
        KeyCode::Char(_) if modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(ch) => Some(KeyInput::Unit(*ch)),
        KeyCode::Enter => Some(KeyInput::Unit(CARRIAGE_RETURN)),
        KeyCode::Backspace => Some(KeyInput::Unit(DELETE)),
        _ => None,
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("failed to switch the terminal to raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Opens the pseudo-terminal on the controlling terminal and runs it until
/// the session closes.
pub async fn run_pseudo_terminal(dispatcher: &Dispatcher, config: SessionConfig) -> Result<()> {
    if !io::stdin().is_terminal() {
        bail!("dawn term needs an interactive terminal");
    }

    let guard = RawModeGuard::enable()?;
    let mut terminal = PseudoTerminal::new(io::stdout(), config);
    terminal.open()?;

    let mut buffer = [0u8; 4];
    while terminal.is_open() {
        let event = tokio::task::spawn_blocking(event::read).await??;
        match key_to_input(&event) {
            Some(KeyInput::Close) => {
                terminal.close();
            }
            Some(KeyInput::Unit(ch)) => {
                let unit: &str = ch.encode_utf8(&mut buffer);
                terminal.handle_input(unit, dispatcher).await?;
            }
            None => {}
        }
    }

    drop(guard);
    println!();
    Ok(())
}
