//! Seams to the host environment.
//!
//! The dispatcher never touches files, terminals or the user directly; it goes
//! through these traits. The binary wires them to [`crate::console`], tests
//! wire them to in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;

/// Language tag used when no document is active.
pub const DEFAULT_LANGUAGE_TAG: &str = "plaintext";

/// A span of the active document, in character offsets.
///
/// `start == end` is an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Snapshot of the active document taken when a request is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub language_tag: String,
    /// Range the generated code will replace.
    pub selection: TextRange,
    /// Text covered by `selection`; empty for an insertion point.
    pub selected_text: String,
}

/// Actions offered to the user alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    OpenConfiguration,
    SwitchProvider,
    ChangeCredential,
}

impl RemediationAction {
    pub fn label(self) -> &'static str {
        match self {
            RemediationAction::OpenConfiguration => "Open Settings",
            RemediationAction::SwitchProvider => "Switch Provider",
            RemediationAction::ChangeCredential => "Change API Key",
        }
    }
}

/// Editor surface: the active document and its selection.
#[async_trait]
pub trait EditorSurface: Send + Sync {
    /// Returns the active document, or `None` when no editor is open.
    fn active_document(&self) -> Option<ActiveDocument>;

    /// Replaces `range` of the active document with `text`.
    async fn replace_range(&self, range: TextRange, text: &str) -> Result<()>;
}

/// Standard (process-backed) terminal surface.
pub trait TerminalSurface: Send + Sync {
    /// Finds or creates a terminal and types `text` into it. When `execute`
    /// is false the user still has to press enter.
    fn send_text(&self, text: &str, execute: bool) -> Result<()>;
}

/// User-facing messages and the configuration page.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn show_info(&self, message: &str);

    /// Shows an error and waits for the user to pick one of `actions`.
    /// Returns `None` when the message was dismissed.
    async fn show_error(
        &self,
        message: &str,
        actions: &[RemediationAction],
    ) -> Option<RemediationAction>;

    /// Marks the start of a long-running operation.
    fn progress_started(&self, title: &str);

    fn progress_finished(&self);

    async fn open_configuration(&self) -> Result<()>;
}

/// Read-only key/value settings.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}
