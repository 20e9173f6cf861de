//! Request dispatch: classify, build, generate, extract, route.
//!
//! One call to [`Dispatcher::dispatch`] handles one committed line from start
//! to finish. Nothing is retried; every failure ends the request and is
//! reported once, either through the [`Notifier`] or, for requests coming
//! from the pseudo-terminal, straight into that terminal's output.

use crate::error::{DispatchError, ErrorClass, ProviderError};
use crate::extractor;
use crate::host::{
    ActiveDocument, ConfigStore, DEFAULT_LANGUAGE_TAG, EditorSurface, Notifier,
    RemediationAction, TerminalSurface, TextRange,
};
use crate::http_client::HttpClient;
use crate::intent::{self, OutputTarget};
use crate::line_editor::write_line;
use crate::prompt_builder;
use crate::providers::{ProviderCredentials, ProviderGateway, ProviderKind, ProviderSelection};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const PROGRESS_TITLE: &str = "CodeDawn is thinking...";

/// Where a request came from, and therefore where its feedback goes.
pub enum Origin<'a> {
    /// The modal prompt: progress indicator, notifications, host terminal.
    Modal,
    /// The custom pseudo-terminal: everything is written to its channel.
    PseudoTerminal(&'a mut (dyn Write + Send)),
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    Validating,
    Rejected,
    ProviderSelected,
    Dispatched,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Rejected | RequestState::Succeeded | RequestState::Failed
        )
    }

    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Created, Validating)
                | (Validating, Rejected)
                | (Validating, ProviderSelected)
                | (ProviderSelected, Dispatched)
                | (Dispatched, Succeeded)
                | (Dispatched, Failed)
        )
    }
}

/// Tracks and logs the state of the request being dispatched.
#[derive(Debug)]
struct Lifecycle {
    state: RequestState,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: RequestState::Created,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal request transition {:?} -> {:?}",
            self.state,
            next
        );
        if !self.state.can_transition_to(next) {
            error!("Illegal request transition {:?} -> {:?}", self.state, next);
            return;
        }
        debug!("Request {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// One user submission, fixed once validation has passed.
#[derive(Debug, Clone)]
pub struct Request {
    prompt_text: String,
    selection_text: Option<String>,
    selection_range: Option<TextRange>,
    file_language_tag: String,
    output_target: OutputTarget,
    provider: ProviderSelection,
    silent_mode: bool,
}

impl Request {
    fn new(
        prompt_text: &str,
        document: Option<ActiveDocument>,
        output_target: OutputTarget,
        provider: ProviderSelection,
        silent_mode: bool,
    ) -> Self {
        let (selection_text, selection_range, file_language_tag) = match document {
            Some(doc) => {
                let text = Some(doc.selected_text).filter(|text| !text.is_empty());
                (text, Some(doc.selection), doc.language_tag)
            }
            None => (None, None, DEFAULT_LANGUAGE_TAG.to_string()),
        };
        Self {
            prompt_text: prompt_text.to_string(),
            selection_text,
            selection_range,
            file_language_tag,
            output_target,
            provider,
            silent_mode,
        }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn selection_text(&self) -> Option<&str> {
        self.selection_text.as_deref()
    }

    pub fn file_language_tag(&self) -> &str {
        &self.file_language_tag
    }

    pub fn output_target(&self) -> OutputTarget {
        self.output_target
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider.kind
    }

    /// Whether progress indicators and success notifications are suppressed.
    pub fn silent_mode(&self) -> bool {
        self.silent_mode
    }

    fn built_prompt(&self) -> String {
        prompt_builder::build(
            &self.prompt_text,
            self.selection_text.as_deref(),
            &self.file_language_tag,
        )
    }
}

/// Where the generated text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    EditorReplaced { range: TextRange, text: String },
    TerminalSent { text: String },
    PseudoTerminalWritten { text: String },
}

/// Final state of a dispatched request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Stopped before any network call.
    Rejected(DispatchError),
    Succeeded(Delivery),
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn state(&self) -> RequestState {
        match self {
            DispatchOutcome::Rejected(_) => RequestState::Rejected,
            DispatchOutcome::Succeeded(_) => RequestState::Succeeded,
            DispatchOutcome::Failed(_) => RequestState::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded(_))
    }
}

/// Host collaborators the dispatcher reports to.
#[derive(Clone)]
pub struct HostSurfaces {
    pub editor: Arc<dyn EditorSurface>,
    pub terminal: Arc<dyn TerminalSurface>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<dyn ConfigStore>,
}

/// User-facing text and remediation for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub message: String,
    pub actions: Vec<RemediationAction>,
}

impl Remediation {
    /// Remediation for an error surfaced to the user.
    pub fn for_error(error: &DispatchError) -> Self {
        match error {
            DispatchError::EmptyPrompt => Self {
                message: "Please describe what you want CodeDawn to do.".to_string(),
                actions: Vec::new(),
            },
            DispatchError::NoActiveEditor => Self {
                message: "No active text editor found. Please open a file.".to_string(),
                actions: Vec::new(),
            },
            DispatchError::NoProviderConfigured => Self {
                message: format!(
                    "Welcome to CodeDawn! Add a Gemini API key ({}) or a Groq API key ({}) to get started.",
                    ProviderKind::Gemini.credential_key(),
                    ProviderKind::Groq.credential_key()
                ),
                actions: vec![RemediationAction::OpenConfiguration],
            },
            DispatchError::Provider { provider, source } => Self::for_provider(*provider, source),
            DispatchError::Sink(reason) => Self {
                message: format!("CodeDawn could not apply the result: {}", reason),
                actions: Vec::new(),
            },
        }
    }

    fn for_provider(provider: ProviderKind, source: &ProviderError) -> Self {
        match source.class() {
            ErrorClass::RateLimited => Self {
                message: format!(
                    "{} quota exceeded or rate limit reached. Switch provider or change your API key.",
                    provider
                ),
                actions: vec![
                    RemediationAction::SwitchProvider,
                    RemediationAction::ChangeCredential,
                ],
            },
            ErrorClass::Unauthorized => Self {
                message: format!(
                    "{} rejected the API key ({}). Change your API key.",
                    provider,
                    provider.credential_key()
                ),
                actions: vec![RemediationAction::ChangeCredential],
            },
            ErrorClass::Other => Self {
                message: format!("CodeDawn request to {} failed: {}", provider, source),
                actions: Vec::new(),
            },
        }
    }
}

/// Orchestrates one request per committed line.
pub struct Dispatcher {
    gateway: ProviderGateway,
    host: HostSurfaces,
}

impl Dispatcher {
    pub fn new(http: Arc<dyn HttpClient>, host: HostSurfaces) -> Self {
        Self {
            gateway: ProviderGateway::new(http),
            host,
        }
    }

    pub async fn dispatch(&self, prompt: &str, mut origin: Origin<'_>) -> DispatchOutcome {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(RequestState::Validating);

        let request = match self.validate(prompt, &origin) {
            Ok(request) => request,
            Err(e) => {
                info!("Request rejected: {}", e);
                lifecycle.advance(RequestState::Rejected);
                self.report(&e, &mut origin).await;
                return DispatchOutcome::Rejected(e);
            }
        };
        lifecycle.advance(RequestState::ProviderSelected);

        lifecycle.advance(RequestState::Dispatched);
        let result = self.generate(&request).await;

        let outcome = match result {
            Ok(text) => self.route(&request, text, &mut origin).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(delivery) => {
                lifecycle.advance(RequestState::Succeeded);
                DispatchOutcome::Succeeded(delivery)
            }
            Err(e) => {
                warn!("Request failed: {}", e);
                lifecycle.advance(RequestState::Failed);
                self.report(&e, &mut origin).await;
                DispatchOutcome::Failed(e)
            }
        }
    }

    fn validate(&self, prompt: &str, origin: &Origin<'_>) -> Result<Request, DispatchError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }

        let target = intent::classify(prompt);
        info!("Classified {:?} as {:?}", prompt, target);

        let document = self.host.editor.active_document();
        if target == OutputTarget::Editor && document.is_none() {
            return Err(DispatchError::NoActiveEditor);
        }

        let credentials = ProviderCredentials::snapshot(self.host.config.as_ref());
        let provider = credentials
            .select()
            .ok_or(DispatchError::NoProviderConfigured)?;
        info!("Selected provider {}", provider.kind);

        let silent_mode = matches!(origin, Origin::PseudoTerminal(_));
        Ok(Request::new(prompt, document, target, provider, silent_mode))
    }

    async fn generate(&self, request: &Request) -> Result<String, DispatchError> {
        let prompt = request.built_prompt();
        debug!("Built prompt ({} chars)", prompt.len());

        if !request.silent_mode() {
            self.host.notifier.progress_started(PROGRESS_TITLE);
        }
        let result = self.gateway.generate(&request.provider, &prompt).await;
        if !request.silent_mode() {
            self.host.notifier.progress_finished();
        }

        let raw = result.map_err(|source| DispatchError::Provider {
            provider: request.provider(),
            source,
        })?;

        let text = extractor::extract(&raw).trim().to_string();
        if text.is_empty() {
            return Err(DispatchError::Provider {
                provider: request.provider(),
                source: ProviderError::EmptyResponse,
            });
        }
        debug!("Extracted {} chars of generated text", text.len());
        Ok(text)
    }

    async fn route(
        &self,
        request: &Request,
        text: String,
        origin: &mut Origin<'_>,
    ) -> Result<Delivery, DispatchError> {
        match request.output_target() {
            OutputTarget::Editor => {
                let range = request
                    .selection_range
                    .ok_or(DispatchError::NoActiveEditor)?;
                self.host
                    .editor
                    .replace_range(range, &text)
                    .await
                    .map_err(|e| DispatchError::Sink(e.to_string()))?;
                info!("Replaced {:?} in the active document", range);

                match origin {
                    Origin::PseudoTerminal(out) => {
                        write_line(&mut **out, "Code inserted into the editor.")
                            .map_err(|e| DispatchError::Sink(e.to_string()))?;
                    }
                    Origin::Modal => {
                        if !request.silent_mode() {
                            self.host.notifier.show_info("CodeDawn: code inserted.");
                        }
                    }
                }
                Ok(Delivery::EditorReplaced { range, text })
            }
            OutputTarget::Terminal => match origin {
                Origin::PseudoTerminal(out) => {
                    write_line(&mut **out, &text).map_err(|e| DispatchError::Sink(e.to_string()))?;
                    info!("Wrote generated command to the pseudo-terminal");
                    Ok(Delivery::PseudoTerminalWritten { text })
                }
                Origin::Modal => {
                    self.host
                        .terminal
                        .send_text(&text, false)
                        .map_err(|e| DispatchError::Sink(e.to_string()))?;
                    info!("Sent generated command to the terminal");
                    if !request.silent_mode() {
                        self.host
                            .notifier
                            .show_info("CodeDawn: command sent to the terminal. Press Enter to run it.");
                    }
                    Ok(Delivery::TerminalSent { text })
                }
            },
        }
    }

    async fn report(&self, error: &DispatchError, origin: &mut Origin<'_>) {
        let remediation = Remediation::for_error(error);
        match origin {
            Origin::PseudoTerminal(out) => {
                if let Err(e) = write_line(&mut **out, &format!("Error: {}", remediation.message)) {
                    warn!("Could not write error to the pseudo-terminal: {}", e);
                }
            }
            Origin::Modal if remediation.actions.is_empty() => {
                if matches!(
                    error,
                    DispatchError::NoActiveEditor | DispatchError::EmptyPrompt
                ) {
                    self.host.notifier.show_info(&remediation.message);
                } else {
                    self.host
                        .notifier
                        .show_error(&remediation.message, &[])
                        .await;
                }
            }
            Origin::Modal => {
                let choice = self
                    .host
                    .notifier
                    .show_error(&remediation.message, &remediation.actions)
                    .await;
                if let Some(action) = choice {
                    info!("User chose {:?}", action);
                    if let Err(e) = self.host.notifier.open_configuration().await {
                        error!("Failed to open configuration: {}", e);
                    }
                }
            }
        }
    }
}
