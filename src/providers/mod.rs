//! Provider gateway: one backend per [`ProviderKind`] variant.
//!
//! The set of providers is closed. Adding a backend means adding a variant
//! and a module next to [`gemini`] and [`groq`]; nothing here matches on
//! free-form strings.

pub mod gemini;
pub mod groq;

use crate::error::ProviderError;
use crate::host::ConfigStore;
use crate::http_client::HttpClient;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

/// Configuration key for the primary provider credential.
pub const GEMINI_API_KEY: &str = "codedawn.geminiApiKey";
/// Configuration key for the secondary provider credential.
pub const GROQ_API_KEY: &str = "codedawn.groqApiKey";
/// Optional model override for Gemini.
pub const GEMINI_MODEL: &str = "codedawn.geminiModel";
/// Optional model override for Groq.
pub const GROQ_MODEL: &str = "codedawn.groqModel";

/// Known AI backends, listed in selection precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    Groq,
}

impl ProviderKind {
    /// Every provider, most preferred first.
    pub const PRECEDENCE: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::Groq];

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Groq => "Groq",
        }
    }

    pub fn credential_key(self) -> &'static str {
        match self {
            ProviderKind::Gemini => GEMINI_API_KEY,
            ProviderKind::Groq => GROQ_API_KEY,
        }
    }

    fn model_key(self) -> &'static str {
        match self {
            ProviderKind::Gemini => GEMINI_MODEL,
            ProviderKind::Groq => GROQ_MODEL,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::Groq => groq::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Credential and model for the provider chosen for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub kind: ProviderKind,
    pub credential: String,
    pub model: String,
}

impl fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSelection")
            .field("kind", &self.kind)
            .field("credential", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Read-only snapshot of provider configuration taken at dispatch time.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    entries: Vec<(ProviderKind, Option<String>, Option<String>)>,
}

impl ProviderCredentials {
    /// Reads every provider's credential and model override from `store`.
    /// Blank values are treated as absent.
    pub fn snapshot(store: &dyn ConfigStore) -> Self {
        let read = |key: &str| {
            store
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let entries = ProviderKind::PRECEDENCE
            .iter()
            .map(|kind| (*kind, read(kind.credential_key()), read(kind.model_key())))
            .collect();
        Self { entries }
    }

    pub fn has_credential(&self, kind: ProviderKind) -> bool {
        self.entries
            .iter()
            .any(|(k, credential, _)| *k == kind && credential.is_some())
    }

    /// Picks the first configured provider in precedence order.
    pub fn select(&self) -> Option<ProviderSelection> {
        ProviderKind::PRECEDENCE.iter().find_map(|kind| {
            let (_, credential, model) = self.entries.iter().find(|(k, _, _)| k == kind)?;
            let credential = credential.clone()?;
            Some(ProviderSelection {
                kind: *kind,
                credential,
                model: model
                    .clone()
                    .unwrap_or_else(|| kind.default_model().to_string()),
            })
        })
    }
}

/// Sends built prompts to the selected backend.
pub struct ProviderGateway {
    http: Arc<dyn HttpClient>,
}

impl ProviderGateway {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Issues exactly one request to the selected provider and returns its
    /// generated text verbatim.
    pub async fn generate(
        &self,
        selection: &ProviderSelection,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        info!(
            "Sending prompt to {} (model {})",
            selection.kind, selection.model
        );
        let result = match selection.kind {
            ProviderKind::Gemini => {
                gemini::generate(
                    self.http.as_ref(),
                    &selection.model,
                    &selection.credential,
                    prompt,
                )
                .await
            }
            ProviderKind::Groq => {
                groq::generate(
                    self.http.as_ref(),
                    &selection.model,
                    &selection.credential,
                    prompt,
                )
                .await
            }
        };
        if let Err(e) = &result {
            warn!("{} request failed: {}", selection.kind, e);
        }
        result
    }
}

static KEY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&]key=)[^&\s)]+").expect("key parameter pattern is valid"));

/// Masks `key=` query parameters in free-form error text.
fn redact_key_params(text: &str) -> String {
    KEY_PARAM.replace_all(text, "${1}<redacted>").into_owned()
}

/// Maps a transport-level failure into the provider taxonomy.
fn transport_error(error: anyhow::Error) -> ProviderError {
    ProviderError::Transport(redact_key_params(&format!("{:#}", error)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<&'static str, &'static str>);

    impl ConfigStore for MapStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn store(pairs: &[(&'static str, &'static str)]) -> MapStore {
        MapStore(pairs.iter().cloned().collect())
    }

    #[test]
    fn test_gemini_wins_when_both_configured() {
        let creds = ProviderCredentials::snapshot(&store(&[
            (GEMINI_API_KEY, "g-key"),
            (GROQ_API_KEY, "q-key"),
        ]));
        let selection = creds.select().unwrap();
        assert_eq!(selection.kind, ProviderKind::Gemini);
        assert_eq!(selection.credential, "g-key");
        assert_eq!(selection.model, gemini::DEFAULT_MODEL);
    }

    #[test]
    fn test_falls_back_to_groq() {
        let creds = ProviderCredentials::snapshot(&store(&[
            (GEMINI_API_KEY, "   "),
            (GROQ_API_KEY, "q-key"),
            (GROQ_MODEL, "llama-small"),
        ]));
        let selection = creds.select().unwrap();
        assert_eq!(selection.kind, ProviderKind::Groq);
        assert_eq!(selection.model, "llama-small");
        assert!(!creds.has_credential(ProviderKind::Gemini));
    }

    #[test]
    fn test_nothing_configured_selects_nothing() {
        let creds = ProviderCredentials::snapshot(&store(&[]));
        assert!(creds.select().is_none());
    }

    #[test]
    fn test_transport_error_masks_key_parameter() {
        let err = transport_error(anyhow::anyhow!(
            "error sending request for url (https://host/v1/m:generateContent?key=SECRETKEY123): dns error"
        ));
        let text = err.to_string();
        assert!(!text.contains("SECRETKEY123"));
        assert!(text.contains("generateContent?key=<redacted>): dns error"));

        let err = transport_error(anyhow::anyhow!("https://host/x?alt=json&key=abc&v=1"));
        assert_eq!(err.to_string(), "request failed: https://host/x?alt=json&key=<redacted>&v=1");
    }

    #[test]
    fn test_debug_redacts_credential() {
        let selection = ProviderSelection {
            kind: ProviderKind::Groq,
            credential: "secret-value".into(),
            model: "m".into(),
        };
        assert!(!format!("{:?}", selection).contains("secret-value"));
    }
}
