//! Error taxonomy for a single request.
//!
//! Every variant here is terminal for the request that produced it: nothing
//! in the pipeline retries. Glue code (config files, CLI, host IO) keeps using
//! `anyhow`; these types exist so the dispatcher can pick a remediation.

use crate::providers::ProviderKind;
use thiserror::Error;

/// Failure reported by a provider gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The transport returned a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A success response that carried no generated content.
    #[error("the provider returned an empty response")]
    EmptyResponse,

    /// A success response whose body could not be decoded.
    #[error("could not decode provider response: {0}")]
    InvalidResponse(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Coarse classification used to pick user-facing remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Unauthorized,
    Other,
}

const RATE_LIMIT_MARKERS: &[&str] = &["quota", "rate limit", "rate_limit", "resource_exhausted"];

const UNAUTHORIZED_MARKERS: &[&str] = &[
    "api key not valid",
    "invalid api key",
    "invalid_api_key",
    "api_key_invalid",
];

impl ProviderError {
    /// Classifies the failure. Rate limiting wins over credential problems
    /// when a body carries markers for both.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::Status { status, body } => {
                let body = body.to_lowercase();
                if *status == 429 || RATE_LIMIT_MARKERS.iter().any(|m| body.contains(m)) {
                    ErrorClass::RateLimited
                } else if matches!(status, 400 | 401 | 403)
                    || UNAUTHORIZED_MARKERS.iter().any(|m| body.contains(m))
                {
                    ErrorClass::Unauthorized
                } else {
                    ErrorClass::Other
                }
            }
            ProviderError::EmptyResponse
            | ProviderError::InvalidResponse(_)
            | ProviderError::Transport(_) => ErrorClass::Other,
        }
    }
}

/// Reasons a request ends without a delivered result.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("the prompt is empty")]
    EmptyPrompt,

    #[error("no active text editor found, please open a file")]
    NoActiveEditor,

    #[error("no AI provider is configured")]
    NoProviderConfigured,

    #[error("{provider} request failed: {source}")]
    Provider {
        provider: ProviderKind,
        #[source]
        source: ProviderError,
    },

    /// The sink rejected the generated text (file write, terminal write).
    #[error("could not deliver the generated text: {0}")]
    Sink(String),
}
