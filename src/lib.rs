//! CodeDawn - natural-language code and command generation.
//!
//! A request typed by the user is classified as either code for the active
//! document or a shell command, sent to an AI provider, stripped of any
//! markdown fencing and delivered to the right place:
//!
//! - **Editor** requests replace the current selection of the active document
//! - **Terminal** requests are typed into a terminal without being executed,
//!   or echoed into the CodeDawn pseudo-terminal when they came from there
//!
//! # Architecture
//!
//! - [`line_editor`] - Input automaton for the pseudo-terminal
//! - [`pseudo_terminal`] - Command interpreter and session lifecycle
//! - [`intent`] - Editor vs. terminal classification
//! - [`prompt_builder`] - Instruction template sent to providers
//! - [`providers`] - Gemini and Groq backends, provider selection
//! - [`extractor`] - Markdown fence stripping
//! - [`dispatcher`] - Orchestration, routing and remediation
//! - [`host`] - Traits for the editor, terminal, notifications and settings
//! - [`console`] - Console implementation of the host traits
//! - [`prompt_ui`] - Console dialogs
//! - [`config`] - Configuration management (API keys, terminal mode)
//! - [`http_client`] - HTTP client abstraction
//! - [`error`] - Error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use codedawn::config::Config;
//! use codedawn::console;
//! use codedawn::dispatcher::{Dispatcher, Origin};
//! use codedawn::http_client::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = console::host_surfaces(Config::load()?, None);
//!     let dispatcher = Dispatcher::new(Arc::new(ReqwestHttpClient::new()), host);
//!
//!     // Terminal requests work without an open document
//!     let outcome = dispatcher.dispatch("show git branches", Origin::Modal).await;
//!     println!("{:?}", outcome.state());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod host;
pub mod http_client;
pub mod intent;
pub mod line_editor;
pub mod prompt_builder;
pub mod prompt_ui;
pub mod providers;
pub mod pseudo_terminal;
