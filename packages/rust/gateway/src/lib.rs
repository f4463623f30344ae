//! AI gateway access for DraftDeck.
//!
//! Every generation step is one chat-completion call against an
//! OpenAI-compatible HTTP API. [`TextGenerator`] is the seam the pipeline
//! code depends on; [`GatewayClient`] is the production implementation.

mod client;
pub mod prompts;

use std::future::Future;

use draftdeck_shared::Result;

pub use client::{GatewayClient, GatewayOptions};
pub use prompts::parse_outline;

/// A single-shot completion: one system message, one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Anything that can turn a prompt into text.
pub trait TextGenerator: Send + Sync {
    /// Run one completion and return the assistant text.
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String>> + Send;
}
