pub mod agent; // Plan → Retrieve → Guard → Compose
pub mod rag; // Curation, citations, retrieval collaborators
pub mod safety; // Crisis gate + escalation

use thiserror::Error;

/// Errors surfaced by the assistant.
///
/// The four pipeline stages themselves are total functions and never produce
/// one of these. They originate from request validation, configuration
/// loading, and network-backed collaborators spliced in at Retrieve.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream {service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl AgentError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}
