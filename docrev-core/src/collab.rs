//! Contracts for the external collaborators the core consumes.
//!
//! The core never performs network or file I/O itself. The front-end wires in
//! implementations of these traits (HTTP client, local file, test fakes).

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::types::Persona;

/// Input to one documentation generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Repository URL (or local path) the documentation is generated for.
    pub repo: String,
    pub persona: Persona,
    /// Branch to document; `None` lets the service choose.
    pub branch: Option<String>,
}

/// Output of a generation: the seed for `"Original"` plus the repository's
/// branch list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedDoc {
    pub document: String,
    pub branches: Vec<String>,
}

/// Input to one chat-refinement turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub repo: String,
    pub persona: Persona,
    /// Full text of the version being refined.
    pub document: String,
    pub message: String,
}

/// Produces the initial document for a session.
#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedDoc, UpstreamError>;
}

/// Turns a user message about a document into refinement text (the delta).
#[async_trait]
pub trait ChatRefiner: Send + Sync {
    async fn chat_refine(&self, request: &ChatRequest) -> Result<String, UpstreamError>;
}
