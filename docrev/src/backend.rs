//! Collaborators backed by the documentation service and the local disk.
//!
//! [`HttpBackend`] speaks the service's JSON API:
//!
//! | endpoint              | request body                                         | response            |
//! |-----------------------|------------------------------------------------------|---------------------|
//! | `POST /generate-docs` | `{githubLink, persona, branch}`                      | `{gpt_summary, branches}` |
//! | `POST /chat`          | `{githubLink, persona, documentation, userMessage}`  | `{chatResponse}`    |
//!
//! [`FileGenerator`] seeds a session from a markdown file for offline use.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use docrev_core::{
    ChatRefiner, ChatRequest, DocGenerator, GenerateRequest, GeneratedDoc, Persona, UpstreamError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    github_link: &'a str,
    persona: Persona,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    gpt_summary: Option<String>,
    #[serde(default)]
    branches: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    github_link: &'a str,
    persona: Persona,
    documentation: &'a str,
    user_message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatReply {
    #[serde(default)]
    chat_response: Option<String>,
}

/// HTTP client for the documentation service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: String,
}

impl HttpBackend {
    /// Builds a client for `base` (e.g. `http://localhost:5000`).
    pub fn new(base: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self { client, base: base.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, UpstreamError> {
        let url = self.url(path);
        debug!(%url, "backend request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(UpstreamError::Status { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

/// Decodes a `/generate-docs` reply body.
fn parse_generate_reply(body: &str) -> Result<GeneratedDoc, UpstreamError> {
    let reply: GenerateReply =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    match reply.gpt_summary {
        Some(document) if !document.trim().is_empty() => {
            Ok(GeneratedDoc { document, branches: reply.branches })
        }
        _ => Err(UpstreamError::Empty("document")),
    }
}

/// Decodes a `/chat` reply body.
fn parse_chat_reply(body: &str) -> Result<String, UpstreamError> {
    let reply: ChatReply =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    match reply.chat_response {
        Some(delta) if !delta.trim().is_empty() => Ok(delta),
        _ => Err(UpstreamError::Empty("chat response")),
    }
}

#[async_trait]
impl DocGenerator for HttpBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedDoc, UpstreamError> {
        let body = GenerateBody {
            github_link: request.repo.trim(),
            persona: request.persona,
            branch: request.branch.as_deref().unwrap_or(""),
        };
        let reply = self.post("generate-docs", &body).await?;
        let doc = parse_generate_reply(&reply)?;
        info!(repo = %request.repo, branches = doc.branches.len(), "documentation generated");
        Ok(doc)
    }
}

#[async_trait]
impl ChatRefiner for HttpBackend {
    async fn chat_refine(&self, request: &ChatRequest) -> Result<String, UpstreamError> {
        let body = ChatBody {
            github_link: &request.repo,
            persona: request.persona,
            documentation: &request.document,
            user_message: &request.message,
        };
        let reply = self.post("chat", &body).await?;
        parse_chat_reply(&reply)
    }
}

/// Reads the initial document from a local markdown file.
#[derive(Debug, Clone)]
pub struct FileGenerator {
    path: PathBuf,
}

impl FileGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocGenerator for FileGenerator {
    async fn generate(&self, _request: &GenerateRequest) -> Result<GeneratedDoc, UpstreamError> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| UpstreamError::Io(format!("{}: {e}", self.path.display())))?;
        info!(path = %self.path.display(), "documentation loaded from file");
        Ok(GeneratedDoc { document, branches: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_reply_carries_branches() {
        let doc = parse_generate_reply(r##"{"gpt_summary":"# Docs","branches":["main","dev"]}"##).unwrap();
        assert_eq!(doc.document, "# Docs");
        assert_eq!(doc.branches, vec!["main", "dev"]);
    }

    #[test]
    fn generate_reply_without_summary_is_empty() {
        assert_eq!(parse_generate_reply(r#"{"branches":[]}"#), Err(UpstreamError::Empty("document")));
        assert_eq!(parse_generate_reply(r#"{"gpt_summary":"  "}"#), Err(UpstreamError::Empty("document")));
    }

    #[test]
    fn chat_reply_is_decoded() {
        assert_eq!(parse_chat_reply(r#"{"chatResponse":"- new"}"#).unwrap(), "- new");
        assert_eq!(parse_chat_reply("{}"), Err(UpstreamError::Empty("chat response")));
        assert!(matches!(parse_chat_reply("<html>"), Err(UpstreamError::Malformed(_))));
    }

    #[test]
    fn request_bodies_use_service_field_names() {
        let body = ChatBody {
            github_link: "https://github.com/acme/widgets",
            persona: Persona::Expert,
            documentation: "# Doc",
            user_message: "more examples",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["githubLink"], "https://github.com/acme/widgets");
        assert_eq!(json["persona"], "expert");
        assert_eq!(json["userMessage"], "more examples");

        let body = GenerateBody { github_link: "r", persona: Persona::Beginner, branch: "" };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["branch"], "");
        assert_eq!(json["persona"], "beginner");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let backend = HttpBackend::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.url("chat"), "http://localhost:5000/chat");
    }

    #[tokio::test]
    async fn file_generator_reads_markdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Widgets\n").unwrap();
        let request = GenerateRequest { repo: String::new(), persona: Persona::default(), branch: None };
        let doc = FileGenerator::new(&path).generate(&request).await.unwrap();
        assert_eq!(doc.document, "# Widgets\n");

        let missing = FileGenerator::new(dir.path().join("nope.md")).generate(&request).await;
        assert!(matches!(missing, Err(UpstreamError::Io(_))));
    }
}
