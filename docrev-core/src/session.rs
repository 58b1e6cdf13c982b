//! One document-generation session.
//!
//! A `Session` owns the version store for a single generate action together
//! with everything a front-end needs around it: the editable scratch buffer,
//! the chat log, and the single-slot refinement gate. A new generate builds a
//! new `Session`; nothing is shared between sessions.
//!
//! # Refinement lifecycle
//!
//! ```text
//! begin_refinement ──► (model call, outside the session) ──► complete_refinement
//!        │                                                          │
//!        └──── cancel_refinement                  commit_pending ◄──┴──► discard_pending
//! ```
//!
//! Only one refinement may be in flight or staged at a time. Results are
//! matched to the ticket that started them; anything else is stale and is
//! dropped without touching the store.

use tracing::{info, warn};
use uuid::Uuid;

use crate::collab::{ChatRequest, DocGenerator, GenerateRequest};
use crate::diff::{diff, DiffSegment};
use crate::error::{Error, Result, UpstreamError};
use crate::pipeline::{PendingRefinement, RefinementPipeline};
use crate::store::VersionStore;
use crate::types::{ChatMessage, Persona, ORIGINAL_KEY};

/// Handle for one in-flight refinement.
///
/// Carries the request to send to the chat collaborator, including a snapshot
/// of the document it was issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementTicket {
    session_id: String,
    seq: u64,
    pub base_key: String,
    pub request: ChatRequest,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    repo: String,
    persona: Persona,
    branches: Vec<String>,
    branch: Option<String>,
    store: VersionStore,
    /// Scratch copy of the active version's content.
    buffer: String,
    chat: Vec<ChatMessage>,
    pipeline: RefinementPipeline,
    in_flight: Option<u64>,
    next_seq: u64,
    pending: Option<PendingRefinement>,
}

impl Session {
    /// Builds a session whose `"Original"` is `document`.
    pub fn from_document(
        repo: impl Into<String>,
        persona: Persona,
        document: impl Into<String>,
        branches: Vec<String>,
        pipeline: RefinementPipeline,
    ) -> Self {
        let document = document.into();
        let branch = branches.first().cloned();
        let session = Self {
            id: Uuid::new_v4().to_string(),
            repo: repo.into(),
            persona,
            branches,
            branch,
            buffer: document.clone(),
            store: VersionStore::with_original(document),
            chat: Vec::new(),
            pipeline,
            in_flight: None,
            next_seq: 0,
            pending: None,
        };
        info!(session = %session.id, repo = %session.repo, persona = %persona, "session started");
        session
    }

    /// Runs `generator` and seeds a fresh session from its output.
    ///
    /// # Errors
    ///
    /// `UpstreamFailure` when generation fails or yields an empty document.
    /// The caller keeps whatever session it already had.
    pub async fn bootstrap(
        generator: &dyn DocGenerator,
        request: &GenerateRequest,
        pipeline: RefinementPipeline,
    ) -> Result<Self> {
        let generated = generator.generate(request).await.map_err(|e| {
            warn!(repo = %request.repo, error = %e, "generation failed");
            e
        })?;
        if generated.document.trim().is_empty() {
            return Err(UpstreamError::Empty("document").into());
        }
        let mut session = Self::from_document(
            request.repo.clone(),
            request.persona,
            generated.document,
            generated.branches,
            pipeline,
        );
        if request.branch.is_some() {
            session.branch = request.branch.clone();
        }
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// Branch the session was generated for (the first reported one by default).
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn pending(&self) -> Option<&PendingRefinement> {
        self.pending.as_ref()
    }

    pub fn is_refining(&self) -> bool {
        self.in_flight.is_some()
    }

    // -----------------------------------------------------------------------
    // Scratch buffer
    // -----------------------------------------------------------------------

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Replaces the scratch buffer. Nothing is persisted until
    /// [`save_buffer`](Self::save_buffer) or a version switch.
    pub fn set_buffer(&mut self, content: impl Into<String>) {
        self.buffer = content.into();
    }

    /// Writes the scratch buffer back into the active version.
    pub fn save_buffer(&mut self) -> Result<()> {
        let key = self.store.active_key().ok_or(Error::NoActiveVersion)?.to_owned();
        self.store.edit(&key, self.buffer.clone())
    }

    /// Makes `key` active: flushes the scratch buffer into the previously
    /// active version, then loads `key` into the buffer.
    ///
    /// Fails with `NotFound` before anything is flushed when `key` is unknown.
    pub fn switch_version(&mut self, key: &str) -> Result<()> {
        self.store.get(key)?;
        if self.store.active_key().is_some() {
            self.save_buffer()?;
        }
        self.buffer = self.store.select(key)?.to_owned();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Version management
    // -----------------------------------------------------------------------

    pub fn rename(&mut self, key: &str, label: &str) -> Result<()> {
        self.store.rename(key, label)
    }

    /// Deletes `key`. When it was active, the buffer is reloaded from the
    /// version that became active; unsaved edits to the deleted version go
    /// with it.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let was_active = self.store.active_key() == Some(key);
        self.store.delete(key)?;
        if was_active {
            self.buffer = self.store.active().map(|v| v.content.clone()).unwrap_or_default();
        }
        Ok(())
    }

    /// Diff from `"Original"` to `key`.
    pub fn diff_against_original(&self, key: &str) -> Result<Vec<DiffSegment>> {
        let original = self.store.get(ORIGINAL_KEY)?;
        let edited = self.store.get(key)?;
        Ok(diff(&original.content, &edited.content))
    }

    // -----------------------------------------------------------------------
    // Refinement
    // -----------------------------------------------------------------------

    /// Opens the refinement gate for `message` against the active version.
    ///
    /// The scratch buffer is flushed first so the model sees unsaved edits.
    ///
    /// # Errors
    ///
    /// `RefinementInFlight` while another request is outstanding,
    /// `PendingExists` while a staged refinement awaits its label and
    /// `NoActiveVersion` on an empty store.
    pub fn begin_refinement(&mut self, message: &str) -> Result<RefinementTicket> {
        if self.in_flight.is_some() {
            return Err(Error::RefinementInFlight);
        }
        if self.pending.is_some() {
            return Err(Error::PendingExists);
        }
        self.save_buffer()?;
        let active = self.store.active().ok_or(Error::NoActiveVersion)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);

        let ticket = RefinementTicket {
            session_id: self.id.clone(),
            seq,
            base_key: active.key.clone(),
            request: ChatRequest {
                repo: self.repo.clone(),
                persona: self.persona,
                document: active.content.clone(),
                message: message.to_owned(),
            },
        };
        self.chat.push(ChatMessage::user(message));
        info!(session = %self.id, seq, base = %ticket.base_key, "refinement started");
        Ok(ticket)
    }

    /// Abandons the in-flight refinement, if any. A late result for it will be
    /// rejected as stale. Returns whether something was cancelled.
    pub fn cancel_refinement(&mut self) -> bool {
        match self.in_flight.take() {
            Some(seq) => {
                self.chat.push(ChatMessage::system("Refinement cancelled."));
                info!(session = %self.id, seq, "refinement cancelled");
                true
            }
            None => false,
        }
    }

    /// Feeds the collaborator's answer for `ticket` back into the session and
    /// stages the merged result.
    ///
    /// # Errors
    ///
    /// `StaleRefinement` when `ticket` is not the one in flight (cancelled, or
    /// issued by another session). `UpstreamFailure` when `result` is an error
    /// or a blank delta; the gate is released and the store is untouched.
    pub fn complete_refinement(
        &mut self,
        ticket: &RefinementTicket,
        result: std::result::Result<String, UpstreamError>,
    ) -> Result<&PendingRefinement> {
        if ticket.session_id != self.id || self.in_flight != Some(ticket.seq) {
            warn!(session = %self.id, seq = ticket.seq, "stale refinement result dropped");
            return Err(Error::StaleRefinement);
        }
        self.in_flight = None;

        let delta = match result {
            Ok(delta) if delta.trim().is_empty() => Err(UpstreamError::Empty("chat response")),
            other => other,
        };
        let delta = match delta {
            Ok(delta) => delta,
            Err(e) => {
                warn!(session = %self.id, error = %e, "refinement failed");
                self.chat.push(ChatMessage::system(format!("Error processing request: {e}")));
                return Err(e.into());
            }
        };

        self.chat.push(ChatMessage::assistant(delta.clone()));
        let pending = self.pipeline.stage(
            &ticket.base_key,
            &ticket.request.document,
            &ticket.request.message,
            &delta,
        );
        let pending: &PendingRefinement = self.pending.insert(pending);
        Ok(pending)
    }

    /// Commits the staged refinement as a new active version.
    ///
    /// The scratch buffer is flushed to the previously active version first and
    /// then reloaded with the new content.
    pub fn commit_pending(&mut self, label: &str) -> Result<String> {
        let pending = self.pending.take().ok_or(Error::NoPendingRefinement)?;
        if self.store.active_key().is_some() {
            self.save_buffer()?;
        }
        let fallback = pending.fallback;
        let key = self.pipeline.commit(&mut self.store, pending, label);
        let version = self.store.get(&key)?;
        self.buffer = version.content.clone();

        let mut notice = format!("New version added as \"{}\".", version.title());
        if fallback {
            notice.push_str(" The section heading was not found, so the refinement was appended.");
        }
        self.chat.push(ChatMessage::system(notice));
        Ok(key)
    }

    /// Drops the staged refinement without touching the store.
    pub fn discard_pending(&mut self) -> Option<PendingRefinement> {
        let pending = self.pending.take()?;
        self.pipeline.cancel(pending.clone());
        Some(pending)
    }
}
