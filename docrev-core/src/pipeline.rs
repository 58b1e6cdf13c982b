//! One chat turn: delta in, labeled version out.
//!
//! The pipeline is split in two so the label prompt can sit between the
//! halves. [`RefinementPipeline::stage`] is pure and produces a
//! [`PendingRefinement`]; [`RefinementPipeline::commit`] turns it into a
//! version. Dropping the pending value is the cancel path and touches nothing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collab::{ChatRefiner, ChatRequest};
use crate::error::{Result, UpstreamError};
use crate::merge::{AnchorMerger, SectionMerger};
use crate::store::VersionStore;

/// Merged candidate content waiting for a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRefinement {
    /// Key of the version the delta was merged into.
    pub base_key: String,
    /// User message that produced the delta.
    pub message: String,
    /// Raw text returned by the language model.
    pub delta: String,
    /// Merged document.
    pub content: String,
    /// The anchor was missing and the delta was appended instead.
    pub fallback: bool,
}

#[derive(Clone)]
pub struct RefinementPipeline {
    merger: Arc<dyn SectionMerger>,
}

impl RefinementPipeline {
    pub fn new(merger: Arc<dyn SectionMerger>) -> Self {
        Self { merger }
    }

    /// Pipeline using the literal-anchor merge strategy with `anchor`.
    pub fn with_anchor(anchor: impl Into<String>) -> Self {
        Self::new(Arc::new(AnchorMerger::new(anchor)))
    }

    /// Merges `delta` into `base_content` and wraps the result.
    pub fn stage(
        &self,
        base_key: &str,
        base_content: &str,
        message: &str,
        delta: &str,
    ) -> PendingRefinement {
        let outcome = self.merger.merge(base_content, delta);
        if outcome.fallback {
            warn!(base = base_key, "anchor not found, refinement appended");
        }
        debug!(base = base_key, bytes = outcome.content.len(), "refinement staged");
        PendingRefinement {
            base_key: base_key.to_owned(),
            message: message.to_owned(),
            delta: delta.to_owned(),
            content: outcome.content,
            fallback: outcome.fallback,
        }
    }

    /// Stores `pending` as a new active version labeled `label`.
    pub fn commit(&self, store: &mut VersionStore, pending: PendingRefinement, label: &str) -> String {
        let key = store.create(pending.content, label);
        info!(key = %key, base = %pending.base_key, "refinement committed");
        key
    }

    /// Discards a staged refinement. The store is not touched.
    pub fn cancel(&self, pending: PendingRefinement) {
        debug!(base = %pending.base_key, "refinement discarded");
    }

    /// Asks `model` for a delta on `request` and stages it against the
    /// document carried by the request.
    ///
    /// # Errors
    ///
    /// `UpstreamFailure` when the model fails or returns blank text.
    pub async fn refine(
        &self,
        model: &dyn ChatRefiner,
        base_key: &str,
        request: &ChatRequest,
    ) -> Result<PendingRefinement> {
        let delta = fetch_delta(model, request).await?;
        Ok(self.stage(base_key, &request.document, &request.message, &delta))
    }
}

impl Default for RefinementPipeline {
    fn default() -> Self {
        Self::new(Arc::new(AnchorMerger::default()))
    }
}

impl std::fmt::Debug for RefinementPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinementPipeline").finish_non_exhaustive()
    }
}

/// Calls the chat collaborator and rejects blank responses.
pub async fn fetch_delta(model: &dyn ChatRefiner, request: &ChatRequest) -> std::result::Result<String, UpstreamError> {
    let delta = model.chat_refine(request).await?;
    if delta.trim().is_empty() {
        return Err(UpstreamError::Empty("chat response"));
    }
    Ok(delta)
}
