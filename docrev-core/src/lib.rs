//! Core of docrev: the documentation version store and refinement merge engine.
//!
//! - [`diff`]: coalesced line diff between two snapshots.
//! - [`merge`]: splices a refinement below a literal section heading.
//! - [`store`]: flat, insertion-ordered registry of labeled versions.
//! - [`pipeline`]: stages a chat delta as a pending refinement and commits it.
//! - [`session`]: one generate action: store, scratch buffer, chat log and
//!   the single in-flight refinement gate.
//! - [`collab`]: traits for the generation and chat services.
//!
//! Nothing in this crate touches the network, the filesystem or a terminal.

pub mod collab;
pub mod diff;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod types;

pub use collab::{ChatRefiner, ChatRequest, DocGenerator, GenerateRequest, GeneratedDoc};
pub use diff::{DiffRow, DiffSegment, DiffStats, SegmentKind};
pub use error::{Error, Result, UpstreamError};
pub use merge::{AnchorMerger, MergeOutcome, SectionMerger, DEFAULT_ANCHOR};
pub use pipeline::{PendingRefinement, RefinementPipeline};
pub use session::{RefinementTicket, Session};
pub use store::VersionStore;
pub use types::{ChatMessage, Persona, Sender, Version, DEFAULT_LABEL, ORIGINAL_KEY};
