//! Error taxonomy for docrev-core.
//!
//! Every failure here is recoverable at the boundary between the core and its
//! caller. The store is never left half-mutated: operations validate before
//! they write.

use thiserror::Error;

/// Failure reported by an external collaborator (generation or chat service).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response decoded but carried no usable text.
    #[error("service returned an empty {0}")]
    Empty(&'static str),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Local input the collaborator needs could not be read.
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The referenced version key is not in the store.
    #[error("version not found: {key}")]
    NotFound { key: String },

    /// Rename or delete aimed at the protected "Original" or at a missing key.
    #[error("invalid target: {key} cannot be renamed or deleted")]
    InvalidTarget { key: String },

    #[error("upstream failure: {0}")]
    UpstreamFailure(#[from] UpstreamError),

    /// A refinement is already awaiting the language model for this session.
    #[error("a refinement is already in flight")]
    RefinementInFlight,

    /// A refinement result arrived for a ticket that is no longer current.
    #[error("refinement result no longer applies to this session")]
    StaleRefinement,

    /// A merged refinement is waiting for its label; commit or discard it first.
    #[error("a staged refinement is waiting for a label")]
    PendingExists,

    #[error("no staged refinement to commit")]
    NoPendingRefinement,

    /// The store is empty (nothing generated yet).
    #[error("no active version")]
    NoActiveVersion,
}

pub type Result<T> = std::result::Result<T, Error>;
