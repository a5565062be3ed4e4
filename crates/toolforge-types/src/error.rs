//! Error types for composition, runtime, and generation-session operations.
//!
//! Decode failures are deliberately absent: the streaming decoder skips
//! malformed lines instead of raising, so the builder can apply its own
//! tolerance policy per event type. The enums here are the explicit,
//! returned-value failures.

use thiserror::Error;

/// Errors from structural mutation of a composition.
///
/// Rejected outright on the direct-edit path; tolerated and recorded as
/// warnings on the generation-driven path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("unknown element type '{0}'")]
    UnknownElement(String),

    #[error("instance id '{0}' already present")]
    DuplicateInstance(String),

    #[error("no instance with id '{0}'")]
    UnknownInstance(String),

    #[error("output '{output}' not declared on element type '{element_id}'")]
    UndeclaredOutput { element_id: String, output: String },

    #[error("input '{input}' not declared on element type '{element_id}'")]
    UndeclaredInput { element_id: String, input: String },

    #[error("composition is finalized; structural mutation refused")]
    Finalized,
}

/// Errors from runtime action dispatch and propagation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no instance with id '{0}'")]
    UnknownInstance(String),

    #[error("unknown element type '{0}'")]
    UnknownElement(String),

    #[error("action '{action}' not declared on element type '{element_id}'")]
    UnsupportedAction { element_id: String, action: String },

    #[error("composition is not finalized")]
    NotFinalized,

    #[error("invalid action payload: {0}")]
    InvalidPayload(String),
}

/// Terminal outcomes of a generation session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The service emitted an `error` record.
    #[error("generation failed: {0}")]
    Protocol(String),

    /// No data arrived within the configured stall interval.
    #[error("generation stalled: no data received")]
    Stalled,

    /// The external cancellation signal fired.
    #[error("generation cancelled")]
    Cancelled,

    /// The stream ended with neither `complete` nor `error` observed.
    #[error("generation ended unexpectedly")]
    UnexpectedEnd,

    /// A finalized result arrived from a superseded session.
    #[error("generation session superseded")]
    Superseded,

    /// Transport-level failure reading the stream.
    #[error("stream transport error: {0}")]
    Transport(String),
}
