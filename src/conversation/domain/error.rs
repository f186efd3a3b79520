//! Error types for conversation domain validation and parsing.

use super::{ConversationStatus, SessionId};
use thiserror::Error;

/// Errors raised while mutating or constructing conversation domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationDomainError {
    /// The requested status change is not permitted by the state machine.
    #[error("session {session_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Session the transition was attempted on.
        session_id: SessionId,
        /// Status held when the transition was attempted.
        from: ConversationStatus,
        /// Requested target status.
        to: ConversationStatus,
    },

    /// A message was composed for a session that has been closed.
    #[error("session {0} is closed")]
    SessionClosed(SessionId),

    /// Text content is empty after trimming.
    #[error("message content must not be empty")]
    EmptyContent,

    /// The template body and its declared variables disagree.
    #[error("template '{name}' is malformed: {reason}")]
    MalformedTemplate {
        /// Template name.
        name: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// The template has not been approved for sending.
    #[error("template '{0}' is not approved")]
    TemplateNotApproved(String),

    /// Operator identity is empty or contains whitespace.
    #[error("invalid operator identity '{0}'")]
    InvalidOperatorId(String),

    /// A persisted session record violates the session invariants.
    #[error("inconsistent session record {session_id}: {reason}")]
    InconsistentSessionRecord {
        /// Offending session.
        session_id: SessionId,
        /// Description of the violated invariant.
        reason: String,
    },
}

/// Error returned while parsing persisted enumeration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
