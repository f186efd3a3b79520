//! Operator-only notes attached to a session.

use super::{ConversationDomainError, NoteId, OperatorId, SessionId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A note visible to operators only. Never delivered to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternalNote {
    id: NoteId,
    session_id: SessionId,
    author: OperatorId,
    content: String,
    created_at: DateTime<Utc>,
}

impl InternalNote {
    /// Creates a note written by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationDomainError::EmptyContent`] when the content is
    /// blank.
    pub fn new(
        session_id: SessionId,
        author: OperatorId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ConversationDomainError> {
        let text = content.into();
        if text.trim().is_empty() {
            return Err(ConversationDomainError::EmptyContent);
        }
        Ok(Self {
            id: NoteId::new(),
            session_id,
            author,
            content: text,
            created_at,
        })
    }

    /// Returns the note identifier.
    #[must_use]
    pub const fn id(&self) -> NoteId {
        self.id
    }

    /// Returns the session the note belongs to.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author(&self) -> &OperatorId {
        &self.author
    }

    /// Returns the note text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
