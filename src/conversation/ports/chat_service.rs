//! Port for the back-end chat service.
//!
//! Session retrieval, template storage and persistence of operator actions
//! all live behind this trait. AI replies are persisted by a separate
//! pipeline and never pass through here.

use crate::conversation::domain::{
    ChatMessage, ChatSession, ConversationStatus, InternalNote, OperatorId, SessionId,
    SessionStatus, TemplateParams,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for chat service operations.
pub type ChatServiceResult<T> = Result<T, ChatServiceError>;

/// Filters accepted by [`ChatService::list_sessions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Restrict to sessions with this coarse status.
    pub status: Option<SessionStatus>,
    /// Restrict to sessions assigned to this operator.
    pub agent_id: Option<OperatorId>,
    /// Maximum number of sessions returned.
    pub limit: Option<usize>,
    /// Number of sessions skipped before the first one returned.
    pub offset: Option<usize>,
}

impl SessionFilter {
    /// Creates an unrestricted filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a coarse status.
    #[must_use]
    pub const fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to one operator's sessions.
    #[must_use]
    pub fn with_agent(mut self, agent_id: OperatorId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Sets the page window.
    #[must_use]
    pub const fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns `true` when `session` passes the status and agent criteria.
    ///
    /// Paging is applied by the caller after matching.
    #[must_use]
    pub fn matches(&self, session: &ChatSession) -> bool {
        let status_matches = self.status.is_none_or(|status| session.status() == status);
        let agent_matches = self
            .agent_id
            .as_ref()
            .is_none_or(|agent| session.assigned_to() == Some(agent));
        status_matches && agent_matches
    }
}

/// Back-end chat service contract.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Lists sessions matching `filter`, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] when the back-end cannot be reached or
    /// answers with data that cannot be decoded.
    async fn list_sessions(&self, filter: &SessionFilter) -> ChatServiceResult<Vec<ChatSession>>;

    /// Lists the log of one session in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] on transport or decoding failure.
    async fn list_messages(&self, session_id: SessionId) -> ChatServiceResult<Vec<ChatMessage>>;

    /// Lists stored template definitions, unvalidated.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] on transport or decoding failure.
    async fn list_templates(&self) -> ChatServiceResult<Vec<TemplateParams>>;

    /// Records a status change made by an operator.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] when the change was not accepted.
    async fn persist_status_change(
        &self,
        session_id: SessionId,
        status: ConversationStatus,
        assigned_to: Option<OperatorId>,
    ) -> ChatServiceResult<()>;

    /// Records a reply written by a human operator.
    ///
    /// The back-end keeps the message identifier, so a later
    /// [`ChatService::list_messages`] returns the same entry rather than a
    /// copy.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] when the message was not accepted.
    async fn persist_outbound_message(&self, message: &ChatMessage) -> ChatServiceResult<()>;

    /// Records an operator note.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError`] when the note was not accepted.
    async fn persist_note(&self, note: &InternalNote) -> ChatServiceResult<()>;
}

/// Errors returned by chat service implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatServiceError {
    /// The back-end could not be reached.
    #[error("chat service unavailable: {0}")]
    Unavailable(String),

    /// The back-end did not answer in time.
    #[error("chat service timed out")]
    Timeout,

    /// The back-end refused the request.
    #[error("chat service rejected the request: {0}")]
    Rejected(String),

    /// The back-end answered with data that cannot be decoded.
    #[error("malformed chat service response: {0}")]
    Malformed(String),
}
