//! In-memory chat service for tests and local tooling.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::conversation::{
    adapters::records::{MessageRecord, SessionRecord, TemplateRecord},
    domain::{
        ChatMessage, ChatSession, ConversationStatus, InternalNote, OperatorId, SessionId,
        TemplateParams, Transition,
    },
    ports::{ChatService, ChatServiceError, ChatServiceResult, SessionFilter},
};

/// Change accepted by [`InMemoryChatService`], kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedChange {
    /// A status change.
    Status {
        /// Affected session.
        session_id: SessionId,
        /// New conversation status.
        status: ConversationStatus,
        /// New assignee.
        assigned_to: Option<OperatorId>,
    },
    /// A human-authored reply.
    OutboundMessage {
        /// Affected session.
        session_id: SessionId,
        /// Message text.
        content: String,
    },
    /// An operator note.
    Note(InternalNote),
}

/// Thread-safe in-memory chat service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatService {
    state: Arc<RwLock<InMemoryChatState>>,
}

#[derive(Debug, Default)]
struct InMemoryChatState {
    sessions: Vec<ChatSession>,
    messages: HashMap<SessionId, Vec<ChatMessage>>,
    templates: Vec<TemplateParams>,
    changes: Vec<PersistedChange>,
}

fn lock_error(err: impl std::fmt::Display) -> ChatServiceError {
    ChatServiceError::Unavailable(format!("lock poisoned: {err}"))
}

impl InMemoryChatService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a service from back-end records.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError::Malformed`] when any record fails to
    /// decode.
    pub fn from_records(
        sessions: Vec<SessionRecord>,
        messages: Vec<MessageRecord>,
        templates: Vec<TemplateRecord>,
    ) -> ChatServiceResult<Self> {
        let service = Self::new();
        {
            let mut state = service.state.write().map_err(lock_error)?;
            for record in sessions {
                state.sessions.push(ChatSession::try_from(record)?);
            }
            for record in messages {
                let message = ChatMessage::try_from(record)?;
                state
                    .messages
                    .entry(message.session_id())
                    .or_default()
                    .push(message);
            }
            for record in templates {
                state.templates.push(TemplateParams::try_from(record)?);
            }
        }
        Ok(service)
    }

    /// Adds a session.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError::Unavailable`] when the lock is poisoned.
    pub fn insert_session(&self, session: ChatSession) -> ChatServiceResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.sessions.push(session);
        Ok(())
    }

    /// Appends a message to a session log, as an inbound delivery would.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError::Unavailable`] when the lock is poisoned.
    pub fn insert_message(&self, message: ChatMessage) -> ChatServiceResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .messages
            .entry(message.session_id())
            .or_default()
            .push(message);
        Ok(())
    }

    /// Adds a template definition.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError::Unavailable`] when the lock is poisoned.
    pub fn insert_template(&self, template: TemplateParams) -> ChatServiceResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.templates.push(template);
        Ok(())
    }

    /// Returns every accepted change in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`ChatServiceError::Unavailable`] when the lock is poisoned.
    pub fn changes(&self) -> ChatServiceResult<Vec<PersistedChange>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.changes.clone())
    }
}

fn transition_for(
    status: ConversationStatus,
    assigned_to: Option<OperatorId>,
) -> ChatServiceResult<Transition> {
    match (status, assigned_to) {
        (ConversationStatus::HumanActive, Some(operator)) => Ok(Transition::TakeOver(operator)),
        (ConversationStatus::HumanActive, None) => Err(ChatServiceError::Rejected(
            "human_active requires an assignee".to_owned(),
        )),
        (ConversationStatus::ActiveAi, _) => Ok(Transition::HandBack),
        (ConversationStatus::Closed, _) => Ok(Transition::Close),
    }
}

#[async_trait]
impl ChatService for InMemoryChatService {
    async fn list_sessions(&self, filter: &SessionFilter) -> ChatServiceResult<Vec<ChatSession>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut matching: Vec<ChatSession> = state
            .sessions
            .iter()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        matching.sort_by_key(|session| std::cmp::Reverse(session.created_at()));
        Ok(matching
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn list_messages(&self, session_id: SessionId) -> ChatServiceResult<Vec<ChatMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.messages.get(&session_id).cloned().unwrap_or_default())
    }

    async fn list_templates(&self) -> ChatServiceResult<Vec<TemplateParams>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.templates.clone())
    }

    async fn persist_status_change(
        &self,
        session_id: SessionId,
        status: ConversationStatus,
        assigned_to: Option<OperatorId>,
    ) -> ChatServiceResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let transition = transition_for(status, assigned_to.clone())?;
        let session = state
            .sessions
            .iter_mut()
            .find(|session| session.id() == session_id)
            .ok_or_else(|| ChatServiceError::Rejected(format!("unknown session {session_id}")))?;
        session
            .apply(transition)
            .map_err(|err| ChatServiceError::Rejected(err.to_string()))?;
        state.changes.push(PersistedChange::Status {
            session_id,
            status,
            assigned_to,
        });
        Ok(())
    }

    async fn persist_outbound_message(&self, message: &ChatMessage) -> ChatServiceResult<()> {
        let session_id = message.session_id();
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.sessions.iter().any(|session| session.id() == session_id) {
            return Err(ChatServiceError::Rejected(format!(
                "unknown session {session_id}"
            )));
        }
        state
            .messages
            .entry(session_id)
            .or_default()
            .push(message.clone());
        state.changes.push(PersistedChange::OutboundMessage {
            session_id,
            content: message.content().to_owned(),
        });
        Ok(())
    }

    async fn persist_note(&self, note: &InternalNote) -> ChatServiceResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.changes.push(PersistedChange::Note(note.clone()));
        Ok(())
    }
}
