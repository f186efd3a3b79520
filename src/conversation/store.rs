//! Conversation store: the single owned aggregate of sessions, logs and notes.
//!
//! Every mutation goes through [`ConversationStore::apply_transition`],
//! [`ConversationStore::apply_message`] or [`ConversationStore::apply_note`],
//! or through the loaders that merge fetched data by identifier. Each of
//! them either leaves the store untouched or leaves every session summary
//! equal to its log.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::conversation::domain::{
    ChatMessage, ChatSession, ConversationDomainError, InternalNote, MessageId, SessionId,
    SessionStatus, Transition, TransitionOutcome,
};

/// Errors returned by store mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced session is not held by the store.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// The domain rejected the mutation.
    #[error(transparent)]
    Domain(#[from] ConversationDomainError),
}

/// Result type for store mutations.
pub type StoreResult<T> = Result<T, StoreError>;

/// In-process state shared by the console components.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    order: Vec<SessionId>,
    sessions: HashMap<SessionId, ChatSession>,
    messages: HashMap<SessionId, Vec<ChatMessage>>,
    notes: HashMap<SessionId, Vec<InternalNote>>,
    revision: u64,
    touched: HashMap<SessionId, u64>,
}

impl ConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session, or `None` when it is not held.
    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&ChatSession> {
        self.sessions.get(&id)
    }

    /// Returns the session log in creation order. Empty when none is loaded.
    #[must_use]
    pub fn messages(&self, id: SessionId) -> &[ChatMessage] {
        self.messages.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the operator notes for a session in creation order.
    #[must_use]
    pub fn notes(&self, id: SessionId) -> &[InternalNote] {
        self.notes.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates sessions in store order.
    pub fn sessions(&self) -> impl Iterator<Item = &ChatSession> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    /// Sessions whose coarse status matches `status`, in store order.
    #[must_use]
    pub fn sessions_with_status(&self, status: SessionStatus) -> Vec<&ChatSession> {
        self.sessions()
            .filter(|session| session.status() == status)
            .collect()
    }

    /// Number of sessions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when no session is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Counter advanced by every local transition and appended message.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Inserts or replaces sessions by identifier.
    ///
    /// New sessions are appended to the store order; known ones keep their
    /// position. When a log is already loaded for a session its summary is
    /// recomputed from that log.
    pub fn upsert_sessions(&mut self, incoming: impl IntoIterator<Item = ChatSession>) {
        let current = self.revision;
        self.upsert_sessions_since(incoming, current);
    }

    /// Like [`ConversationStore::upsert_sessions`] for sessions fetched when
    /// the store was at revision `since`.
    ///
    /// A session changed locally after `since` keeps its local state; the
    /// fetched copy is older than it. Returns the number of sessions skipped.
    pub fn upsert_sessions_since(
        &mut self,
        incoming: impl IntoIterator<Item = ChatSession>,
        since: u64,
    ) -> usize {
        let mut skipped = 0_usize;
        for mut session in incoming {
            let id = session.id();
            if self.touched.get(&id).is_some_and(|changed| *changed > since) {
                skipped = skipped.saturating_add(1);
                continue;
            }
            if let Some(log) = self.messages.get(&id) {
                sync_from_log(&mut session, log);
            }
            if self.sessions.insert(id, session).is_none() {
                self.order.push(id);
            }
        }
        skipped
    }

    /// Merges freshly fetched messages into the log of `id`.
    ///
    /// Messages belonging to another session are dropped, as are messages
    /// whose identifier is already in the log; held entries are never
    /// replaced or removed, so the log cannot shrink. The merged log is
    /// stably sorted by creation time and the session summary is re-synced.
    /// Returns the number of messages added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSession`] when the session is not held;
    /// nothing is stored in that case.
    pub fn merge_messages(
        &mut self,
        id: SessionId,
        fetched: impl IntoIterator<Item = ChatMessage>,
    ) -> StoreResult<usize> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;
        let log = self.messages.entry(id).or_default();

        let mut known: HashSet<MessageId> = log.iter().map(ChatMessage::id).collect();
        let before = log.len();
        log.extend(
            fetched
                .into_iter()
                .filter(|message| message.session_id() == id && known.insert(message.id())),
        );
        log.sort_by_key(ChatMessage::created_at);
        sync_from_log(session, log);
        Ok(log.len().saturating_sub(before))
    }

    /// Applies a status transition to a held session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSession`] for an unknown id and
    /// [`StoreError::Domain`] when the state machine rejects the transition.
    pub fn apply_transition(
        &mut self,
        id: SessionId,
        transition: Transition,
    ) -> StoreResult<TransitionOutcome> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;
        let outcome = session.apply(transition)?;
        if outcome.is_applied() {
            self.touch(id);
        }
        Ok(outcome)
    }

    /// Appends a message to the end of its session log.
    ///
    /// The timestamp is moved forward when it would precede the current
    /// last message, and the session summary is re-synced from the log.
    /// Returns the message as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSession`] when the owning session is not
    /// held.
    pub fn apply_message(&mut self, message: ChatMessage) -> StoreResult<ChatMessage> {
        let id = message.session_id();
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;
        let log = self.messages.entry(id).or_default();

        let ordered = match log.last() {
            Some(last) => message.not_before(last.created_at()),
            None => message,
        };
        log.push(ordered.clone());
        sync_from_log(session, log);
        self.touch(id);
        Ok(ordered)
    }

    /// Appends an operator note.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownSession`] when the session is not held.
    pub fn apply_note(&mut self, note: InternalNote) -> StoreResult<()> {
        let id = note.session_id();
        if !self.sessions.contains_key(&id) {
            return Err(StoreError::UnknownSession(id));
        }
        self.notes.entry(id).or_default().push(note);
        Ok(())
    }

    fn touch(&mut self, id: SessionId) {
        self.revision = self.revision.saturating_add(1);
        self.touched.insert(id, self.revision);
    }
}

fn sync_from_log(session: &mut ChatSession, log: &[ChatMessage]) {
    let count = u64::try_from(log.len()).unwrap_or(u64::MAX);
    session.sync_summary(count, log.last().map(ChatMessage::created_at));
}
