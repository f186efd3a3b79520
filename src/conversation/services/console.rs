//! Operator console service.
//!
//! Ties the selector, the store, the state machine and the composer to the
//! back-end [`ChatService`]. All console state sits behind one async mutex,
//! so mutations are applied in call order. A mutating operation persists
//! its change first and touches the store only once the back-end accepted
//! it; a failed call therefore leaves the store as it was. Fetches run
//! without the lock and are merged by the identifiers in the response.

use std::collections::BTreeMap;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::conversation::{
    domain::{
        ChatMessage, ChatSession, ConversationDomainError, InternalNote, MediaType, MessageType,
        OperatorId, Sender, SessionId, TemplateDefinition, TemplateVariables, Transition,
        TransitionOutcome, render,
    },
    ports::{ChatService, ChatServiceError, SessionFilter},
    services::{
        composer::{self, ComposeRequest, TemplateLabel, media_content},
        selector::{NoActiveSession, SessionSelector},
    },
    store::{ConversationStore, StoreError},
};

/// Errors surfaced to the operator surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// The action needs an open session and none is selected.
    #[error(transparent)]
    NoActiveSession(#[from] NoActiveSession),

    /// The selected session is not held by the store.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// No loaded template has this name.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// The template label could not be rendered.
    #[error("failed to render template label: {0}")]
    TemplateLabel(String),

    /// The domain rejected the action.
    #[error(transparent)]
    Domain(#[from] ConversationDomainError),

    /// The back-end call failed.
    #[error(transparent)]
    Service(#[from] ChatServiceError),
}

impl From<StoreError> for ConsoleError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UnknownSession(id) => Self::UnknownSession(id),
            StoreError::Domain(domain) => Self::Domain(domain),
        }
    }
}

impl ConsoleError {
    /// Returns `true` for errors the operator must see before continuing.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Domain(
                ConversationDomainError::TemplateNotApproved(_)
                    | ConversationDomainError::EmptyContent
                    | ConversationDomainError::SessionClosed(_)
            ) | Self::UnknownTemplate(_)
        )
    }
}

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Outcome of [`ConsoleService::load_templates`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLoadReport {
    /// Names of templates that passed validation.
    pub loaded: Vec<String>,
    /// Templates excluded from the catalogue and why.
    pub rejected: Vec<ConversationDomainError>,
}

#[derive(Debug, Default)]
struct ConsoleState {
    store: ConversationStore,
    selector: SessionSelector,
    templates: BTreeMap<String, TemplateDefinition>,
    preview: TemplateVariables,
}

/// Console operations for one signed-in operator.
pub struct ConsoleService<S, C>
where
    S: ChatService,
    C: Clock + Send + Sync,
{
    chat: Arc<S>,
    clock: Arc<C>,
    operator: OperatorId,
    label: TemplateLabel,
    state: Mutex<ConsoleState>,
}

impl<S, C> ConsoleService<S, C>
where
    S: ChatService,
    C: Clock + Send + Sync,
{
    /// Creates a console for `operator` with an empty store.
    #[must_use]
    pub fn new(chat: Arc<S>, clock: Arc<C>, operator: OperatorId) -> Self {
        Self {
            chat,
            clock,
            operator,
            label: TemplateLabel::default(),
            state: Mutex::new(ConsoleState::default()),
        }
    }

    /// Replaces the label used for sent template content.
    #[must_use]
    pub fn with_template_label(mut self, label: TemplateLabel) -> Self {
        self.label = label;
        self
    }

    /// Returns the operator this console acts for.
    #[must_use]
    pub const fn operator(&self) -> &OperatorId {
        &self.operator
    }

    /// Fetches sessions and merges them into the store.
    ///
    /// Sessions changed by this console while the fetch was in flight keep
    /// their local state. Returns the number of sessions received.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Service`] when the fetch fails; the store is
    /// not modified.
    pub async fn refresh_sessions(&self, filter: &SessionFilter) -> ConsoleResult<usize> {
        let since = self.state.lock().await.store.revision();
        let sessions = self.chat.list_sessions(filter).await?;
        let received = sessions.len();
        let skipped = self
            .state
            .lock()
            .await
            .store
            .upsert_sessions_since(sessions, since);
        tracing::debug!(received, skipped, "merged session list");
        Ok(received)
    }

    /// Opens a session, or closes the open one with `None`, and loads its log.
    ///
    /// The selection changes immediately. The fetched log is merged into the
    /// session it was requested for, so a response arriving after the
    /// operator moved on never touches the newly selected session, and
    /// messages already held are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Service`] when the log cannot be fetched.
    pub async fn select_session(&self, id: Option<SessionId>) -> ConsoleResult<()> {
        self.state.lock().await.selector.select(id);
        let Some(session_id) = id else {
            return Ok(());
        };

        let messages = self.chat.list_messages(session_id).await?;
        let mut state = self.state.lock().await;
        match state.store.merge_messages(session_id, messages) {
            Ok(added) => {
                tracing::debug!(%session_id, added, "merged session log");
                Ok(())
            }
            Err(StoreError::UnknownSession(_)) => {
                tracing::warn!(%session_id, "selected session is not in the store");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Takes the open session over from the AI agent.
    ///
    /// # Errors
    ///
    /// See [`ConsoleService::transition`].
    pub async fn take_over(&self) -> ConsoleResult<TransitionOutcome> {
        self.transition(Transition::TakeOver(self.operator.clone()))
            .await
    }

    /// Hands the open session back to the AI agent.
    ///
    /// # Errors
    ///
    /// See [`ConsoleService::transition`].
    pub async fn hand_back(&self) -> ConsoleResult<TransitionOutcome> {
        self.transition(Transition::HandBack).await
    }

    /// Closes the open session.
    ///
    /// # Errors
    ///
    /// See [`ConsoleService::transition`].
    pub async fn close_session(&self) -> ConsoleResult<TransitionOutcome> {
        self.transition(Transition::Close).await
    }

    /// Applies `transition` to the open session.
    ///
    /// Idempotent transitions return [`TransitionOutcome::Unchanged`] without
    /// calling the back-end.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NoActiveSession`] with nothing open,
    /// [`ConsoleError::UnknownSession`] when the open id is not held,
    /// [`ConsoleError::Domain`] when leaving the closed state and
    /// [`ConsoleError::Service`] when persistence fails. The store is left
    /// untouched in every error case.
    pub async fn transition(&self, transition: Transition) -> ConsoleResult<TransitionOutcome> {
        let mut state = self.state.lock().await;
        let session_id = Self::require_selected(&state)?;
        let mut candidate = Self::require_session(&state, session_id)?.clone();

        let outcome = candidate.apply(transition.clone())?;
        if !outcome.is_applied() {
            tracing::debug!(
                %session_id,
                requested = %transition.target(),
                "transition already in effect"
            );
            return Ok(outcome);
        }

        self.chat
            .persist_status_change(
                session_id,
                candidate.conversation_status(),
                candidate.assigned_to().cloned(),
            )
            .await?;
        let applied = state.store.apply_transition(session_id, transition)?;
        tracing::info!(
            %session_id,
            operator = %self.operator,
            status = %candidate.conversation_status(),
            "session status changed"
        );
        Ok(applied)
    }

    /// Sends free-form text to the open session.
    ///
    /// # Errors
    ///
    /// See [`ConsoleService::compose`].
    pub async fn send_message(&self, content: &str) -> ConsoleResult<ChatMessage> {
        self.compose(ComposeRequest::text(content)).await
    }

    /// Sends an approved template with its variable bindings.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::UnknownTemplate`] for an unloaded name,
    /// [`ConversationDomainError::TemplateNotApproved`] (as
    /// [`ConsoleError::Domain`]) for a template that is not approved, and
    /// otherwise the errors of [`ConsoleService::compose`].
    pub async fn send_template(
        &self,
        name: &str,
        variables: &TemplateVariables,
    ) -> ConsoleResult<ChatMessage> {
        let mut state = self.state.lock().await;
        let template = state
            .templates
            .get(name)
            .ok_or_else(|| ConsoleError::UnknownTemplate(name.to_owned()))?;
        if !template.is_approved() {
            tracing::warn!(
                template = name,
                status = template.status().as_str(),
                "refused unapproved template"
            );
            return Err(ConversationDomainError::TemplateNotApproved(name.to_owned()).into());
        }
        let content = self
            .label
            .render(template, variables)
            .map_err(|error| ConsoleError::TemplateLabel(error.to_string()))?;
        self.compose_locked(&mut state, ComposeRequest::new(content, MessageType::Template))
            .await
    }

    /// Sends media to the open session.
    ///
    /// # Errors
    ///
    /// See [`ConsoleService::compose`].
    pub async fn send_media(
        &self,
        media_type: MediaType,
        caption: Option<&str>,
    ) -> ConsoleResult<ChatMessage> {
        let content = media_content(media_type, caption);
        self.compose(ComposeRequest::new(content, MessageType::Media))
            .await
    }

    /// Appends a message to the open session.
    ///
    /// Operator-authored messages are persisted through the back-end before
    /// they are stored; AI-attributed ones are stored directly because the
    /// automation pipeline persists them itself.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NoActiveSession`] with nothing open,
    /// [`ConsoleError::UnknownSession`] when the open id is not held,
    /// [`ConsoleError::Domain`] for a closed session or blank content and
    /// [`ConsoleError::Service`] when persistence fails.
    pub async fn compose(&self, request: ComposeRequest) -> ConsoleResult<ChatMessage> {
        let mut state = self.state.lock().await;
        self.compose_locked(&mut state, request).await
    }

    async fn compose_locked(
        &self,
        state: &mut MutexGuard<'_, ConsoleState>,
        request: ComposeRequest,
    ) -> ConsoleResult<ChatMessage> {
        let session_id = Self::require_selected(state)?;
        let message = composer::draft(&state.store, session_id, request, self.clock.as_ref())?;

        if message.sender() == Sender::HumanAgent {
            self.chat.persist_outbound_message(&message).await?;
        }
        let stored = composer::commit(&mut state.store, message)?;
        tracing::info!(
            %session_id,
            sender = %stored.sender(),
            message_type = stored.message_type().as_str(),
            "message appended"
        );
        Ok(stored)
    }

    /// Adds an operator-only note to the open session.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NoActiveSession`], [`ConsoleError::UnknownSession`],
    /// [`ConsoleError::Domain`] for blank content or
    /// [`ConsoleError::Service`] when persistence fails.
    pub async fn add_note(&self, content: &str) -> ConsoleResult<InternalNote> {
        let mut state = self.state.lock().await;
        let session_id = Self::require_selected(&state)?;
        Self::require_session(&state, session_id)?;

        let note = InternalNote::new(
            session_id,
            self.operator.clone(),
            content,
            self.clock.utc(),
        )?;
        self.chat.persist_note(&note).await?;
        state.store.apply_note(note.clone())?;
        tracing::info!(%session_id, operator = %self.operator, "note added");
        Ok(note)
    }

    /// Fetches and validates the template catalogue, replacing the loaded one.
    ///
    /// Malformed definitions are left out and listed in the report.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Service`] when the fetch fails; the loaded
    /// catalogue is kept.
    pub async fn load_templates(&self) -> ConsoleResult<TemplateLoadReport> {
        let fetched = self.chat.list_templates().await?;
        let mut report = TemplateLoadReport::default();
        let mut catalogue = BTreeMap::new();
        for params in fetched {
            match TemplateDefinition::new(params) {
                Ok(template) => {
                    report.loaded.push(template.name().to_owned());
                    catalogue.insert(template.name().to_owned(), template);
                }
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed template");
                    report.rejected.push(error);
                }
            }
        }
        self.state.lock().await.templates = catalogue;
        Ok(report)
    }

    /// Sets a preview binding. An empty value clears it.
    pub async fn toggle_preview_variable(&self, name: &str, value: &str) {
        let mut state = self.state.lock().await;
        if value.is_empty() {
            state.preview.remove(name);
        } else {
            state.preview.insert(name.to_owned(), value.to_owned());
        }
    }

    /// Clears every preview binding.
    pub async fn clear_preview(&self) {
        self.state.lock().await.preview.clear();
    }

    /// Renders a loaded template with the current preview bindings.
    ///
    /// Unbound variables show as `{{name}}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::UnknownTemplate`] for an unloaded name.
    pub async fn preview_template(&self, name: &str) -> ConsoleResult<String> {
        let state = self.state.lock().await;
        let template = state
            .templates
            .get(name)
            .ok_or_else(|| ConsoleError::UnknownTemplate(name.to_owned()))?;
        Ok(render(template, &state.preview))
    }

    /// Returns the current preview bindings.
    pub async fn preview_variables(&self) -> TemplateVariables {
        self.state.lock().await.preview.clone()
    }

    /// Returns the open session id.
    pub async fn selected_id(&self) -> Option<SessionId> {
        self.state.lock().await.selector.selected()
    }

    /// Returns the open session, if it is held.
    pub async fn selected_session(&self) -> Option<ChatSession> {
        let state = self.state.lock().await;
        state
            .selector
            .selected()
            .and_then(|id| state.store.session(id).cloned())
    }

    /// Returns a held session.
    pub async fn session(&self, id: SessionId) -> Option<ChatSession> {
        self.state.lock().await.store.session(id).cloned()
    }

    /// Returns every held session in store order.
    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.state.lock().await.store.sessions().cloned().collect()
    }

    /// Returns the log of a session; empty when none is loaded.
    pub async fn messages(&self, id: SessionId) -> Vec<ChatMessage> {
        self.state.lock().await.store.messages(id).to_vec()
    }

    /// Returns the operator notes of a session.
    pub async fn notes(&self, id: SessionId) -> Vec<InternalNote> {
        self.state.lock().await.store.notes(id).to_vec()
    }

    /// Returns the log of the open session; empty with nothing open.
    pub async fn selected_messages(&self) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state
            .selector
            .selected()
            .map(|id| state.store.messages(id).to_vec())
            .unwrap_or_default()
    }

    /// Returns the loaded templates that may be sent.
    pub async fn approved_templates(&self) -> Vec<TemplateDefinition> {
        self.state
            .lock()
            .await
            .templates
            .values()
            .filter(|template| template.is_approved())
            .cloned()
            .collect()
    }

    fn require_selected(state: &ConsoleState) -> ConsoleResult<SessionId> {
        state.selector.require().map_err(|error| {
            tracing::debug!("ignored action with no session open");
            ConsoleError::from(error)
        })
    }

    fn require_session(state: &ConsoleState, session_id: SessionId) -> ConsoleResult<&ChatSession> {
        state.store.session(session_id).ok_or_else(|| {
            tracing::warn!(%session_id, "action on a session the store does not hold");
            ConsoleError::UnknownSession(session_id)
        })
    }
}
