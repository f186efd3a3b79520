//! Message composition: attribution, validation and content synthesis.
//!
//! Composition is split in two steps so callers can persist a message
//! before it becomes visible: [`draft`] validates and builds the message
//! without touching the store, [`commit`] appends it. [`add_message`] does
//! both.

use minijinja::{Environment, context};
use mockable::Clock;

use crate::conversation::{
    domain::{
        ChatMessage, ConversationDomainError, MediaType, MessageType, Sender, SessionId,
        TemplateDefinition, TemplateVariables, attribute_sender,
    },
    store::{ConversationStore, StoreError, StoreResult},
};

/// Label format applied when none is configured.
pub const DEFAULT_TEMPLATE_LABEL: &str = "[Template: {{ name }}] {{ values | join(', ') }}";

/// What to append to a session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    content: String,
    sender: Option<Sender>,
    message_type: MessageType,
}

impl ComposeRequest {
    /// Free-form text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, MessageType::Text)
    }

    /// Content with an explicit message type.
    #[must_use]
    pub fn new(content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            content: content.into(),
            sender: None,
            message_type,
        }
    }

    /// Records the message under `sender` instead of the attributed one.
    #[must_use]
    pub const fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Returns the content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }
}

/// Builds the message `request` would append to `session_id`.
///
/// # Errors
///
/// Returns [`StoreError::UnknownSession`] for an unknown session,
/// [`ConversationDomainError::SessionClosed`] for a closed one and
/// [`ConversationDomainError::EmptyContent`] for blank content.
pub fn draft(
    store: &ConversationStore,
    session_id: SessionId,
    request: ComposeRequest,
    clock: &impl Clock,
) -> StoreResult<ChatMessage> {
    let session = store
        .session(session_id)
        .ok_or(StoreError::UnknownSession(session_id))?;
    if session.is_closed() {
        return Err(ConversationDomainError::SessionClosed(session_id).into());
    }
    if request.content.trim().is_empty() {
        return Err(ConversationDomainError::EmptyContent.into());
    }

    let sender = request
        .sender
        .unwrap_or_else(|| attribute_sender(session.conversation_status()));
    Ok(ChatMessage::outbound(
        session_id,
        sender,
        request.content,
        request.message_type,
        clock.utc(),
    ))
}

/// Appends a drafted message and returns it as stored.
///
/// # Errors
///
/// Returns [`StoreError::UnknownSession`] when the owning session is gone.
pub fn commit(store: &mut ConversationStore, message: ChatMessage) -> StoreResult<ChatMessage> {
    store.apply_message(message)
}

/// Drafts and commits in one step.
///
/// # Errors
///
/// See [`draft`] and [`commit`].
pub fn add_message(
    store: &mut ConversationStore,
    session_id: SessionId,
    request: ComposeRequest,
    clock: &impl Clock,
) -> StoreResult<ChatMessage> {
    let message = draft(store, session_id, request, clock)?;
    commit(store, message)
}

/// Content of a media message: the caption, or `[<TYPE> sent]` without one.
#[must_use]
pub fn media_content(media_type: MediaType, caption: Option<&str>) -> String {
    caption
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map_or_else(|| media_type.placeholder(), ToOwned::to_owned)
}

/// Renders the descriptive content recorded for a sent template.
///
/// The format is a `minijinja` template receiving `name` (the template
/// name) and `values` (bound values in declared variable order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLabel {
    format: String,
}

impl Default for TemplateLabel {
    fn default() -> Self {
        Self {
            format: DEFAULT_TEMPLATE_LABEL.to_owned(),
        }
    }
}

impl TemplateLabel {
    /// Creates a label from a `minijinja` format, checking that it renders.
    ///
    /// # Errors
    ///
    /// Returns the `minijinja` error when the format does not compile or
    /// fails to render with sample values.
    pub fn new(format: impl Into<String>) -> Result<Self, minijinja::Error> {
        let label = Self {
            format: format.into(),
        };
        label.render_parts("sample", &["value"])?;
        Ok(label)
    }

    /// Returns the format source.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Renders the label for a template and its bindings.
    ///
    /// # Errors
    ///
    /// Returns the `minijinja` error when rendering fails.
    pub fn render(
        &self,
        template: &TemplateDefinition,
        bound: &TemplateVariables,
    ) -> Result<String, minijinja::Error> {
        self.render_parts(template.name(), &template.bound_values(bound))
    }

    fn render_parts(&self, name: &str, values: &[&str]) -> Result<String, minijinja::Error> {
        let environment = Environment::new();
        let rendered = environment.render_str(&self.format, context! { name, values })?;
        Ok(rendered.trim_end().to_owned())
    }
}
