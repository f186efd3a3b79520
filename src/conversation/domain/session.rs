//! Chat session aggregate and its status state machine.
//!
//! A session is driven by the AI agent until an operator takes it over; the
//! operator can hand it back or close it. `Closed` is terminal. The coarse
//! [`SessionStatus`] and the operator assignment are kept consistent with
//! [`ConversationStatus`] by construction: the only way to change them is
//! through [`ChatSession::apply`].

use super::{ConversationDomainError, OperatorId, ParseEnumError, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel a session arrived on. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// `WhatsApp` business messaging.
    Whatsapp,
    /// Embedded web chat widget.
    Web,
}

impl Channel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Web => "web",
        }
    }
}

impl TryFrom<&str> for Channel {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Self::Whatsapp),
            "web" => Ok(Self::Web),
            _ => Err(ParseEnumError::new("channel", value)),
        }
    }
}

/// Who is currently handling the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// The AI agent answers the customer. Initial state.
    ActiveAi,
    /// A human operator has taken over.
    HumanActive,
    /// The conversation is over. Terminal.
    Closed,
}

impl ConversationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActiveAi => "active_ai",
            Self::HumanActive => "human_active",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` when no transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` when moving from `self` to `target` changes state and
    /// is permitted.
    ///
    /// Self-transitions are not listed here; the state machine treats them
    /// as idempotent no-ops rather than transitions.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::ActiveAi, Self::HumanActive | Self::Closed)
                | (Self::HumanActive, Self::ActiveAi | Self::Closed)
        )
    }

    /// Coarse status derived from this conversation status.
    #[must_use]
    pub const fn coarse(self) -> SessionStatus {
        match self {
            Self::Closed => SessionStatus::Closed,
            Self::ActiveAi | Self::HumanActive => SessionStatus::Active,
        }
    }
}

impl TryFrom<&str> for ConversationStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active_ai" => Ok(Self::ActiveAi),
            "human_active" => Ok(Self::HumanActive),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("conversation status", value)),
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse session status used for list filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// AI- or human-handled.
    Active,
    /// Closed.
    Closed,
}

impl SessionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("session status", value)),
        }
    }
}

/// Operator-invoked status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Operator assumes control from the AI agent.
    TakeOver(OperatorId),
    /// Operator returns control to the AI agent.
    HandBack,
    /// Conversation is ended.
    Close,
}

impl Transition {
    /// Status this transition moves the session to.
    #[must_use]
    pub const fn target(&self) -> ConversationStatus {
        match self {
            Self::TakeOver(_) => ConversationStatus::HumanActive,
            Self::HandBack => ConversationStatus::ActiveAi,
            Self::Close => ConversationStatus::Closed,
        }
    }
}

/// Result of applying a [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The session changed status.
    Applied,
    /// The session already held the target status; nothing changed.
    Unchanged,
}

impl TransitionOutcome {
    /// Returns `true` when the session changed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Optional customer details shown alongside a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Display name, when known.
    pub name: Option<String>,
    /// Phone number in E.164 form, when known.
    pub phone: Option<String>,
}

/// Chat session aggregate root.
///
/// Not deserializable: wire data goes through
/// [`SessionRecord`](crate::conversation::adapters::records::SessionRecord) and
/// [`ChatSession::from_persisted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSession {
    id: SessionId,
    channel: Channel,
    conversation_status: ConversationStatus,
    assigned_to: Option<OperatorId>,
    contact: ContactInfo,
    message_count: u64,
    last_message_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSessionData {
    /// Persisted identifier.
    pub id: SessionId,
    /// Persisted channel.
    pub channel: Channel,
    /// Persisted conversation status.
    pub conversation_status: ConversationStatus,
    /// Persisted coarse status, checked against `conversation_status`.
    pub status: SessionStatus,
    /// Persisted assignee.
    pub assigned_to: Option<OperatorId>,
    /// Persisted customer details.
    pub contact: ContactInfo,
    /// Persisted message count.
    pub message_count: u64,
    /// Persisted last message timestamp.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates a new AI-handled session with an empty log.
    #[must_use]
    pub fn new(channel: Channel, contact: ContactInfo, created_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            channel,
            conversation_status: ConversationStatus::ActiveAi,
            assigned_to: None,
            contact,
            message_count: 0,
            last_message_at: None,
            created_at,
        }
    }

    /// Reconstructs a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationDomainError::InconsistentSessionRecord`] when
    /// the coarse status disagrees with the conversation status or an
    /// assignee is recorded on a session no operator is handling.
    pub fn from_persisted(data: PersistedSessionData) -> Result<Self, ConversationDomainError> {
        let inconsistent = |reason: &str| ConversationDomainError::InconsistentSessionRecord {
            session_id: data.id,
            reason: reason.to_owned(),
        };
        if data.conversation_status.coarse() != data.status {
            return Err(inconsistent("status disagrees with conversation status"));
        }
        if data.assigned_to.is_some() && data.conversation_status != ConversationStatus::HumanActive
        {
            return Err(inconsistent("assignee set while no operator is active"));
        }

        Ok(Self {
            id: data.id,
            channel: data.channel,
            conversation_status: data.conversation_status,
            assigned_to: data.assigned_to,
            contact: data.contact,
            message_count: data.message_count,
            last_message_at: data.last_message_at,
            created_at: data.created_at,
        })
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the channel.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns who is handling the conversation.
    #[must_use]
    pub const fn conversation_status(&self) -> ConversationStatus {
        self.conversation_status
    }

    /// Returns the coarse status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.conversation_status.coarse()
    }

    /// Returns the operator handling the session, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&OperatorId> {
        self.assigned_to.as_ref()
    }

    /// Returns the customer details.
    #[must_use]
    pub const fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    /// Returns the number of messages in the session log.
    #[must_use]
    pub const fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Returns the timestamp of the latest message.
    #[must_use]
    pub const fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` once the session is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.conversation_status.is_terminal()
    }

    /// Applies an operator transition.
    ///
    /// Re-entering the current status is a no-op reported as
    /// [`TransitionOutcome::Unchanged`]; a take-over of a session another
    /// operator already holds keeps the existing assignee.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationDomainError::InvalidTransition`] when leaving
    /// the closed state is attempted. The session is not modified.
    pub fn apply(
        &mut self,
        transition: Transition,
    ) -> Result<TransitionOutcome, ConversationDomainError> {
        let from = self.conversation_status;
        let to = transition.target();
        if from == to {
            return Ok(TransitionOutcome::Unchanged);
        }
        if !from.can_transition_to(to) {
            return Err(ConversationDomainError::InvalidTransition {
                session_id: self.id,
                from,
                to,
            });
        }

        self.assigned_to = match transition {
            Transition::TakeOver(operator) => Some(operator),
            Transition::HandBack | Transition::Close => None,
        };
        self.conversation_status = to;
        Ok(TransitionOutcome::Applied)
    }

    /// Resets the summary fields to match a freshly loaded log.
    pub(crate) const fn sync_summary(
        &mut self,
        message_count: u64,
        last_message_at: Option<DateTime<Utc>>,
    ) {
        self.message_count = message_count;
        self.last_message_at = last_message_at;
    }
}
