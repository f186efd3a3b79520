//! Chat messages and the sender attribution rule.
//!
//! Messages are immutable once created. A session log only ever grows.

use super::{ConversationStatus, MessageId, ParseEnumError, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the message reached us from the customer or was sent to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the customer.
    Inbound,
    /// Sent to the customer.
    Outbound,
}

impl Direction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            _ => Err(ParseEnumError::new("direction", value)),
        }
    }
}

/// Identity a message is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The customer.
    User,
    /// The AI agent.
    Ai,
    /// A human operator.
    HumanAgent,
    /// Automated system notices.
    System,
}

impl Sender {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::HumanAgent => "human_agent",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for Sender {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "ai" => Ok(Self::Ai),
            "human_agent" | "agent" => Ok(Self::HumanAgent),
            "system" => Ok(Self::System),
            _ => Err(ParseEnumError::new("sender", value)),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the sender an outbound message is recorded under when the caller
/// does not name one.
///
/// Operators own the conversation while it is `HumanActive`; in every other
/// status the AI agent speaks.
///
/// # Examples
///
/// ```
/// use switchboard::conversation::domain::{attribute_sender, ConversationStatus, Sender};
///
/// assert_eq!(attribute_sender(ConversationStatus::HumanActive), Sender::HumanAgent);
/// assert_eq!(attribute_sender(ConversationStatus::ActiveAi), Sender::Ai);
/// ```
#[must_use]
pub const fn attribute_sender(status: ConversationStatus) -> Sender {
    match status {
        ConversationStatus::HumanActive => Sender::HumanAgent,
        ConversationStatus::ActiveAi | ConversationStatus::Closed => Sender::Ai,
    }
}

/// Kind of payload a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Free-form text.
    #[default]
    Text,
    /// Rendered approved template.
    Template,
    /// Media attachment, optionally captioned.
    Media,
}

impl MessageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Template => "template",
            Self::Media => "media",
        }
    }
}

impl TryFrom<&str> for MessageType {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "template" => Ok(Self::Template),
            "media" => Ok(Self::Media),
            _ => Err(ParseEnumError::new("message type", value)),
        }
    }
}

/// Delivery progress of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Handed to the channel.
    #[default]
    Sent,
    /// Channel confirmed delivery.
    Delivered,
    /// Customer opened the message.
    Read,
    /// Channel rejected the message.
    Failed,
}

impl DeliveryStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for DeliveryStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseEnumError::new("delivery status", value)),
        }
    }
}

/// Kind of media attached by [`MessageType::Media`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Audio or voice note.
    Audio,
    /// Document such as a PDF.
    Document,
}

impl MediaType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Content used when a media message carries no caption, e.g.
    /// `[IMAGE sent]`.
    #[must_use]
    pub fn placeholder(self) -> String {
        format!("[{} sent]", self.as_str().to_ascii_uppercase())
    }
}

impl TryFrom<&str> for MediaType {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "document" => Ok(Self::Document),
            _ => Err(ParseEnumError::new("media type", value)),
        }
    }
}

/// A single entry in a session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    session_id: SessionId,
    direction: Direction,
    sender: Sender,
    content: String,
    message_type: MessageType,
    status: DeliveryStatus,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMessageData {
    /// Persisted identifier.
    pub id: MessageId,
    /// Owning session.
    pub session_id: SessionId,
    /// Persisted direction.
    pub direction: Direction,
    /// Persisted sender.
    pub sender: Sender,
    /// Persisted content.
    pub content: String,
    /// Persisted message type.
    pub message_type: MessageType,
    /// Persisted delivery status.
    pub status: DeliveryStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates an outbound message in the `Sent` state.
    #[must_use]
    pub fn outbound(
        session_id: SessionId,
        sender: Sender,
        content: impl Into<String>,
        message_type: MessageType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            direction: Direction::Outbound,
            sender,
            content: content.into(),
            message_type,
            status: DeliveryStatus::Sent,
            created_at,
        }
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            session_id: data.session_id,
            direction: data.direction,
            sender: data.sender,
            content: data.content,
            message_type: data.message_type,
            status: data.status,
            created_at: data.created_at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the owning session.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the rendered content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns the delivery status.
    #[must_use]
    pub const fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the timestamp forward so the log stays ordered.
    pub(crate) fn not_before(mut self, floor: DateTime<Utc>) -> Self {
        if self.created_at < floor {
            self.created_at = floor;
        }
        self
    }
}
