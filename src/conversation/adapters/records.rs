//! Wire records exchanged with the chat service back-end.
//!
//! Enumerations travel as snake_case strings and identifiers as UUIDs.
//! Conversion into domain types is fallible; any decoding problem is
//! reported as [`ChatServiceError::Malformed`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::{
    domain::{
        Channel, ChatMessage, ChatSession, ContactInfo, ConversationStatus, DeliveryStatus,
        Direction, MessageId, MessageType, OperatorId, PersistedMessageData, PersistedSessionData,
        Sender, SessionId, SessionStatus, TemplateDefinition, TemplateId, TemplateParams,
        TemplateStatus,
    },
    ports::ChatServiceError,
};

fn malformed(error: impl std::fmt::Display) -> ChatServiceError {
    ChatServiceError::Malformed(error.to_string())
}

/// Session row as returned by the back-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: Uuid,
    /// `whatsapp` or `web`.
    pub channel: String,
    /// `active_ai`, `human_active` or `closed`.
    pub conversation_status: String,
    /// `active` or `closed`.
    pub status: String,
    /// Assigned operator identity.
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Customer display name.
    #[serde(default)]
    pub contact_name: Option<String>,
    /// Customer phone number.
    #[serde(default)]
    pub contact_phone: Option<String>,
    /// Denormalized message count.
    #[serde(default)]
    pub message_count: u64,
    /// Denormalized last message timestamp.
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SessionRecord> for ChatSession {
    type Error = ChatServiceError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        let assigned_to = record
            .assigned_to
            .map(OperatorId::new)
            .transpose()
            .map_err(malformed)?;
        let data = PersistedSessionData {
            id: SessionId::from_uuid(record.id),
            channel: Channel::try_from(record.channel.as_str()).map_err(malformed)?,
            conversation_status: ConversationStatus::try_from(record.conversation_status.as_str())
                .map_err(malformed)?,
            status: SessionStatus::try_from(record.status.as_str()).map_err(malformed)?,
            assigned_to,
            contact: ContactInfo {
                name: record.contact_name,
                phone: record.contact_phone,
            },
            message_count: record.message_count,
            last_message_at: record.last_message_at,
            created_at: record.created_at,
        };
        Self::from_persisted(data).map_err(malformed)
    }
}

impl From<&ChatSession> for SessionRecord {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id().into_inner(),
            channel: session.channel().as_str().to_owned(),
            conversation_status: session.conversation_status().as_str().to_owned(),
            status: session.status().as_str().to_owned(),
            assigned_to: session.assigned_to().map(ToString::to_string),
            contact_name: session.contact().name.clone(),
            contact_phone: session.contact().phone.clone(),
            message_count: session.message_count(),
            last_message_at: session.last_message_at(),
            created_at: session.created_at(),
        }
    }
}

/// Message row as returned by the back-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message identifier.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// `inbound` or `outbound`.
    pub direction: String,
    /// `user`, `ai`, `human_agent` or `system`.
    pub sender: String,
    /// Rendered text.
    pub content: String,
    /// `text`, `template` or `media`.
    #[serde(default = "default_message_type")]
    pub message_type: String,
    /// `sent`, `delivered`, `read` or `failed`.
    #[serde(default = "default_delivery_status")]
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

fn default_message_type() -> String {
    MessageType::Text.as_str().to_owned()
}

fn default_delivery_status() -> String {
    DeliveryStatus::Sent.as_str().to_owned()
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = ChatServiceError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Self::from_persisted(PersistedMessageData {
            id: MessageId::from_uuid(record.id),
            session_id: SessionId::from_uuid(record.session_id),
            direction: Direction::try_from(record.direction.as_str()).map_err(malformed)?,
            sender: Sender::try_from(record.sender.as_str()).map_err(malformed)?,
            content: record.content,
            message_type: MessageType::try_from(record.message_type.as_str())
                .map_err(malformed)?,
            status: DeliveryStatus::try_from(record.status.as_str()).map_err(malformed)?,
            created_at: record.created_at,
        }))
    }
}

/// Template row as returned by the back-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Template identifier.
    pub id: Uuid,
    /// Unique template name.
    pub name: String,
    /// Provider category.
    pub category: String,
    /// Language code.
    pub language: String,
    /// Body with `{{n}}` placeholders.
    pub body: String,
    /// Variable names in placeholder order.
    #[serde(default)]
    pub variables: Vec<String>,
    /// `pending`, `approved` or `rejected`.
    pub status: String,
}

impl TryFrom<TemplateRecord> for TemplateParams {
    type Error = ChatServiceError;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TemplateId::from_uuid(record.id),
            status: TemplateStatus::try_from(record.status.as_str()).map_err(malformed)?,
            name: record.name,
            category: record.category,
            language: record.language,
            body: record.body,
            variables: record.variables,
        })
    }
}

impl TryFrom<TemplateRecord> for TemplateDefinition {
    type Error = ChatServiceError;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        Self::new(TemplateParams::try_from(record)?).map_err(malformed)
    }
}
