//! Domain model for conversation sessions.
//!
//! Sessions, messages, notes and templates are pure values here; storage,
//! transport and selection live outside the domain boundary.

mod error;
mod ids;
mod message;
mod note;
mod session;
mod template;

pub use error::{ConversationDomainError, ParseEnumError};
pub use ids::{MessageId, NoteId, OperatorId, SessionId, TemplateId};
pub use message::{
    ChatMessage, DeliveryStatus, Direction, MediaType, MessageType, PersistedMessageData, Sender,
    attribute_sender,
};
pub use note::InternalNote;
pub use session::{
    Channel, ChatSession, ContactInfo, ConversationStatus, PersistedSessionData, SessionStatus,
    Transition, TransitionOutcome,
};
pub use template::{
    TemplateDefinition, TemplateParams, TemplateStatus, TemplateVariables, placeholder_indices,
    render,
};
