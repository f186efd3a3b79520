//! Conversation session management for the operator console.
//!
//! A chat or `WhatsApp` thread moves between the AI agent, a human operator
//! and the closed state while its log grows one message at a time. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The single owned state aggregate in [`store`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Operator-facing orchestration in [`services`]
//!
//! # Example
//!
//! ```
//! use switchboard::conversation::domain::{
//!     Channel, ChatSession, ContactInfo, MessageType, Sender,
//! };
//! use switchboard::conversation::services::{composer, ComposeRequest};
//! use switchboard::conversation::store::ConversationStore;
//! use mockable::{Clock, DefaultClock};
//!
//! let clock = DefaultClock;
//! let session = ChatSession::new(Channel::Web, ContactInfo::default(), clock.utc());
//! let id = session.id();
//!
//! let mut store = ConversationStore::new();
//! store.upsert_sessions([session]);
//!
//! let message = composer::add_message(&mut store, id, ComposeRequest::text("Hi"), &clock)
//!     .expect("session accepts messages");
//! assert_eq!(message.sender(), Sender::Ai);
//! assert_eq!(message.message_type(), MessageType::Text);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod store;

#[cfg(test)]
mod tests;
