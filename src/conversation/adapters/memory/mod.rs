//! In-memory adapter implementations.
//!
//! These adapters keep everything in process and are meant for tests and
//! local tooling, not production traffic.

mod chat_service;

pub use chat_service::{InMemoryChatService, PersistedChange};
