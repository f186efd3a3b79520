//! Adapters for the conversation ports.
//!
//! - [`memory::InMemoryChatService`]: process-local chat service
//! - [`records`]: serde wire records and their conversion into domain types

pub mod memory;
pub mod records;
