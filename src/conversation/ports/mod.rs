//! Port contracts for conversation management.
//!
//! Ports define infrastructure-agnostic interfaces used by the console
//! service. The back-end behind them is external to this crate.

pub mod chat_service;

pub use chat_service::{ChatService, ChatServiceError, ChatServiceResult, SessionFilter};
