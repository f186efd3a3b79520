//! Switchboard: conversation session core for a customer-engagement console.
//!
//! Operators watch chat and `WhatsApp` conversations handled by an AI agent,
//! take them over, reply, send approved templates and close them. This
//! crate holds the state and rules behind those actions; transport,
//! authentication and rendering live elsewhere.
//!
//! # Modules
//!
//! - [`conversation`]: sessions, message logs, templates and the console
//!   service
//! - [`config`]: TOML configuration
//! - [`telemetry`]: `tracing` subscriber setup

pub mod config;
pub mod conversation;
pub mod telemetry;
