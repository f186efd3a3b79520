//! Application services for the operator console.
//!
//! - [`selector`]: the open-session pointer
//! - [`composer`]: attribution and message construction
//! - [`console`]: operator actions wired to the store and the chat service

pub mod composer;
pub mod console;
pub mod selector;

pub use composer::{ComposeRequest, DEFAULT_TEMPLATE_LABEL, TemplateLabel};
pub use console::{ConsoleError, ConsoleResult, ConsoleService, TemplateLoadReport};
pub use selector::{NoActiveSession, SessionSelector};
