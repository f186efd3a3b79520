//! Shared fixtures for console integration tests.

use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use switchboard::conversation::{
    adapters::memory::InMemoryChatService,
    domain::{
        Channel, ChatSession, ContactInfo, OperatorId, SessionId, TemplateId, TemplateParams,
        TemplateStatus, TemplateVariables,
    },
    ports::SessionFilter,
    services::ConsoleService,
};

/// Console wired to the in-memory chat service.
pub type TestConsole = ConsoleService<InMemoryChatService, DefaultClock>;

/// A console with one `WhatsApp` session loaded and open.
pub struct ConsoleHarness {
    /// Back-end the console talks to.
    pub chat: Arc<InMemoryChatService>,
    /// Console under test.
    pub console: TestConsole,
    /// The open session.
    pub session_id: SessionId,
}

/// Operator identity used throughout the tests.
///
/// # Errors
///
/// Returns an error if the identity is rejected.
pub fn operator() -> eyre::Result<OperatorId> {
    Ok(OperatorId::new("agent-42")?)
}

/// Builds a customer session created now.
#[must_use]
pub fn customer_session() -> ChatSession {
    ChatSession::new(
        Channel::Whatsapp,
        ContactInfo {
            name: Some("Amit".to_owned()),
            phone: Some("+919800000000".to_owned()),
        },
        DefaultClock.utc(),
    )
}

/// Creates a console without loading anything.
///
/// # Errors
///
/// Returns an error if the operator identity is rejected.
pub fn console_for(chat: &Arc<InMemoryChatService>) -> eyre::Result<TestConsole> {
    Ok(ConsoleService::new(
        Arc::clone(chat),
        Arc::new(DefaultClock),
        operator()?,
    ))
}

/// Seeds a session, loads the session list and opens the session.
///
/// # Errors
///
/// Returns an error if seeding or any console call fails.
pub async fn open_session() -> eyre::Result<ConsoleHarness> {
    let chat = Arc::new(InMemoryChatService::new());
    let session = customer_session();
    let session_id = session.id();
    chat.insert_session(session)?;

    let console = console_for(&chat)?;
    console.refresh_sessions(&SessionFilter::new()).await?;
    console.select_session(Some(session_id)).await?;
    Ok(ConsoleHarness {
        chat,
        console,
        session_id,
    })
}

/// Template definition with the given name, body, variables and status.
#[must_use]
pub fn template(
    name: &str,
    body: &str,
    variables: &[&str],
    status: TemplateStatus,
) -> TemplateParams {
    TemplateParams {
        id: TemplateId::new(),
        name: name.to_owned(),
        category: "utility".to_owned(),
        language: "en".to_owned(),
        body: body.to_owned(),
        variables: variables.iter().map(|name| (*name).to_owned()).collect(),
        status,
    }
}

/// The approved order update template.
#[must_use]
pub fn order_update() -> TemplateParams {
    template(
        "order_update",
        "Hi {{1}}! Order {{2}} is {{3}}.",
        &["customer_name", "order_number", "status"],
        TemplateStatus::Approved,
    )
}

/// Builds variable bindings from pairs.
#[must_use]
pub fn bind(pairs: &[(&str, &str)]) -> TemplateVariables {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}
