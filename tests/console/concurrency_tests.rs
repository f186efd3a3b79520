//! Back-end responses that arrive after the console state moved on.

use super::helpers::{customer_session, operator};
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockable::{Clock, DefaultClock};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use switchboard::conversation::{
    adapters::memory::InMemoryChatService,
    domain::{
        ChatMessage, ChatSession, ConversationStatus, InternalNote, MessageType, OperatorId,
        Sender, SessionId, TemplateParams,
    },
    ports::{ChatService, ChatServiceResult, SessionFilter},
    services::ConsoleService,
};
use tokio::sync::Notify;

/// Call held back by [`GatedChat`] once armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// `list_messages` for this session.
    Messages(SessionId),
    /// `list_sessions`, after its snapshot is taken.
    Sessions,
}

/// In-memory back-end that parks one call until the test releases it.
struct GatedChat {
    inner: InMemoryChatService,
    gate: Gate,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedChat {
    fn new(inner: InMemoryChatService, gate: Gate) -> Self {
        Self {
            inner,
            gate,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn hold_if(&self, call: Gate) {
        if call == self.gate && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl ChatService for GatedChat {
    async fn list_sessions(&self, filter: &SessionFilter) -> ChatServiceResult<Vec<ChatSession>> {
        let snapshot = self.inner.list_sessions(filter).await?;
        self.hold_if(Gate::Sessions).await;
        Ok(snapshot)
    }

    async fn list_messages(&self, session_id: SessionId) -> ChatServiceResult<Vec<ChatMessage>> {
        self.hold_if(Gate::Messages(session_id)).await;
        self.inner.list_messages(session_id).await
    }

    async fn list_templates(&self) -> ChatServiceResult<Vec<TemplateParams>> {
        self.inner.list_templates().await
    }

    async fn persist_status_change(
        &self,
        session_id: SessionId,
        status: ConversationStatus,
        assigned_to: Option<OperatorId>,
    ) -> ChatServiceResult<()> {
        self.inner
            .persist_status_change(session_id, status, assigned_to)
            .await
    }

    async fn persist_outbound_message(&self, message: &ChatMessage) -> ChatServiceResult<()> {
        self.inner.persist_outbound_message(message).await
    }

    async fn persist_note(&self, note: &InternalNote) -> ChatServiceResult<()> {
        self.inner.persist_note(note).await
    }
}

fn customer_line(session_id: SessionId, content: &str) -> ChatMessage {
    ChatMessage::outbound(
        session_id,
        Sender::User,
        content,
        MessageType::Text,
        DefaultClock.utc(),
    )
}

fn contents(log: &[ChatMessage]) -> Vec<&str> {
    log.iter().map(ChatMessage::content).collect()
}

fn gated_console(chat: &Arc<GatedChat>) -> eyre::Result<ConsoleService<GatedChat, DefaultClock>> {
    Ok(ConsoleService::new(
        Arc::clone(chat),
        Arc::new(DefaultClock),
        operator()?,
    ))
}

async fn open_gated(
    chat: &Arc<GatedChat>,
    session_id: SessionId,
) -> eyre::Result<ConsoleService<GatedChat, DefaultClock>> {
    let console = gated_console(chat)?;
    console.refresh_sessions(&SessionFilter::new()).await?;
    console.select_session(Some(session_id)).await?;
    Ok(console)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn late_log_for_previous_selection_stays_with_its_session() -> eyre::Result<()> {
    let backend = InMemoryChatService::new();
    let first = customer_session();
    let second = customer_session();
    let (first_id, second_id) = (first.id(), second.id());
    backend.insert_session(first)?;
    backend.insert_session(second)?;
    backend.insert_message(customer_line(first_id, "order 1 missing"))?;
    backend.insert_message(customer_line(second_id, "wrong size"))?;
    let chat = Arc::new(GatedChat::new(backend, Gate::Messages(first_id)));
    let console = gated_console(&chat)?;
    console.refresh_sessions(&SessionFilter::new()).await?;
    chat.arm();

    let (slow, fast) = tokio::join!(console.select_session(Some(first_id)), async {
        chat.entered.notified().await;
        let selected = console.select_session(Some(second_id)).await;
        let log = console.selected_messages().await;
        chat.release.notify_one();
        (selected, log)
    });
    slow?;
    let (selected, second_log_before) = fast;
    selected?;

    ensure!(console.selected_id().await == Some(second_id));
    let second_log = console.selected_messages().await;
    ensure!(second_log == second_log_before);
    ensure!(contents(&second_log) == vec!["wrong size"]);
    ensure!(contents(&console.messages(first_id).await) == vec!["order 1 missing"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_session_list_does_not_undo_take_over() -> eyre::Result<()> {
    let backend = InMemoryChatService::new();
    let session = customer_session();
    let session_id = session.id();
    backend.insert_session(session)?;
    let chat = Arc::new(GatedChat::new(backend, Gate::Sessions));
    let console = open_gated(&chat, session_id).await?;
    chat.arm();

    let filter = SessionFilter::new();
    let (refreshed, taken) = tokio::join!(console.refresh_sessions(&filter), async {
        chat.entered.notified().await;
        let taken = console.take_over().await;
        chat.release.notify_one();
        taken
    });
    taken?;
    ensure!(refreshed? == 1);

    let Some(current) = console.selected_session().await else {
        bail!("open session missing");
    };
    ensure!(current.conversation_status() == ConversationStatus::HumanActive);
    ensure!(current.assigned_to() == Some(&operator()?));
    let reply = console.send_message("Hello, I'm a human").await?;
    ensure!(reply.sender() == Sender::HumanAgent);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn later_refresh_picks_up_back_end_changes_again() -> eyre::Result<()> {
    let backend = InMemoryChatService::new();
    let session = customer_session();
    let session_id = session.id();
    backend.insert_session(session)?;
    let chat = Arc::new(GatedChat::new(backend, Gate::Sessions));
    let console = open_gated(&chat, session_id).await?;
    console.take_over().await?;

    chat.inner
        .persist_status_change(session_id, ConversationStatus::Closed, None)
        .await?;
    console.refresh_sessions(&SessionFilter::new()).await?;

    let Some(current) = console.selected_session().await else {
        bail!("open session missing");
    };
    ensure!(current.is_closed());
    Ok(())
}
