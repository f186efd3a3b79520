//! Back-end failures leave the console state untouched.

use super::helpers::{customer_session, operator};
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockable::{Clock, DefaultClock};
use mockall::mock;
use rstest::rstest;
use std::sync::Arc;
use switchboard::conversation::{
    domain::{
        ChatMessage, ChatSession, ConversationStatus, InternalNote, MessageType, OperatorId,
        Sender, SessionId, TemplateParams,
    },
    ports::{ChatService, ChatServiceError, ChatServiceResult, SessionFilter},
    services::{ConsoleError, ConsoleService},
};

mock! {
    pub Chat {}

    #[async_trait]
    impl ChatService for Chat {
        async fn list_sessions(&self, filter: &SessionFilter) -> ChatServiceResult<Vec<ChatSession>>;
        async fn list_messages(&self, session_id: SessionId) -> ChatServiceResult<Vec<ChatMessage>>;
        async fn list_templates(&self) -> ChatServiceResult<Vec<TemplateParams>>;
        async fn persist_status_change(
            &self,
            session_id: SessionId,
            status: ConversationStatus,
            assigned_to: Option<OperatorId>,
        ) -> ChatServiceResult<()>;
        async fn persist_outbound_message(&self, message: &ChatMessage) -> ChatServiceResult<()>;
        async fn persist_note(&self, note: &InternalNote) -> ChatServiceResult<()>;
    }
}

/// Mock that serves one session with an empty log.
fn serving(session: &ChatSession) -> MockChat {
    let listed = session.clone();
    let mut chat = MockChat::new();
    chat.expect_list_sessions()
        .returning(move |_| Ok(vec![listed.clone()]));
    chat.expect_list_messages().returning(|_| Ok(Vec::new()));
    chat
}

async fn console_over(
    chat: MockChat,
    session_id: SessionId,
) -> eyre::Result<ConsoleService<MockChat, DefaultClock>> {
    let console = ConsoleService::new(Arc::new(chat), Arc::new(DefaultClock), operator()?);
    console.refresh_sessions(&SessionFilter::new()).await?;
    console.select_session(Some(session_id)).await?;
    Ok(console)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_take_over_keeps_ai_in_control() -> eyre::Result<()> {
    let session = customer_session();
    let mut chat = serving(&session);
    chat.expect_persist_status_change()
        .times(1)
        .returning(|_, _, _| Err(ChatServiceError::Timeout));
    chat.expect_persist_outbound_message().never();
    let console = console_over(chat, session.id()).await?;

    let result = console.take_over().await;
    let reply = console.send_message("Still the assistant").await?;

    ensure!(result == Err(ConsoleError::Service(ChatServiceError::Timeout)));
    ensure!(reply.sender() == Sender::Ai);
    let Some(current) = console.selected_session().await else {
        bail!("open session missing");
    };
    ensure!(current.conversation_status() == ConversationStatus::ActiveAi);
    ensure!(current.assigned_to().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_reply_is_not_appended() -> eyre::Result<()> {
    let session = customer_session();
    let mut chat = serving(&session);
    chat.expect_persist_status_change()
        .returning(|_, _, _| Ok(()));
    chat.expect_persist_outbound_message()
        .withf(|message| message.content().contains("refund"))
        .times(1)
        .returning(|_| Err(ChatServiceError::Rejected("window expired".to_owned())));
    let console = console_over(chat, session.id()).await?;
    console.take_over().await?;

    let result = console.send_message("Your refund is on its way").await;

    ensure!(
        result
            == Err(ConsoleError::Service(ChatServiceError::Rejected(
                "window expired".to_owned()
            )))
    );
    ensure!(console.selected_messages().await.is_empty());
    let Some(current) = console.selected_session().await else {
        bail!("open session missing");
    };
    ensure!(current.message_count() == 0);
    ensure!(current.last_message_at().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_note_is_not_stored() -> eyre::Result<()> {
    let session = customer_session();
    let mut chat = serving(&session);
    chat.expect_persist_note()
        .times(1)
        .returning(|_| Err(ChatServiceError::Unavailable("connection reset".to_owned())));
    let console = console_over(chat, session.id()).await?;

    let result = console.add_note("call back at 5pm").await;

    ensure!(matches!(result, Err(ConsoleError::Service(ChatServiceError::Unavailable(_)))));
    ensure!(console.notes(session.id()).await.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_keeps_loaded_sessions() -> eyre::Result<()> {
    let session = customer_session();
    let listed = session.clone();
    let mut chat = MockChat::new();
    let mut calls = 0_u32;
    chat.expect_list_sessions().returning(move |_| {
        calls = calls.saturating_add(1);
        if calls == 1 {
            Ok(vec![listed.clone()])
        } else {
            Err(ChatServiceError::Timeout)
        }
    });
    chat.expect_list_messages().returning(|_| Ok(Vec::new()));
    let console = console_over(chat, session.id()).await?;

    let result = console.refresh_sessions(&SessionFilter::new()).await;

    ensure!(result == Err(ConsoleError::Service(ChatServiceError::Timeout)));
    ensure!(console.sessions().await == vec![session]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fetched_log_is_filtered_to_the_requested_session() -> eyre::Result<()> {
    let session = customer_session();
    let session_id = session.id();
    let listed = session.clone();
    let mut chat = MockChat::new();
    chat.expect_list_sessions()
        .returning(move |_| Ok(vec![listed.clone()]));
    chat.expect_list_messages().returning(move |requested| {
        let now = DefaultClock.utc();
        Ok(vec![
            ChatMessage::outbound(requested, Sender::User, "mine", MessageType::Text, now),
            ChatMessage::outbound(SessionId::new(), Sender::User, "stale", MessageType::Text, now),
        ])
    });
    let console = console_over(chat, session_id).await?;

    let log = console.selected_messages().await;

    ensure!(log.len() == 1);
    ensure!(log.first().map(ChatMessage::content) == Some("mine"));
    ensure!(console.messages(session_id).await == log);
    Ok(())
}
