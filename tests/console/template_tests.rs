//! Template catalogue, preview and send flows through the console.

use super::helpers::{ConsoleHarness, bind, open_session, order_update, template};
use eyre::ensure;
use rstest::rstest;
use switchboard::config::ConsoleConfig;
use switchboard::conversation::{
    adapters::memory::PersistedChange,
    domain::{ConversationDomainError, MessageType, Sender, TemplateStatus},
    services::ConsoleError,
};

async fn with_catalogue() -> eyre::Result<ConsoleHarness> {
    let harness = open_session().await?;
    harness.chat.insert_template(order_update())?;
    harness.chat.insert_template(template(
        "spring_sale",
        "Hi {{1}}, {{2}} off this week!",
        &["customer_name", "discount"],
        TemplateStatus::Pending,
    ))?;
    harness.chat.insert_template(template(
        "broken",
        "Hi {{1}} and {{2}}",
        &["customer_name"],
        TemplateStatus::Approved,
    ))?;
    harness.console.load_templates().await?;
    Ok(harness)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_templates_are_reported_and_skipped() -> eyre::Result<()> {
    let harness = open_session().await?;
    harness.chat.insert_template(order_update())?;
    harness.chat.insert_template(template(
        "broken",
        "Hi {{1}} and {{2}}",
        &["customer_name"],
        TemplateStatus::Approved,
    ))?;

    let report = harness.console.load_templates().await?;

    ensure!(report.loaded == vec!["order_update".to_owned()]);
    ensure!(report.rejected.len() == 1);
    ensure!(matches!(
        report.rejected.first(),
        Some(ConversationDomainError::MalformedTemplate { name, .. }) if name == "broken"
    ));
    let broken = harness.console.preview_template("broken").await;
    ensure!(broken == Err(ConsoleError::UnknownTemplate("broken".to_owned())));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_approved_templates_are_offered() -> eyre::Result<()> {
    let harness = with_catalogue().await?;

    let offered: Vec<String> = harness
        .console
        .approved_templates()
        .await
        .iter()
        .map(|definition| definition.name().to_owned())
        .collect();

    ensure!(offered == vec!["order_update".to_owned()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn preview_shows_unbound_variables_by_name() -> eyre::Result<()> {
    let harness = with_catalogue().await?;

    harness
        .console
        .toggle_preview_variable("customer_name", "Amit")
        .await;
    let preview = harness.console.preview_template("order_update").await?;

    ensure!(preview == "Hi Amit! Order {{order_number}} is {{status}}.");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_preview_bindings_restores_markers() -> eyre::Result<()> {
    let harness = with_catalogue().await?;
    harness
        .console
        .toggle_preview_variable("customer_name", "Amit")
        .await;
    harness.console.toggle_preview_variable("status", "late").await;

    harness.console.toggle_preview_variable("customer_name", "").await;
    ensure!(harness.console.preview_variables().await == bind(&[("status", "late")]));

    harness.console.clear_preview().await;
    let preview = harness.console.preview_template("order_update").await?;
    ensure!(preview == "Hi {{customer_name}}! Order {{order_number}} is {{status}}.");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_template_is_sent_with_label() -> eyre::Result<()> {
    let harness = with_catalogue().await?;
    harness.console.take_over().await?;
    let bound = bind(&[("customer_name", "Amit"), ("order_number", "A-1009")]);

    let message = harness.console.send_template("order_update", &bound).await?;

    ensure!(message.message_type() == MessageType::Template);
    ensure!(message.sender() == Sender::HumanAgent);
    ensure!(message.content() == "[Template: order_update] Amit, A-1009");
    let persisted = harness.chat.changes()?.into_iter().any(|change| {
        change
            == PersistedChange::OutboundMessage {
                session_id: harness.session_id,
                content: "[Template: order_update] Amit, A-1009".to_owned(),
            }
    });
    ensure!(persisted);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unapproved_template_is_refused() -> eyre::Result<()> {
    let harness = with_catalogue().await?;

    let result = harness
        .console
        .send_template("spring_sale", &bind(&[("discount", "20%")]))
        .await;

    let Err(error) = result else {
        eyre::bail!("pending template was sent");
    };
    ensure!(error == ConsoleError::Domain(ConversationDomainError::TemplateNotApproved(
        "spring_sale".to_owned()
    )));
    ensure!(error.is_blocking());
    ensure!(harness.console.selected_messages().await.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_template_is_refused() -> eyre::Result<()> {
    let harness = with_catalogue().await?;

    let result = harness.console.send_template("welcome", &bind(&[])).await;

    ensure!(result == Err(ConsoleError::UnknownTemplate("welcome".to_owned())));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_label_shapes_template_content() -> eyre::Result<()> {
    let config = ConsoleConfig::from_toml_str(
        r#"
        [console]
        operator_id = "agent-42"
        template_label = "{{ name }}: {{ values | join(' / ') }}"
        "#,
    )?;
    let harness = with_catalogue().await?;
    let ConsoleHarness {
        chat,
        console,
        session_id,
    } = harness;
    let labelled = console.with_template_label(config.template_label()?);
    labelled.refresh_sessions(&config.first_page()).await?;
    labelled.select_session(Some(session_id)).await?;
    labelled.load_templates().await?;

    let message = labelled
        .send_template("order_update", &bind(&[("customer_name", "Amit"), ("status", "packed")]))
        .await?;

    ensure!(message.content() == "order_update: Amit / packed");
    ensure!(labelled.operator() == &config.operator_id()?);
    ensure!(chat.changes()?.is_empty());
    Ok(())
}
