//! End-to-end runs of the agent over fake source, chat and mailer.

use crate::helpers::{
    FixedSource, RecordingChat, ScriptedMailer, agent, quote, store_path, write_recipients,
};
use bcv_agent::store::ReadingStore;
use bcv_agent::store::lock::StoreLock;
use bcv_agent::{AgentError, RunOutcome};

#[tokio::test]
async fn new_rate_is_recorded_and_everyone_is_notified() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(
        tmp.path(),
        &[
            ("ana@example.com", "Ana", "el 0414-1234567"),
            ("luis@example.com", "Luis", "el 0412-7654321"),
        ],
    );
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();
    let agent = agent(
        tmp.path(),
        FixedSource::Quote(quote(2024, 5, 1, 36.45)),
        &chat,
        &mailer,
    );

    let outcome = agent.run().await.unwrap();

    let (reading, delivery) = match outcome {
        RunOutcome::Recorded { reading, delivery } => (reading, delivery),
        other => panic!("expected a recorded reading, got {other:?}"),
    };
    assert_eq!(reading.date_key(), "2024-05-01");
    let report = delivery.expect("recipients were available");
    assert_eq!(report.attempted, 2);
    assert_eq!(report.sent, 2);
    assert!(report.failures.is_empty());

    assert_eq!(chat.messages(), vec!["Tasa BCV del 2024-05-01: Bs 36.45"]);
    assert_eq!(
        mailer.attempted_addresses(),
        vec!["ana@example.com", "luis@example.com"]
    );
    let first = mailer.attempts.lock().unwrap()[0].clone();
    assert_eq!(first.subject, "Tasa BCV del 2024-05-01");
    assert!(first.body.contains("Apreciad@ Ana"));
    assert!(first.body.contains("Bs 36.4500"));

    let stored = ReadingStore::new(store_path(tmp.path())).readings().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].rate, 36.45);
    assert_eq!(stored[0].observation_date, reading.observation_date);
}

#[tokio::test]
async fn second_run_for_same_date_sends_no_email() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(tmp.path(), &[("ana@example.com", "Ana", "el 0414-1234567")]);
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();
    let q = quote(2024, 5, 1, 36.45);

    agent(tmp.path(), FixedSource::Quote(q), &chat, &mailer)
        .run()
        .await
        .unwrap();
    let second = agent(tmp.path(), FixedSource::Quote(q), &chat, &mailer)
        .run()
        .await
        .unwrap();

    assert_eq!(second, RunOutcome::AlreadyRecorded { quote: q });
    assert_eq!(mailer.attempted_addresses().len(), 1);
    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("ya estaba registrada"));

    let stored = ReadingStore::new(store_path(tmp.path())).readings().unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn later_date_appends_a_second_row() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(tmp.path(), &[]);
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();

    for q in [quote(2024, 5, 1, 36.45), quote(2024, 5, 2, 36.52)] {
        let outcome = agent(tmp.path(), FixedSource::Quote(q), &chat, &mailer)
            .run()
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Recorded { .. }));
    }

    let stored = ReadingStore::new(store_path(tmp.path())).readings().unwrap();
    let rates: Vec<f64> = stored.iter().map(|r| r.rate).collect();
    assert_eq!(rates, vec![36.45, 36.52]);
}

#[tokio::test]
async fn one_failed_email_does_not_stop_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(
        tmp.path(),
        &[
            ("a@example.com", "A", "el 0414-0000001"),
            ("b@example.com", "B", "el 0414-0000002"),
            ("c@example.com", "C", "el 0414-0000003"),
        ],
    );
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer {
        fail_for: vec!["b@example.com".into()],
        ..Default::default()
    };

    let outcome = agent(
        tmp.path(),
        FixedSource::Quote(quote(2024, 5, 1, 36.45)),
        &chat,
        &mailer,
    )
    .run()
    .await
    .unwrap();

    let report = match outcome {
        RunOutcome::Recorded {
            delivery: Some(report),
            ..
        } => report,
        other => panic!("expected a delivery report, got {other:?}"),
    };
    assert_eq!(report.attempted, 3);
    assert_eq!(report.sent, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].to, "b@example.com");
    assert_eq!(
        mailer.attempted_addresses(),
        vec!["a@example.com", "b@example.com", "c@example.com"]
    );
}

#[tokio::test]
async fn fetch_failure_alerts_chat_and_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(tmp.path(), &[("ana@example.com", "Ana", "el 0414-1234567")]);
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();

    let err = agent(tmp.path(), FixedSource::Unreachable, &chat, &mailer)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Transport(_)));
    let messages = chat.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Error en agente BCV: transport error"));
    assert!(mailer.attempted_addresses().is_empty());
    assert!(!store_path(tmp.path()).exists());
}

#[tokio::test]
async fn failure_alert_can_be_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();

    let result = agent(tmp.path(), FixedSource::Unreachable, &chat, &mailer)
        .with_failure_notification(false)
        .run()
        .await;

    assert!(result.is_err());
    assert!(chat.messages().is_empty());
}

#[tokio::test]
async fn locked_store_fails_the_run_without_emails() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(tmp.path(), &[("ana@example.com", "Ana", "el 0414-1234567")]);
    std::fs::create_dir_all(store_path(tmp.path()).parent().unwrap()).unwrap();
    let _held = StoreLock::acquire(&store_path(tmp.path())).unwrap();
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();

    let err = agent(
        tmp.path(),
        FixedSource::Quote(quote(2024, 5, 1, 36.45)),
        &chat,
        &mailer,
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, AgentError::Storage(_)));
    assert!(err.to_string().contains("locked"));
    assert!(mailer.attempted_addresses().is_empty());
    assert_eq!(chat.messages().len(), 1);
}

#[tokio::test]
async fn missing_recipient_list_still_records_the_rate() {
    let tmp = tempfile::tempdir().unwrap();
    let chat = RecordingChat::default();
    let mailer = ScriptedMailer::default();

    let outcome = agent(
        tmp.path(),
        FixedSource::Quote(quote(2024, 5, 1, 36.45)),
        &chat,
        &mailer,
    )
    .run()
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Recorded { delivery: None, .. }
    ));
    assert_eq!(chat.messages().len(), 1);
    let stored = ReadingStore::new(store_path(tmp.path())).readings().unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn chat_outage_does_not_fail_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    write_recipients(tmp.path(), &[("ana@example.com", "Ana", "el 0414-1234567")]);
    let chat = RecordingChat {
        down: true,
        ..Default::default()
    };
    let mailer = ScriptedMailer::default();

    let outcome = agent(
        tmp.path(),
        FixedSource::Quote(quote(2024, 5, 1, 36.45)),
        &chat,
        &mailer,
    )
    .run()
    .await
    .unwrap();

    assert!(matches!(outcome, RunOutcome::Recorded { .. }));
    assert_eq!(mailer.attempted_addresses(), vec!["ana@example.com"]);
}
