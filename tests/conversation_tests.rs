mod common;

use common::FakeCompletion;
use openai_api_rs::v1::chat_completion::MessageRole;
use retell::ai::services::ModelTier;
use retell::audit::AuditLogger;
use retell::conversation::{ConversationStore, Reply, SummarizationDispatcher};
use retell::core::models::{ConversationId, Modality, NormalizedInput, Role, Turn};
use retell::prompt::{APOLOGY_MESSAGE, MAX_NORMALIZED_CHARS, TRUNCATION_MARKER};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    audit: Arc<AuditLogger>,
    store: Arc<ConversationStore>,
    completion: Arc<FakeCompletion>,
    dispatcher: SummarizationDispatcher,
}

fn harness(completion: FakeCompletion) -> Harness {
    let dir = TempDir::new().unwrap();
    let audit = Arc::new(AuditLogger::new(dir.path().join("log.csv")));
    audit.initialize().unwrap();
    let store = Arc::new(ConversationStore::new());
    let completion = Arc::new(completion);
    let dispatcher = SummarizationDispatcher::new(
        store.clone(),
        completion.clone(),
        audit.clone(),
        "Demo channel",
        "English",
    );
    Harness {
        _dir: dir,
        audit,
        store,
        completion,
        dispatcher,
    }
}

fn text(body: &str) -> NormalizedInput {
    NormalizedInput::new(body, Modality::Text)
}

#[tokio::test]
async fn test_transcript_has_two_turns_per_answered_message() {
    let h = harness(FakeCompletion::replying(&["r1", "r2", "r3"]));
    let chat = ConversationId(7);

    for body in ["m1", "m2", "m3"] {
        assert!(matches!(h.dispatcher.respond(chat, &text(body)).await, Reply::Summary(_)));
    }

    let transcript = h.store.transcript(chat).await;
    assert_eq!(transcript.len(), 6);
    assert_eq!(
        transcript,
        vec![
            Turn::user("m1"),
            Turn::assistant("r1"),
            Turn::user("m2"),
            Turn::assistant("r2"),
            Turn::user("m3"),
            Turn::assistant("r3"),
        ]
    );
}

#[tokio::test]
async fn test_request_is_transcript_then_instruction_then_input() {
    let h = harness(FakeCompletion::replying(&["first", "second"]));
    let chat = ConversationId(1);

    h.dispatcher.respond(chat, &text("hello")).await;
    h.dispatcher.respond(chat, &text("again")).await;

    let requests = h.completion.requests.lock().unwrap();
    let second = &requests[1];
    assert_eq!(second.tier, ModelTier::Summary);
    assert_eq!(second.max_tokens, None);

    let roles: Vec<&str> = second
        .messages
        .iter()
        .map(|m| match m.role {
            MessageRole::system => "system",
            MessageRole::assistant => "assistant",
            _ => "user",
        })
        .collect();
    assert_eq!(roles, vec!["user", "assistant", "user", "system", "user"]);
    drop(requests);

    let texts = h.completion.request_texts(1);
    assert_eq!(texts[0], "hello");
    assert_eq!(texts[1], "first");
    assert_eq!(texts[2], "again");
    assert!(texts[3].contains("'Demo channel'"));
    assert_eq!(texts[4], "again");
}

#[tokio::test]
async fn test_failed_completion_keeps_unanswered_user_turn() {
    let h = harness(FakeCompletion::failing());
    let chat = ConversationId(2);

    let reply = h.dispatcher.respond(chat, &text("lost?")).await;
    assert_eq!(reply, Reply::Apology);
    assert_eq!(reply.text(), APOLOGY_MESSAGE);
    assert_eq!(h.store.transcript(chat).await, vec![Turn::user("lost?")]);

    // The unanswered turn is still context for the next request.
    h.completion.push(Ok("answer".to_string()));
    h.dispatcher.respond(chat, &text("retry")).await;
    let texts = h.completion.request_texts(1);
    assert_eq!(texts[0], "lost?");
    assert_eq!(texts[1], "retry");

    let roles: Vec<Role> = h.store.transcript(chat).await.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_conversations_do_not_share_context() {
    let h = harness(FakeCompletion::replying(&["a", "b"]));

    h.dispatcher.respond(ConversationId(10), &text("first chat")).await;
    h.dispatcher.respond(ConversationId(20), &text("second chat")).await;

    let texts = h.completion.request_texts(1);
    assert!(!texts.iter().any(|t| t == "first chat"));
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn test_oversized_input_is_truncated_before_dispatch() {
    let h = harness(FakeCompletion::replying(&["ok"]));
    let chat = ConversationId(3);

    h.dispatcher
        .respond(chat, &text(&"z".repeat(MAX_NORMALIZED_CHARS + 500)))
        .await;

    let stored = &h.store.transcript(chat).await[0].content;
    assert!(stored.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        stored.chars().count(),
        MAX_NORMALIZED_CHARS + TRUNCATION_MARKER.chars().count()
    );
}

#[tokio::test]
async fn test_answered_messages_are_audited() {
    let h = harness(FakeCompletion::replying(&["summary"]));
    h.completion.push(Err(retell::PipelineError::Service("down".to_string())));

    h.dispatcher
        .respond(ConversationId(5), &NormalizedInput::new("a poll", Modality::Poll))
        .await;
    h.dispatcher.respond(ConversationId(5), &text("unanswered")).await;

    let mut reader = csv::Reader::from_path(h.audit.path()).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "5");
    assert_eq!(&rows[0][2], "a poll");
    assert_eq!(&rows[0][3], "poll");
    assert_eq!(&rows[0][4], "summary");
}
