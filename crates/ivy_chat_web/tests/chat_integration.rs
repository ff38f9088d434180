//! Orchestrator tests against a real in-process QA stand-in and the
//! in-memory store, with a manual clock so minute boundaries can be crossed.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Local, TimeDelta, TimeZone};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use ivy_chat_client::{QaClient, QaSettings};
use ivy_chat_store::{MemoryStore, Reaction, TurnId};
use ivy_chat_web::clock::ManualClock;
use ivy_chat_web::typing::Typewriter;
use ivy_chat_web::{ChatError, ChatOrchestrator, ReactionOutcome, SessionContext, TurnRef};

async fn spawn_qa_server() -> String {
    let app = Router::new()
        .route(
            "/ask",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "response": format!("answer to {}", body["question"].as_str().unwrap_or("")),
                }))
            }),
        )
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"response": "too late"}))
            }),
        )
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "engine exploded") }),
        )
        .route("/wrong-shape", post(|| async { Json(json!({"answer": "x"})) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    orch: ChatOrchestrator,
    base: String,
    _export_dir: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        let base = spawn_qa_server().await;
        let store = Arc::new(MemoryStore::new());
        let start = Local.with_ymd_and_hms(2025, 3, 4, 14, 7, 30).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let export_dir = tempfile::tempdir().unwrap();

        let orch = ChatOrchestrator::new(
            QaClient::new(),
            store.clone(),
            store.clone(),
            export_dir.path().to_path_buf(),
        )
        .with_clock(clock.clone())
        .with_typewriter(Typewriter::instant());

        Self {
            store,
            clock,
            orch,
            base,
            _export_dir: export_dir,
        }
    }

    fn settings(&self, path: &str) -> QaSettings {
        QaSettings {
            url: format!("{}{}", self.base, path),
            api_key: "k".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

fn alice() -> SessionContext {
    SessionContext::new("alice", "s1")
}

#[tokio::test]
async fn successful_turn_logs_one_record_without_reaction() {
    let h = Harness::new().await;

    let turn = h
        .orch
        .submit(&alice(), "What is Ivy?", &h.settings("/ask"), None)
        .await
        .unwrap();

    assert_eq!(turn.response, "answer to What is Ivy?");
    assert_eq!(turn.reaction, Reaction::NoReaction);
    assert_eq!(turn.timestamp, "Mar-04-2025_14:07");

    let stored = h.store.turns().unwrap();
    assert_eq!(stored, vec![turn]);
}

#[tokio::test]
async fn failed_remote_call_writes_nothing() {
    let h = Harness::new().await;

    let err = h
        .orch
        .submit(&alice(), "q", &h.settings("/broken"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Remote(_)), "got {:?}", err);

    let err = h
        .orch
        .submit(&alice(), "q", &h.settings("/wrong-shape"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Remote(_)), "got {:?}", err);

    assert!(h.store.turns().unwrap().is_empty());
}

#[tokio::test]
async fn timed_out_remote_call_writes_nothing() {
    let h = Harness::new().await;
    let mut settings = h.settings("/slow");
    settings.timeout = Duration::from_millis(300);

    let err = h.orch.submit(&alice(), "q", &settings, None).await.unwrap_err();
    match err {
        ChatError::Remote(e) => assert!(e.is_timeout(), "got {:?}", e),
        other => panic!("expected remote timeout, got {:?}", other),
    }
    assert!(h.store.turns().unwrap().is_empty());
}

#[tokio::test]
async fn reaction_after_minute_rollover_updates_same_turn() {
    let h = Harness::new().await;
    let turn = h
        .orch
        .submit(&alice(), "q", &h.settings("/ask"), None)
        .await
        .unwrap();

    h.clock.advance(TimeDelta::minutes(2));

    let outcome = h
        .orch
        .react(
            &alice(),
            TurnRef {
                turn_id: Some(turn.turn_id),
                question: turn.question.clone(),
                response: turn.response.clone(),
            },
            Reaction::Liked,
        )
        .unwrap();

    match outcome {
        ReactionOutcome::Updated(updated) => {
            assert_eq!(updated.turn_id, turn.turn_id);
            assert_eq!(updated.reaction, Reaction::Liked);
            assert_eq!(updated.timestamp, turn.timestamp);
        }
        other => panic!("expected update, got {:?}", other),
    }

    let stored = h.store.turns().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reaction, Reaction::Liked);
}

#[tokio::test]
async fn reaction_for_unknown_turn_inserts_new_record() {
    let h = Harness::new().await;
    h.orch
        .submit(&alice(), "q", &h.settings("/ask"), None)
        .await
        .unwrap();

    let outcome = h
        .orch
        .react(
            &alice(),
            TurnRef {
                turn_id: Some(TurnId::new()),
                question: "old question".into(),
                response: "old answer".into(),
            },
            Reaction::Disliked,
        )
        .unwrap();

    let inserted = match outcome {
        ReactionOutcome::Inserted(t) => t,
        other => panic!("expected insert, got {:?}", other),
    };
    assert_eq!(inserted.question, "old question");
    assert_eq!(inserted.reaction, Reaction::Disliked);
    assert_eq!(h.store.turns().unwrap().len(), 2);
}

#[tokio::test]
async fn same_minute_turns_stay_distinct() {
    let h = Harness::new().await;
    let settings = h.settings("/ask");

    let first = h.orch.submit(&alice(), "one", &settings, None).await.unwrap();
    let second = h.orch.submit(&alice(), "two", &settings, None).await.unwrap();
    assert_eq!(first.timestamp, second.timestamp);
    assert_ne!(first.turn_id, second.turn_id);

    h.orch
        .react(
            &alice(),
            TurnRef {
                turn_id: Some(first.turn_id),
                question: first.question.clone(),
                response: first.response.clone(),
            },
            Reaction::Flagged,
        )
        .unwrap();

    let history = h.orch.history(&alice()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reaction, Reaction::Flagged);
    assert_eq!(history[1].reaction, Reaction::NoReaction);
}

#[tokio::test]
async fn export_without_flags_creates_nothing() {
    let h = Harness::new().await;
    h.orch
        .submit(&alice(), "q", &h.settings("/ask"), None)
        .await
        .unwrap();

    assert_eq!(h.orch.export_flagged(&alice()).unwrap(), None);
    assert_eq!(std::fs::read_dir(h.orch.export_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn export_contains_only_this_sessions_flagged_turns() {
    let h = Harness::new().await;
    let settings = h.settings("/ask");
    let other = SessionContext::new("alice", "s2");

    for q in ["first, with comma", "second \"quoted\""] {
        let turn = h.orch.submit(&alice(), q, &settings, None).await.unwrap();
        h.orch
            .react(
                &alice(),
                TurnRef {
                    turn_id: Some(turn.turn_id),
                    question: turn.question,
                    response: turn.response,
                },
                Reaction::Flagged,
            )
            .unwrap();
    }
    h.orch
        .react(
            &other,
            TurnRef {
                turn_id: None,
                question: "elsewhere".into(),
                response: "x".into(),
            },
            Reaction::Flagged,
        )
        .unwrap();

    let path = h.orch.export_flagged(&alice()).unwrap().expect("file written");
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("alice_2025-03-0"), "{}", name);
    assert!(name.ends_with("_flagged.csv"), "{}", name);

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Username,SessionId,Timestamp,Question,Response,Reaction");
    assert!(lines[1].contains("\"first, with comma\""));
    assert!(lines[2].contains("\"second \"\"quoted\"\"\""));
    assert!(!csv.contains("elsewhere"));
}

#[tokio::test]
async fn typing_frames_precede_the_logged_turn() {
    let h = Harness::new().await;
    let (tx, mut rx) = mpsc::channel(64);

    let turn = h
        .orch
        .submit(&alice(), "hi", &h.settings("/ask"), Some(tx))
        .await
        .unwrap();

    let mut frames = Vec::new();
    while let Some(f) = rx.recv().await {
        frames.push(f);
    }
    assert_eq!(frames.len(), turn.response.chars().count());
    assert_eq!(frames.first().map(String::as_str), Some("a"));
    assert_eq!(frames.last(), Some(&turn.response));
    assert_eq!(h.store.turns().unwrap().len(), 1);
}

#[tokio::test]
async fn dropped_typing_receiver_still_logs_turn() {
    let h = Harness::new().await;
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let turn = h
        .orch
        .submit(&alice(), "hi", &h.settings("/ask"), Some(tx))
        .await
        .unwrap();
    assert_eq!(h.store.turns().unwrap(), vec![turn]);
}

#[tokio::test]
async fn start_session_logs_login_event() {
    let h = Harness::new().await;
    let session = h.orch.start_session("bob").unwrap();

    let logins = h.store.logins().unwrap();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].username, "bob");
    assert_eq!(logins[0].session_id, session.session_id);
    assert_eq!(logins[0].timestamp, "Mar-04-2025_14:07");
}

#[tokio::test]
async fn reaction_cannot_touch_another_sessions_turn() {
    let h = Harness::new().await;
    let bob = SessionContext::new("bob", "sb");
    let bobs_turn = h
        .orch
        .submit(&bob, "bob asks", &h.settings("/ask"), None)
        .await
        .unwrap();

    let outcome = h
        .orch
        .react(
            &alice(),
            TurnRef {
                turn_id: Some(bobs_turn.turn_id),
                question: bobs_turn.question.clone(),
                response: bobs_turn.response.clone(),
            },
            Reaction::Flagged,
        )
        .unwrap();

    let inserted = match outcome {
        ReactionOutcome::Inserted(t) => t,
        other => panic!("expected insert, got {:?}", other),
    };
    assert_ne!(inserted.turn_id, bobs_turn.turn_id);
    assert_eq!(inserted.username, "alice");
    assert_eq!(inserted.session_id, "s1");

    let bobs = h.orch.history(&bob).unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].reaction, Reaction::NoReaction);
    assert_eq!(h.orch.export_flagged(&bob).unwrap(), None);

    let path = h.orch.export_flagged(&alice()).unwrap().expect("alice's flag exported");
    let csv = std::fs::read_to_string(path).unwrap();
    assert!(csv.contains("alice,s1,"));
    assert!(!csv.contains("bob,sb,"));
}
