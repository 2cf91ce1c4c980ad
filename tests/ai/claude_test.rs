//! Claude provider tests against stub agents.
#![cfg(unix)]

use resume_tailor::ai::{AiError, AiProvider, ClaudeCli};
use serde_json::json;

use crate::support::StubBackend;

fn delta(text: &str) -> serde_json::Value {
    json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": text}})
}

fn wrapped_delta(text: &str) -> serde_json::Value {
    json!({"type": "stream_event", "session_id": "s-1", "event": delta(text)})
}

fn result(text: &str) -> serde_json::Value {
    json!({"type": "result", "subtype": "success", "is_error": false, "result": text, "total_cost_usd": 0.01})
}

#[tokio::test]
async fn chat_returns_result_envelope() {
    let stub = StubBackend::events(&[result("hello")], 0);

    let response = ClaudeCli::with_command(stub.command())
        .chat("SYS", "hi")
        .await
        .unwrap();

    assert_eq!(response, "hello");
    assert_eq!(
        stub.recorded_args(),
        vec!["-p", "SYS\n\nhi", "--output-format", "json"]
    );
}

#[tokio::test]
async fn chat_failure_names_claude() {
    let stub = StubBackend::new("", "boom", 2);

    let err = ClaudeCli::with_command(stub.command())
        .chat("s", "u")
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Invocation { backend: "Claude", exit_code: 2, .. }));
    assert_eq!(err.to_string(), "Claude CLI failed (exit 2): boom");
}

#[tokio::test]
async fn stream_emits_deltas_and_ignores_final_result() {
    let stub = StubBackend::events(
        &[
            json!({"type": "system", "subtype": "init", "session_id": "s-1"}),
            delta("Hel"),
            wrapped_delta("lo"),
            json!({"type": "content_block_stop", "index": 0}),
            result("Hello"),
        ],
        0,
    );
    let mut chunks = Vec::new();
    let mut on_chunk = |chunk: &str| chunks.push(chunk.to_string());

    let response = ClaudeCli::with_command(stub.command())
        .model("sonnet")
        .chat_stream("s", "u", &mut on_chunk)
        .await
        .unwrap();

    assert_eq!(response, "Hello");
    assert_eq!(chunks, vec!["Hel", "lo"]);
    assert_eq!(
        stub.recorded_args(),
        vec!["-p", "s\n\nu", "--output-format", "stream-json", "--verbose", "--model", "sonnet"]
    );
}

#[tokio::test]
async fn stream_uses_result_when_no_deltas_arrive() {
    let stub = StubBackend::events(
        &[
            json!({"type": "system", "subtype": "init"}),
            json!({"type": "assistant", "message": {"content": [{"type": "text", "text": "Whole answer"}]}}),
            result("Whole answer"),
        ],
        0,
    );
    let mut chunks = Vec::new();
    let mut on_chunk = |chunk: &str| chunks.push(chunk.to_string());

    let response = ClaudeCli::with_command(stub.command())
        .chat_stream("s", "u", &mut on_chunk)
        .await
        .unwrap();

    assert_eq!(response, "Whole answer");
    assert_eq!(chunks, vec!["Whole answer"]);
}

#[tokio::test]
async fn test_connection_uses_probe_prompt() {
    let stub = StubBackend::events(&[result("ok")], 0);

    assert!(ClaudeCli::with_command(stub.command()).test_connection().await);
    assert_eq!(
        stub.recorded_args(),
        vec!["-p", "respond ok", "--output-format", "json"]
    );
}
