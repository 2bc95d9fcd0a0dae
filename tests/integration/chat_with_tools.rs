//! Multi-round conversations with local tool execution

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use contract_chat::client::{ChatObserver, ChatStop};
use contract_chat::tools::{tool_fn, ExecutionMode, ToolError, ToolRegistry};
use contract_chat::types::{FunctionDefinition, ToolCall, ToolResult};
use contract_chat::{ChatOptions, Message, MessageRole, ToolContext};
use mockito::Matcher;
use serde_json::json;

use crate::mock_server::*;

fn echo_registry() -> Arc<ToolRegistry> {
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(
            "echo",
            FunctionDefinition::new("echo", "Echo the arguments", json!({"type": "object"})),
            tool_fn(|args, _ctx| async move { Ok(args) }),
        )
        .unwrap();
    registry
}

/// Matches request bodies that already carry a tool result.
fn after_tool_round() -> Matcher {
    Matcher::Regex(r#""role":"tool""#.to_string())
}

#[tokio::test]
async fn plain_answer_takes_one_round() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(answer_frames(&["The ", "answer ", "is 42."]))
        .await;

    let client = fixture.client(Arc::new(ToolRegistry::new()));
    let input = vec![Message::system("Be brief."), Message::user("What is the answer?")];
    let outcome = client
        .chat_with_tools(&input, &ChatOptions::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.content, "The answer is 42.");
    assert!(outcome.tool_calls.is_empty());
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.stop, ChatStop::Completed);
    assert_eq!(outcome.messages, input);
}

#[tokio::test]
async fn echo_round_trip() {
    let fixture = MockServerFixture::new().await;
    let second = fixture
        .mock_sse_stream_matching(after_tool_round(), answer_frames(&["Echoed."]))
        .await;
    let first = fixture
        .mock_sse_stream(tool_call_frames("call_1", "echo", &["{\"x\"", ":1}"]))
        .await;

    let client = fixture.client(echo_registry());
    let input = vec![Message::user("Echo x=1")];
    let outcome = client
        .chat_with_tools(&input, &ChatOptions::new())
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;

    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.stop, ChatStop::Completed);
    assert_eq!(outcome.content, "Echoed.");
    assert_eq!(
        outcome.tool_calls,
        vec![ToolCall::new("call_1", "echo", "{\"x\":1}")]
    );

    let roles: Vec<MessageRole> = outcome.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool]
    );

    let assistant = &outcome.messages[1];
    assert_eq!(assistant.content, None);
    assert_eq!(assistant.tool_calls.as_ref().map(Vec::len), Some(1));

    let tool = &outcome.messages[2];
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool.name.as_deref(), Some("echo"));
    assert_eq!(tool.content.as_deref(), Some("{\"x\":1}"));

    // the caller's transcript is left alone
    assert_eq!(input.len(), 1);
}

#[tokio::test]
async fn round_budget_caps_requests() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream_times(
            Matcher::Any,
            tool_call_frames("call_loop", "echo", &["{}"]),
            3,
        )
        .await;

    let client = fixture.client(echo_registry());
    let outcome = client
        .chat_with_tools(
            &[Message::user("loop forever")],
            &ChatOptions::new().max_tool_rounds(3),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.stop, ChatStop::RoundLimit);
    assert_eq!(outcome.tool_calls.len(), 3);
    // user + 3 x (assistant + tool)
    assert_eq!(outcome.messages.len(), 7);
}

#[tokio::test]
async fn zero_round_budget_counts_as_one() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(tool_call_frames("call_1", "echo", &["{}"]))
        .await;

    let client = fixture.client(echo_registry());
    let outcome = client
        .chat_with_tools(&[Message::user("hi")], &ChatOptions::new().max_tool_rounds(0))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.stop, ChatStop::RoundLimit);
}

#[tokio::test]
async fn unregistered_tool_becomes_error_result() {
    let fixture = MockServerFixture::new().await;
    let _second = fixture
        .mock_sse_stream_matching(after_tool_round(), answer_frames(&["Sorry."]))
        .await;
    let _first = fixture
        .mock_sse_stream(tool_call_frames("call_1", "echo", &["{}"]))
        .await;

    let registry = echo_registry();
    assert!(registry.unregister("echo"));

    let client = fixture.client(registry);
    let outcome = client
        .chat_with_tools(&[Message::user("echo")], &ChatOptions::new())
        .await
        .unwrap();

    let tool = &outcome.messages[2];
    let content: serde_json::Value =
        serde_json::from_str(tool.content.as_deref().unwrap()).unwrap();
    assert_eq!(content, json!({"error": "Tool not found: echo"}));
    assert_eq!(outcome.content, "Sorry.");
}

#[tokio::test]
async fn unregister_between_identical_runs() {
    let fixture = MockServerFixture::new().await;
    let answer = fixture
        .mock_sse_stream_times(after_tool_round(), answer_frames(&["Done."]), 2)
        .await;
    let tool_round = fixture
        .mock_sse_stream_times(
            Matcher::Any,
            tool_call_frames("call_1", "echo", &["{\"x\"", ":1}"]),
            2,
        )
        .await;

    let registry = echo_registry();
    let client = fixture.client(registry.clone());
    let input = vec![Message::user("Echo x=1")];

    let first = client
        .chat_with_tools(&input, &ChatOptions::new())
        .await
        .unwrap();
    assert_eq!(first.messages[2].content.as_deref(), Some("{\"x\":1}"));

    assert!(registry.unregister("echo"));

    let second = client
        .chat_with_tools(&input, &ChatOptions::new())
        .await
        .unwrap();
    let content: serde_json::Value =
        serde_json::from_str(second.messages[2].content.as_deref().unwrap()).unwrap();
    assert_eq!(content, json!({"error": "Tool not found: echo"}));
    assert_eq!(second.messages[2].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(second.stop, ChatStop::Completed);

    tool_round.assert_async().await;
    answer.assert_async().await;
}

#[tokio::test]
async fn failing_tool_does_not_abort_the_loop() {
    let fixture = MockServerFixture::new().await;
    let _second = fixture
        .mock_sse_stream_matching(after_tool_round(), answer_frames(&["Validation failed."]))
        .await;
    let _first = fixture
        .mock_sse_stream(tool_call_frames("call_1", "validate", &["{\"strict\":true}"]))
        .await;

    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(
            "validate",
            FunctionDefinition::new("validate", "Validate the document", json!({"type": "object"})),
            tool_fn(|_args, _ctx| async move {
                Err::<serde_json::Value, _>(ToolError::execution("schema mismatch at models.orders"))
            }),
        )
        .unwrap();

    let client = fixture.client(registry);
    let outcome = client
        .chat_with_tools(&[Message::user("validate")], &ChatOptions::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop, ChatStop::Completed);
    assert_eq!(
        outcome.messages[2].content.as_deref(),
        Some(r#"{"error":"schema mismatch at models.orders"}"#)
    );
}

#[tokio::test]
async fn context_reaches_tool_handlers() {
    let fixture = MockServerFixture::new().await;
    let _second = fixture
        .mock_sse_stream_matching(after_tool_round(), answer_frames(&["Done."]))
        .await;
    let _first = fixture
        .mock_sse_stream(tool_call_frames("call_1", "read_document", &[""]))
        .await;

    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(
            "read_document",
            FunctionDefinition::new("read_document", "Current document", json!({"type": "object"})),
            tool_fn(|_args, ctx| async move {
                Ok(json!(ctx.str_value("document").unwrap_or_default()))
            }),
        )
        .unwrap();

    let client = fixture.client(registry);
    let options = ChatOptions::new()
        .context(ToolContext::new().with_value("document", "id: orders"))
        .execution_mode(ExecutionMode::Concurrent);
    let outcome = client
        .chat_with_tools(&[Message::user("read it")], &options)
        .await
        .unwrap();

    assert_eq!(outcome.messages[2].content.as_deref(), Some("id: orders"));
}

#[derive(Default)]
struct RoundRecorder {
    started: AtomicUsize,
    results: Mutex<Vec<ToolResult>>,
}

impl ChatObserver for RoundRecorder {
    fn on_tool_calls_start(&self, _calls: &[ToolCall]) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_tool_calls_complete(&self, calls: &[ToolCall], results: &[ToolResult]) {
        assert_eq!(calls.len(), results.len());
        self.results.lock().unwrap().extend_from_slice(results);
    }
}

#[tokio::test]
async fn observer_sees_each_tool_round() {
    let fixture = MockServerFixture::new().await;
    let _second = fixture
        .mock_sse_stream_matching(after_tool_round(), answer_frames(&["ok"]))
        .await;
    let _first = fixture
        .mock_sse_stream(tool_call_frames("call_1", "echo", &["{\"y\":2}"]))
        .await;

    let client = fixture.client(echo_registry());
    let recorder = Arc::new(RoundRecorder::default());
    let outcome = client
        .chat_with_tools(
            &[Message::user("echo")],
            &ChatOptions::new().observer(recorder.clone()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert_eq!(recorder.started.load(Ordering::SeqCst), 1);
    assert_eq!(
        *recorder.results.lock().unwrap(),
        vec![ToolResult::new("call_1", "echo", "{\"y\":2}")]
    );
}
