//! Aborting requests and streams

use std::sync::Arc;

use contract_chat::client::ChatObserver;
use contract_chat::tools::ToolRegistry;
use contract_chat::{CancelHandle, ChatClient, ChatOptions, Error, Message, StreamOptions};

use crate::mock_server::*;

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream_times(mockito::Matcher::Any, answer_frames(&["never"]), 0)
        .await;

    let client = fixture.client(Arc::new(ToolRegistry::new()));
    let cancel = CancelHandle::new();
    cancel.cancel();

    let err = client
        .chat_with_tools(&[Message::user("hi")], &ChatOptions::new().cancel(cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Aborted));
    mock.assert_async().await;
}

/// Cancels the handle as soon as the first content chunk arrives.
struct CancelOnFirstChunk(CancelHandle);

impl ChatObserver for CancelOnFirstChunk {
    fn on_content(&self, _chunk: &str, _accumulated: &str) {
        self.0.cancel();
    }
}

#[tokio::test]
async fn cancel_mid_stream_aborts() {
    let endpoint = spawn_stalling_sse_server(content_frame("Partial")).await;
    let client = ChatClient::builder()
        .endpoint(endpoint)
        .api_key("sk-test")
        .registry(Arc::new(ToolRegistry::new()))
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let options = ChatOptions::new()
        .cancel(cancel.clone())
        .observer(Arc::new(CancelOnFirstChunk(cancel.clone())));
    let input = vec![Message::user("write a long essay")];

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        client.chat_with_tools(&input, &options),
    )
    .await
    .expect("abort must not wait for the stalled stream");

    assert!(result.unwrap_err().is_abort());
    assert!(cancel.is_cancelled());
    assert_eq!(input, vec![Message::user("write a long essay")]);
}

#[tokio::test]
async fn cancel_from_another_task() {
    let endpoint = spawn_stalling_sse_server(content_frame("Partial")).await;
    let client = ChatClient::builder()
        .endpoint(endpoint)
        .registry(Arc::new(ToolRegistry::new()))
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let options = StreamOptions::new().cancel(cancel);
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        client.stream_chat_completion(&[Message::user("hi")], &options),
    )
    .await
    .expect("abort must not wait for the stalled stream");

    assert!(matches!(result, Err(Error::Aborted)));
}
