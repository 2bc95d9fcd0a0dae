//! Mock completion endpoints for integration tests

use std::sync::Arc;

use contract_chat::tools::ToolRegistry;
use contract_chat::ChatClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, COMPLETIONS_PATH)
    }

    /// Client pointed at the mock server with its own empty registry.
    pub fn client(&self, registry: Arc<ToolRegistry>) -> ChatClient {
        ChatClient::builder()
            .endpoint(self.endpoint())
            .api_key("sk-test")
            .registry(registry)
            .build()
            .expect("client builds")
    }

    /// Mock a streamed completion. Each frame is sent as its own `data:` event.
    pub async fn mock_sse_stream(&self, frames: Vec<String>) -> Mock {
        self.mock_sse_stream_matching(Matcher::Any, frames).await
    }

    /// Like [`mock_sse_stream`](Self::mock_sse_stream) but only for request
    /// bodies matching `body`.
    pub async fn mock_sse_stream_matching(&self, body: Matcher, frames: Vec<String>) -> Mock {
        self.mock_sse_stream_times(body, frames, 1).await
    }

    /// Mock a streamed completion that is expected to be requested `hits` times.
    pub async fn mock_sse_stream_times(&self, body: Matcher, frames: Vec<String>, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", COMPLETIONS_PATH)
            .match_body(body)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(&frames))
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn sse_body(frames: &[String]) -> String {
    let mut body: String = frames
        .iter()
        .map(|frame| format!("data: {frame}\n\n"))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn content_frame(text: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {"content": text}}]}).to_string()
}

pub fn finish_frame(reason: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {}, "finish_reason": reason}]}).to_string()
}

/// First fragment of a tool call: id and name, empty arguments.
pub fn tool_call_start_frame(index: u32, id: &str, name: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
        "index": index,
        "id": id,
        "type": "function",
        "function": {"name": name, "arguments": ""}
    }]}}]})
    .to_string()
}

pub fn tool_args_frame(index: u32, fragment: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
        "index": index,
        "function": {"arguments": fragment}
    }]}}]})
    .to_string()
}

/// Frames of a plain answer split into `chunks`, ending with `stop`.
pub fn answer_frames(chunks: &[&str]) -> Vec<String> {
    let mut frames: Vec<String> = chunks.iter().map(|c| content_frame(c)).collect();
    frames.push(finish_frame("stop"));
    frames
}

/// Frames of a single tool call whose arguments arrive in `fragments`.
pub fn tool_call_frames(id: &str, name: &str, fragments: &[&str]) -> Vec<String> {
    let mut frames = vec![tool_call_start_frame(0, id, name)];
    frames.extend(fragments.iter().map(|f| tool_args_frame(0, f)));
    frames.push(finish_frame("tool_calls"));
    frames
}

/// Raw HTTP server that answers every request with SSE headers and
/// `first_frame`, then keeps the connection open without sending more.
pub async fn spawn_stalling_sse_server(first_frame: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let frame = first_frame.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            content-type: text/event-stream\r\n\
                            connection: close\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket
                    .write_all(format!("data: {frame}\n\n").as_bytes())
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            });
        }
    });

    format!("http://{addr}{COMPLETIONS_PATH}")
}
