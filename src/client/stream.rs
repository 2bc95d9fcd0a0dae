//! One streamed completion: request, SSE decoding, tool-call assembly.

use std::collections::HashSet;

use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::CompletionConfig;
use super::core::{ChatClient, CompletionOutput, StreamOptions};
use crate::pipeline::decode_sse;
use crate::transport::{error_message_from_body, HttpTransport};
use crate::types::{Message, SseEvent, ToolDefinition};
use crate::utils::ToolCallAssembler;
use crate::{Error, Result};

impl ChatClient {
    /// Stream one completion for `messages` and assemble its content and
    /// tool calls.
    ///
    /// Fails with [`Error::Request`] on a non-2xx status and with
    /// [`Error::Aborted`] when `options.cancel` fires before the stream is
    /// exhausted.
    pub async fn stream_chat_completion(
        &self,
        messages: &[Message],
        options: &StreamOptions,
    ) -> Result<CompletionOutput> {
        let config = self.config.merged(&options.overrides);
        let cancel = options.cancel.clone().unwrap_or_default();
        let observer = options.observer_or_noop();

        let request_id = Uuid::new_v4().to_string();
        let headers = HttpTransport::build_headers(&config, &request_id)?;
        let body = self.build_request_body(&config, messages, &options.tools)?;

        if cancel.is_cancelled() {
            return Err(Error::Aborted);
        }

        let tool_count = body
            .get("tools")
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len);
        info!(
            request_id = %request_id,
            model = %config.model,
            messages = messages.len(),
            tools = tool_count,
            "starting chat completion"
        );

        let start = std::time::Instant::now();
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            resp = self.transport.post_stream_response(&config.endpoint, headers, &body) => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let text = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Aborted),
                text = resp.text() => text.unwrap_or_default(),
            };
            let message = error_message_from_body(status.as_u16(), &text);
            warn!(request_id = %request_id, http_status = status.as_u16(), error = %message, "chat completion rejected");
            return Err(Error::Request {
                status: status.as_u16(),
                message,
            });
        }

        // The event stream owns the response body; every return below drops
        // it, which releases the connection.
        let mut events = decode_sse(HttpTransport::body_stream(resp));
        let mut content = String::new();
        let mut assembler = ToolCallAssembler::new();
        let mut finish_reason = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(request_id = %request_id, "chat completion aborted mid-stream");
                    return Err(Error::Aborted);
                }
                next = events.next() => next,
            };
            let Some(event) = next else { break };

            match event? {
                SseEvent::ContentDelta { content: chunk } => {
                    content.push_str(&chunk);
                    observer.on_content(&chunk, &content);
                }
                SseEvent::ToolCallDelta { deltas } => {
                    assembler.apply_all(&deltas);
                    observer.on_tool_call_delta(&deltas, &assembler.snapshot());
                }
                SseEvent::Finish { reason } => {
                    let snapshot = CompletionOutput {
                        content: content.clone(),
                        tool_calls: assembler.snapshot(),
                        finish_reason: Some(reason.clone()),
                    };
                    observer.on_finish(&reason, &snapshot);
                    finish_reason = Some(reason);
                }
            }
        }
        drop(events);

        let tool_calls = assembler.finalize();
        info!(
            request_id = %request_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            content_len = content.len(),
            tool_calls = tool_calls.len(),
            finish_reason = finish_reason.as_deref().unwrap_or("none"),
            "chat completion finished"
        );

        Ok(CompletionOutput {
            content,
            tool_calls,
            finish_reason,
        })
    }

    /// JSON body of a streaming completion request.
    ///
    /// With tools enabled, caller tools are advertised first, followed by
    /// registry tools whose names the caller did not already use.
    pub fn build_request_body(
        &self,
        config: &CompletionConfig,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Value> {
        let mut body = json!({
            "model": config.model,
            "messages": serde_json::to_value(messages)?,
            "stream": true,
            "max_completion_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        if config.use_tools {
            let mut seen: HashSet<&str> = tools.iter().map(|t| t.name()).collect();
            let registered = self.registry.list();
            let mut combined: Vec<&ToolDefinition> = tools.iter().collect();
            for def in &registered {
                if seen.insert(def.name()) {
                    combined.push(def);
                }
            }

            if !combined.is_empty() {
                body["tools"] = serde_json::to_value(&combined)?;
                body["tool_choice"] = json!("auto");
            }
        }

        Ok(body)
    }
}
