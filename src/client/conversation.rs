//! Multi-round conversation loop with local tool execution.

use tracing::{info, warn};

use super::core::{ChatClient, ChatOptions, ChatOutcome, ChatStop};
use crate::tools::execute_tool_calls;
use crate::types::{Message, ToolCall};
use crate::{Error, Result};

impl ChatClient {
    /// Drive completions until the model stops calling tools or
    /// `options.max_tool_rounds` round-trips have been made.
    ///
    /// Each round with tool calls appends one assistant message carrying the
    /// calls, then one tool message per call in call order. Rounds run
    /// strictly one after another. `messages` itself is never modified: on
    /// error or abort the caller's transcript is exactly as before.
    pub async fn chat_with_tools(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatOutcome> {
        let max_rounds = options.max_tool_rounds.max(1);
        let observer = options.stream.observer_or_noop();

        let mut transcript: Vec<Message> = messages.to_vec();
        let mut all_tool_calls: Vec<ToolCall> = Vec::new();
        let mut rounds: u32 = 0;

        loop {
            let output = self
                .stream_chat_completion(&transcript, &options.stream)
                .await?;
            rounds += 1;

            if output.tool_calls.is_empty() {
                info!(rounds, "conversation completed");
                return Ok(ChatOutcome {
                    content: output.content,
                    tool_calls: all_tool_calls,
                    messages: transcript,
                    rounds,
                    stop: ChatStop::Completed,
                });
            }

            if options
                .stream
                .cancel
                .as_ref()
                .is_some_and(|c| c.is_cancelled())
            {
                return Err(Error::Aborted);
            }

            info!(
                round = rounds,
                tool_calls = output.tool_calls.len(),
                "executing tool calls"
            );
            observer.on_tool_calls_start(&output.tool_calls);
            let results = execute_tool_calls(
                &self.registry,
                &output.tool_calls,
                &options.context,
                options.execution_mode,
            )
            .await;
            observer.on_tool_calls_complete(&output.tool_calls, &results);

            all_tool_calls.extend(output.tool_calls.iter().cloned());
            let content = output.content;
            transcript.push(Message::assistant_with_tool_calls(
                Some(content.clone()),
                output.tool_calls,
            ));
            transcript.extend(results.into_iter().map(Message::from));

            if rounds >= max_rounds {
                warn!(
                    rounds,
                    max_rounds, "tool round budget exhausted; returning last observed state"
                );
                return Ok(ChatOutcome {
                    content,
                    tool_calls: all_tool_calls,
                    messages: transcript,
                    rounds,
                    stop: ChatStop::RoundLimit,
                });
            }
        }
    }
}
