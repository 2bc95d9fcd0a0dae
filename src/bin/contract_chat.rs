//! contract-chat: run one tool-augmented conversation from the terminal
//!
//! Usage:
//!   contract-chat [--config <file.yaml>] [--max-rounds <n>] [--document <file>] <prompt...>
//!
//! Configuration comes from `AI_CHAT_*` environment variables, overlaid with
//! the optional YAML file. Set `RUST_LOG=contract_chat=debug` for request
//! and tool logs.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use contract_chat::client::{ChatObserver, ChatStop};
use contract_chat::tools::{tool_fn, ToolContext, ToolError, ToolRegistry};
use contract_chat::types::{FunctionDefinition, ToolCall, ToolResult};
use contract_chat::{
    CancelHandle, ChatClient, ChatOptions, CompletionConfigOverrides, Error, Message,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const SYSTEM_PROMPT: &str = "You are an assistant embedded in a data-contract editor. \
Use the available tools to inspect the current document before answering questions about it.";

struct Args {
    config: Option<PathBuf>,
    document: Option<PathBuf>,
    max_rounds: Option<u32>,
    prompt: String,
}

fn print_usage() {
    println!(
        r#"contract-chat: streaming tool-augmented chat

USAGE:
    contract-chat [OPTIONS] <PROMPT>...

OPTIONS:
    --config <file>       YAML configuration overrides
    --document <file>     Document exposed to the read_document tool
    --max-rounds <n>      Maximum completion round-trips (default 5)
    -h, --help            Show this help message

ENVIRONMENT:
    AI_CHAT_ENDPOINT, AI_CHAT_MODEL, AI_CHAT_API_KEY (or OPENAI_API_KEY),
    AI_CHAT_MAX_TOKENS, AI_CHAT_TEMPERATURE, AI_CHAT_AUTH_HEADER,
    AI_HTTP_TIMEOUT_SECS, AI_PROXY_URL, RUST_LOG"#
    );
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut config = None;
    let mut document = None;
    let mut max_rounds = None;
    let mut prompt = Vec::new();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => config = Some(PathBuf::from(it.next().context("--config needs a path")?)),
            "--document" => {
                document = Some(PathBuf::from(it.next().context("--document needs a path")?))
            }
            "--max-rounds" => {
                let raw = it.next().context("--max-rounds needs a number")?;
                max_rounds = Some(raw.parse().with_context(|| format!("invalid --max-rounds '{raw}'"))?);
            }
            other if other.starts_with("--") => bail!("unknown option {other}"),
            _ => prompt.push(arg),
        }
    }

    if prompt.is_empty() {
        return Ok(None);
    }
    Ok(Some(Args {
        config,
        document,
        max_rounds,
        prompt: prompt.join(" "),
    }))
}

/// Streams content to stdout and tool activity to stderr.
struct TerminalObserver;

impl ChatObserver for TerminalObserver {
    fn on_content(&self, chunk: &str, _accumulated: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(chunk.as_bytes());
        let _ = out.flush();
    }

    fn on_tool_calls_start(&self, calls: &[ToolCall]) {
        for call in calls {
            eprintln!("\n[tool] {}({})", call.function.name, call.function.arguments);
        }
    }

    fn on_tool_calls_complete(&self, _calls: &[ToolCall], results: &[ToolResult]) {
        for result in results {
            let marker = if result.is_error() { "failed" } else { "ok" };
            eprintln!("[tool] {} {}", result.name, marker);
        }
    }
}

fn register_builtin_tools(registry: &ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        "echo",
        FunctionDefinition::new(
            "echo",
            "Return the given arguments unchanged.",
            json!({"type": "object", "additionalProperties": true}),
        ),
        tool_fn(|args, _ctx| async move { Ok(args) }),
    )?;

    registry.register(
        "read_document",
        FunctionDefinition::new(
            "read_document",
            "Return the full text of the data contract currently open in the editor.",
            json!({"type": "object", "properties": {}}),
        ),
        tool_fn(|_args, ctx| async move {
            match ctx.str_value("document") {
                Some(doc) => Ok(json!(doc)),
                None => Err(ToolError::execution("no document is open")),
            }
        }),
    )?;

    registry.register(
        "current_time",
        FunctionDefinition::new(
            "current_time",
            "Return the current Unix time in seconds.",
            json!({"type": "object", "properties": {}}),
        ),
        tool_fn(|_args, _ctx| async move {
            let secs = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_err(|e| ToolError::execution(e.to_string()))?
                .as_secs();
            Ok(json!({ "unix_seconds": secs }))
        }),
    )?;

    Ok(())
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let registry = Arc::new(ToolRegistry::new());
    register_builtin_tools(&registry)?;

    let mut builder = ChatClient::builder().from_env().registry(registry);
    if let Some(path) = &args.config {
        builder = builder.overrides(CompletionConfigOverrides::from_yaml_file(path)?);
    }
    let client = builder.build()?;

    let mut context = ToolContext::new();
    if let Some(path) = &args.document {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read document {}", path.display()))?;
        context = context.with_value("document", text);
    }

    let cancel = CancelHandle::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut options = ChatOptions::new()
        .context(context)
        .cancel(cancel)
        .observer(Arc::new(TerminalObserver));
    if let Some(n) = args.max_rounds {
        options = options.max_tool_rounds(n);
    }

    let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(args.prompt)];
    match client.chat_with_tools(&messages, &options).await {
        Ok(outcome) => {
            println!();
            if outcome.stop == ChatStop::RoundLimit {
                eprintln!("[stopped after {} rounds]", outcome.rounds);
            }
            Ok(0)
        }
        Err(e) if e.is_abort() => {
            eprintln!("\n[aborted]");
            Ok(130)
        }
        Err(Error::Request { status, message }) => {
            eprintln!("request failed ({status}): {message}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };

    let code = run(args).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
