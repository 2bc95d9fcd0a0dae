//! HTTP transport for the completion endpoint.

pub mod http;

pub use http::{error_message_from_body, HttpTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
