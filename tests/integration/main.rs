//! Integration tests against mock completion endpoints

mod cancellation;
mod chat_with_tools;
mod mock_server;
