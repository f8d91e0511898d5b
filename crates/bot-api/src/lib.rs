//! Client for the HTTP document API.
//!
//! [`BotApiClient::send_document`] performs exactly one multipart POST.
//! Retrying is the caller's decision, driven by [`RetryPolicy`].

mod client;
mod error;
mod retry;

pub use client::{BotApiClient, DEFAULT_BASE_URL, HttpReply, REQUEST_TIMEOUT};
pub use error::BotApiError;
pub use retry::RetryPolicy;
