use tokio_tungstenite::tungstenite;

/// Errors from the streaming client.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] folderpush_transfer::TransferError),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("remote error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("unexpected reply: {0}")]
    Reply(#[from] folderpush_protocol::ReplyError),

    #[error("protocol error: {0}")]
    Protocol(String),
}
