/// Errors from the document API client.
///
/// HTTP error statuses are not errors here; they come back in
/// [`HttpReply`](crate::HttpReply) so the retry policy can inspect them.
#[derive(Debug, thiserror::Error)]
pub enum BotApiError {
    /// The request URL carries the bot token, so it is stripped first.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for BotApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
