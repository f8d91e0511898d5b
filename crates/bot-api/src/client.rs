use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;
use tracing::debug;

use folderpush_transfer::ProgressSink;

use crate::error::BotApiError;

/// Public endpoint of the document API.
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Per-request timeout covering the whole upload.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Status and body of one HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as delivered.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Document API client bound to one bot token.
pub struct BotApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl BotApiClient {
    /// Creates a client for `base_url` (no trailing path) and `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, BotApiError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BotApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token: token.to_string(),
        })
    }

    fn send_document_url(&self) -> String {
        format!("{}/bot{}/sendDocument", self.base_url, self.token)
    }

    /// Uploads `path` to `chat_id` in a single multipart POST.
    ///
    /// The file is streamed from disk; `progress` receives the cumulative
    /// bytes handed to the connection. Any HTTP status is returned as an
    /// [`HttpReply`]; only transport failures are errors.
    pub async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<HttpReply, BotApiError> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut sent = 0u64;
        let stream = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                progress.update(sent);
            }
            chunk
        });

        let document = Part::stream_with_length(reqwest::Body::wrap_stream(stream), size)
            .file_name(file_name.clone());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", document);

        debug!(file = %file_name, size, "sending document");
        let resp = self
            .http
            .post(self.send_document_url())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(HttpReply { status, body })
    }
}
