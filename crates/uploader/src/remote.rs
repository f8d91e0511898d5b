//! Bindings from the wire clients to the transport traits.

use std::path::Path;
use std::sync::Arc;

use folderpush_bot_api::{BotApiClient, HttpReply};
use folderpush_protocol::messages::AuthenticateRequest;
use folderpush_stream_client::StreamClient;
use folderpush_transfer::ProgressSink;

use crate::error::TransportError;
use crate::transport::{BoxFuture, Connector, DocumentApi, RemoteSession};
use crate::types::Credentials;

/// Opens [`StreamClient`] sessions against a fixed endpoint.
pub struct StreamConnector {
    url: String,
}

impl StreamConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connector for StreamConnector {
    fn connect<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Arc<dyn RemoteSession>, TransportError>> {
        Box::pin(async move {
            let auth = AuthenticateRequest {
                api_id: credentials.api_id,
                api_hash: credentials.api_hash.clone(),
                bot_token: credentials.bot_token.clone(),
            };
            let client = StreamClient::connect(&self.url, &auth).await?;
            Ok(Arc::new(client) as Arc<dyn RemoteSession>)
        })
    }
}

impl RemoteSession for StreamClient {
    fn upload<'a>(
        &'a self,
        destination: &'a str,
        file_path: &'a Path,
        chunk_size: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.upload_file(destination, file_path, chunk_size, progress.as_ref())
                .await?;
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.close().await?;
            Ok(())
        })
    }
}

impl DocumentApi for BotApiClient {
    fn send_document<'a>(
        &'a self,
        destination: &'a str,
        file_path: &'a Path,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<HttpReply, TransportError>> {
        Box::pin(async move {
            let reply = BotApiClient::send_document(self, destination, file_path, progress).await?;
            Ok(reply)
        })
    }
}
