use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use folderpush_protocol::constants::{
    MessageType, WS_BINARY_REQUEST_TIMEOUT, WS_ERR_CODE_UNAUTHORIZED, WS_MAX_MESSAGE_SIZE,
    WS_REQUEST_TIMEOUT,
};
use folderpush_protocol::envelope::Message;
use folderpush_protocol::messages::{AuthOkResponse, AuthenticateRequest, ChunkHeader};

use crate::error::StreamError;
use crate::upload::encode_chunk_frame;

/// In-flight requests awaiting a response, keyed by request id.
pub type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Message>>>>;

/// Authenticated connection to the streaming service.
pub struct StreamClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    pending: PendingMap,
    session_id: String,
    closed: Arc<AtomicBool>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    cancel: CancellationToken,
}

impl StreamClient {
    /// Connects to `url` and authenticates with `auth`.
    pub async fn connect(url: &str, auth: &AuthenticateRequest) -> Result<Self, StreamError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let write_handle = tokio::spawn(crate::pumps::write::write_pump(
            write,
            write_rx,
            cancel.clone(),
        ));
        let read_handle = tokio::spawn(crate::pumps::read::read_pump(
            read,
            pending.clone(),
            closed.clone(),
            write_tx.clone(),
            cancel.clone(),
        ));
        let ping_handle = tokio::spawn(crate::pumps::ping::ping_pump(
            write_tx.clone(),
            cancel.clone(),
        ));

        let mut client = Self {
            write_tx,
            pending,
            session_id: String::new(),
            closed,
            handles: vec![read_handle, write_handle, ping_handle],
            cancel,
        };

        client.session_id = client.authenticate(auth).await?;
        info!(url, session = %client.session_id, "stream session established");
        Ok(client)
    }

    async fn authenticate(&self, auth: &AuthenticateRequest) -> Result<String, StreamError> {
        let resp = match self
            .send_request(MessageType::Authenticate, auth)
            .await
        {
            Ok(resp) => resp,
            Err(StreamError::Remote { code, message }) if code == WS_ERR_CODE_UNAUTHORIZED => {
                return Err(StreamError::AuthFailed(message));
            }
            Err(e) => return Err(e),
        };

        let ok: AuthOkResponse = resp.expect(MessageType::AuthOk)?;
        Ok(ok.session_id)
    }

    /// Sends a request and waits for the response with the same id.
    pub async fn send_request<T: serde::Serialize>(
        &self,
        msg_type: MessageType,
        payload: &T,
    ) -> Result<Message, StreamError> {
        let id = uuid::Uuid::new_v4().to_string();
        let msg = Message::request(id.clone(), msg_type, payload)?;
        let json = serde_json::to_string(&msg)?;

        self.round_trip(id, tungstenite::Message::Text(json.into()), WS_REQUEST_TIMEOUT)
            .await
    }

    /// Sends one chunk frame and waits for its acknowledgement.
    ///
    /// A fresh request id is written into `header.id`.
    pub async fn send_chunk(
        &self,
        header: &ChunkHeader,
        data: &[u8],
    ) -> Result<Message, StreamError> {
        let id = uuid::Uuid::new_v4().to_string();
        let header = ChunkHeader {
            id: id.clone(),
            ..header.clone()
        };
        let frame = encode_chunk_frame(&header, data)?;

        self.round_trip(
            id,
            tungstenite::Message::Binary(frame.into()),
            WS_BINARY_REQUEST_TIMEOUT,
        )
        .await
    }

    async fn round_trip(
        &self,
        id: String,
        frame: tungstenite::Message,
        timeout: Duration,
    ) -> Result<Message, StreamError> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if self.write_tx.send(frame).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(StreamError::Closed);
        }

        let result = tokio::time::timeout(timeout, rx).await;

        // Clean up pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(resp)) => resp.into_outcome().map_err(|r| StreamError::Remote {
                code: r.code,
                message: r.message,
            }),
            Ok(Err(_)) => Err(StreamError::Closed),
            Err(_) => Err(StreamError::Timeout),
        }
    }

    /// Session id assigned by the service at authentication.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns `true` once the read pump has stopped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Says goodbye and closes the connection.
    ///
    /// A session the peer already dropped counts as closed, not as an error.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.is_closed() {
            self.cancel.cancel();
            debug!(session = %self.session_id, "stream session already closed by peer");
            return Ok(());
        }
        let goodbye = Message::signal(uuid::Uuid::new_v4().to_string(), MessageType::Goodbye);
        let json = serde_json::to_string(&goodbye)?;
        if self
            .write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .is_err()
        {
            debug!(session = %self.session_id, "write pump gone before goodbye");
        }
        // The write pump sends the close frame once cancelled.
        self.cancel.cancel();
        debug!(session = %self.session_id, "stream session closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        write_tx: mpsc::Sender<tungstenite::Message>,
        pending: PendingMap,
    ) -> Self {
        Self {
            write_tx,
            pending,
            session_id: "test-session".into(),
            closed: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        for handle in &self.handles {
            handle.abort();
        }
    }
}
