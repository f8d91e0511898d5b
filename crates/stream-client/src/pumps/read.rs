//! Routes incoming responses to the requests waiting for them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use folderpush_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};
use folderpush_protocol::envelope::Message;

use crate::client::PendingMap;

/// Reads frames until the socket closes, goes silent or is cancelled.
///
/// Any incoming frame resets the [`WS_PONG_WAIT`] deadline. On exit the
/// connection is marked closed and every pending request is dropped, so
/// waiters observe [`StreamError::Closed`](crate::StreamError::Closed)
/// instead of waiting for their own timeout.
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("no traffic from stream service within {WS_PONG_WAIT:?}, closing");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_message(&text, &pending).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => trace!("received pong"),
                            tungstenite::Message::Close(_) => {
                                debug!("stream service closed the connection");
                                break;
                            }
                            _ => {}
                        }
                    }
                    Some(Err(e)) => {
                        warn!("stream read error: {e}");
                        break;
                    }
                    None => {
                        debug!("stream ended");
                        break;
                    }
                }
            }
        }
    }

    closed.store(true, Ordering::Release);
    pending.lock().await.clear();
}

async fn handle_text_message(text: &str, pending: &PendingMap) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return;
    }

    let msg: Message = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("failed to parse message: {e}");
            return;
        }
    };

    trace!(msg_type = ?msg.msg_type, id = %msg.id, "received message");

    match pending.lock().await.remove(&msg.id) {
        Some(tx) => {
            let _ = tx.send(msg);
        }
        None => debug!(msg_type = ?msg.msg_type, id = %msg.id, "unsolicited message dropped"),
    }
}
