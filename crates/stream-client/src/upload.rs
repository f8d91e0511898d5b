use std::path::Path;

use tracing::{debug, info};

use folderpush_protocol::constants::{BINARY_HEADER_LEN_BYTES, MessageType};
use folderpush_protocol::messages::{
    BeginFileRequest, ChunkAckResponse, ChunkHeader, CompleteFileRequest, FileAcceptedResponse,
    FileCompletedResponse,
};
use folderpush_transfer::{ChunkReader, ProgressSink};

use crate::client::StreamClient;
use crate::error::StreamError;

/// Builds a binary chunk frame: `[u32 BE header len][JSON header][data]`.
pub fn encode_chunk_frame(header: &ChunkHeader, data: &[u8]) -> Result<Vec<u8>, StreamError> {
    let header_json = serde_json::to_vec(header)?;
    let header_len = u32::try_from(header_json.len())
        .map_err(|_| StreamError::Protocol("chunk header too large".into()))?;

    let mut frame = Vec::with_capacity(BINARY_HEADER_LEN_BYTES + header_json.len() + data.len());
    frame.extend_from_slice(&header_len.to_be_bytes());
    frame.extend_from_slice(&header_json);
    frame.extend_from_slice(data);
    Ok(frame)
}

/// Splits a binary chunk frame back into header and data.
pub fn decode_chunk_frame(frame: &[u8]) -> Result<(ChunkHeader, &[u8]), StreamError> {
    if frame.len() < BINARY_HEADER_LEN_BYTES {
        return Err(StreamError::Protocol("frame shorter than length prefix".into()));
    }
    let (len_bytes, rest) = frame.split_at(BINARY_HEADER_LEN_BYTES);
    let mut prefix = [0u8; BINARY_HEADER_LEN_BYTES];
    prefix.copy_from_slice(len_bytes);
    let header_len = u32::from_be_bytes(prefix) as usize;
    if rest.len() < header_len {
        return Err(StreamError::Protocol("truncated chunk header".into()));
    }
    let (header_json, data) = rest.split_at(header_len);
    let header = serde_json::from_slice(header_json)?;
    Ok((header, data))
}

impl StreamClient {
    /// Streams one file to `destination` in chunks of `chunk_size` bytes.
    ///
    /// `progress` receives the cumulative bytes acknowledged after every
    /// chunk. The file is read on the blocking pool, one chunk at a time.
    pub async fn upload_file(
        &self,
        destination: &str,
        path: &Path,
        chunk_size: usize,
        progress: &dyn ProgressSink,
    ) -> Result<FileCompletedResponse, StreamError> {
        let owned_path = path.to_path_buf();
        let mut reader = tokio::task::spawn_blocking(move || ChunkReader::new(&owned_path, chunk_size))
            .await
            .map_err(std::io::Error::other)??;
        let size = reader.file_size();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let begin = BeginFileRequest {
            destination: destination.to_string(),
            file_name: file_name.clone(),
            size,
            chunk_size: chunk_size as u64,
        };
        let resp = self.send_request(MessageType::BeginFile, &begin).await?;
        let accepted: FileAcceptedResponse = resp.expect(MessageType::FileAccepted)?;
        debug!(file = %file_name, upload_id = %accepted.upload_id, size, "upload accepted");

        loop {
            let (r, next) = tokio::task::spawn_blocking(move || {
                let next = reader.next_chunk();
                (reader, next)
            })
            .await
            .map_err(std::io::Error::other)?;
            reader = r;

            let Some(chunk) = next? else {
                break;
            };

            let header = ChunkHeader {
                id: String::new(),
                upload_id: accepted.upload_id.clone(),
                offset: chunk.offset,
                checksum: chunk.checksum.clone(),
            };
            let resp = self.send_chunk(&header, &chunk.data).await?;
            let ack: ChunkAckResponse = resp.expect(MessageType::ChunkAck)?;
            if ack.received != chunk.end() {
                return Err(StreamError::Protocol(format!(
                    "chunk ack reports {} bytes, expected {}",
                    ack.received,
                    chunk.end()
                )));
            }
            progress.update(ack.received);
        }

        let complete = CompleteFileRequest {
            upload_id: accepted.upload_id,
        };
        let resp = self
            .send_request(MessageType::CompleteFile, &complete)
            .await?;
        let done: FileCompletedResponse = resp.expect(MessageType::FileCompleted)?;
        info!(file = %file_name, message_id = done.message_id, "file streamed");
        Ok(done)
    }
}
