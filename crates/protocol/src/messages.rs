use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// First message on a new connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub api_id: i64,
    pub api_hash: String,
    pub bot_token: String,
}

/// Opens a file upload towards `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginFileRequest {
    pub destination: String,
    pub file_name: String,
    pub size: u64,
    pub chunk_size: u64,
}

/// JSON header of a binary chunk frame.
///
/// `id` is injected by the client for response correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkHeader {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub upload_id: String,
    pub offset: u64,
    /// SHA-256 hex of the chunk data.
    pub checksum: String,
}

/// Finalizes a file upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFileRequest {
    pub upload_id: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOkResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAcceptedResponse {
    pub upload_id: String,
}

/// Acknowledges a chunk; `received` is the byte count persisted so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAckResponse {
    pub upload_id: String,
    pub received: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCompletedResponse {
    pub upload_id: String,
    #[serde(default)]
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_file_uses_camel_case() {
        let req = BeginFileRequest {
            destination: "-1001".into(),
            file_name: "a.mkv".into(),
            size: 10,
            chunk_size: 4,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fileName"], "a.mkv");
        assert_eq!(json["chunkSize"], 4);
    }

    #[test]
    fn chunk_header_omits_empty_id() {
        let header = ChunkHeader {
            id: String::new(),
            upload_id: "u1".into(),
            offset: 0,
            checksum: "ab".into(),
        };
        let json = serde_json::to_string(&header).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("uploadId"));
    }

    #[test]
    fn file_completed_defaults_message_id() {
        let parsed: FileCompletedResponse =
            serde_json::from_str(r#"{"uploadId":"u1"}"#).unwrap();
        assert_eq!(parsed.message_id, 0);
    }
}
