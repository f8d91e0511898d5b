use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::constants::MessageType;

/// Rejection sent by the service in place of the expected reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: i32,
    pub message: String,
}

/// A reply did not have the shape the request called for.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("expected {expected:?} reply, got {got:?}")]
    WrongType {
        expected: MessageType,
        got: MessageType,
    },

    #[error("{0:?} reply has no payload")]
    MissingPayload(MessageType),

    #[error("malformed {kind:?} payload: {source}")]
    Malformed {
        kind: MessageType,
        source: serde_json::Error,
    },
}

/// Text frame of the upload session.
///
/// A reply echoes the `id` of its request. The payload is kept as raw JSON
/// until the caller names the type it expects via [`Message::expect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Rejection>,
}

impl Message {
    /// Builds a request carrying `payload`.
    pub fn request<T: Serialize>(
        id: impl Into<String>,
        msg_type: MessageType,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: id.into(),
            msg_type,
            payload: Some(serde_json::value::to_raw_value(payload)?),
            error: None,
        })
    }

    /// A message with no payload, such as `goodbye`.
    pub fn signal(id: impl Into<String>, msg_type: MessageType) -> Self {
        Self {
            id: id.into(),
            msg_type,
            payload: None,
            error: None,
        }
    }

    pub fn rejection(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            error: Some(Rejection {
                code,
                message: message.into(),
            }),
            ..Self::signal(id, MessageType::Error)
        }
    }

    /// Answers this request with the same id.
    pub fn reply<T: Serialize>(
        &self,
        msg_type: MessageType,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Self::request(self.id.clone(), msg_type, payload)
    }

    /// Splits a reply into accepted or rejected.
    pub fn into_outcome(mut self) -> Result<Self, Rejection> {
        match self.error.take() {
            Some(rejection) => Err(rejection),
            None => Ok(self),
        }
    }

    /// Decodes the payload of a reply that must be of type `expected`.
    pub fn expect<T: DeserializeOwned>(&self, expected: MessageType) -> Result<T, ReplyError> {
        if self.msg_type != expected {
            return Err(ReplyError::WrongType {
                expected,
                got: self.msg_type,
            });
        }
        let raw = self
            .payload
            .as_ref()
            .ok_or(ReplyError::MissingPayload(expected))?;
        serde_json::from_str(raw.get()).map_err(|source| ReplyError::Malformed {
            kind: expected,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{BeginFileRequest, ChunkAckResponse, FileAcceptedResponse};

    #[test]
    fn begin_file_request_wire_shape() {
        let begin = BeginFileRequest {
            destination: "@archive".into(),
            file_name: "movie.mkv".into(),
            size: 10,
            chunk_size: 4,
        };
        let msg = Message::request("r1", MessageType::BeginFile, &begin).unwrap();
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["id"], "r1");
        assert_eq!(json["type"], "begin_file");
        assert_eq!(json["payload"]["fileName"], "movie.mkv");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn goodbye_has_no_payload() {
        let json = serde_json::to_string(&Message::signal("g", MessageType::Goodbye)).unwrap();
        assert_eq!(json, r#"{"id":"g","type":"goodbye"}"#);
    }

    #[test]
    fn accepted_reply_decodes() {
        let request = Message::signal("r7", MessageType::BeginFile);
        let reply = request
            .reply(
                MessageType::FileAccepted,
                &FileAcceptedResponse {
                    upload_id: "up-7".into(),
                },
            )
            .unwrap();
        assert_eq!(reply.id, "r7");

        let accepted: FileAcceptedResponse = reply
            .into_outcome()
            .unwrap()
            .expect(MessageType::FileAccepted)
            .unwrap();
        assert_eq!(accepted.upload_id, "up-7");
    }

    #[test]
    fn rejection_survives_the_wire() {
        let json = serde_json::to_string(&Message::rejection("r2", 413, "file too large")).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();

        let rejection = parsed.into_outcome().unwrap_err();
        assert_eq!(
            rejection,
            Rejection {
                code: 413,
                message: "file too large".into()
            }
        );
    }

    #[test]
    fn unexpected_reply_type() {
        let reply = Message::signal("r3", MessageType::Pong);
        let err = reply
            .expect::<ChunkAckResponse>(MessageType::ChunkAck)
            .unwrap_err();
        assert!(matches!(
            err,
            ReplyError::WrongType {
                expected: MessageType::ChunkAck,
                got: MessageType::Pong
            }
        ));
    }

    #[test]
    fn missing_or_malformed_payload() {
        let bare = Message::signal("r4", MessageType::ChunkAck);
        assert!(matches!(
            bare.expect::<ChunkAckResponse>(MessageType::ChunkAck),
            Err(ReplyError::MissingPayload(MessageType::ChunkAck))
        ));

        let wrong: Message = serde_json::from_str(
            r#"{"id":"r5","type":"chunk_ack","payload":{"uploadId":"u","received":"lots"}}"#,
        )
        .unwrap();
        assert!(matches!(
            wrong.expect::<ChunkAckResponse>(MessageType::ChunkAck),
            Err(ReplyError::Malformed { .. })
        ));
    }
}
