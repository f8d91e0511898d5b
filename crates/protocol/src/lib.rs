//! Wire protocol types for the streaming upload service.
//!
//! Every text frame on the WebSocket is a JSON [`envelope::Message`].
//! File data travels in binary frames whose layout is documented on
//! [`constants::BINARY_HEADER_LEN_BYTES`].

pub mod constants;
pub mod envelope;
pub mod messages;

pub use constants::MessageType;
pub use envelope::{Message, Rejection, ReplyError};
