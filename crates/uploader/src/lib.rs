//! Upload orchestration for a directory tree.
//!
//! This crate holds the business logic only. Wire clients are reached
//! through the traits in [`transport`], so every stage runs against mocks
//! in tests.
//!
//! # Pipeline
//!
//! 1. **Connect**: open the shared streaming session
//! 2. **Scan**: walk the root top-down ([`scanner::enumerate`])
//! 3. **Filter**: drop paths already in the ledger
//! 4. **Select**: pick a backend per file ([`selector::select`])
//! 5. **Schedule**: run uploads under a concurrency bound ([`Scheduler`])
//! 6. **Disconnect**: close the session and report the [`RunSummary`]

pub mod controller;
pub mod error;
pub mod remote;
pub mod scanner;
pub mod scheduler;
pub mod selector;
pub mod transport;
pub mod types;

pub use controller::{RunController, RunSettings};
pub use error::{TransportError, UploadError};
pub use remote::StreamConnector;
pub use scanner::enumerate;
pub use scheduler::Scheduler;
pub use selector::{HYBRID_THRESHOLD_BYTES, select};
pub use transport::{
    Connector, DocumentApi, MultipartTransport, RemoteSession, StreamingTransport, Transport,
    TransportSet,
};
pub use types::{Credentials, ParseModeError, RunSummary, TaskOutcome, UploadMode, UploadTask};
