//! Run configuration from the environment.
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the process environment take precedence.

use std::path::PathBuf;

use folderpush_ledger::{DEFAULT_ERROR_LOG_FILE, DEFAULT_LEDGER_FILE};
use folderpush_protocol::constants::{DEFAULT_STREAM_CHUNK_SIZE, MAX_STREAM_CHUNK_SIZE};
use folderpush_uploader::{Credentials, RunSettings, UploadMode};

const DEFAULT_BOT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_SOURCE_DIR: &str = "/media";
const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_CHUNK_SIZE_KB: usize = DEFAULT_STREAM_CHUNK_SIZE / 1024;

/// Configuration problems. All are fatal before anything connects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub destination: String,
    pub mode: UploadMode,
    pub stream_endpoint: String,
    pub bot_api_url: String,
    pub source_dir: PathBuf,
    pub concurrency: usize,
    /// Streaming chunk size in bytes.
    pub chunk_size: usize,
    pub upload_log: PathBuf,
    pub error_log: PathBuf,
}

impl RunConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_id = required("API_ID")?;
        let api_id = api_id.parse::<i64>().map_err(|e| ConfigError::Invalid {
            key: "API_ID",
            reason: e.to_string(),
        })?;

        let mode = match get("UPLOAD_MODE") {
            Some(v) => v.parse::<UploadMode>().map_err(|e| ConfigError::Invalid {
                key: "UPLOAD_MODE",
                reason: e.to_string(),
            })?,
            None => UploadMode::default(),
        };

        let concurrency = parse_or("CONCURRENCY", get("CONCURRENCY"), DEFAULT_CONCURRENCY)?;
        let chunk_kb = parse_or("CHUNK_SIZE_KB", get("CHUNK_SIZE_KB"), DEFAULT_CHUNK_SIZE_KB)?;
        let chunk_size = chunk_size_bytes(chunk_kb)?;

        Ok(Self {
            credentials: Credentials {
                api_id,
                api_hash: required("API_HASH")?,
                bot_token: required("BOT_TOKEN")?,
            },
            destination: required("GROUP_TARGET")?,
            mode,
            stream_endpoint: required("STREAM_ENDPOINT")?,
            bot_api_url: get("BOT_API_URL").unwrap_or_else(|| DEFAULT_BOT_API_URL.into()),
            source_dir: get("SOURCE_DIR")
                .unwrap_or_else(|| DEFAULT_SOURCE_DIR.into())
                .into(),
            concurrency,
            chunk_size,
            upload_log: get("UPLOAD_LOG")
                .unwrap_or_else(|| DEFAULT_LEDGER_FILE.into())
                .into(),
            error_log: get("ERROR_LOG")
                .unwrap_or_else(|| DEFAULT_ERROR_LOG_FILE.into())
                .into(),
        })
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings {
            destination: self.destination.clone(),
            mode: self.mode,
            concurrency: self.concurrency,
            chunk_size: self.chunk_size,
        }
    }
}

/// Streaming chunks must fit one WebSocket frame.
fn chunk_size_bytes(kb: usize) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "CHUNK_SIZE_KB",
        reason,
    };
    if kb == 0 {
        return Err(invalid("must be at least 1".into()));
    }
    match kb.checked_mul(1024) {
        Some(bytes) if bytes <= MAX_STREAM_CHUNK_SIZE => Ok(bytes),
        _ => Err(invalid(format!(
            "must be at most {} KiB",
            MAX_STREAM_CHUNK_SIZE / 1024
        ))),
    }
}

fn parse_or(key: &'static str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
