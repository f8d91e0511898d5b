//! Backend selection per file.

use folderpush_transfer::TransportKind;

use crate::types::UploadMode;

/// Files up to and including this size go over HTTP in hybrid mode.
pub const HYBRID_THRESHOLD_BYTES: u64 = 50 * 1024 * 1024;

/// Picks the transport for a file of `size_bytes` under `mode`.
pub fn select(size_bytes: u64, mode: UploadMode) -> TransportKind {
    match mode {
        UploadMode::StreamingOnly => TransportKind::Streaming,
        UploadMode::MultipartOnly => TransportKind::Multipart,
        UploadMode::Hybrid if size_bytes <= HYBRID_THRESHOLD_BYTES => TransportKind::Multipart,
        UploadMode::Hybrid => TransportKind::Streaming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn selection_table() {
        let cases = [
            (UploadMode::MultipartOnly, 10 * MB, TransportKind::Multipart),
            (UploadMode::MultipartOnly, 80 * MB, TransportKind::Multipart),
            (UploadMode::StreamingOnly, 10 * MB, TransportKind::Streaming),
            (UploadMode::StreamingOnly, 80 * MB, TransportKind::Streaming),
            (UploadMode::Hybrid, 10 * MB, TransportKind::Multipart),
            (UploadMode::Hybrid, 80 * MB, TransportKind::Streaming),
            (UploadMode::Hybrid, 0, TransportKind::Multipart),
        ];
        for (mode, size, expected) in cases {
            assert_eq!(select(size, mode), expected, "{mode} / {size} bytes");
        }
    }

    #[test]
    fn hybrid_threshold_is_inclusive() {
        assert_eq!(
            select(HYBRID_THRESHOLD_BYTES, UploadMode::Hybrid),
            TransportKind::Multipart
        );
        assert_eq!(
            select(HYBRID_THRESHOLD_BYTES + 1, UploadMode::Hybrid),
            TransportKind::Streaming
        );
    }
}
