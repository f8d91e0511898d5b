//! File enumeration for upload.
//!
//! Walks a directory tree top-down: each directory's regular files come
//! first, sorted by name, then its subdirectories in `read_dir` order.

use std::path::{Path, PathBuf};

use folderpush_transfer::FileRecord;
use tracing::{debug, warn};

use crate::error::UploadError;

/// Lists every regular file under `root`.
///
/// Only a failure to read `root` itself is an error. Unreadable entries,
/// unreadable subdirectories and symbolic links are skipped with a warning.
pub fn enumerate(root: &Path) -> Result<Vec<FileRecord>, UploadError> {
    let entries = std::fs::read_dir(root).map_err(|source| UploadError::Enumeration {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    walk_entries(root, entries, &mut files);
    debug!(root = %root.display(), files = files.len(), "enumeration finished");
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<FileRecord>) {
    match std::fs::read_dir(dir) {
        Ok(entries) => walk_entries(dir, entries, files),
        Err(e) => warn!(path = %dir.display(), error = %e, "skipping unreadable directory"),
    }
}

fn walk_entries(dir: &Path, entries: std::fs::ReadDir, files: &mut Vec<FileRecord>) {
    let mut here = Vec::new();
    let mut subdirs: Vec<PathBuf> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = dir.join(entry.file_name());

        // `file_type` does not follow symlinks.
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping entry without file type");
                continue;
            }
        };

        if file_type.is_symlink() {
            warn!(path = %path.display(), "skipping symbolic link");
        } else if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => here.push((entry.file_name(), FileRecord::new(path, meta.len()))),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping file without metadata"),
            }
        }
    }

    here.sort_by(|a, b| a.0.cmp(&b.0));
    files.extend(here.into_iter().map(|(_, record)| record));

    for sub in subdirs {
        walk_dir(&sub, files);
    }
}
