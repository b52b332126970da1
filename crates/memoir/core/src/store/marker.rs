// Memoir
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Completion marker for store directories.
//!
//! A store directory is only ever treated as complete when this marker is
//! present, parses, and every file it lists verifies. The marker is
//! written last, via a temp file and an atomic rename, so a reader never
//! observes a half-written result set as complete.

use memoir_common::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// File name of the completion marker inside a store directory.
pub const MARKER_FILE: &str = "finished.json";

/// Marker format version; bump on any incompatible change.
pub const MARKER_FORMAT: u32 = 1;

/// Size and checksum of one persisted result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub crc32: u32,
}

/// Record written into a store directory after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub format: u32,
    pub run_id: Uuid,
    pub digest: String,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    pub files: Vec<FileRecord>,
}

impl CompletionMarker {
    /// Fresh marker for a run that is about to be published.
    pub fn new(digest: impl Into<String>, started_at_ms: u64) -> Self {
        Self {
            format: MARKER_FORMAT,
            run_id: Uuid::new_v4(),
            digest: digest.into(),
            started_at_ms,
            finished_at_ms: now_ms(),
            files: Vec::new(),
        }
    }

    /// Record every regular file currently in `dir` (the marker itself and
    /// temp files excluded), with sizes and checksums.
    pub fn record_dir(&mut self, dir: &Path) -> StoreResult<()> {
        self.files.clear();
        let mut names = Vec::new();
        collect_files(dir, dir, &mut names)?;
        names.sort();
        for name in names {
            if name == MARKER_FILE || name.ends_with(".tmp") {
                continue;
            }
            let (size, crc32) = checksum_file(&dir.join(&name))?;
            self.files.push(FileRecord { name, size, crc32 });
        }
        Ok(())
    }

    /// Publish the marker: write to a temp file, flush, then rename into
    /// place. The rename is the commit point.
    pub fn write_atomic(&self, dir: &Path) -> StoreResult<()> {
        let tmp = dir.join(format!(".{}.tmp", MARKER_FILE));
        let bytes = serde_json::to_vec_pretty(self)?;
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, dir.join(MARKER_FILE))?;
        Ok(())
    }

    /// Read the marker from `dir`. `Ok(None)` when no marker exists;
    /// `CorruptMarker` when one exists but does not parse.
    pub fn load(dir: &Path) -> StoreResult<Option<Self>> {
        let path = dir.join(MARKER_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let marker: Self = serde_json::from_slice(&bytes).map_err(|err| StoreError::CorruptMarker {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        if marker.format != MARKER_FORMAT {
            return Err(StoreError::CorruptMarker {
                path,
                reason: format!("unsupported format {}", marker.format),
            });
        }
        Ok(Some(marker))
    }

    /// Verify that every listed file still exists with the recorded size
    /// and checksum.
    pub fn verify(&self, dir: &Path) -> StoreResult<()> {
        for record in &self.files {
            let path = dir.join(&record.name);
            if !path.is_file() {
                return Err(StoreError::MissingFile { file: record.name.clone() });
            }
            let (size, crc32) = checksum_file(&path)?;
            if size != record.size || crc32 != record.crc32 {
                return Err(StoreError::ChecksumMismatch { file: record.name.clone() });
            }
        }
        Ok(())
    }
}

/// Streaming CRC32 and size of a file.
pub fn checksum_file(path: &Path) -> StoreResult<(u64, u32)> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        size += read as u64;
        hasher.update(&buffer[..read]);
    }
    Ok((size, hasher.finalize()))
}

/// Relative paths of regular files under `dir`, recursively.
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> StoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "results.json", b"{}");
        write_file(tmp.path(), "params.json", b"[]");

        let mut marker = CompletionMarker::new("ab".repeat(32), now_ms());
        marker.record_dir(tmp.path()).unwrap();
        assert_eq!(marker.files.len(), 2);
        marker.write_atomic(tmp.path()).unwrap();

        let loaded = CompletionMarker::load(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded.run_id, marker.run_id);
        assert_eq!(loaded.files, marker.files);
        loaded.verify(tmp.path()).unwrap();
    }

    #[test]
    fn test_missing_marker_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(CompletionMarker::load(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_marker_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), MARKER_FILE, b"not json");
        assert!(matches!(CompletionMarker::load(tmp.path()), Err(StoreError::CorruptMarker { .. })));
    }

    #[test]
    fn test_marker_excludes_itself_and_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "results.json", b"{}");
        write_file(tmp.path(), MARKER_FILE, b"{}");
        write_file(tmp.path(), ".finished.json.tmp", b"{}");

        let mut marker = CompletionMarker::new("00".repeat(32), 0);
        marker.record_dir(tmp.path()).unwrap();
        let names: Vec<&str> = marker.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["results.json"]);
    }

    #[test]
    fn test_verify_detects_truncation() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "results.json", b"0123456789");
        let mut marker = CompletionMarker::new("00".repeat(32), 0);
        marker.record_dir(tmp.path()).unwrap();

        write_file(tmp.path(), "results.json", b"0123");
        assert!(matches!(marker.verify(tmp.path()), Err(StoreError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_verify_detects_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "results.json", b"{}");
        let mut marker = CompletionMarker::new("00".repeat(32), 0);
        marker.record_dir(tmp.path()).unwrap();

        fs::remove_file(tmp.path().join("results.json")).unwrap();
        assert!(matches!(marker.verify(tmp.path()), Err(StoreError::MissingFile { .. })));
    }

    #[test]
    fn test_verify_detects_same_size_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "results.json", b"aaaa");
        let mut marker = CompletionMarker::new("00".repeat(32), 0);
        marker.record_dir(tmp.path()).unwrap();

        write_file(tmp.path(), "results.json", b"bbbb");
        assert!(matches!(marker.verify(tmp.path()), Err(StoreError::ChecksumMismatch { .. })));
    }
}
