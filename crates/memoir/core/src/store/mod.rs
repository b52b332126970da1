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

//! Datastores
//!
//! A datastore maps an executable to the directory its parameters and
//! results live in. Three strategies are provided:
//!
//! - [`DirectoryDataStore`]: an explicit directory, or a subdirectory of
//!   the owner's store for nested nodes;
//! - [`SubDataStore`]: no directory of its own; files are prefixed into
//!   the owner's directory;
//! - [`HashDataStore`]: a directory derived from the digest of the
//!   resolved parameter tree, the basis of result memoization.
//!
//! Resolution is lazy and cached for the handle's lifetime. Directories
//! are only created when a path is handed out for writing.

pub mod directory;
pub mod hash;
pub mod marker;
pub mod sub;

pub use directory::DirectoryDataStore;
pub use hash::HashDataStore;
pub use marker::{CompletionMarker, FileRecord, MARKER_FILE};
pub use sub::SubDataStore;

use memoir_common::StoreResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside a store directory.
pub const PARAMS_FILE: &str = "params.json";
/// Result-set file name inside a store directory.
pub const RESULTS_FILE: &str = "results.json";

/// Directory handle used by executables and lifecycle plugins.
pub trait DataStore: Send + Sync {
    /// The directory this store points at. Lazy; cached after the first
    /// successful call.
    fn resolve(&self) -> StoreResult<PathBuf>;

    /// Path of a file under this store, creating intermediate directories
    /// so the caller can write to it directly.
    fn path(&self, parts: &[&str]) -> StoreResult<PathBuf> {
        let mut path = self.resolve()?;
        for part in parts {
            path.push(part);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Whether a file exists under this store. Never creates directories.
    fn exists(&self, parts: &[&str]) -> bool {
        match self.resolve() {
            Ok(mut path) => {
                for part in parts {
                    path.push(part);
                }
                path.exists()
            }
            Err(_) => false,
        }
    }

    /// Whether the store's directory can be created and written to.
    fn is_writable(&self) -> bool {
        self.resolve().map(|dir| probe_writable(&dir)).unwrap_or(false)
    }
}

/// Check whether `target` could be written to, walking up to the nearest
/// existing ancestor when the directory itself does not exist yet.
pub fn probe_writable(target: &Path) -> bool {
    let mut current = target;
    loop {
        if current.exists() {
            return fs::metadata(current).map(|meta| !meta.permissions().readonly()).unwrap_or(false);
        }
        match current.parent() {
            Some(parent) if parent.as_os_str().is_empty() => current = Path::new("."),
            Some(parent) => current = parent,
            None => return false,
        }
    }
}
