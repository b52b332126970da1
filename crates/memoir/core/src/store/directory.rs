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

//! Directory-backed datastore.

use super::DataStore;
use memoir_common::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Datastore pointing at a directory.
///
/// Either the directory is set explicitly, or the store belongs to a
/// nested node and resolves to `<owner dir>/<node name>`.
pub struct DirectoryDataStore {
    explicit: Option<PathBuf>,
    owner: Option<(Arc<dyn DataStore>, String)>,
    resolved: RwLock<Option<PathBuf>>,
    clear_before_run: bool,
}

impl DirectoryDataStore {
    /// Store with an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(dir.into()),
            owner: None,
            resolved: RwLock::new(None),
            clear_before_run: true,
        }
    }

    /// Store for a nested node, allocated under the owner's directory.
    pub fn under(owner: Arc<dyn DataStore>, name: impl Into<String>) -> Self {
        Self {
            explicit: None,
            owner: Some((owner, name.into())),
            resolved: RwLock::new(None),
            clear_before_run: true,
        }
    }

    /// Whether an incomplete directory may be cleared before re-running.
    pub fn clear_before_run(&self) -> bool {
        self.clear_before_run
    }

    pub fn with_clear_before_run(mut self, clear: bool) -> Self {
        self.clear_before_run = clear;
        self
    }
}

impl DataStore for DirectoryDataStore {
    fn resolve(&self) -> StoreResult<PathBuf> {
        if let Some(dir) = &self.explicit {
            return Ok(dir.clone());
        }
        if let Some(dir) = self.resolved.read().as_ref() {
            return Ok(dir.clone());
        }
        let (owner, name) = self.owner.as_ref().ok_or(StoreError::Unresolved)?;
        let dir = owner.resolve()?.join(name);
        *self.resolved.write() = Some(dir.clone());
        Ok(dir)
    }
}
