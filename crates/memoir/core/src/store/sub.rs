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

//! Datastore sharing the owner's directory.

use super::DataStore;
use memoir_common::StoreResult;
use std::path::PathBuf;
use std::sync::Arc;

/// Datastore that puts its files directly into the owner's directory,
/// prefixed with the node name.
///
/// A node that only ever writes a file or two does not deserve a
/// directory; `file` for node `density` lands at
/// `<owner dir>/density-file`. The separator is configurable.
pub struct SubDataStore {
    owner: Arc<dyn DataStore>,
    name: String,
    sep: String,
}

impl SubDataStore {
    pub fn new(owner: Arc<dyn DataStore>, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            sep: "-".to_string(),
        }
    }

    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = sep.into();
        self
    }
}

impl DataStore for SubDataStore {
    fn resolve(&self) -> StoreResult<PathBuf> {
        self.owner.resolve()
    }

    fn path(&self, parts: &[&str]) -> StoreResult<PathBuf> {
        match parts.split_first() {
            None => self.owner.path(&[self.name.as_str()]),
            Some((first, rest)) => {
                let prefixed = format!("{}{}{}", self.name, self.sep, first);
                let mut parts = Vec::with_capacity(rest.len() + 1);
                parts.push(prefixed.as_str());
                parts.extend_from_slice(rest);
                self.owner.path(&parts)
            }
        }
    }

    fn exists(&self, parts: &[&str]) -> bool {
        match parts.split_first() {
            None => self.owner.exists(&[self.name.as_str()]),
            Some((first, rest)) => {
                let prefixed = format!("{}{}{}", self.name, self.sep, first);
                let mut parts = Vec::with_capacity(rest.len() + 1);
                parts.push(prefixed.as_str());
                parts.extend_from_slice(rest);
                self.owner.exists(&parts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DirectoryDataStore;

    fn owner(tmp: &tempfile::TempDir) -> Arc<dyn DataStore> {
        Arc::new(DirectoryDataStore::new(tmp.path().join("out")))
    }

    #[test]
    fn test_files_are_prefixed_into_owner_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SubDataStore::new(owner(&tmp), "density");
        let out = tmp.path().join("out");
        assert_eq!(store.path(&[]).unwrap(), out.join("density"));
        assert_eq!(store.path(&["file"]).unwrap(), out.join("density-file"));
        assert_eq!(store.path(&["dir", "file"]).unwrap(), out.join("density-dir").join("file"));
    }

    #[test]
    fn test_custom_separator() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SubDataStore::new(owner(&tmp), "density").with_sep(".");
        assert_eq!(store.path(&["file"]).unwrap(), tmp.path().join("out").join("density.file"));
    }

    #[test]
    fn test_exists_sees_prefixed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SubDataStore::new(owner(&tmp), "density");
        assert!(!store.exists(&["file"]));
        std::fs::write(store.path(&["file"]).unwrap(), b"x").unwrap();
        assert!(store.exists(&["file"]));
    }
}
