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

//! Content-addressed datastore.

use super::DataStore;
use crate::params::{ParamDigest, ParamTree};
use memoir_common::StoreResult;
use parking_lot::RwLock;
use std::path::PathBuf;
use tracing::debug;

/// Default root for hash-allocated store directories.
pub const DEFAULT_HASH_ROOT: &str = "data/memo";

/// Datastore whose directory is derived from the digest of a resolved
/// parameter tree: `<root>/<first 2 hex chars>/<remaining 62>`.
///
/// Two value-equal trees resolve to the same directory; any value
/// difference resolves elsewhere. Resolution is lazy because computing the
/// digest may read referenced input files; the result is cached for the
/// handle's lifetime.
pub struct HashDataStore {
    root: PathBuf,
    tree: ParamTree,
    digest: RwLock<Option<ParamDigest>>,
    resolved: RwLock<Option<PathBuf>>,
}

impl HashDataStore {
    pub fn new(root: impl Into<PathBuf>, tree: ParamTree) -> Self {
        Self {
            root: root.into(),
            tree,
            digest: RwLock::new(None),
            resolved: RwLock::new(None),
        }
    }

    /// Store under the default root.
    pub fn in_default_root(tree: ParamTree) -> Self {
        Self::new(DEFAULT_HASH_ROOT, tree)
    }

    /// The tree this store is keyed by.
    pub fn tree(&self) -> &ParamTree {
        &self.tree
    }

    /// Digest of the parameter tree; computed once and cached.
    pub fn digest(&self) -> StoreResult<ParamDigest> {
        if let Some(digest) = self.digest.read().as_ref() {
            return Ok(digest.clone());
        }
        let digest = ParamDigest::of_tree(&self.tree)?;
        debug!(digest = %digest, label = self.tree.label(), "computed parameter digest");
        *self.digest.write() = Some(digest.clone());
        Ok(digest)
    }
}

impl DataStore for HashDataStore {
    fn resolve(&self) -> StoreResult<PathBuf> {
        if let Some(dir) = self.resolved.read().as_ref() {
            return Ok(dir.clone());
        }
        let digest = self.digest()?;
        let (shard, rest) = digest.shard();
        let dir = self.root.join(shard).join(rest);
        *self.resolved.write() = Some(dir.clone());
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamSchema, overlay};
    use serde_json::json;

    fn tree(config: serde_json::Value) -> ParamTree {
        let schema = ParamSchema::builder("Sim").param("a", 1).build().unwrap();
        overlay::resolve(&schema, &config).unwrap()
    }

    #[test]
    fn test_layout_is_sharded() {
        let store = HashDataStore::new("data/memo", tree(json!({})));
        let dir = store.resolve().unwrap();
        let digest = store.digest().unwrap();
        let (shard, rest) = digest.shard();
        assert_eq!(dir, PathBuf::from("data/memo").join(shard).join(rest));
    }

    #[test]
    fn test_same_tree_same_dir() {
        let a = HashDataStore::new("root", tree(json!({"a": 2})));
        let b = HashDataStore::new("root", tree(json!({"a": 2})));
        assert_eq!(a.resolve().unwrap(), b.resolve().unwrap());
    }

    #[test]
    fn test_different_value_different_dir() {
        let a = HashDataStore::new("root", tree(json!({"a": 1})));
        let b = HashDataStore::new("root", tree(json!({"a": 2})));
        assert_ne!(a.resolve().unwrap(), b.resolve().unwrap());
    }

    #[test]
    fn test_resolution_does_not_create_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HashDataStore::new(tmp.path().join("memo"), tree(json!({})));
        let dir = store.resolve().unwrap();
        assert!(!dir.exists());
    }
}
