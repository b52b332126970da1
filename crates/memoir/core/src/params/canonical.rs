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

//! Canonical encoding and digest of a resolved parameter tree.
//!
//! This module is a compatibility contract: the directory a result set
//! lands in is derived from these exact rules, and changing any of them
//! invalidates every existing store.
//!
//! - The digest input is the compact JSON encoding of the two-element
//!   array `[label, params]`, where `params` maps each entry name to its
//!   canonical value and object keys are in lexicographic order.
//! - A `FileRef` leaf encodes as `{"file#blake3": "<hex>"}` where `<hex>`
//!   is the BLAKE3 digest of the referenced file's content. Two trees
//!   pointing at byte-identical inputs therefore hash equal regardless of
//!   where those inputs live.
//! - The digest is BLAKE3 over the canonical bytes, rendered as lowercase
//!   hex, and split `2 + 62` to form the store subdirectory.

use super::tree::{ParamNode, ParamTree};
use super::value::ParamValue;
use memoir_common::{ParamError, ParamResult};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Key under which a file reference's content hash is recorded.
const FILE_HASH_KEY: &str = "file#blake3";

/// Canonical JSON form of a single parameter value.
pub fn canonical_value(value: &ParamValue) -> ParamResult<Value> {
    match value {
        ParamValue::Bool(b) => Ok(Value::Bool(*b)),
        ParamValue::Int(i) => Ok(Value::from(*i)),
        ParamValue::Float(f) => {
            if !f.is_finite() {
                return Err(ParamError::NonFiniteFloat(*f));
            }
            Ok(Value::from(*f))
        }
        ParamValue::Str(s) => Ok(Value::String(s.clone())),
        ParamValue::List(items) => {
            let mut encoded = Vec::with_capacity(items.len());
            for item in items {
                encoded.push(canonical_value(item)?);
            }
            Ok(Value::Array(encoded))
        }
        ParamValue::Map(entries) => {
            let mut obj = serde_json::Map::new();
            for (key, val) in entries {
                obj.insert(key.clone(), canonical_value(val)?);
            }
            Ok(Value::Object(obj))
        }
        ParamValue::FileRef(path) => {
            let digest = hash_file(path)?;
            let mut obj = serde_json::Map::new();
            obj.insert(FILE_HASH_KEY.to_string(), Value::String(digest));
            Ok(Value::Object(obj))
        }
    }
}

/// Canonical JSON object for a resolved tree node.
pub fn canonical_tree(tree: &ParamTree) -> ParamResult<Value> {
    let mut obj = serde_json::Map::new();
    for (name, node) in tree.entries() {
        let encoded = match node {
            ParamNode::Leaf(value) => canonical_value(value)?,
            ParamNode::Nested(child) => canonical_tree(child)?,
        };
        obj.insert(name.to_string(), encoded);
    }
    Ok(Value::Object(obj))
}

/// The exact bytes the digest is computed over: `[label, params]`.
///
/// These bytes are also what `params.json` contains, so a stored manifest
/// can be compared byte-for-byte against a freshly resolved tree.
pub fn manifest_bytes(tree: &ParamTree) -> ParamResult<Vec<u8>> {
    let encoded = Value::Array(vec![Value::String(tree.label().to_string()), canonical_tree(tree)?]);
    Ok(serde_json::to_vec(&encoded)?)
}

/// BLAKE3 digest of a resolved parameter tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamDigest(String);

impl ParamDigest {
    /// Compute the digest of a resolved tree.
    pub fn of_tree(tree: &ParamTree) -> ParamResult<Self> {
        let bytes = manifest_bytes(tree)?;
        let hash = blake3::hash(&bytes);
        Ok(Self(hex::encode(hash.as_bytes())))
    }

    /// Reconstruct a digest from its hex form (e.g. read back from a marker).
    pub fn from_hex(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split for the on-disk layout: 2-char shard directory + remainder.
    pub fn shard(&self) -> (&str, &str) {
        self.0.split_at(2)
    }
}

impl fmt::Display for ParamDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BLAKE3 hex digest of a file's content.
fn hash_file(path: &Path) -> ParamResult<String> {
    let mut file = File::open(path).map_err(|source| ParamError::FileRef {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher).map_err(|source| ParamError::FileRef {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::overlay;
    use crate::params::schema::ParamSchema;
    use serde_json::json;
    use std::io::Write;

    fn schema() -> ParamSchema {
        let nested = ParamSchema::builder("Output").param("precision", 6).build().unwrap();
        ParamSchema::builder("Sim")
            .param("steps", 100)
            .param("dt", 0.01)
            .child("output", nested)
            .build()
            .unwrap()
    }

    #[test]
    fn test_manifest_is_sorted_and_compact() {
        let tree = overlay::defaults(&schema()).unwrap();
        let text = String::from_utf8(manifest_bytes(&tree).unwrap()).unwrap();
        assert_eq!(text, r#"["Sim",{"dt":0.01,"output":{"precision":6},"steps":100}]"#);
    }

    #[test]
    fn test_equal_trees_equal_digest() {
        let a = overlay::resolve(&schema(), &json!({"steps": 7})).unwrap();
        let b = overlay::resolve(&schema(), &json!({"steps": 7})).unwrap();
        assert_eq!(ParamDigest::of_tree(&a).unwrap(), ParamDigest::of_tree(&b).unwrap());
    }

    #[test]
    fn test_value_difference_changes_digest() {
        let a = overlay::defaults(&schema()).unwrap();
        let b = overlay::resolve(&schema(), &json!({"output": {"precision": 7}})).unwrap();
        assert_ne!(ParamDigest::of_tree(&a).unwrap(), ParamDigest::of_tree(&b).unwrap());
    }

    #[test]
    fn test_label_participates_in_digest() {
        let other = ParamSchema::builder("Sim2")
            .param("steps", 100)
            .param("dt", 0.01)
            .child("output", ParamSchema::builder("Output").param("precision", 6).build().unwrap())
            .build()
            .unwrap();
        let a = overlay::defaults(&schema()).unwrap();
        let b = overlay::defaults(&other).unwrap();
        assert_ne!(ParamDigest::of_tree(&a).unwrap(), ParamDigest::of_tree(&b).unwrap());
    }

    #[test]
    fn test_shard_split() {
        let tree = overlay::defaults(&schema()).unwrap();
        let digest = ParamDigest::of_tree(&tree).unwrap();
        let (head, tail) = digest.shard();
        assert_eq!(head.len(), 2);
        assert_eq!(tail.len(), 62);
        assert_eq!(format!("{}{}", head, tail), digest.as_str());
    }

    #[test]
    fn test_file_ref_hashes_content_not_path() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");
        std::fs::File::create(&path_a).unwrap().write_all(b"1,2,3\n").unwrap();
        std::fs::File::create(&path_b).unwrap().write_all(b"1,2,3\n").unwrap();

        let make = |path: &std::path::Path| {
            let schema = ParamSchema::builder("Load")
                .param("input", ParamValue::FileRef(path.to_path_buf()))
                .build()
                .unwrap();
            overlay::defaults(&schema).unwrap()
        };
        let digest_a = ParamDigest::of_tree(&make(&path_a)).unwrap();
        let digest_b = ParamDigest::of_tree(&make(&path_b)).unwrap();
        assert_eq!(digest_a, digest_b);

        std::fs::File::create(&path_b).unwrap().write_all(b"4,5,6\n").unwrap();
        let digest_b = ParamDigest::of_tree(&make(&path_b)).unwrap();
        assert_ne!(digest_a, digest_b);
    }

    #[test]
    fn test_missing_file_ref_fails() {
        let schema = ParamSchema::builder("Load")
            .param("input", ParamValue::FileRef("no/such/file".into()))
            .build()
            .unwrap();
        let tree = overlay::defaults(&schema).unwrap();
        assert!(matches!(ParamDigest::of_tree(&tree), Err(ParamError::FileRef { .. })));
    }
}
