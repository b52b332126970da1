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

//! The `results` namespace of an execution.
//!
//! Downstream consumers must rely only on what a computation puts here;
//! this is exactly the set of values that survives a save/load round trip.

use memoir_common::{ExecError, ExecResult, StoreError, StoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Named outputs of a computation, persisted as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: BTreeMap<String, Value>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a serializable value under `name`.
    pub fn insert<T: Serialize>(&mut self, name: impl Into<String>, value: T) -> ExecResult<()> {
        let encoded = serde_json::to_value(value)?;
        self.entries.insert(name.into(), encoded);
        Ok(())
    }

    /// Store a raw JSON value under `name`.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Fetch and decode the value stored under `name`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> ExecResult<T> {
        let value = self.entries.get(name).ok_or_else(|| ExecError::MissingResult(name.to_string()))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (name, value) in &self.entries {
            obj.insert(name.clone(), value.clone());
        }
        Value::Object(obj)
    }

    pub fn from_json(value: Value) -> ExecResult<Self> {
        match value {
            Value::Object(obj) => Ok(Self {
                entries: obj.into_iter().collect(),
            }),
            other => Err(ExecError::Failed(format!("result file must hold a JSON object, got {}", other))),
        }
    }

    /// Persist to `path` as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.to_json())?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a result set back from `path`.
    pub fn read(path: &Path) -> StoreResult<Self> {
        let bytes = fs::read(path)?;
        let value: Value = serde_json::from_slice(&bytes)?;
        Self::from_json(value).map_err(|err| StoreError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut results = ResultSet::new();
        results.insert("mean", 2.5).unwrap();
        results.insert("counts", vec![1, 2, 3]).unwrap();

        let mean: f64 = results.get("mean").unwrap();
        assert_eq!(mean, 2.5);
        let counts: Vec<i64> = results.get("counts").unwrap();
        assert_eq!(counts, vec![1, 2, 3]);
        assert!(matches!(results.get::<f64>("missing"), Err(ExecError::MissingResult(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.json");

        let mut results = ResultSet::new();
        results.insert("alpha", json!({"pi": 3.14})).unwrap();
        results.write(&path).unwrap();

        let loaded = ResultSet::read(&path).unwrap();
        assert_eq!(loaded, results);
    }

    #[test]
    fn test_non_object_file_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results.json");
        fs::write(&path, b"[1,2,3]").unwrap();
        assert!(ResultSet::read(&path).is_err());
    }
}
