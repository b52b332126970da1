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

//! Parameter leaf values and their type tags.

use memoir_common::{NodePath, ParamError, ParamResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Key marking a JSON object as a file reference rather than a map value.
pub const FILE_REF_KEY: &str = "$file";

/// A parameter value.
///
/// Collections nest arbitrarily. `FileRef` names an input file whose
/// *content* (not path) identifies the parameter for hashing purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
    FileRef(PathBuf),
}

/// Type tag of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    File,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::File => "file",
        };
        write!(f, "{}", name)
    }
}

impl ParamValue {
    /// Type tag of this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            ParamValue::Bool(_) => TypeTag::Bool,
            ParamValue::Int(_) => TypeTag::Int,
            ParamValue::Float(_) => TypeTag::Float,
            ParamValue::Str(_) => TypeTag::Str,
            ParamValue::List(_) => TypeTag::List,
            ParamValue::Map(_) => TypeTag::Map,
            ParamValue::FileRef(_) => TypeTag::File,
        }
    }

    /// Widen this value toward `target` where a lossless cast exists.
    ///
    /// The only widening performed is `Int` to `Float`, mirroring the cast
    /// rules of numeric parameter assignment. Any other combination returns
    /// the value unchanged.
    pub fn widen_toward(self, target: TypeTag) -> ParamValue {
        match (&self, target) {
            (ParamValue::Int(i), TypeTag::Float) => ParamValue::Float(*i as f64),
            _ => self,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check that every float reachable from this value is finite.
    ///
    /// Non-finite floats have no canonical JSON form, so they are rejected
    /// before they can reach a digest or a manifest.
    pub fn ensure_finite(&self) -> ParamResult<()> {
        match self {
            ParamValue::Float(f) if !f.is_finite() => Err(ParamError::NonFiniteFloat(*f)),
            ParamValue::List(items) => items.iter().try_for_each(ParamValue::ensure_finite),
            ParamValue::Map(entries) => entries.values().try_for_each(ParamValue::ensure_finite),
            _ => Ok(()),
        }
    }

    /// Convert a JSON configuration value into a parameter value.
    ///
    /// An object whose single key is [`FILE_REF_KEY`] becomes a `FileRef`;
    /// every other object becomes a `Map`. `null` is not a parameter value.
    pub fn from_json(value: &Value, path: &NodePath) -> ParamResult<ParamValue> {
        match value {
            Value::Null => Err(ParamError::TypeMismatch {
                path: path.clone(),
                expected: "a parameter value".to_string(),
                got: "null".to_string(),
            }),
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Int(i))
                } else if n.is_u64() {
                    Err(ParamError::TypeMismatch {
                        path: path.clone(),
                        expected: "an integer within i64 range".to_string(),
                        got: n.to_string(),
                    })
                } else if let Some(f) = n.as_f64() {
                    Ok(ParamValue::Float(f))
                } else {
                    Err(ParamError::TypeMismatch {
                        path: path.clone(),
                        expected: "a number".to_string(),
                        got: n.to_string(),
                    })
                }
            }
            Value::String(s) => Ok(ParamValue::Str(s.clone())),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(ParamValue::from_json(item, path)?);
                }
                Ok(ParamValue::List(list))
            }
            Value::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(Value::String(p)) = obj.get(FILE_REF_KEY) {
                        return Ok(ParamValue::FileRef(PathBuf::from(p)));
                    }
                }
                let mut map = BTreeMap::new();
                for (key, val) in obj {
                    map.insert(key.clone(), ParamValue::from_json(val, path)?);
                }
                Ok(ParamValue::Map(map))
            }
        }
    }

    /// Plain JSON rendering of this value.
    ///
    /// `FileRef` keeps its path form here; content hashing only happens in
    /// the canonical encoding.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Value::from(*f),
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::List(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
            ParamValue::Map(entries) => {
                let mut obj = serde_json::Map::new();
                for (key, val) in entries {
                    obj.insert(key.clone(), val.to_json());
                }
                Value::Object(obj)
            }
            ParamValue::FileRef(path) => {
                let mut obj = serde_json::Map::new();
                obj.insert(FILE_REF_KEY.to_string(), Value::String(path.display().to_string()));
                Value::Object(obj)
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(items: Vec<ParamValue>) -> Self {
        ParamValue::List(items)
    }
}

impl From<BTreeMap<String, ParamValue>> for ParamValue {
    fn from(entries: BTreeMap<String, ParamValue>) -> Self {
        ParamValue::Map(entries)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
