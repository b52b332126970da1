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

//! Error types for the parameter, datastore and execution layers.
//!
//! Each layer has its own enum with a matching `Result` alias; the execution
//! layer wraps the two lower ones via `#[from]` so that `?` composes across
//! the whole stack.

use crate::path::NodePath;
use std::path::PathBuf;

/// Parameter declaration and resolution error types
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter key: {0}")]
    UnknownKey(NodePath),

    #[error("{path}: expected {expected}, got {got}")]
    TypeMismatch { path: NodePath, expected: String, got: String },

    #[error("{path}: {reason}")]
    ConstraintViolation { path: NodePath, reason: String },

    #[error("missing required parameter: {0}")]
    MissingRequired(NodePath),

    #[error("parameter floats must be finite: got {0}")]
    NonFiniteFloat(f64),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("cannot hash referenced file {}: {source}", .path.display())]
    FileRef {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ParamError {
    fn from(err: serde_json::Error) -> Self {
        ParamError::Serialization(err.to_string())
    }
}

/// Type alias for parameter operation results
pub type ParamResult<T> = Result<T, ParamError>;

/// Datastore resolution and persistence error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("datastore directory is not resolved")]
    Unresolved,

    #[error("directory {} is not writable", .0.display())]
    NotWritable(PathBuf),

    #[error("directory {} holds parameters for a different tree", .dir.display())]
    DigestCollision { dir: PathBuf },

    #[error("directory {} holds an incomplete result set", .0.display())]
    Incomplete(PathBuf),

    #[error("corrupt completion marker at {}: {reason}", .path.display())]
    CorruptMarker { path: PathBuf, reason: String },

    #[error("checksum mismatch for result file {file}")]
    ChecksumMismatch { file: String },

    #[error("result file listed in marker is missing: {file}")]
    MissingFile { file: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Type alias for datastore operation results
pub type StoreResult<T> = Result<T, StoreError>;

/// Execution lifecycle error types
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    #[error("no result named {0}")]
    MissingResult(String),

    #[error("computation failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for ExecError {
    fn from(err: serde_json::Error) -> Self {
        ExecError::Param(ParamError::Serialization(err.to_string()))
    }
}

/// Type alias for execution results
pub type ExecResult<T> = Result<T, ExecError>;
