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

//! Shared types for the memoir workspace.
//!
//! This crate holds the pieces every other memoir crate needs: the error
//! enums for the parameter, datastore and execution layers, and the dotted
//! [`NodePath`] type used to address nodes inside a parameter tree.

pub mod errors;
pub mod path;

pub use errors::{ExecError, ExecResult, ParamError, ParamResult, StoreError, StoreResult};
pub use path::NodePath;
