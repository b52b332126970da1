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

//! Parameter Model
//!
//! This module provides the declaration and resolution side of memoir:
//! typed parameter declarations with defaults and constraints, nested
//! parametric nodes forming a tree, the configuration overlay that turns a
//! nested mapping plus the declared defaults into a resolved [`ParamTree`],
//! and the canonical encoding that gives every resolved tree a stable
//! content digest.
//!
//! # Usage
//!
//! ```rust
//! use memoir_core::params::{Constraint, ParamDigest, ParamSchema, ParamValue, overlay};
//! use serde_json::json;
//!
//! let output = ParamSchema::builder("Output").param("precision", 6).build().unwrap();
//! let schema = ParamSchema::builder("Sim")
//!     .param("steps", 100)
//!     .param("dt", 0.01)
//!     .param_with("method", "euler", Constraint::choice([
//!         ParamValue::from("euler"),
//!         ParamValue::from("rk4"),
//!     ]))
//!     .child("output", output)
//!     .build()
//!     .unwrap();
//!
//! let tree = overlay::resolve(&schema, &json!({
//!     "steps": 500,
//!     "output": {"precision": 12},
//! })).unwrap();
//!
//! assert_eq!(tree.get_i64("steps"), Some(500));
//! assert_eq!(tree.get_f64("dt"), Some(0.01));
//! let digest = ParamDigest::of_tree(&tree).unwrap();
//! assert_eq!(digest.as_str().len(), 64);
//! ```

pub mod canonical;
pub mod constraint;
pub mod overlay;
pub mod schema;
pub mod tree;
pub mod value;

// Re-export commonly used types
pub use canonical::{ParamDigest, canonical_tree, canonical_value, manifest_bytes};
pub use constraint::Constraint;
pub use schema::{ParamSchema, ParamSpec, SchemaBuilder};
pub use tree::{ParamNode, ParamTree};
pub use value::{FILE_REF_KEY, ParamValue, TypeTag};
