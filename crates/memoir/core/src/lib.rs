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

//! Memoir core: parametric computations with content-addressed result
//! caching.
//!
//! # Core Components
//!
//! ## Parameter Model
//! - Typed declarations with defaults and constraints
//! - Nested parametric nodes forming a tree
//! - Configuration overlay with construction-time validation
//! - Canonical encoding and BLAKE3 digest of resolved trees
//!
//! ## Datastores
//! - Explicit directory, owner-relative and digest-addressed stores
//! - Completion markers with per-file checksums
//!
//! ## Execution
//! - Fixed prepare/run-or-load/finish lifecycle with plugin hooks
//! - Result namespace persisted as JSON
//!
//! ## Memoization
//! - Run-or-load decision from the store's completeness
//! - Crash recovery and loud collision detection
//!
//! # Usage
//!
//! ```rust
//! use memoir_core::exec::{Computation, ExecContext, ExecOutcome};
//! use memoir_core::memo::Memoizer;
//! use memoir_core::params::{ParamSchema, overlay};
//! use memoir_common::ExecResult;
//! use serde_json::json;
//!
//! struct Mean;
//!
//! impl Computation for Mean {
//!     fn run(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
//!         let n = ctx.params().get_i64("n").unwrap_or(0);
//!         ctx.results.insert("mean", (n as f64 + 1.0) / 2.0)?;
//!         Ok(())
//!     }
//! }
//!
//! let schema = ParamSchema::builder("Mean").param("n", 10).build().unwrap();
//! let tree = overlay::resolve(&schema, &json!({"n": 100})).unwrap();
//!
//! let root = tempfile::tempdir().unwrap();
//! let mut memoizer = Memoizer::new(root.path());
//! let first = memoizer.execute(&mut Mean, tree.clone()).unwrap();
//! assert_eq!(first.outcome, ExecOutcome::Computed);
//!
//! // same parameters: the stored results are loaded instead
//! let second = memoizer.execute(&mut Mean, tree).unwrap();
//! assert_eq!(second.outcome, ExecOutcome::Loaded);
//! assert_eq!(first.results, second.results);
//! ```

pub mod exec;
pub mod memo;
pub mod params;
pub mod store;

// Re-export commonly used types
pub use exec::{Computation, Driver, DumpParameters, DumpResults, ExecContext, ExecMode, ExecOutcome, ExecState, LifecycleHook, LogPhases, MetaStore, ResultSet};
pub use memo::{MemoRun, Memoizer};
pub use memoir_common::{ExecError, ExecResult, NodePath, ParamError, ParamResult, StoreError, StoreResult};
pub use params::{Constraint, ParamDigest, ParamSchema, ParamTree, ParamValue, TypeTag, overlay};
pub use store::{DataStore, DirectoryDataStore, HashDataStore, SubDataStore};
