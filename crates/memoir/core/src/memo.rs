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

//! Result memoization.
//!
//! A [`Memoizer`] executes a computation against a [`HashDataStore`]: when
//! the digest-addressed directory already holds a complete result set, the
//! run is skipped and the results are loaded; otherwise the computation
//! runs and its directory is published with a completion marker written
//! last. A directory without a valid, verifying marker is never treated as
//! complete, so a crashed run is recomputed on the next attempt.

use crate::exec::{Computation, Driver, ExecContext, ExecMode, ExecOutcome, LifecycleHook, ResultSet};
use crate::params::{ParamDigest, ParamTree, manifest_bytes};
use crate::store::hash::DEFAULT_HASH_ROOT;
use crate::store::marker::CompletionMarker;
use crate::store::{DataStore, HashDataStore, PARAMS_FILE, RESULTS_FILE};
use memoir_common::{ExecResult, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// What the memoizer found in the target directory.
#[derive(Debug, PartialEq, Eq)]
enum StoreStatus {
    /// Nothing there yet.
    Fresh,
    /// A marker exists and every listed file verifies.
    Complete,
    /// Directory exists but cannot be trusted (no marker, corrupt marker,
    /// or failed verification).
    Incomplete,
}

/// Outcome of a memoized execution.
#[derive(Debug)]
pub struct MemoRun {
    /// Whether the computation ran or its results were loaded.
    pub outcome: ExecOutcome,
    /// Digest of the resolved parameter tree.
    pub digest: ParamDigest,
    /// The digest-addressed directory.
    pub dir: PathBuf,
    /// The result namespace after the lifecycle completed.
    pub results: ResultSet,
}

/// Executes computations with digest-addressed result caching.
pub struct Memoizer {
    root: PathBuf,
    clear_before_run: bool,
    hooks: Vec<Box<dyn LifecycleHook>>,
}

impl Memoizer {
    /// Memoizer rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clear_before_run: true,
            hooks: Vec::new(),
        }
    }

    /// Memoizer under the default store root.
    pub fn in_default_root() -> Self {
        Self::new(DEFAULT_HASH_ROOT)
    }

    /// Register an additional lifecycle hook, invoked on every execution.
    pub fn with_hook(mut self, hook: Box<dyn LifecycleHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Whether an untrusted directory may be cleared and recomputed.
    /// When disabled, hitting one is an error instead.
    pub fn with_clear_before_run(mut self, clear: bool) -> Self {
        self.clear_before_run = clear;
        self
    }

    /// Execute `comp` for the resolved tree, loading instead of running
    /// when a complete result set for the same parameters already exists.
    pub fn execute(&mut self, comp: &mut dyn Computation, tree: ParamTree) -> ExecResult<MemoRun> {
        let store = Arc::new(HashDataStore::new(&self.root, tree.clone()));
        let digest = store.digest()?;
        let dir = store.resolve()?;
        let manifest = manifest_bytes(&tree)?;

        let status = assess_dir(&dir, &manifest, &digest)?;
        match status {
            StoreStatus::Complete => {
                info!(digest = %digest, dir = %dir.display(), "found complete result set, loading");
                let mut ctx = ExecContext::new(tree, store);
                let mut driver = Driver::new(ExecMode::Load);
                driver.execute(comp, &mut ctx, &mut self.hooks)?;
                Ok(MemoRun {
                    outcome: ExecOutcome::Loaded,
                    digest,
                    dir,
                    results: ctx.results,
                })
            }
            StoreStatus::Incomplete => {
                if !self.clear_before_run {
                    return Err(StoreError::Incomplete(dir).into());
                }
                warn!(dir = %dir.display(), "clearing incomplete store directory before re-running");
                fs::remove_dir_all(&dir).map_err(StoreError::from)?;
                self.run_fresh(comp, tree, store, digest, dir, &manifest)
            }
            StoreStatus::Fresh => self.run_fresh(comp, tree, store, digest, dir, &manifest),
        }
    }

    fn run_fresh(
        &mut self,
        comp: &mut dyn Computation,
        tree: ParamTree,
        store: Arc<HashDataStore>,
        digest: ParamDigest,
        dir: PathBuf,
        manifest: &[u8],
    ) -> ExecResult<MemoRun> {
        fs::create_dir_all(&dir).map_err(StoreError::from)?;
        fs::write(dir.join(PARAMS_FILE), manifest).map_err(StoreError::from)?;
        let started_at_ms = now_ms();

        let mut ctx = ExecContext::new(tree, store);
        let mut driver = Driver::new(ExecMode::Run);
        driver.execute(comp, &mut ctx, &mut self.hooks)?;

        ctx.results.write(&dir.join(RESULTS_FILE))?;

        // The marker is the commit point: everything above may be observed
        // half-written, nothing below it exists until rename succeeds.
        let mut marker = CompletionMarker::new(digest.as_str(), started_at_ms);
        marker.record_dir(&dir)?;
        marker.write_atomic(&dir)?;
        info!(digest = %digest, dir = %dir.display(), files = marker.files.len(), "published result set");

        Ok(MemoRun {
            outcome: ExecOutcome::Computed,
            digest,
            dir,
            results: ctx.results,
        })
    }
}

/// Classify the target directory, failing loudly when it belongs to
/// different parameters.
fn assess_dir(dir: &Path, manifest: &[u8], digest: &ParamDigest) -> ExecResult<StoreStatus> {
    if !dir.exists() {
        return Ok(StoreStatus::Fresh);
    }

    match fs::read(dir.join(PARAMS_FILE)) {
        Ok(stored) if stored != manifest => {
            return Err(StoreError::DigestCollision { dir: dir.to_path_buf() }.into());
        }
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            // no manifest: either an empty leftover or a crashed run
            let empty = fs::read_dir(dir).map_err(StoreError::from)?.next().is_none();
            return Ok(if empty { StoreStatus::Fresh } else { StoreStatus::Incomplete });
        }
        Err(err) => return Err(StoreError::from(err).into()),
    }

    match CompletionMarker::load(dir) {
        Ok(Some(marker)) => {
            if marker.digest != digest.as_str() {
                return Err(StoreError::DigestCollision { dir: dir.to_path_buf() }.into());
            }
            match marker.verify(dir) {
                Ok(()) => Ok(StoreStatus::Complete),
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "marker present but result set does not verify");
                    Ok(StoreStatus::Incomplete)
                }
            }
        }
        Ok(None) => Ok(StoreStatus::Incomplete),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "unreadable completion marker");
            Ok(StoreStatus::Incomplete)
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamSchema, overlay};
    use serde_json::json;

    struct Squarer {
        runs: usize,
    }

    impl Computation for Squarer {
        fn run(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
            self.runs += 1;
            let x = ctx.params().get_i64("x").unwrap_or(0);
            ctx.results.insert("squared", x * x)?;
            Ok(())
        }
    }

    fn tree(x: i64) -> ParamTree {
        let schema = ParamSchema::builder("Squarer").param("x", 3).build().unwrap();
        overlay::resolve(&schema, &json!({ "x": x })).unwrap()
    }

    #[test]
    fn test_run_publishes_marker_last() {
        let tmp = tempfile::tempdir().unwrap();
        let mut memoizer = Memoizer::new(tmp.path().join("memo"));
        let mut comp = Squarer { runs: 0 };

        let run = memoizer.execute(&mut comp, tree(4)).unwrap();
        assert_eq!(run.outcome, ExecOutcome::Computed);
        assert!(run.dir.join(PARAMS_FILE).is_file());
        assert!(run.dir.join(RESULTS_FILE).is_file());
        let marker = CompletionMarker::load(&run.dir).unwrap().unwrap();
        assert_eq!(marker.digest, run.digest.as_str());
        marker.verify(&run.dir).unwrap();
    }

    #[test]
    fn test_collision_with_foreign_parameters_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut memoizer = Memoizer::new(tmp.path().join("memo"));
        let mut comp = Squarer { runs: 0 };
        let run = memoizer.execute(&mut comp, tree(4)).unwrap();

        // overwrite the stored manifest so it no longer matches
        fs::write(run.dir.join(PARAMS_FILE), b"[\"Other\",{}]").unwrap();
        let err = memoizer.execute(&mut comp, tree(4)).unwrap_err();
        assert!(err.to_string().contains("different tree"));
        assert_eq!(comp.runs, 1);
    }
}
