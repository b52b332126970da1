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

//! Built-in lifecycle plugins.
//!
//! These cover the bookkeeping every execution wants: persisting the
//! parameter manifest and the result set, flushing metadata records, and
//! tracing the lifecycle phases. Plugins that cannot reach a usable
//! datastore skip their work instead of failing; an execution without a
//! configured datastore is legitimate, it just keeps nothing.

use super::{ExecContext, LifecycleHook};
use crate::params::manifest_bytes;
use crate::store::{DataStore, PARAMS_FILE, RESULTS_FILE};
use memoir_common::ExecResult;
use std::fs;
use tracing::{debug, info};

/// Writes the canonical parameter manifest as `params.json` before the run.
#[derive(Debug, Default)]
pub struct DumpParameters;

impl LifecycleHook for DumpParameters {
    fn pre_run(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        if !ctx.store().is_writable() {
            debug!("datastore not writable, skipping parameter dump");
            return Ok(());
        }
        let bytes = manifest_bytes(ctx.params())?;
        let path = ctx.store().path(&[PARAMS_FILE])?;
        fs::write(&path, bytes).map_err(memoir_common::StoreError::from)?;
        debug!(path = %path.display(), "wrote parameter manifest");
        Ok(())
    }
}

/// Writes the `results` namespace as `results.json` during save.
#[derive(Debug, Default)]
pub struct DumpResults;

impl LifecycleHook for DumpResults {
    fn save(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        if !ctx.store().is_writable() {
            debug!("datastore not writable, skipping result dump");
            return Ok(());
        }
        let path = ctx.store().path(&[RESULTS_FILE])?;
        ctx.results.write(&path)?;
        debug!(path = %path.display(), count = ctx.results.len(), "wrote results");
        Ok(())
    }
}

/// Persists the context's metadata records as `meta.json`.
pub struct MetaStore {
    file: String,
}

impl MetaStore {
    pub fn new() -> Self {
        Self {
            file: "meta.json".to_string(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }
}

impl Default for MetaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleHook for MetaStore {
    fn save(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        if ctx.meta.is_empty() {
            return Ok(());
        }
        if !ctx.store().is_writable() {
            debug!("datastore not writable, not saving metadata");
            return Ok(());
        }
        let path = ctx.store().path(&[self.file.as_str()])?;
        let bytes = serde_json::to_vec_pretty(&ctx.meta)?;
        fs::write(&path, bytes).map_err(memoir_common::StoreError::from)?;
        Ok(())
    }

    fn load(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        if !ctx.store().exists(&[self.file.as_str()]) {
            return Ok(());
        }
        let path = ctx.store().path(&[self.file.as_str()])?;
        let bytes = fs::read(&path).map_err(memoir_common::StoreError::from)?;
        ctx.meta = serde_json::from_slice(&bytes)?;
        Ok(())
    }
}

/// Emits a tracing event per lifecycle phase.
#[derive(Debug, Default)]
pub struct LogPhases;

impl LifecycleHook for LogPhases {
    fn prepare(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        debug!(label = ctx.params().label(), "prepared");
        Ok(())
    }

    fn pre_run(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        info!(label = ctx.params().label(), "run started");
        Ok(())
    }

    fn post_run(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        info!(label = ctx.params().label(), results = ctx.results.len(), "run finished");
        Ok(())
    }

    fn load(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        info!(label = ctx.params().label(), results = ctx.results.len(), "loaded persisted results");
        Ok(())
    }

    fn finish(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        debug!(label = ctx.params().label(), "finished");
        Ok(())
    }
}
