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

//! Executable Lifecycle
//!
//! A [`Computation`] provides the domain hooks (`prepare`, `run`, `save`,
//! `load`, `finish`); a [`Driver`] walks them in a fixed order, flanked by
//! any number of [`LifecycleHook`] observers:
//!
//! ```text
//! prepare();           hooks.prepare()
//! if should_load():    load();  hooks.load()
//! else:                hooks.pre_run();  run();  hooks.post_run();
//!                      save();  hooks.save()
//! hooks.finish();      finish()
//! ```
//!
//! Hooks run in registration order. Everything a computation needs at run
//! time travels in the [`ExecContext`]: the resolved parameters, the
//! datastore handle, the `results` namespace and a small metadata map.

pub mod driver;
pub mod plugins;
pub mod results;
pub mod state;

pub use driver::{Driver, ExecMode, ExecOutcome};
pub use plugins::{DumpParameters, DumpResults, LogPhases, MetaStore};
pub use results::ResultSet;
pub use state::{ExecState, StateMachine};

use crate::params::ParamTree;
use crate::store::{DataStore, RESULTS_FILE};
use memoir_common::ExecResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything an execution carries through its lifecycle.
pub struct ExecContext {
    params: ParamTree,
    store: Arc<dyn DataStore>,
    /// Named outputs; the only state that survives a save/load round trip.
    pub results: ResultSet,
    /// Small free-form records persisted by the [`MetaStore`] hook.
    pub meta: BTreeMap<String, Value>,
}

impl ExecContext {
    pub fn new(params: ParamTree, store: Arc<dyn DataStore>) -> Self {
        Self {
            params,
            store,
            results: ResultSet::new(),
            meta: BTreeMap::new(),
        }
    }

    /// The resolved parameter tree for this execution.
    pub fn params(&self) -> &ParamTree {
        &self.params
    }

    /// The datastore this execution reads from and writes to.
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    /// Replace the result namespace with the persisted one.
    pub fn load_results(&mut self) -> ExecResult<()> {
        let path = self.store.path(&[RESULTS_FILE])?;
        self.results = ResultSet::read(&path)?;
        Ok(())
    }
}

/// A simulation or analysis with a parameterized lifecycle.
///
/// Only `run` is mandatory; the default `load` restores the `results`
/// namespace from the datastore, which is all most computations need.
pub trait Computation {
    /// Anything to be done before `run`/`load`, e.g. executing upstreams.
    fn prepare(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    /// Whether persisted results should be loaded instead of running.
    /// Only consulted in [`ExecMode::Auto`].
    fn should_load(&self, _ctx: &ExecContext) -> bool {
        false
    }

    /// The actual simulation/analysis.
    fn run(&mut self, ctx: &mut ExecContext) -> ExecResult<()>;

    /// Save results not covered by the lifecycle plugins.
    fn save(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    /// Restore state from the datastore instead of running.
    fn load(&mut self, ctx: &mut ExecContext) -> ExecResult<()> {
        ctx.load_results()
    }

    /// Anything to be done before the lifecycle ends.
    fn finish(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }
}

/// Observer invoked around the computation's own hooks.
///
/// All methods default to no-ops; a plugin implements the phases it cares
/// about. Plugins registered on a driver are invoked in order.
pub trait LifecycleHook {
    fn prepare(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    fn pre_run(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    fn post_run(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    fn save(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    fn load(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }

    fn finish(&mut self, _ctx: &mut ExecContext) -> ExecResult<()> {
        Ok(())
    }
}
