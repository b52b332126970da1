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

//! Lifecycle driver.

use super::state::{ExecState, StateMachine};
use super::{Computation, ExecContext, LifecycleHook};
use memoir_common::ExecResult;
use tracing::debug;

/// How the run-or-load decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Always run the computation.
    Run,
    /// Always load persisted results.
    Load,
    /// Ask [`Computation::should_load`].
    #[default]
    Auto,
}

/// What an execution ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The computation ran and its results were persisted.
    Computed,
    /// Persisted results were loaded; the computation did not run.
    Loaded,
}

/// Walks a [`Computation`] through its lifecycle exactly once.
pub struct Driver {
    mode: ExecMode,
    state: StateMachine,
}

impl Driver {
    pub fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            state: StateMachine::new(),
        }
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn state(&self) -> ExecState {
        self.state.current()
    }

    /// Execute the full lifecycle. On any error the driver moves to
    /// `Failed` and the error is returned unchanged.
    pub fn execute(&mut self, comp: &mut dyn Computation, ctx: &mut ExecContext, hooks: &mut [Box<dyn LifecycleHook>]) -> ExecResult<ExecOutcome> {
        match self.run_lifecycle(comp, ctx, hooks) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let _ = self.state.transition(ExecState::Failed);
                Err(err)
            }
        }
    }

    fn run_lifecycle(&mut self, comp: &mut dyn Computation, ctx: &mut ExecContext, hooks: &mut [Box<dyn LifecycleHook>]) -> ExecResult<ExecOutcome> {
        comp.prepare(ctx)?;
        for hook in hooks.iter_mut() {
            hook.prepare(ctx)?;
        }

        let load = match self.mode {
            ExecMode::Run => false,
            ExecMode::Load => true,
            ExecMode::Auto => comp.should_load(ctx),
        };
        debug!(mode = ?self.mode, load, "resolved execution branch");

        if load {
            self.state.transition(ExecState::Loading)?;
            comp.load(ctx)?;
            for hook in hooks.iter_mut() {
                hook.load(ctx)?;
            }
        } else {
            self.state.transition(ExecState::Running)?;
            for hook in hooks.iter_mut() {
                hook.pre_run(ctx)?;
            }
            comp.run(ctx)?;
            for hook in hooks.iter_mut() {
                hook.post_run(ctx)?;
            }
            comp.save(ctx)?;
            for hook in hooks.iter_mut() {
                hook.save(ctx)?;
            }
        }

        for hook in hooks.iter_mut() {
            hook.finish(ctx)?;
        }
        comp.finish(ctx)?;
        self.state.transition(ExecState::Finished)?;

        Ok(if load { ExecOutcome::Loaded } else { ExecOutcome::Computed })
    }
}
