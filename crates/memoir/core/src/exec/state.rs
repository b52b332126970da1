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

//! Lifecycle state machine.
//!
//! Every execution moves `Unresolved → {Running | Loading} → Finished`;
//! `Failed` is reachable from any non-terminal state. Transitions outside
//! this graph are errors.

use memoir_common::{ExecError, ExecResult};
use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

/// Execution states of a driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// No decision has been made yet.
    Unresolved,
    /// The computation is being (re)computed.
    Running,
    /// A persisted result set is being loaded instead.
    Loading,
    /// Lifecycle completed.
    Finished,
    /// Lifecycle aborted with an error.
    Failed,
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecState::Unresolved => "unresolved",
            ExecState::Running => "running",
            ExecState::Loading => "loading",
            ExecState::Finished => "finished",
            ExecState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Thread-safe holder validating lifecycle transitions.
pub struct StateMachine {
    state: Mutex<ExecState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ExecState::Unresolved),
        }
    }

    pub fn current(&self) -> ExecState {
        *self.state.lock()
    }

    /// Perform a transition, rejecting edges outside the lifecycle graph.
    pub fn transition(&self, to: ExecState) -> ExecResult<()> {
        let mut state = self.state.lock();
        let allowed = matches!(
            (*state, to),
            (ExecState::Unresolved, ExecState::Running)
                | (ExecState::Unresolved, ExecState::Loading)
                | (ExecState::Running, ExecState::Finished)
                | (ExecState::Loading, ExecState::Finished)
                | (ExecState::Unresolved, ExecState::Failed)
                | (ExecState::Running, ExecState::Failed)
                | (ExecState::Loading, ExecState::Failed)
        );
        if !allowed {
            return Err(ExecError::InvalidTransition(format!("{} -> {}", state, to)));
        }
        debug!(from = %state, to = %to, "lifecycle transition");
        *state = to;
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_path() {
        let machine = StateMachine::new();
        assert_eq!(machine.current(), ExecState::Unresolved);
        machine.transition(ExecState::Running).unwrap();
        machine.transition(ExecState::Finished).unwrap();
        assert_eq!(machine.current(), ExecState::Finished);
    }

    #[test]
    fn test_load_path() {
        let machine = StateMachine::new();
        machine.transition(ExecState::Loading).unwrap();
        machine.transition(ExecState::Finished).unwrap();
    }

    #[test]
    fn test_invalid_transitions() {
        let machine = StateMachine::new();
        assert!(machine.transition(ExecState::Finished).is_err());

        machine.transition(ExecState::Running).unwrap();
        assert!(machine.transition(ExecState::Loading).is_err());

        machine.transition(ExecState::Finished).unwrap();
        assert!(machine.transition(ExecState::Running).is_err());
        assert!(machine.transition(ExecState::Failed).is_err());
    }

    #[test]
    fn test_failure_is_terminal() {
        let machine = StateMachine::new();
        machine.transition(ExecState::Running).unwrap();
        machine.transition(ExecState::Failed).unwrap();
        assert!(machine.transition(ExecState::Finished).is_err());
    }
}
