// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::VecDeque;

use crate::command::Command;
use crate::error::StructuralError;

/// The command invoker: validates, executes and records commands for undo/redo.
///
/// A rejected command is logged and dropped; it never reaches the undo stack and
/// never touches the state. Executing a new command clears the redo stack.
pub struct CommandHistory<S> {
    undo_stack: VecDeque<Box<dyn Command<S>>>,
    redo_stack: Vec<Box<dyn Command<S>>>,
    limit: Option<usize>,
}

impl<S: 'static> CommandHistory<S> {
    /// Creates a history with an unbounded undo stack.
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: None,
        }
    }

    /// Creates a history that keeps at most `limit` undoable commands.
    ///
    /// When the limit is exceeded the oldest command is forgotten.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Validates and executes `command`, recording it on success.
    ///
    /// Returns `Ok(false)` if the command was rejected by its precondition check,
    /// `Ok(true)` if it was executed, and `Err` if execution broke an invariant.
    pub fn invoke(
        &mut self,
        state: &mut S,
        command: impl Command<S>,
    ) -> Result<bool, StructuralError> {
        self.invoke_boxed(state, Box::new(command))
    }

    /// Type-erased variant of [`invoke`](Self::invoke).
    pub fn invoke_boxed(
        &mut self,
        state: &mut S,
        mut command: Box<dyn Command<S>>,
    ) -> Result<bool, StructuralError> {
        if let Err(rejection) = command.valid(state) {
            log::warn!("Rejected command '{}': {}", command.label(), rejection);
            return Ok(false);
        }

        command.execute(state)?;
        log::debug!("Executed command '{}'", command.label());

        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                if let Some(dropped) = self.undo_stack.pop_front() {
                    log::debug!("Undo limit reached, forgetting '{}'", dropped.label());
                }
            }
        }
        Ok(true)
    }

    /// Reverses the most recent command. Returns `Ok(false)` if there is nothing to undo.
    pub fn undo(&mut self, state: &mut S) -> Result<bool, StructuralError> {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        command.unexecute(state)?;
        log::debug!("Undid command '{}'", command.label());
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Re-applies the most recently undone command. Returns `Ok(false)` if there is
    /// nothing to redo.
    pub fn redo(&mut self, state: &mut S) -> Result<bool, StructuralError> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        command.execute(state)?;
        log::debug!("Redid command '{}'", command.label());
        self.undo_stack.push_back(command);
        Ok(true)
    }

    /// Returns the number of undoable commands.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of redoable commands.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns the label of the command [`undo`](Self::undo) would reverse.
    pub fn next_undo_label(&self) -> Option<String> {
        self.undo_stack.back().map(|command| command.label())
    }

    /// Forgets every recorded command without touching the state.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl<S: 'static> Default for CommandHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}
