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

use crate::command::{Command, Validation};
use crate::error::{Rejection, StructuralError};

/// An ordered group of commands that behaves as one atomic command.
///
/// Every member is validated before any of them executes, so a single failing
/// precondition rejects the whole batch. Members execute in insertion order and
/// unexecute in strict reverse order.
pub struct CommandBatch<S> {
    label: String,
    commands: Vec<Box<dyn Command<S>>>,
}

impl<S: 'static> CommandBatch<S> {
    /// Creates an empty batch.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a command, builder style.
    pub fn with(mut self, command: impl Command<S>) -> Self {
        self.push(command);
        self
    }

    /// Appends a command.
    pub fn push(&mut self, command: impl Command<S>) {
        self.commands.push(Box::new(command));
    }

    /// Returns the number of commands in the batch.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if the batch holds no command.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<S: 'static> Command<S> for CommandBatch<S> {
    fn label(&self) -> String {
        format!("{} ({} commands)", self.label, self.commands.len())
    }

    fn valid(&self, state: &S) -> Validation {
        if self.commands.is_empty() {
            return Err(Rejection::new(format!("batch '{}' is empty", self.label)));
        }
        for command in &self.commands {
            command.valid(state).map_err(|rejection| {
                Rejection::new(format!("{}: {}", command.label(), rejection))
            })?;
        }
        Ok(())
    }

    fn execute(&mut self, state: &mut S) -> Result<(), StructuralError> {
        for done in 0..self.commands.len() {
            if let Err(err) = self.commands[done].execute(state) {
                // Roll back what already ran so the batch stays atomic.
                for command in self.commands[..done].iter_mut().rev() {
                    command.unexecute(state)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn unexecute(&mut self, state: &mut S) -> Result<(), StructuralError> {
        for command in self.commands.iter_mut().rev() {
            command.unexecute(state)?;
        }
        Ok(())
    }
}
