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

//! The reversible-command contract.
//!
//! Every structural mutation of the store is expressed as a [`Command`]. A command
//! moves through `Constructed → valid? → Executed ⇄ Unexecuted`:
//!
//! - [`Command::valid`] is a side-effect-free precondition check. A command that
//!   fails it is never executed.
//! - [`Command::execute`] applies the mutation and captures, inside the command
//!   itself, everything required to invert it.
//! - [`Command::unexecute`] applies the exact inverse. Running it right after
//!   `execute` restores the observable pre-execute state, and running `execute`
//!   again reproduces the post-execute state.
//!
//! Commands are generic over the state `S` they mutate, so this module stays
//! ignorant of object types.

mod batch;
mod history;

pub use batch::CommandBatch;
pub use history::CommandHistory;

use crate::error::{Rejection, StructuralError};

/// The outcome of a precondition check.
pub type Validation = Result<(), Rejection>;

/// A self-contained, invertible description of one structural mutation of `S`.
pub trait Command<S>: 'static {
    /// A short description used in log messages.
    fn label(&self) -> String;

    /// Checks the command's preconditions against `state` without mutating it.
    fn valid(&self, state: &S) -> Validation;

    /// Applies the mutation, capturing whatever is needed to reverse it.
    fn execute(&mut self, state: &mut S) -> Result<(), StructuralError>;

    /// Reverses a previous [`execute`](Command::execute).
    fn unexecute(&mut self, state: &mut S) -> Result<(), StructuralError>;
}

impl<S: 'static> Command<S> for Box<dyn Command<S>> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn valid(&self, state: &S) -> Validation {
        (**self).valid(state)
    }

    fn execute(&mut self, state: &mut S) -> Result<(), StructuralError> {
        (**self).execute(state)
    }

    fn unexecute(&mut self, state: &mut S) -> Result<(), StructuralError> {
        (**self).unexecute(state)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A tiny counter state shared by the command tests.

    use super::*;

    /// A list of integers mutated by [`PushValue`].
    #[derive(Debug, Default, PartialEq, Eq)]
    pub struct Counter {
        pub values: Vec<i32>,
    }

    /// Pushes one value; rejected when the value is negative.
    pub struct PushValue(pub i32);

    impl Command<Counter> for PushValue {
        fn label(&self) -> String {
            format!("PushValue({})", self.0)
        }

        fn valid(&self, _state: &Counter) -> Validation {
            if self.0 < 0 {
                return Err(Rejection::new("negative values are not allowed"));
            }
            Ok(())
        }

        fn execute(&mut self, state: &mut Counter) -> Result<(), StructuralError> {
            state.values.push(self.0);
            Ok(())
        }

        fn unexecute(&mut self, state: &mut Counter) -> Result<(), StructuralError> {
            match state.values.pop() {
                Some(value) if value == self.0 => Ok(()),
                _ => Err(StructuralError::InvalidState(
                    "counter top does not match".to_string(),
                )),
            }
        }
    }

    /// Fails in `execute` when the counter already holds `limit` values.
    pub struct FailAt {
        pub limit: usize,
    }

    impl Command<Counter> for FailAt {
        fn label(&self) -> String {
            "FailAt".to_string()
        }

        fn valid(&self, _state: &Counter) -> Validation {
            Ok(())
        }

        fn execute(&mut self, state: &mut Counter) -> Result<(), StructuralError> {
            if state.values.len() >= self.limit {
                return Err(StructuralError::InvalidState("limit reached".to_string()));
            }
            state.values.push(0);
            Ok(())
        }

        fn unexecute(&mut self, state: &mut Counter) -> Result<(), StructuralError> {
            state.values.pop();
            Ok(())
        }
    }
}
