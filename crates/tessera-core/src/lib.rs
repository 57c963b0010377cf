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

//! Foundational crate for the Tessera store.
//!
//! `tessera-core` knows nothing about concrete object types. It defines the contracts
//! every other crate builds upon:
//!
//! - the [`Command`](command::Command) validate/execute/unexecute contract, command
//!   batches and the undo/redo [`CommandHistory`](command::CommandHistory);
//! - the two-tier error model ([`StructuralError`] for broken invariants,
//!   [`Rejection`] for expected validation failures);
//! - the little-endian binary codec ([`ByteWriter`] / [`ByteReader`]) and the
//!   named, skippable settings sections built on top of it;
//! - the [`TypeToken`] used to key every per-type registry.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod settings;
pub mod stream;
pub mod token;

pub use command::{Command, CommandBatch, CommandHistory, Validation};
pub use error::{Rejection, StreamError, StructuralError};
pub use stream::{ByteReader, ByteWriter};
pub use token::TypeToken;
