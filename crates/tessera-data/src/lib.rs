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

//! The Tessera object store.
//!
//! This crate holds everything that knows about concrete object types:
//!
//! - [`object`]: per-type object packs and the manager that registers them;
//! - [`bond`]: parent/child relations between object types;
//! - [`instance`]: per-object instance rows and the groups keeping them at a
//!   common width;
//! - [`store`]: the [`Store`] aggregate tying the three together;
//! - [`commands`]: the reversible commands through which every structural
//!   mutation of a [`Store`] goes.

#![warn(missing_docs)]

// Lets `#[derive(Object)]` refer to `::tessera_data` from inside this crate.
extern crate self as tessera_data;

pub mod bond;
pub mod commands;
pub mod instance;
pub mod object;
pub mod store;

pub use bond::{BondKind, Bonded, ParentHandle};
pub use instance::{InstanceGroup, InstanceRow, Occurrence, RowSnapshot};
pub use object::{Object, ObjectId, ObjectKey, ObjectPack};
pub use store::{Store, StoreBuilder};
pub use tessera_macros::Object;

#[cfg(test)]
mod tests;
