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

//! The reversible commands mutating a [`Store`].
//!
//! Commands reference objects and groups by name only. Storage keys are looked up
//! afresh on every `valid`, `execute` and `unexecute`, because any command in
//! between may have moved, destroyed or recreated the object behind a key.

mod bond;
mod group;
mod instance;
mod object;

pub use bond::{AdoptObject, DestroyAllChildren, DestroyChildrenOfType, OrphanObject};
pub use group::{AttachInstances, CreateGroup, DestroyGroup, DetachInstances};
pub use instance::{DestroyInstance, EnlargeGroup, ReduceGroup, SwapInstances};
pub use object::{CreateObject, DestroyObject, RenameObject};

use tessera_core::{CommandBatch, CommandHistory, Rejection, StructuralError, TypeToken};

use crate::instance::InstanceGroup;
use crate::object::ObjectKey;
use crate::store::Store;

/// A batch of store commands.
pub type StoreBatch = CommandBatch<Store>;

/// The undo/redo history of a store.
pub type StoreHistory = CommandHistory<Store>;

fn require_object(store: &Store, token: TypeToken, name: &str) -> Result<ObjectKey, Rejection> {
    if !store.objects().is_registered(token) {
        return Err(Rejection::new(format!("type {token} is not registered")));
    }
    store
        .key_of(token, name)
        .ok_or_else(|| Rejection::new(format!("no {token} named '{name}'")))
}

fn require_group<'s>(store: &'s Store, name: &str) -> Result<&'s InstanceGroup, Rejection> {
    store
        .instances()
        .group(name)
        .ok_or_else(|| Rejection::new(format!("no instance group named '{name}'")))
}

fn not_executed(label: String) -> StructuralError {
    StructuralError::InvalidState(format!("'{label}' was undone without being executed"))
}
