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

//! Object identity and per-type storage.
//!
//! An object is a named value of a concrete type. Its identity is the pair
//! (type token, name); the name is unique within its type and is the only
//! identifier that survives a command boundary. Inside a single operation the
//! store also hands out [`ObjectId`]s, generation-checked slot handles that stay
//! valid while the object lives even though its storage row moves on every
//! swap-remove.

mod manager;
mod pack;
mod slots;

pub use manager::ObjectManager;
pub use pack::{AnyPack, ObjectPack, INVALID_NAME};

use serde::{de::DeserializeOwned, Serialize};
use tessera_core::TypeToken;

/// A type whose values can be stored in an [`ObjectPack`].
///
/// Implement it with `#[derive(Object)]`. The supertraits let a pack create a
/// value-initialised object on demand and stream its contents.
pub trait Object: Default + Serialize + DeserializeOwned + 'static {
    /// The registered type name, also written into binary streams.
    const TYPE_NAME: &'static str;

    /// Returns the token keying this type in every registry.
    fn token() -> TypeToken
    where
        Self: Sized,
    {
        TypeToken::new(Self::TYPE_NAME)
    }
}

/// A generation-checked handle to an object slot inside one pack.
///
/// When an object is destroyed its slot index can be recycled, but the generation
/// is incremented, so a stale `ObjectId` never resolves to the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    /// The slot index in the pack's slot table.
    pub index: u32,
    /// Incremented each time the slot is recycled.
    pub generation: u32,
}

/// An [`ObjectId`] qualified by the type of the pack it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// The object's type.
    pub token: TypeToken,
    /// The object's slot in that type's pack.
    pub id: ObjectId,
}

impl ObjectKey {
    /// Creates a key.
    pub fn new(token: TypeToken, id: ObjectId) -> Self {
        Self { token, id }
    }
}
