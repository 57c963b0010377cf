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

use tessera_core::{Command, Rejection, StructuralError, TypeToken, Validation};

use super::{not_executed, require_object};
use crate::object::Object;
use crate::store::{DestroyedObject, Store};

/// Creates a value-initialised object.
pub struct CreateObject {
    token: TypeToken,
    name: String,
}

impl CreateObject {
    /// Creates a `T` named `name`.
    pub fn new<T: Object>(name: impl Into<String>) -> Self {
        Self::erased(T::token(), name)
    }

    /// Creates an object of type `token` named `name`.
    pub fn erased(token: TypeToken, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
        }
    }
}

impl Command<Store> for CreateObject {
    fn label(&self) -> String {
        format!("create {}:{}", self.token, self.name)
    }

    fn valid(&self, store: &Store) -> Validation {
        if self.name.is_empty() {
            return Err(Rejection::new("object names cannot be empty"));
        }
        if !store.objects().is_registered(self.token) {
            return Err(Rejection::new(format!("type {} is not registered", self.token)));
        }
        if store.key_of(self.token, &self.name).is_some() {
            return Err(Rejection::new(format!(
                "a {} named '{}' already exists",
                self.token, self.name
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        store.create_object(self.token, &self.name).map(|_| ())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let key = store.objects().require_key(self.token, &self.name)?;
        store.destroy_object(key).map(|_| ())
    }
}

/// Destroys an object, orphaning its children.
///
/// Undo brings the object back with its value, its parent links at their
/// previous sibling positions, its children and its instance row.
pub struct DestroyObject {
    token: TypeToken,
    name: String,
    destroyed: Option<DestroyedObject>,
}

impl DestroyObject {
    /// Destroys the `T` named `name`.
    pub fn new<T: Object>(name: impl Into<String>) -> Self {
        Self::erased(T::token(), name)
    }

    /// Destroys the object of type `token` named `name`.
    pub fn erased(token: TypeToken, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
            destroyed: None,
        }
    }
}

impl Command<Store> for DestroyObject {
    fn label(&self) -> String {
        format!("destroy {}:{}", self.token, self.name)
    }

    fn valid(&self, store: &Store) -> Validation {
        require_object(store, self.token, &self.name).map(|_| ())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let key = store.objects().require_key(self.token, &self.name)?;
        self.destroyed = Some(store.destroy_object(key)?);
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let destroyed = self.destroyed.take().ok_or_else(|| not_executed(self.label()))?;
        store.restore_object(destroyed).map(|_| ())
    }
}

/// Renames an object.
pub struct RenameObject {
    token: TypeToken,
    old_name: String,
    new_name: String,
}

impl RenameObject {
    /// Renames the `T` named `old_name`.
    pub fn new<T: Object>(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::erased(T::token(), old_name, new_name)
    }

    /// Renames the object of type `token` named `old_name`.
    pub fn erased(
        token: TypeToken,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            token,
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }
}

impl Command<Store> for RenameObject {
    fn label(&self) -> String {
        format!("rename {}:{} to '{}'", self.token, self.old_name, self.new_name)
    }

    fn valid(&self, store: &Store) -> Validation {
        require_object(store, self.token, &self.old_name)?;
        if self.new_name.is_empty() {
            return Err(Rejection::new("object names cannot be empty"));
        }
        if self.new_name == self.old_name {
            return Err(Rejection::new("the new name equals the current one"));
        }
        if store.key_of(self.token, &self.new_name).is_some() {
            return Err(Rejection::new(format!(
                "a {} named '{}' already exists",
                self.token, self.new_name
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let key = store.objects().require_key(self.token, &self.old_name)?;
        store.rename_object(key, &self.new_name)
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let key = store.objects().require_key(self.token, &self.new_name)?;
        store.rename_object(key, &self.old_name)
    }
}
