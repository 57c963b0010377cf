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

//! The [`Store`] aggregate: object packs, bonds and instance groups.
//!
//! The store is passed explicitly, by reference, to every command. It is the
//! single logical mutator of its data: nothing in it locks, and nothing outside it
//! keeps an address into its storage across a command boundary.

mod bonds;
mod persistence;

pub use bonds::ParentLink;

use std::any::Any;

use tessera_core::{StructuralError, TypeToken};

use crate::bond::{BondDescriptor, BondRegistry, Bonded, ParentHandle};
use crate::instance::{InstanceManager, InstanceRow, Occurrence, RowSnapshot};
use crate::object::{Object, ObjectKey, ObjectManager};

/// Builds a [`Store`] with its fixed set of object types and bonds.
///
/// The relation graph cannot change once the store is built.
#[derive(Default)]
pub struct StoreBuilder {
    store: Store,
}

impl StoreBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object type.
    pub fn register<T: Object>(mut self) -> Self {
        self.store.objects.register::<T>();
        self
    }

    /// Registers an object type whose objects each own an instance row.
    pub fn register_occurrence<T: Occurrence>(mut self) -> Self {
        self.store.objects.register::<T>();
        self.store.instances.register_occurrence::<T>();
        self
    }

    /// Declares the bond `C -> P`, registering both types if needed.
    pub fn bond<C, P>(mut self) -> Self
    where
        C: Bonded<P>,
        P: Object,
    {
        self.store.objects.register::<C>();
        self.store.objects.register::<P>();
        self.store.bonds.declare(BondDescriptor::of::<C, P>());
        self
    }

    /// Finishes the store.
    pub fn build(self) -> Store {
        self.store
    }
}

/// Everything captured when an object is destroyed, enough to bring it back.
///
/// The object comes back under the same name but with a fresh [`ObjectKey`];
/// bonds are re-linked by name at their previous sibling positions and the
/// instance row is re-attached at its previous group position.
pub struct DestroyedObject {
    token: TypeToken,
    name: String,
    value: Box<dyn Any>,
    parents: Vec<ParentLink>,
    children: Vec<(TypeToken, Vec<String>)>,
    row: Option<CapturedRow>,
}

impl DestroyedObject {
    /// Returns the destroyed object's type.
    pub fn token(&self) -> TypeToken {
        self.token
    }

    /// Returns the destroyed object's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct CapturedRow {
    row: InstanceRow,
    membership: Option<(String, usize, RowSnapshot)>,
}

/// The object store.
#[derive(Default)]
pub struct Store {
    objects: ObjectManager,
    bonds: BondRegistry,
    instances: InstanceManager,
}

impl Store {
    /// Starts a [`StoreBuilder`].
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Returns a store with the same registrations and bonds, holding nothing.
    pub fn empty_like(&self) -> Self {
        Self {
            objects: self.objects.empty_like(),
            bonds: self.bonds.empty_like(),
            instances: self.instances.empty_like(),
        }
    }

    /// Returns the object packs.
    pub fn objects(&self) -> &ObjectManager {
        &self.objects
    }

    /// Returns the object packs mutably.
    ///
    /// Meant for editing object values; structural changes go through commands.
    pub fn objects_mut(&mut self) -> &mut ObjectManager {
        &mut self.objects
    }

    /// Returns the bond registry.
    pub fn bonds(&self) -> &BondRegistry {
        &self.bonds
    }

    /// Returns the instance rows and groups.
    pub fn instances(&self) -> &InstanceManager {
        &self.instances
    }

    /// Returns the instance rows and groups mutably.
    pub fn instances_mut(&mut self) -> &mut InstanceManager {
        &mut self.instances
    }

    /// Looks up an object of type `T` by name.
    pub fn find<T: Object>(&self, name: &str) -> Option<&T> {
        self.objects.find::<T>(name)
    }

    /// Looks up an object of type `T` by name, mutably.
    pub fn find_mut<T: Object>(&mut self, name: &str) -> Option<&mut T> {
        self.objects.find_mut::<T>(name)
    }

    /// Resolves `(token, name)` to the object's current key.
    pub fn key_of(&self, token: TypeToken, name: &str) -> Option<ObjectKey> {
        self.objects.key_of(token, name)
    }

    /// Creates a value-initialised object and, for occurrence types, its empty row.
    pub fn create_object(
        &mut self,
        token: TypeToken,
        name: &str,
    ) -> Result<ObjectKey, StructuralError> {
        if name.is_empty() {
            return Err(StructuralError::InvalidState(format!(
                "cannot create a {token} without a name"
            )));
        }
        let id = self.objects.require_pack_mut(token)?.create_default(name)?;
        let key = ObjectKey::new(token, id);
        self.instances.spawn_row(key);
        Ok(key)
    }

    /// Destroys an object, capturing its value, bonds and instance row.
    ///
    /// The object is unlinked from its parents and its children are orphaned, not
    /// destroyed. An attached row is detached from its group first.
    pub fn destroy_object(&mut self, key: ObjectKey) -> Result<DestroyedObject, StructuralError> {
        if !self.objects.contains(key) {
            return Err(StructuralError::MissingObject {
                type_name: key.token.name().to_string(),
                name: format!("#{}", key.id.index),
            });
        }

        let row = match self.instances.group_of(key).map(str::to_string) {
            Some(group) => {
                let (position, snapshot) =
                    self.instances.detach_instance_pack(&group, key, true)?;
                let snapshot = snapshot.unwrap_or_default();
                self.instances.take_row(key).map(|row| CapturedRow {
                    row,
                    membership: Some((group, position, snapshot)),
                })
            }
            None => self.instances.take_row(key).map(|row| CapturedRow {
                row,
                membership: None,
            }),
        };

        let parents = self.detach_from_all_parents(key);
        let mut children = Vec::new();
        for child_type in self.bonds.child_types_of(key.token) {
            let names = self.orphan_children(key, child_type);
            if !names.is_empty() {
                children.push((child_type, names));
            }
        }

        let (name, value) = self
            .objects
            .require_pack_mut(key.token)?
            .take(key.id)
            .ok_or_else(|| StructuralError::InvalidState(format!(
                "{} vanished while being destroyed",
                key.token
            )))?;

        log::trace!("Destroyed {}:{name}", key.token);
        Ok(DestroyedObject {
            token: key.token,
            name,
            value,
            parents,
            children,
            row,
        })
    }

    /// Brings a destroyed object back with its bonds and instance row.
    pub fn restore_object(
        &mut self,
        destroyed: DestroyedObject,
    ) -> Result<ObjectKey, StructuralError> {
        let DestroyedObject {
            token,
            name,
            value,
            parents,
            children,
            row,
        } = destroyed;

        let id = self.objects.require_pack_mut(token)?.restore(&name, value)?;
        let key = ObjectKey::new(token, id);

        if let Some(CapturedRow { row, membership }) = row {
            self.instances.restore_row(key, row);
            if let Some((group, position, snapshot)) = membership {
                self.instances
                    .attach_instance_pack(&group, key, Some(&snapshot), Some(position))?;
            }
        }

        for link in &parents {
            if !self.restore_parent_link(key, link) {
                return Err(StructuralError::BondViolation(format!(
                    "{token}:{name} could not be re-linked to {}",
                    link.handle
                )));
            }
        }
        for (child_type, names) in children {
            for child_name in names {
                let child = self.objects.require_key(child_type, &child_name)?;
                if !self.set_parent(child, &ParentHandle::erased(token, name.as_str())) {
                    return Err(StructuralError::BondViolation(format!(
                        "{child_type}:{child_name} could not be re-linked to {token}:{name}"
                    )));
                }
            }
        }
        Ok(key)
    }

    /// Renames a live object. Bonds and rows follow the object.
    pub fn rename_object(&mut self, key: ObjectKey, new_name: &str) -> Result<(), StructuralError> {
        if new_name.is_empty() {
            return Err(StructuralError::InvalidState(format!(
                "cannot rename a {} to an empty name",
                key.token
            )));
        }
        self.objects.require_pack_mut(key.token)?.rename(key.id, new_name)
    }
}
