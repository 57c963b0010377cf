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

use std::any::Any;
use std::collections::HashMap;

use tessera_core::{ByteReader, ByteWriter, StreamError, StructuralError, TypeToken};

use crate::object::slots::SlotTable;
use crate::object::{Object, ObjectId};

/// Returned by [`ObjectPack::resolve_owner_name`] when an address does not belong
/// to any live object of the pack.
pub const INVALID_NAME: &str = "<invalid>";

fn codec_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Contiguous storage for every live object of one type.
///
/// Objects are stored by value in a dense `Vec<T>`. The `ids` and `names` columns
/// are row-aligned with it: the object at `objects[i]` is named `names[i]` and is
/// addressed by `ids[i]`. Destruction is a swap-remove applied to all three
/// columns in lock-step, so a row index is only meaningful until the next removal.
pub struct ObjectPack<T: Object> {
    objects: Vec<T>,
    ids: Vec<ObjectId>,
    names: Vec<String>,
    slots: SlotTable,
    /// Name → id index used for O(1) lookups.
    labels: HashMap<String, ObjectId>,
}

impl<T: Object> ObjectPack<T> {
    /// Creates an empty pack.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            ids: Vec::new(),
            names: Vec::new(),
            slots: SlotTable::default(),
            labels: HashMap::new(),
        }
    }

    /// Returns the token of the stored type.
    pub fn token(&self) -> TypeToken {
        T::token()
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the pack holds no object.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Appends a value-initialised object under `name`.
    pub fn create(&mut self, name: &str) -> Result<(ObjectId, &mut T), StructuralError> {
        let id = self.insert(name, T::default())?;
        let row = self.objects.len() - 1;
        Ok((id, &mut self.objects[row]))
    }

    /// Appends `value` under `name`.
    pub fn insert(&mut self, name: &str, value: T) -> Result<ObjectId, StructuralError> {
        if self.labels.contains_key(name) {
            return Err(StructuralError::DuplicateName {
                type_name: T::TYPE_NAME.to_string(),
                name: name.to_string(),
            });
        }
        let id = self.slots.allocate(self.objects.len() as u32);
        self.objects.push(value);
        self.ids.push(id);
        self.names.push(name.to_string());
        self.labels.insert(name.to_string(), id);
        Ok(id)
    }

    /// Swap-removes the object and returns its name and value.
    ///
    /// The last object moves into the freed row; its slot is repointed so its
    /// `ObjectId` stays valid.
    pub fn destroy(&mut self, id: ObjectId) -> Option<(String, T)> {
        let row = self.slots.release(id)? as usize;
        let value = self.objects.swap_remove(row);
        let name = self.names.swap_remove(row);
        self.ids.swap_remove(row);
        self.labels.remove(&name);

        if let Some(&moved) = self.ids.get(row) {
            self.slots.relocate(moved, row as u32);
        }
        Some((name, value))
    }

    /// Returns `true` if an object is registered under `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Returns the id of the object registered under `name`.
    pub fn id_of(&self, name: &str) -> Option<ObjectId> {
        self.labels.get(name).copied()
    }

    /// Returns the name of a live object.
    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.index_of(id).map(|row| self.names[row].as_str())
    }

    /// Returns the current storage row of a live object.
    ///
    /// The row is spoiled by the next removal from this pack.
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.slots.row_of(id).map(|row| row as usize)
    }

    /// Returns a live object by id.
    pub fn get(&self, id: ObjectId) -> Option<&T> {
        self.index_of(id).map(|row| &self.objects[row])
    }

    /// Returns a live object by id, mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        self.index_of(id).map(move |row| &mut self.objects[row])
    }

    /// Looks an object up by name.
    pub fn find(&self, name: &str) -> Option<&T> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Looks an object up by name, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        let id = self.id_of(name)?;
        self.get_mut(id)
    }

    /// Renames a live object.
    pub fn rename(&mut self, id: ObjectId, new_name: &str) -> Result<(), StructuralError> {
        let row = self.index_of(id).ok_or_else(|| StructuralError::MissingObject {
            type_name: T::TYPE_NAME.to_string(),
            name: format!("#{}", id.index),
        })?;
        if self.labels.contains_key(new_name) {
            return Err(StructuralError::DuplicateName {
                type_name: T::TYPE_NAME.to_string(),
                name: new_name.to_string(),
            });
        }
        let old_name = std::mem::replace(&mut self.names[row], new_name.to_string());
        self.labels.remove(&old_name);
        self.labels.insert(new_name.to_string(), id);
        Ok(())
    }

    /// Iterates over live objects in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &str, &T)> {
        self.ids
            .iter()
            .zip(self.names.iter())
            .zip(self.objects.iter())
            .map(|((id, name), object)| (*id, name.as_str(), object))
    }

    /// Iterates over object names in storage order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Recovers the name of the object containing `address`.
    ///
    /// The owner row is derived by stride arithmetic from the storage's data
    /// pointer. Addresses outside the live objects, and any address for a
    /// zero-sized type, yield [`INVALID_NAME`]. The address is never dereferenced.
    pub fn resolve_owner_name(&self, address: *const u8) -> &str {
        let stride = std::mem::size_of::<T>();
        let base = self.objects.as_ptr() as usize;
        let address = address as usize;
        if stride == 0 || address < base {
            return INVALID_NAME;
        }
        let row = (address - base) / stride;
        self.names
            .get(row)
            .map(String::as_str)
            .unwrap_or(INVALID_NAME)
    }

    /// Writes the pack settings stream.
    ///
    /// Layout: `[count: u64]`, then `[name][typeName]` per object, then one
    /// length-prefixed bincode payload per object in the same order.
    pub fn export_pack(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        out.write_u64(self.objects.len() as u64);
        for name in &self.names {
            out.write_str(name);
            out.write_str(T::TYPE_NAME);
        }
        for object in &self.objects {
            let bytes = bincode::serde::encode_to_vec(object, codec_config())
                .map_err(|e| StreamError::Codec(e.to_string()))?;
            out.write_blob(&bytes);
        }
        Ok(())
    }

    /// Reads a pack settings stream, appending every object it contains.
    ///
    /// The whole stream is decoded and checked before anything is inserted, so a
    /// duplicate or foreign entry leaves the pack untouched.
    pub fn import_pack(
        &mut self,
        input: &mut ByteReader<'_>,
    ) -> Result<Vec<ObjectId>, StructuralError> {
        let count = input.read_len()?;
        let mut names = Vec::new();
        for _ in 0..count {
            let name = input.read_str()?;
            let type_name = input.read_str()?;
            if type_name != T::TYPE_NAME {
                return Err(StructuralError::TypeMismatch {
                    expected: T::TYPE_NAME.to_string(),
                    found: type_name,
                });
            }
            if self.contains_name(&name) || names.contains(&name) {
                return Err(StructuralError::DuplicateName {
                    type_name: T::TYPE_NAME.to_string(),
                    name,
                });
            }
            names.push(name);
        }

        let mut values = Vec::with_capacity(names.len());
        for _ in 0..count {
            let bytes = input.read_blob()?;
            let (value, _): (T, usize) = bincode::serde::decode_from_slice(bytes, codec_config())
                .map_err(|e| StreamError::Codec(e.to_string()))?;
            values.push(value);
        }

        names
            .iter()
            .zip(values)
            .map(|(name, value)| self.insert(name, value))
            .collect()
    }
}

impl<T: Object> Default for ObjectPack<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type-erased view of an [`ObjectPack`].
///
/// This lets the manager and the commands create, remove and stream objects of a
/// type they only know by its [`TypeToken`].
pub trait AnyPack {
    /// Returns the token of the stored type.
    fn token(&self) -> TypeToken;

    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the number of live objects.
    fn len(&self) -> usize;

    /// Returns `true` if the pack holds no object.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the id of the object registered under `name`.
    fn id_of(&self, name: &str) -> Option<ObjectId>;

    /// Returns the name of a live object.
    fn name_of(&self, id: ObjectId) -> Option<&str>;

    /// Returns the ids of every live object in storage order.
    fn object_ids(&self) -> Vec<ObjectId>;

    /// Appends a value-initialised object.
    fn create_default(&mut self, name: &str) -> Result<ObjectId, StructuralError>;

    /// Swap-removes an object and hands back its name and boxed value.
    fn take(&mut self, id: ObjectId) -> Option<(String, Box<dyn Any>)>;

    /// Re-inserts a value previously returned by [`take`](AnyPack::take).
    fn restore(&mut self, name: &str, value: Box<dyn Any>) -> Result<ObjectId, StructuralError>;

    /// Renames a live object.
    fn rename(&mut self, id: ObjectId, new_name: &str) -> Result<(), StructuralError>;

    /// Writes the pack settings stream.
    fn export_pack(&self, out: &mut ByteWriter) -> Result<(), StructuralError>;

    /// Reads a pack settings stream.
    fn import_pack(&mut self, input: &mut ByteReader<'_>)
        -> Result<Vec<ObjectId>, StructuralError>;

    /// Creates an empty pack of the same object type.
    fn empty_like(&self) -> Box<dyn AnyPack>;
}

impl<T: Object> AnyPack for ObjectPack<T> {
    fn token(&self) -> TypeToken {
        T::token()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.objects.len()
    }

    fn id_of(&self, name: &str) -> Option<ObjectId> {
        ObjectPack::id_of(self, name)
    }

    fn name_of(&self, id: ObjectId) -> Option<&str> {
        ObjectPack::name_of(self, id)
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.ids.clone()
    }

    fn create_default(&mut self, name: &str) -> Result<ObjectId, StructuralError> {
        self.insert(name, T::default())
    }

    fn take(&mut self, id: ObjectId) -> Option<(String, Box<dyn Any>)> {
        self.destroy(id)
            .map(|(name, value)| (name, Box::new(value) as Box<dyn Any>))
    }

    fn restore(&mut self, name: &str, value: Box<dyn Any>) -> Result<ObjectId, StructuralError> {
        let value = value
            .downcast::<T>()
            .map_err(|_| StructuralError::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                found: "a value of another type".to_string(),
            })?;
        self.insert(name, *value)
    }

    fn rename(&mut self, id: ObjectId, new_name: &str) -> Result<(), StructuralError> {
        ObjectPack::rename(self, id, new_name)
    }

    fn export_pack(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        ObjectPack::export_pack(self, out)
    }

    fn import_pack(
        &mut self,
        input: &mut ByteReader<'_>,
    ) -> Result<Vec<ObjectId>, StructuralError> {
        ObjectPack::import_pack(self, input)
    }

    fn empty_like(&self) -> Box<dyn AnyPack> {
        Box::new(ObjectPack::<T>::new())
    }
}
