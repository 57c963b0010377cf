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

use std::collections::HashMap;

use tessera_core::{StructuralError, TypeToken};

use crate::object::{AnyPack, Object, ObjectKey, ObjectPack, INVALID_NAME};

/// The registry owning exactly one [`ObjectPack`] per registered type.
///
/// Packs are created once, when the store is built, and live as long as the
/// store. Registration order is preserved so that persistence is deterministic.
#[derive(Default)]
pub struct ObjectManager {
    packs: HashMap<TypeToken, Box<dyn AnyPack>>,
    order: Vec<TypeToken>,
}

impl ObjectManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pack for `T`. Registering the same type twice is a no-op.
    pub fn register<T: Object>(&mut self) -> TypeToken {
        let token = T::token();
        if !self.packs.contains_key(&token) {
            self.packs.insert(token, Box::new(ObjectPack::<T>::new()));
            self.order.push(token);
        }
        token
    }

    /// Returns a manager registering the same types, with every pack empty.
    pub fn empty_like(&self) -> Self {
        let packs = self
            .packs
            .iter()
            .map(|(&token, pack)| (token, pack.empty_like()))
            .collect();
        Self {
            packs,
            order: self.order.clone(),
        }
    }

    /// Returns `true` if a pack exists for `token`.
    pub fn is_registered(&self, token: TypeToken) -> bool {
        self.packs.contains_key(&token)
    }

    /// Returns every registered token in registration order.
    pub fn tokens(&self) -> &[TypeToken] {
        &self.order
    }

    /// Finds the registered token whose type name is `name`.
    pub fn token_by_name(&self, name: &str) -> Option<TypeToken> {
        self.order.iter().copied().find(|token| token.name() == name)
    }

    /// Returns the typed pack for `T`.
    pub fn pack<T: Object>(&self) -> Option<&ObjectPack<T>> {
        self.packs
            .get(&T::token())
            .and_then(|pack| pack.as_any().downcast_ref::<ObjectPack<T>>())
    }

    /// Returns the typed pack for `T`, mutably.
    pub fn pack_mut<T: Object>(&mut self) -> Option<&mut ObjectPack<T>> {
        self.packs
            .get_mut(&T::token())
            .and_then(|pack| pack.as_any_mut().downcast_mut::<ObjectPack<T>>())
    }

    /// Returns the type-erased pack for `token`.
    pub fn pack_dyn(&self, token: TypeToken) -> Option<&dyn AnyPack> {
        self.packs.get(&token).map(|pack| &**pack)
    }

    /// Returns the type-erased pack for `token`, mutably.
    pub fn pack_dyn_mut(&mut self, token: TypeToken) -> Option<&mut (dyn AnyPack + 'static)> {
        self.packs.get_mut(&token).map(|pack| &mut **pack)
    }

    /// Like [`pack_dyn`](Self::pack_dyn) but reports an unregistered type as an error.
    pub fn require_pack(&self, token: TypeToken) -> Result<&dyn AnyPack, StructuralError> {
        self.pack_dyn(token)
            .ok_or_else(|| StructuralError::UnknownType {
                type_name: token.name().to_string(),
            })
    }

    /// Like [`pack_dyn_mut`](Self::pack_dyn_mut) but reports an unregistered type as an error.
    pub fn require_pack_mut(
        &mut self,
        token: TypeToken,
    ) -> Result<&mut (dyn AnyPack + 'static), StructuralError> {
        self.pack_dyn_mut(token)
            .ok_or_else(|| StructuralError::UnknownType {
                type_name: token.name().to_string(),
            })
    }

    /// Looks up an object of type `T` by name.
    pub fn find<T: Object>(&self, name: &str) -> Option<&T> {
        self.pack::<T>().and_then(|pack| pack.find(name))
    }

    /// Looks up an object of type `T` by name, mutably.
    pub fn find_mut<T: Object>(&mut self, name: &str) -> Option<&mut T> {
        self.pack_mut::<T>().and_then(|pack| pack.find_mut(name))
    }

    /// Resolves `(token, name)` to the object's current key.
    pub fn key_of(&self, token: TypeToken, name: &str) -> Option<ObjectKey> {
        self.pack_dyn(token)
            .and_then(|pack| pack.id_of(name))
            .map(|id| ObjectKey::new(token, id))
    }

    /// Like [`key_of`](Self::key_of) but reports a missing object as an error.
    pub fn require_key(&self, token: TypeToken, name: &str) -> Result<ObjectKey, StructuralError> {
        self.require_pack(token)?;
        self.key_of(token, name)
            .ok_or_else(|| StructuralError::MissingObject {
                type_name: token.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Returns the name of a live object.
    pub fn name_of(&self, key: ObjectKey) -> Option<&str> {
        self.pack_dyn(key.token).and_then(|pack| pack.name_of(key.id))
    }

    /// Returns `true` if `key` designates a live object.
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.name_of(key).is_some()
    }

    /// Formats a key as `Type:name` for diagnostics.
    pub fn describe(&self, key: ObjectKey) -> String {
        format!(
            "{}:{}",
            key.token,
            self.name_of(key).unwrap_or(INVALID_NAME)
        )
    }

    /// Returns the number of live objects of type `token`.
    pub fn count(&self, token: TypeToken) -> usize {
        self.pack_dyn(token).map_or(0, |pack| pack.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize, Object)]
    struct Widget(u8);

    #[derive(Debug, Default, Serialize, Deserialize, Object)]
    #[object(name = "Gizmo")]
    struct GizmoData(u8);

    #[test]
    fn test_find_is_scoped_by_type() {
        let mut manager = ObjectManager::new();
        manager.register::<Widget>();
        manager.register::<GizmoData>();

        manager.pack_mut::<Widget>().unwrap().create("shared").unwrap();

        assert!(manager.find::<Widget>("shared").is_some());
        assert!(manager.find::<GizmoData>("shared").is_none());
        assert_eq!(manager.token_by_name("Gizmo"), Some(GizmoData::token()));
        assert_eq!(manager.tokens(), &[Widget::token(), GizmoData::token()]);
    }

    #[test]
    fn test_keys_resolve_through_type_erased_packs() {
        let mut manager = ObjectManager::new();
        let token = manager.register::<Widget>();
        manager
            .require_pack_mut(token)
            .unwrap()
            .create_default("w")
            .unwrap();

        let key = manager.key_of(token, "w").unwrap();
        assert_eq!(manager.name_of(key), Some("w"));
        assert_eq!(manager.describe(key), "Widget:w");
        assert!(matches!(
            manager.require_key(token, "missing"),
            Err(StructuralError::MissingObject { .. })
        ));
    }
}
