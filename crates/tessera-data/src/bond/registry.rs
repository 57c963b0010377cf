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

use tessera_core::TypeToken;

use crate::bond::{BondDescriptor, Relation};
use crate::object::ObjectKey;

/// The descriptor map of every declared bond, keyed by (child type, parent type).
#[derive(Debug, Default, Clone)]
pub struct BondRegistry {
    relations: HashMap<(TypeToken, TypeToken), Relation>,
    order: Vec<(TypeToken, TypeToken)>,
}

impl BondRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a bond. Declaring the same pair twice keeps the first declaration.
    pub fn declare(&mut self, descriptor: BondDescriptor) {
        let key = (descriptor.child, descriptor.parent);
        if let Some(existing) = self.relations.get(&key) {
            if existing.descriptor().kind != descriptor.kind {
                log::warn!(
                    "Bond {} -> {} redeclared with a different kind; keeping {:?}",
                    descriptor.child,
                    descriptor.parent,
                    existing.descriptor().kind
                );
            }
            return;
        }
        self.relations.insert(key, Relation::new(descriptor));
        self.order.push(key);
    }

    /// Returns a registry declaring the same bonds, with no link recorded.
    pub fn empty_like(&self) -> Self {
        let mut registry = Self::new();
        for descriptor in self.descriptors() {
            registry.declare(*descriptor);
        }
        registry
    }

    /// Returns the relation between `child` and `parent` types.
    pub fn relation(&self, child: TypeToken, parent: TypeToken) -> Option<&Relation> {
        self.relations.get(&(child, parent))
    }

    /// Returns the relation between `child` and `parent` types, mutably.
    pub fn relation_mut(&mut self, child: TypeToken, parent: TypeToken) -> Option<&mut Relation> {
        self.relations.get_mut(&(child, parent))
    }

    /// Returns every declared descriptor in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &BondDescriptor> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.relations.get(key))
            .map(Relation::descriptor)
    }

    /// Returns the parent types `child` is bonded to, in declaration order.
    pub fn parent_types_of(&self, child: TypeToken) -> Vec<TypeToken> {
        self.order
            .iter()
            .filter(|(c, _)| *c == child)
            .map(|(_, p)| *p)
            .collect()
    }

    /// Returns the child types bonded to `parent`, in declaration order.
    pub fn child_types_of(&self, parent: TypeToken) -> Vec<TypeToken> {
        self.order
            .iter()
            .filter(|(_, p)| *p == parent)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Returns `true` if `key` is linked as a child in any relation.
    pub fn has_any_parent(&self, key: ObjectKey) -> bool {
        self.parent_types_of(key.token).into_iter().any(|parent| {
            self.relation(key.token, parent)
                .and_then(|relation| relation.parent_of(key.id))
                .is_some()
        })
    }
}
