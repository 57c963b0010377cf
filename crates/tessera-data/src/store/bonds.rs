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

use tessera_core::TypeToken;

use crate::bond::{Bonded, ParentHandle, Relation};
use crate::object::{Object, ObjectKey};
use crate::store::Store;

/// A child's link to one parent, captured by name so it can be re-established
/// after either side moved in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    /// The parent the child was linked to.
    pub handle: ParentHandle,
    /// The sibling that followed the child, if any.
    pub next_sibling: Option<String>,
}

impl Store {
    fn resolve_relation(&self, child: TypeToken, parent: TypeToken) -> Option<&Relation> {
        self.bonds.relation(child, parent)
    }

    /// Links `child` under the parent named by `handle`, at the end of its
    /// sibling list.
    ///
    /// The child is detached from its current parent of that type first. Returns
    /// `false`, leaving the child without a parent of that type, when the handle,
    /// the relation or the parent cannot be resolved, or when a one-to-one parent
    /// is already occupied.
    pub fn set_parent(&mut self, child: ObjectKey, handle: &ParentHandle) -> bool {
        self.set_parent_before(child, handle, None)
    }

    /// Like [`set_parent`](Self::set_parent), inserting the child before the
    /// sibling named `before` when that sibling is a child of the same parent.
    pub fn set_parent_before(
        &mut self,
        child: ObjectKey,
        handle: &ParentHandle,
        before: Option<&str>,
    ) -> bool {
        let Some(parent_type) = handle.parent_type().filter(|_| handle.is_valid()) else {
            log::warn!("Cannot link {}: invalid parent handle", self.objects.describe(child));
            return false;
        };
        if !self.objects.contains(child) {
            log::warn!("Cannot link a dead {} object to {handle}", child.token);
            return false;
        }
        let parent = self.objects.key_of(parent_type, handle.parent_name());
        let before = before.and_then(|name| self.objects.key_of(child.token, name));
        let describe = self.objects.describe(child);

        let Some(relation) = self.bonds.relation_mut(child.token, parent_type) else {
            log::warn!("Cannot link {describe}: no bond to {parent_type} was declared");
            return false;
        };
        relation.unlink(child.id);
        let Some(parent) = parent else {
            log::warn!("Cannot link {describe}: parent {handle} does not exist");
            return false;
        };
        match relation.link(child.id, parent.id, before.map(|key| key.id)) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Cannot link {describe} to {handle}: {err}");
                false
            }
        }
    }

    /// Unlinks `child` from its parent of type `parent_type`.
    ///
    /// Idempotent: returns the previous parent, or `None` if there was none.
    pub fn detach_from_parent(
        &mut self,
        child: ObjectKey,
        parent_type: TypeToken,
    ) -> Option<ObjectKey> {
        self.bonds
            .relation_mut(child.token, parent_type)?
            .unlink(child.id)
            .map(|parent| ObjectKey::new(parent_type, parent))
    }

    /// Unlinks `child` from every parent and returns the captured links, in
    /// bond declaration order.
    pub fn detach_from_all_parents(&mut self, child: ObjectKey) -> Vec<ParentLink> {
        let mut links = Vec::new();
        for parent_type in self.bonds.parent_types_of(child.token) {
            if let Some(link) = self.parent_link(child, parent_type) {
                self.detach_from_parent(child, parent_type);
                links.push(link);
            }
        }
        links
    }

    /// Captures `child`'s link to its parent of type `parent_type`.
    pub fn parent_link(&self, child: ObjectKey, parent_type: TypeToken) -> Option<ParentLink> {
        let handle = self.get_parent_handle(child, parent_type);
        if !handle.is_valid() {
            return None;
        }
        let next_sibling = self
            .next_sibling(child, parent_type)
            .and_then(|next| self.objects.name_of(next))
            .map(str::to_string);
        Some(ParentLink {
            handle,
            next_sibling,
        })
    }

    /// Re-establishes a captured link. An invalid handle just detaches.
    pub fn restore_parent_link(&mut self, child: ObjectKey, link: &ParentLink) -> bool {
        self.set_parent_before(child, &link.handle, link.next_sibling.as_deref())
    }

    /// Unlinks every `child_type` child of `parent` and returns their names in
    /// sibling order.
    pub fn orphan_children(&mut self, parent: ObjectKey, child_type: TypeToken) -> Vec<String> {
        let names = self.child_names(parent, child_type);
        if let Some(relation) = self.bonds.relation_mut(child_type, parent.token) {
            relation.unlink_children(parent.id);
        }
        names
    }

    /// Returns a handle to `child`'s parent of type `parent_type`, or an invalid
    /// handle.
    pub fn get_parent_handle(&self, child: ObjectKey, parent_type: TypeToken) -> ParentHandle {
        self.get_parent(child, parent_type)
            .and_then(|parent| self.objects.name_of(parent))
            .map_or_else(ParentHandle::invalid, |name| {
                ParentHandle::erased(parent_type, name)
            })
    }

    /// Returns `true` if `child` is linked to a parent of type `parent_type`.
    pub fn has_parent(&self, child: ObjectKey, parent_type: TypeToken) -> bool {
        self.get_parent(child, parent_type).is_some()
    }

    /// Returns `child`'s parent of type `parent_type`.
    pub fn get_parent(&self, child: ObjectKey, parent_type: TypeToken) -> Option<ObjectKey> {
        self.resolve_relation(child.token, parent_type)?
            .parent_of(child.id)
            .map(|id| ObjectKey::new(parent_type, id))
    }

    /// Calls `f` with every `child_type` child of `parent`, in sibling order.
    pub fn for_each_child<F>(&self, parent: ObjectKey, child_type: TypeToken, mut f: F)
    where
        F: FnMut(ObjectKey),
    {
        if let Some(relation) = self.resolve_relation(child_type, parent.token) {
            for child in relation.children(parent.id) {
                f(ObjectKey::new(child_type, child));
            }
        }
    }

    /// Returns the `child_type` children of `parent`, in sibling order.
    pub fn children_of(&self, parent: ObjectKey, child_type: TypeToken) -> Vec<ObjectKey> {
        let mut children = Vec::new();
        self.for_each_child(parent, child_type, |child| children.push(child));
        children
    }

    /// Returns the names of the `child_type` children of `parent`, in sibling order.
    pub fn child_names(&self, parent: ObjectKey, child_type: TypeToken) -> Vec<String> {
        self.children_of(parent, child_type)
            .into_iter()
            .filter_map(|child| self.objects.name_of(child).map(str::to_string))
            .collect()
    }

    /// Returns the first `child_type` child of `parent`.
    pub fn first_child(&self, parent: ObjectKey, child_type: TypeToken) -> Option<ObjectKey> {
        self.resolve_relation(child_type, parent.token)?
            .first_child(parent.id)
            .map(|id| ObjectKey::new(child_type, id))
    }

    /// Returns the last `child_type` child of `parent`.
    pub fn last_child(&self, parent: ObjectKey, child_type: TypeToken) -> Option<ObjectKey> {
        self.resolve_relation(child_type, parent.token)?
            .last_child(parent.id)
            .map(|id| ObjectKey::new(child_type, id))
    }

    /// Returns the sibling after `child` under its parent of type `parent_type`.
    pub fn next_sibling(&self, child: ObjectKey, parent_type: TypeToken) -> Option<ObjectKey> {
        self.resolve_relation(child.token, parent_type)?
            .next_sibling(child.id)
            .map(|id| ObjectKey::new(child.token, id))
    }

    /// Returns the sibling before `child` under its parent of type `parent_type`.
    pub fn prev_sibling(&self, child: ObjectKey, parent_type: TypeToken) -> Option<ObjectKey> {
        self.resolve_relation(child.token, parent_type)?
            .prev_sibling(child.id)
            .map(|id| ObjectKey::new(child.token, id))
    }

    /// Returns the number of `child_type` children of `parent`.
    pub fn child_count(&self, parent: ObjectKey, child_type: TypeToken) -> usize {
        self.resolve_relation(child_type, parent.token)
            .map_or(0, |relation| relation.child_count(parent.id))
    }

    /// Returns the `P` parent of the `C` object named `child`.
    pub fn parent_of<C, P>(&self, child: &str) -> Option<&P>
    where
        C: Bonded<P>,
        P: Object,
    {
        let child = self.objects.key_of(C::token(), child)?;
        let parent = self.get_parent(child, P::token())?;
        self.objects.pack::<P>()?.get(parent.id)
    }

    /// Returns the names of the `C` children of the `P` object named `parent`.
    pub fn children_named<C, P>(&self, parent: &str) -> Vec<String>
    where
        C: Bonded<P>,
        P: Object,
    {
        self.objects
            .key_of(P::token(), parent)
            .map(|parent| self.child_names(parent, C::token()))
            .unwrap_or_default()
    }
}
