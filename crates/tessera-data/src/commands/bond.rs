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

use std::collections::HashSet;

use tessera_core::{Command, Rejection, StructuralError, TypeToken, Validation};

use super::{not_executed, require_object, DestroyObject};
use crate::bond::{Bonded, ParentHandle};
use crate::object::{Object, ObjectKey};
use crate::store::{ParentLink, Store};

/// Links a child under a new parent, remembering the previous one.
pub struct AdoptObject {
    child_type: TypeToken,
    child_name: String,
    parent: ParentHandle,
    // Outer `None` until executed; inner `None` when the child had no parent.
    previous: Option<Option<ParentLink>>,
}

impl AdoptObject {
    /// Links the `C` named `child` under the `P` named `parent`.
    pub fn new<C, P>(child: impl Into<String>, parent: impl Into<String>) -> Self
    where
        C: Bonded<P>,
        P: Object,
    {
        Self::erased(C::token(), child, ParentHandle::new::<P>(parent))
    }

    /// Links the object of type `child_type` named `child` under `parent`.
    pub fn erased(child_type: TypeToken, child: impl Into<String>, parent: ParentHandle) -> Self {
        Self {
            child_type,
            child_name: child.into(),
            parent,
            previous: None,
        }
    }

    fn parent_type(&self) -> Result<TypeToken, StructuralError> {
        self.parent.parent_type().ok_or_else(|| {
            StructuralError::BondViolation(format!("invalid parent handle {}", self.parent))
        })
    }
}

impl Command<Store> for AdoptObject {
    fn label(&self) -> String {
        format!("adopt {}:{} under {}", self.child_type, self.child_name, self.parent)
    }

    fn valid(&self, store: &Store) -> Validation {
        let Some(parent_type) = self.parent.parent_type().filter(|_| self.parent.is_valid()) else {
            return Err(Rejection::new("the parent handle is invalid"));
        };
        let child = require_object(store, self.child_type, &self.child_name)?;
        let parent = require_object(store, parent_type, self.parent.parent_name())?;
        let Some(relation) = store.bonds().relation(self.child_type, parent_type) else {
            return Err(Rejection::new(format!(
                "no bond between {} and {parent_type} was declared",
                self.child_type
            )));
        };
        if relation.parent_of(child.id) == Some(parent.id) {
            return Err(Rejection::new(format!(
                "{}:{} is already a child of {}",
                self.child_type, self.child_name, self.parent
            )));
        }
        if !relation.can_link(child.id, parent.id) {
            return Err(Rejection::new(format!(
                "{} already holds its single {} child",
                self.parent, self.child_type
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let parent_type = self.parent_type()?;
        let child = store.objects().require_key(self.child_type, &self.child_name)?;
        let previous = store.parent_link(child, parent_type);
        if !store.set_parent(child, &self.parent) {
            if let Some(link) = &previous {
                store.restore_parent_link(child, link);
            }
            return Err(StructuralError::BondViolation(format!(
                "could not link {}:{} under {}",
                self.child_type, self.child_name, self.parent
            )));
        }
        self.previous = Some(previous);
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let parent_type = self.parent_type()?;
        let previous = self.previous.take().ok_or_else(|| not_executed(self.label()))?;
        let child = store.objects().require_key(self.child_type, &self.child_name)?;
        store.detach_from_parent(child, parent_type);
        if let Some(link) = previous {
            if !store.restore_parent_link(child, &link) {
                return Err(StructuralError::BondViolation(format!(
                    "could not re-link {}:{} under {}",
                    self.child_type, self.child_name, link.handle
                )));
            }
        }
        Ok(())
    }
}

/// Unlinks an object from its parents.
///
/// By default every bonded parent type is detached at once; undo restores each
/// link at its previous sibling position.
pub struct OrphanObject {
    child_type: TypeToken,
    child_name: String,
    parent_type: Option<TypeToken>,
    links: Option<Vec<ParentLink>>,
}

impl OrphanObject {
    /// Detaches the `C` named `child` from all of its parents.
    pub fn new<C: Object>(child: impl Into<String>) -> Self {
        Self::erased(C::token(), child, None)
    }

    /// Detaches the `C` named `child` from its `P` parent only.
    pub fn from_parent<C, P>(child: impl Into<String>) -> Self
    where
        C: Bonded<P>,
        P: Object,
    {
        Self::erased(C::token(), child, Some(P::token()))
    }

    /// Detaches the object of type `child_type` named `child` from its parent of
    /// type `parent_type`, or from all parents when `None`.
    pub fn erased(
        child_type: TypeToken,
        child: impl Into<String>,
        parent_type: Option<TypeToken>,
    ) -> Self {
        Self {
            child_type,
            child_name: child.into(),
            parent_type,
            links: None,
        }
    }
}

impl Command<Store> for OrphanObject {
    fn label(&self) -> String {
        match self.parent_type {
            Some(parent_type) => format!(
                "orphan {}:{} from its {parent_type}",
                self.child_type, self.child_name
            ),
            None => format!("orphan {}:{}", self.child_type, self.child_name),
        }
    }

    fn valid(&self, store: &Store) -> Validation {
        let child = require_object(store, self.child_type, &self.child_name)?;
        let parented = match self.parent_type {
            Some(parent_type) => store.has_parent(child, parent_type),
            None => store.bonds().has_any_parent(child),
        };
        if !parented {
            return Err(Rejection::new(format!(
                "{}:{} has no parent to detach from",
                self.child_type, self.child_name
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let child = store.objects().require_key(self.child_type, &self.child_name)?;
        let links = match self.parent_type {
            Some(parent_type) => {
                let link = store.parent_link(child, parent_type);
                store.detach_from_parent(child, parent_type);
                link.into_iter().collect()
            }
            None => store.detach_from_all_parents(child),
        };
        self.links = Some(links);
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let links = self.links.take().ok_or_else(|| not_executed(self.label()))?;
        let child = store.objects().require_key(self.child_type, &self.child_name)?;
        for link in &links {
            if !store.restore_parent_link(child, link) {
                return Err(StructuralError::BondViolation(format!(
                    "could not re-link {}:{} under {}",
                    self.child_type, self.child_name, link.handle
                )));
            }
        }
        Ok(())
    }
}

/// Runs materialised destroy commands forward.
fn destroy_forward(
    store: &mut Store,
    commands: &mut [DestroyObject],
) -> Result<(), StructuralError> {
    commands.iter_mut().try_for_each(|command| command.execute(store))
}

/// Runs materialised destroy commands backward.
fn destroy_backward(
    store: &mut Store,
    commands: &mut [DestroyObject],
) -> Result<(), StructuralError> {
    commands
        .iter_mut()
        .rev()
        .try_for_each(|command| command.unexecute(store))
}

/// Destroys every child of one type under a parent.
///
/// One [`DestroyObject`] per child is materialised on the first execution and
/// replayed on redo.
pub struct DestroyChildrenOfType {
    parent_type: TypeToken,
    parent_name: String,
    child_type: TypeToken,
    destroyed: Option<Vec<DestroyObject>>,
}

impl DestroyChildrenOfType {
    /// Destroys every `C` child of the `P` named `parent`.
    pub fn new<C, P>(parent: impl Into<String>) -> Self
    where
        C: Bonded<P>,
        P: Object,
    {
        Self::erased(P::token(), parent, C::token())
    }

    /// Destroys every `child_type` child of the `parent_type` object named `parent`.
    pub fn erased(
        parent_type: TypeToken,
        parent: impl Into<String>,
        child_type: TypeToken,
    ) -> Self {
        Self {
            parent_type,
            parent_name: parent.into(),
            child_type,
            destroyed: None,
        }
    }
}

impl Command<Store> for DestroyChildrenOfType {
    fn label(&self) -> String {
        format!(
            "destroy {} children of {}:{}",
            self.child_type, self.parent_type, self.parent_name
        )
    }

    fn valid(&self, store: &Store) -> Validation {
        let parent = require_object(store, self.parent_type, &self.parent_name)?;
        if store.bonds().relation(self.child_type, self.parent_type).is_none() {
            return Err(Rejection::new(format!(
                "no bond between {} and {} was declared",
                self.child_type, self.parent_type
            )));
        }
        if store.child_count(parent, self.child_type) == 0 {
            return Err(Rejection::new(format!(
                "{}:{} has no {} children",
                self.parent_type, self.parent_name, self.child_type
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        if self.destroyed.is_none() {
            let parent = store.objects().require_key(self.parent_type, &self.parent_name)?;
            let commands = store
                .child_names(parent, self.child_type)
                .into_iter()
                .map(|name| DestroyObject::erased(self.child_type, name))
                .collect();
            self.destroyed = Some(commands);
        }
        match self.destroyed.as_mut() {
            Some(commands) => destroy_forward(store, commands),
            None => Ok(()),
        }
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        match self.destroyed.as_mut() {
            Some(commands) => destroy_backward(store, commands),
            None => Err(not_executed(self.label())),
        }
    }
}

/// Destroys every child of every bonded type under a parent.
pub struct DestroyAllChildren {
    parent_type: TypeToken,
    parent_name: String,
    destroyed: Option<Vec<DestroyObject>>,
}

impl DestroyAllChildren {
    /// Destroys every child of the `P` named `parent`.
    pub fn new<P: Object>(parent: impl Into<String>) -> Self {
        Self::erased(P::token(), parent)
    }

    /// Destroys every child of the `parent_type` object named `parent`.
    pub fn erased(parent_type: TypeToken, parent: impl Into<String>) -> Self {
        Self {
            parent_type,
            parent_name: parent.into(),
            destroyed: None,
        }
    }

    fn children(&self, store: &Store, parent: ObjectKey) -> Vec<ObjectKey> {
        let mut seen = HashSet::new();
        store
            .bonds()
            .child_types_of(self.parent_type)
            .into_iter()
            .flat_map(|child_type| store.children_of(parent, child_type))
            .filter(|child| seen.insert(*child))
            .collect()
    }
}

impl Command<Store> for DestroyAllChildren {
    fn label(&self) -> String {
        format!("destroy all children of {}:{}", self.parent_type, self.parent_name)
    }

    fn valid(&self, store: &Store) -> Validation {
        let parent = require_object(store, self.parent_type, &self.parent_name)?;
        if self.children(store, parent).is_empty() {
            return Err(Rejection::new(format!(
                "{}:{} has no children",
                self.parent_type, self.parent_name
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        if self.destroyed.is_none() {
            let parent = store.objects().require_key(self.parent_type, &self.parent_name)?;
            let mut commands = Vec::new();
            for child in self.children(store, parent) {
                let name = store.objects().name_of(child).ok_or_else(|| {
                    StructuralError::InvalidState(format!("child {} has no name", child.token))
                })?;
                commands.push(DestroyObject::erased(child.token, name));
            }
            self.destroyed = Some(commands);
        }
        match self.destroyed.as_mut() {
            Some(commands) => destroy_forward(store, commands),
            None => Ok(()),
        }
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        match self.destroyed.as_mut() {
            Some(commands) => destroy_backward(store, commands),
            None => Err(not_executed(self.label())),
        }
    }
}
