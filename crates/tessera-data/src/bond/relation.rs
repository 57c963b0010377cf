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

use tessera_core::StructuralError;

use crate::bond::{BondDescriptor, BondKind};
use crate::object::ObjectId;

/// A child's position in its parent's sibling list.
#[derive(Debug, Clone, Copy)]
struct Link {
    parent: ObjectId,
    prev: Option<ObjectId>,
    next: Option<ObjectId>,
}

/// The head of a parent's sibling list.
#[derive(Debug, Clone, Copy)]
struct Family {
    first: ObjectId,
    last: ObjectId,
    count: usize,
}

/// The link state of one declared bond.
///
/// Children of a parent form an intrusive doubly-linked list threaded through
/// their [`Link`]s. Every id is a generation-checked slot id of the child or
/// parent pack, never a storage row, so swap-removes elsewhere in the packs
/// leave the list intact.
#[derive(Debug, Clone)]
pub struct Relation {
    descriptor: BondDescriptor,
    links: HashMap<ObjectId, Link>,
    families: HashMap<ObjectId, Family>,
}

impl Relation {
    /// Creates an empty relation for `descriptor`.
    pub fn new(descriptor: BondDescriptor) -> Self {
        Self {
            descriptor,
            links: HashMap::new(),
            families: HashMap::new(),
        }
    }

    /// Returns the relation's descriptor.
    pub fn descriptor(&self) -> &BondDescriptor {
        &self.descriptor
    }

    /// Returns the parent `child` is linked to.
    pub fn parent_of(&self, child: ObjectId) -> Option<ObjectId> {
        self.links.get(&child).map(|link| link.parent)
    }

    /// Returns `true` if linking `child` under `parent` respects the bond's
    /// cardinality, assuming `child` is detached first.
    pub fn can_link(&self, child: ObjectId, parent: ObjectId) -> bool {
        match self.descriptor.kind {
            BondKind::ManyToOne => true,
            BondKind::OneToOne => match self.families.get(&parent) {
                None => true,
                Some(family) => family.first == child,
            },
        }
    }

    /// Links a detached `child` under `parent`.
    ///
    /// For a many-to-one bond the child is inserted before `before` when that
    /// object is currently a child of `parent`, and appended otherwise.
    pub fn link(
        &mut self,
        child: ObjectId,
        parent: ObjectId,
        before: Option<ObjectId>,
    ) -> Result<(), StructuralError> {
        if self.links.contains_key(&child) {
            return Err(StructuralError::BondViolation(format!(
                "{} child #{} is already linked to a {} parent",
                self.descriptor.child, child.index, self.descriptor.parent
            )));
        }
        if !self.can_link(child, parent) {
            return Err(StructuralError::BondViolation(format!(
                "{} parent #{} already holds its single {} child",
                self.descriptor.parent, parent.index, self.descriptor.child
            )));
        }

        let before = before.filter(|sibling| self.parent_of(*sibling) == Some(parent));
        match before {
            Some(next) => {
                let prev = self.links[&next].prev;
                self.links.insert(
                    child,
                    Link {
                        parent,
                        prev,
                        next: Some(next),
                    },
                );
                if let Some(link) = self.links.get_mut(&next) {
                    link.prev = Some(child);
                }
                let family = self
                    .families
                    .get_mut(&parent)
                    .ok_or_else(|| StructuralError::BondViolation("missing family".into()))?;
                match prev {
                    Some(prev) => {
                        if let Some(link) = self.links.get_mut(&prev) {
                            link.next = Some(child);
                        }
                    }
                    None => family.first = child,
                }
                family.count += 1;
            }
            None => match self.families.get_mut(&parent) {
                Some(family) => {
                    let last = family.last;
                    family.last = child;
                    family.count += 1;
                    if let Some(link) = self.links.get_mut(&last) {
                        link.next = Some(child);
                    }
                    self.links.insert(
                        child,
                        Link {
                            parent,
                            prev: Some(last),
                            next: None,
                        },
                    );
                }
                None => {
                    self.families.insert(
                        parent,
                        Family {
                            first: child,
                            last: child,
                            count: 1,
                        },
                    );
                    self.links.insert(
                        child,
                        Link {
                            parent,
                            prev: None,
                            next: None,
                        },
                    );
                }
            },
        }
        Ok(())
    }

    /// Unlinks `child` and returns its former parent. Unlinking a detached child
    /// does nothing.
    pub fn unlink(&mut self, child: ObjectId) -> Option<ObjectId> {
        let link = self.links.remove(&child)?;

        if let Some(prev) = link.prev {
            if let Some(prev_link) = self.links.get_mut(&prev) {
                prev_link.next = link.next;
            }
        }
        if let Some(next) = link.next {
            if let Some(next_link) = self.links.get_mut(&next) {
                next_link.prev = link.prev;
            }
        }

        let emptied = match self.families.get_mut(&link.parent) {
            Some(family) => {
                family.count -= 1;
                if family.first == child {
                    if let Some(next) = link.next {
                        family.first = next;
                    }
                }
                if family.last == child {
                    if let Some(prev) = link.prev {
                        family.last = prev;
                    }
                }
                family.count == 0
            }
            None => false,
        };
        if emptied {
            self.families.remove(&link.parent);
        }
        Some(link.parent)
    }

    /// Unlinks every child of `parent` and returns them in sibling order.
    pub fn unlink_children(&mut self, parent: ObjectId) -> Vec<ObjectId> {
        let children: Vec<ObjectId> = self.children(parent).collect();
        for child in &children {
            self.unlink(*child);
        }
        children
    }

    /// Returns the first child of `parent`.
    pub fn first_child(&self, parent: ObjectId) -> Option<ObjectId> {
        self.families.get(&parent).map(|family| family.first)
    }

    /// Returns the last child of `parent`.
    pub fn last_child(&self, parent: ObjectId) -> Option<ObjectId> {
        self.families.get(&parent).map(|family| family.last)
    }

    /// Returns the sibling after `child`.
    pub fn next_sibling(&self, child: ObjectId) -> Option<ObjectId> {
        self.links.get(&child).and_then(|link| link.next)
    }

    /// Returns the sibling before `child`.
    pub fn prev_sibling(&self, child: ObjectId) -> Option<ObjectId> {
        self.links.get(&child).and_then(|link| link.prev)
    }

    /// Returns the number of children of `parent`.
    pub fn child_count(&self, parent: ObjectId) -> usize {
        self.families.get(&parent).map_or(0, |family| family.count)
    }

    /// Iterates over the children of `parent` in sibling order.
    pub fn children(&self, parent: ObjectId) -> Children<'_> {
        Children {
            relation: self,
            cursor: self.first_child(parent),
        }
    }

    /// Returns the total number of links in the relation.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Iterator over a parent's children, see [`Relation::children`].
pub struct Children<'a> {
    relation: &'a Relation,
    cursor: Option<ObjectId>,
}

impl Iterator for Children<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.relation.next_sibling(current);
        Some(current)
    }
}
