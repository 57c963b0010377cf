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

//! Parent/child bonds between object types.
//!
//! A bond is a relation between one child type and one parent type, declared when
//! the store is built. Each (child type, parent type) pair owns an independent
//! [`Relation`] holding its link state, so a child type may be bonded to several
//! parent types and a parent type may hold several child types without any of
//! those axes affecting the others.

mod registry;
mod relation;

pub use registry::BondRegistry;
pub use relation::{Children, Relation};

use std::fmt;

use tessera_core::TypeToken;

use crate::object::Object;

/// The cardinality of a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondKind {
    /// A parent holds at most one child of the bonded type.
    OneToOne,
    /// A parent holds any number of children, kept in an ordered sequence.
    ManyToOne,
}

/// Declares, at compile time, that `Self` can be the child of `P`.
///
/// ```ignore
/// impl Bonded<Folder> for Document {
///     const KIND: BondKind = BondKind::ManyToOne;
/// }
/// ```
pub trait Bonded<P: Object>: Object {
    /// The cardinality of the bond.
    const KIND: BondKind;
}

/// The runtime description of one declared bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BondDescriptor {
    /// The child type.
    pub child: TypeToken,
    /// The parent type.
    pub parent: TypeToken,
    /// The bond's cardinality.
    pub kind: BondKind,
}

impl BondDescriptor {
    /// Builds the descriptor of the compile-time bond between `C` and `P`.
    pub fn of<C, P>() -> Self
    where
        C: Bonded<P>,
        P: Object,
    {
        Self {
            child: C::token(),
            parent: P::token(),
            kind: C::KIND,
        }
    }
}

/// A type-erased, re-resolvable reference to a parent object.
///
/// A handle never caches a storage address or slot: it names the parent by type
/// and name and is resolved through the registry every time it is used, so it
/// survives any relocation of the parent's storage. The relation a handle refers
/// to is selected by pairing the handle's type with the child's type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParentHandle {
    parent_type: Option<TypeToken>,
    parent_name: String,
}

impl ParentHandle {
    /// A handle designating no parent.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// A handle to the `P` object named `name`.
    pub fn new<P: Object>(name: impl Into<String>) -> Self {
        Self::erased(P::token(), name)
    }

    /// A handle to the object of type `token` named `name`.
    pub fn erased(token: TypeToken, name: impl Into<String>) -> Self {
        Self {
            parent_type: Some(token),
            parent_name: name.into(),
        }
    }

    /// A handle is valid when its type is set and its name is non-empty.
    pub fn is_valid(&self) -> bool {
        self.parent_type.is_some() && !self.parent_name.is_empty()
    }

    /// Returns the parent's type, if set.
    pub fn parent_type(&self) -> Option<TypeToken> {
        self.parent_type
    }

    /// Returns the parent's name (empty for an invalid handle).
    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }
}

impl fmt::Display for ParentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent_type {
            Some(token) if self.is_valid() => write!(f, "{token}:{}", self.parent_name),
            _ => f.write_str("<no parent>"),
        }
    }
}
