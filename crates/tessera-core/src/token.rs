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

//! Type tokens keying every per-type registry.

use std::fmt;

/// A stable identifier for a concrete object type.
///
/// Every per-type registry in the store (object packs, bond descriptors, occurrence
/// factories) is keyed by a `TypeToken`. The token wraps the type's registered name,
/// which is also the `typeName` written into binary streams, so a token read back
/// from disk can be matched against the registry without any `TypeId` involvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(&'static str);

impl TypeToken {
    /// Creates a token from a registered type name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the registered type name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
