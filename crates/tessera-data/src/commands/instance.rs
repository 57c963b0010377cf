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

use tessera_core::{ByteReader, ByteWriter, Command, Rejection, StructuralError, Validation};

use super::{not_executed, require_group};
use crate::store::Store;

fn export_tail(store: &Store, group: &str, count: usize) -> Result<Vec<u8>, StructuralError> {
    let mut out = ByteWriter::new();
    store
        .instances()
        .require_group(group)?
        .export_tail_to(count, &mut out)?;
    Ok(out.into_inner())
}

fn import_tail(
    store: &mut Store,
    group: &str,
    count: usize,
    tail: &[u8],
) -> Result<(), StructuralError> {
    store
        .instances_mut()
        .require_group_mut(group)?
        .import_tail_from(count, &mut ByteReader::new(tail))
}

fn reject_zero(amount: usize) -> Validation {
    if amount == 0 {
        return Err(Rejection::new("the amount must be at least one"));
    }
    Ok(())
}

/// Appends default instances to every row of a group.
///
/// Undo captures the appended tail so a redo restores the exact records,
/// including any edits made to them in between.
pub struct EnlargeGroup {
    group: String,
    amount: usize,
    tail: Option<Vec<u8>>,
}

impl EnlargeGroup {
    /// Appends `amount` instances to `group`.
    pub fn new(group: impl Into<String>, amount: usize) -> Self {
        Self {
            group: group.into(),
            amount,
            tail: None,
        }
    }
}

impl Command<Store> for EnlargeGroup {
    fn label(&self) -> String {
        format!("enlarge group '{}' by {}", self.group, self.amount)
    }

    fn valid(&self, store: &Store) -> Validation {
        require_group(store, &self.group)?;
        reject_zero(self.amount)
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        match self.tail.take() {
            Some(tail) => import_tail(store, &self.group, self.amount, &tail),
            None => {
                store
                    .instances_mut()
                    .require_group_mut(&self.group)?
                    .add_instances(self.amount);
                Ok(())
            }
        }
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let tail = export_tail(store, &self.group, self.amount)?;
        store
            .instances_mut()
            .require_group_mut(&self.group)?
            .pop_instances(self.amount)?;
        self.tail = Some(tail);
        Ok(())
    }
}

/// Removes the newest instances from every row of a group.
pub struct ReduceGroup {
    group: String,
    amount: usize,
    tail: Option<Vec<u8>>,
}

impl ReduceGroup {
    /// Removes the newest `amount` instances of `group`.
    pub fn new(group: impl Into<String>, amount: usize) -> Self {
        Self {
            group: group.into(),
            amount,
            tail: None,
        }
    }
}

impl Command<Store> for ReduceGroup {
    fn label(&self) -> String {
        format!("reduce group '{}' by {}", self.group, self.amount)
    }

    fn valid(&self, store: &Store) -> Validation {
        let group = require_group(store, &self.group)?;
        reject_zero(self.amount)?;
        if self.amount > group.width() {
            return Err(Rejection::new(format!(
                "cannot remove {} instances from group '{}' of width {}",
                self.amount,
                self.group,
                group.width()
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let tail = export_tail(store, &self.group, self.amount)?;
        store
            .instances_mut()
            .require_group_mut(&self.group)?
            .pop_instances(self.amount)?;
        self.tail = Some(tail);
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let tail = self.tail.take().ok_or_else(|| not_executed(self.label()))?;
        import_tail(store, &self.group, self.amount, &tail)
    }
}

/// Swaps two instances in every row of a group. Its own inverse.
pub struct SwapInstances {
    group: String,
    a: usize,
    b: usize,
}

impl SwapInstances {
    /// Swaps instances `a` and `b` of `group`.
    pub fn new(group: impl Into<String>, a: usize, b: usize) -> Self {
        Self {
            group: group.into(),
            a,
            b,
        }
    }
}

impl Command<Store> for SwapInstances {
    fn label(&self) -> String {
        format!("swap instances {} and {} of group '{}'", self.a, self.b, self.group)
    }

    fn valid(&self, store: &Store) -> Validation {
        let group = require_group(store, &self.group)?;
        if self.a == self.b {
            return Err(Rejection::new("cannot swap an instance with itself"));
        }
        let bound = self.a.max(self.b);
        if bound >= group.width() {
            return Err(Rejection::new(format!(
                "index {bound} is out of bounds for group '{}' of width {}",
                self.group,
                group.width()
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        store
            .instances_mut()
            .require_group_mut(&self.group)?
            .swap_instances(self.a, self.b)
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        self.execute(store)
    }
}

/// Removes one instance from every row of a group by swapping it with the last
/// one and popping the tail.
pub struct DestroyInstance {
    group: String,
    index: usize,
    // The popped tail record and the index it was swapped with.
    captured: Option<(Vec<u8>, usize)>,
}

impl DestroyInstance {
    /// Removes instance `index` of `group`.
    pub fn new(group: impl Into<String>, index: usize) -> Self {
        Self {
            group: group.into(),
            index,
            captured: None,
        }
    }
}

impl Command<Store> for DestroyInstance {
    fn label(&self) -> String {
        format!("destroy instance {} of group '{}'", self.index, self.group)
    }

    fn valid(&self, store: &Store) -> Validation {
        let group = require_group(store, &self.group)?;
        if self.index >= group.width() {
            return Err(Rejection::new(format!(
                "index {} is out of bounds for group '{}' of width {}",
                self.index,
                self.group,
                group.width()
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let group = store.instances_mut().require_group_mut(&self.group)?;
        let last = group.width().checked_sub(1).ok_or(StructuralError::IndexOutOfBounds {
            index: self.index,
            len: 0,
        })?;
        if self.index != last {
            group.swap_instances(self.index, last)?;
        }
        let tail = export_tail(store, &self.group, 1)?;
        store
            .instances_mut()
            .require_group_mut(&self.group)?
            .pop_instances(1)?;
        self.captured = Some((tail, last));
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let (tail, last) = self.captured.take().ok_or_else(|| not_executed(self.label()))?;
        import_tail(store, &self.group, 1, &tail)?;
        if self.index != last {
            store
                .instances_mut()
                .require_group_mut(&self.group)?
                .swap_instances(self.index, last)?;
        }
        Ok(())
    }
}
