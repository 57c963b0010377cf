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

use std::collections::{BTreeMap, HashMap};

use tessera_core::{ByteReader, StructuralError, TypeToken};

use crate::instance::{InstanceGroup, InstanceRow, InstanceTable, Occurrence, RowSnapshot};
use crate::object::{ObjectKey, ObjectManager};

type TableFactory = fn() -> Box<dyn InstanceTable>;

/// Owns every instance row and every instance group.
///
/// A row lives in exactly one place: either in the detached set, with zero
/// width, or inside the group recorded for its owner in the membership map.
#[derive(Default)]
pub struct InstanceManager {
    factories: HashMap<TypeToken, TableFactory>,
    detached: HashMap<ObjectKey, InstanceRow>,
    membership: HashMap<ObjectKey, String>,
    groups: BTreeMap<String, InstanceGroup>,
}

fn row_label(owner: ObjectKey) -> String {
    format!("{}#{}", owner.token, owner.id.index)
}

impl InstanceManager {
    /// Creates a manager with no occurrence types and no groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that every object of `T` owns an instance row.
    pub fn register_occurrence<T: Occurrence>(&mut self) {
        self.factories.insert(T::token(), T::instance_table);
    }

    /// Returns a manager with the same occurrence types and no rows or groups.
    pub fn empty_like(&self) -> Self {
        Self {
            factories: self.factories.clone(),
            ..Self::default()
        }
    }

    /// Returns `true` if objects of `token` own an instance row.
    pub fn has_occurrence(&self, token: TypeToken) -> bool {
        self.factories.contains_key(&token)
    }

    /// Creates the detached, empty row of a freshly created object.
    ///
    /// Returns `false` when the owner's type has no occurrence table.
    pub fn spawn_row(&mut self, owner: ObjectKey) -> bool {
        let Some(factory) = self.factories.get(&owner.token) else {
            return false;
        };
        self.detached.insert(owner, InstanceRow::new(owner, factory()));
        true
    }

    /// Removes a detached row from the manager.
    ///
    /// Attached rows are left in place; detach them first.
    pub fn take_row(&mut self, owner: ObjectKey) -> Option<InstanceRow> {
        self.detached.remove(&owner)
    }

    /// Hands a detached row back to the manager under a possibly new owner.
    pub fn restore_row(&mut self, owner: ObjectKey, mut row: InstanceRow) {
        row.set_owner(owner);
        self.detached.insert(owner, row);
    }

    /// Returns `true` if `owner` has a row, attached or not.
    pub fn has_row(&self, owner: ObjectKey) -> bool {
        self.detached.contains_key(&owner) || self.membership.contains_key(&owner)
    }

    /// Returns `owner`'s row wherever it currently lives.
    pub fn row(&self, owner: ObjectKey) -> Option<&InstanceRow> {
        match self.membership.get(&owner) {
            Some(group) => self.groups.get(group)?.row(owner),
            None => self.detached.get(&owner),
        }
    }

    /// Returns `owner`'s row mutably.
    pub fn row_mut(&mut self, owner: ObjectKey) -> Option<&mut InstanceRow> {
        match self.membership.get(&owner) {
            Some(group) => self.groups.get_mut(group)?.row_mut(owner),
            None => self.detached.get_mut(&owner),
        }
    }

    /// Returns the name of the group `owner`'s row is attached to.
    pub fn group_of(&self, owner: ObjectKey) -> Option<&str> {
        self.membership.get(&owner).map(String::as_str)
    }

    /// Creates an empty group.
    pub fn create_group(&mut self, name: &str, width: usize) -> Result<(), StructuralError> {
        if name.is_empty() {
            return Err(StructuralError::InvalidState(
                "instance groups need a non-empty name".to_string(),
            ));
        }
        if self.groups.contains_key(name) {
            return Err(StructuralError::DuplicateGroup {
                group: name.to_string(),
            });
        }
        self.groups
            .insert(name.to_string(), InstanceGroup::with_width(name, width));
        Ok(())
    }

    /// Removes a group that holds no row.
    pub fn remove_group(&mut self, name: &str) -> Result<InstanceGroup, StructuralError> {
        let group = self.require_group(name)?;
        if group.row_count() > 0 {
            return Err(StructuralError::InvalidState(format!(
                "group '{name}' still holds {} rows",
                group.row_count()
            )));
        }
        self.groups
            .remove(name)
            .ok_or_else(|| StructuralError::MissingGroup {
                group: name.to_string(),
            })
    }

    /// Returns the group named `name`.
    pub fn group(&self, name: &str) -> Option<&InstanceGroup> {
        self.groups.get(name)
    }

    /// Returns the group named `name`, mutably.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut InstanceGroup> {
        self.groups.get_mut(name)
    }

    /// Like [`group`](Self::group), failing with [`StructuralError::MissingGroup`].
    pub fn require_group(&self, name: &str) -> Result<&InstanceGroup, StructuralError> {
        self.groups
            .get(name)
            .ok_or_else(|| StructuralError::MissingGroup {
                group: name.to_string(),
            })
    }

    /// Like [`group_mut`](Self::group_mut), failing with [`StructuralError::MissingGroup`].
    pub fn require_group_mut(&mut self, name: &str) -> Result<&mut InstanceGroup, StructuralError> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| StructuralError::MissingGroup {
                group: name.to_string(),
            })
    }

    /// Iterates over the groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &InstanceGroup> + '_ {
        self.groups.values()
    }

    /// Attaches `owner`'s detached row to `group`.
    ///
    /// With a snapshot the row takes the snapshot's records, and the snapshot
    /// count must equal the width of a group that already holds rows. Without
    /// one the row is enlarged to the group width. `position` inserts the row
    /// before the row currently at that index; `None` appends.
    pub fn attach_instance_pack(
        &mut self,
        group: &str,
        owner: ObjectKey,
        snapshot: Option<&RowSnapshot>,
        position: Option<usize>,
    ) -> Result<(), StructuralError> {
        if let Some(current) = self.membership.get(&owner) {
            return Err(StructuralError::RowAlreadyAttached {
                row: row_label(owner),
                group: current.clone(),
            });
        }
        let target = self
            .groups
            .get_mut(group)
            .ok_or_else(|| StructuralError::MissingGroup {
                group: group.to_string(),
            })?;
        let mut row = self
            .detached
            .remove(&owner)
            .ok_or_else(|| StructuralError::MissingRow {
                row: row_label(owner),
            })?;

        let prepared = match snapshot {
            Some(snapshot) => row.restore(snapshot),
            None => {
                row.table_mut().clear();
                row.table_mut().enlarge(target.width());
                Ok(())
            }
        };
        if let Err(err) = prepared {
            row.table_mut().clear();
            self.detached.insert(owner, row);
            return Err(err);
        }

        match target.insert_row(row, position) {
            Ok(()) => {
                self.membership.insert(owner, group.to_string());
                Ok(())
            }
            Err((err, mut row)) => {
                row.table_mut().clear();
                self.detached.insert(owner, row);
                Err(err)
            }
        }
    }

    /// Detaches `owner`'s row from `group` and clears it to zero width.
    ///
    /// Returns the position the row occupied and, if requested, a snapshot of
    /// its records taken before clearing.
    pub fn detach_instance_pack(
        &mut self,
        group: &str,
        owner: ObjectKey,
        with_snapshot: bool,
    ) -> Result<(usize, Option<RowSnapshot>), StructuralError> {
        let not_attached = || StructuralError::RowNotAttached {
            row: row_label(owner),
            group: group.to_string(),
        };
        if self.membership.get(&owner).map(String::as_str) != Some(group) {
            return Err(not_attached());
        }
        let source = self.require_group_mut(group)?;
        // Snapshot before removal so a failure leaves the group untouched.
        let snapshot = if with_snapshot {
            Some(source.row(owner).ok_or_else(not_attached)?.snapshot()?)
        } else {
            None
        };
        let (position, mut row) = source.remove_row(owner).ok_or_else(not_attached)?;

        row.table_mut().clear();
        self.membership.remove(&owner);
        self.detached.insert(owner, row);
        Ok((position, snapshot))
    }

    /// Attaches the rows of a stream written by
    /// [`InstanceGroup::export_all_to`] to `group`.
    ///
    /// Rows whose owner cannot be resolved through `objects`, or whose owner has
    /// no instance row, are skipped. Returns the number of rows attached.
    pub fn import_all_from(
        &mut self,
        group: &str,
        input: &mut ByteReader<'_>,
        objects: &ObjectManager,
    ) -> Result<usize, StructuralError> {
        self.require_group(group)?;
        let row_count = input.read_u32()?;
        let mut attached = 0;
        for _ in 0..row_count {
            let name = input.read_str()?;
            let type_name = input.read_str()?;
            let count = input.read_len()?;
            let payload = input.read_blob()?;

            let owner = objects
                .token_by_name(&type_name)
                .and_then(|token| objects.key_of(token, &name))
                .filter(|owner| self.has_row(*owner));
            let Some(owner) = owner else {
                log::warn!("Skipping instance row of unknown object {type_name}:{name}");
                continue;
            };

            let snapshot = RowSnapshot::from_payload(count, payload);
            self.attach_instance_pack(group, owner, Some(&snapshot), None)?;
            attached += 1;
        }
        Ok(attached)
    }
}
