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

use tessera_core::{Command, Rejection, StructuralError, TypeToken, Validation};

use super::{not_executed, require_group, require_object};
use crate::instance::RowSnapshot;
use crate::object::Object;
use crate::store::Store;

/// Creates an empty instance group.
pub struct CreateGroup {
    name: String,
    width: usize,
}

impl CreateGroup {
    /// Creates the group `name` with width zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_width(name, 0)
    }

    /// Creates the group `name` with a preset width.
    pub fn with_width(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

impl Command<Store> for CreateGroup {
    fn label(&self) -> String {
        format!("create group '{}'", self.name)
    }

    fn valid(&self, store: &Store) -> Validation {
        if self.name.is_empty() {
            return Err(Rejection::new("group names cannot be empty"));
        }
        if store.instances().group(&self.name).is_some() {
            return Err(Rejection::new(format!("group '{}' already exists", self.name)));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        store.instances_mut().create_group(&self.name, self.width)
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        store.instances_mut().remove_group(&self.name).map(|_| ())
    }
}

struct CapturedGroup {
    width: usize,
    rows: Vec<(TypeToken, String, RowSnapshot)>,
}

/// Detaches every row of a group and removes it.
///
/// Undo recreates the group and re-attaches each row, in order, with its records.
pub struct DestroyGroup {
    name: String,
    captured: Option<CapturedGroup>,
}

impl DestroyGroup {
    /// Destroys the group `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            captured: None,
        }
    }
}

impl Command<Store> for DestroyGroup {
    fn label(&self) -> String {
        format!("destroy group '{}'", self.name)
    }

    fn valid(&self, store: &Store) -> Validation {
        require_group(store, &self.name).map(|_| ())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let group = store.instances().require_group(&self.name)?;
        let width = group.width();
        let owners: Vec<_> = group.owners().collect();

        let mut rows = Vec::with_capacity(owners.len());
        for owner in owners {
            let name = store
                .objects()
                .name_of(owner)
                .map(str::to_string)
                .ok_or_else(|| StructuralError::MissingObject {
                    type_name: owner.token.name().to_string(),
                    name: format!("#{}", owner.id.index),
                })?;
            let (_, snapshot) = store
                .instances_mut()
                .detach_instance_pack(&self.name, owner, true)?;
            rows.push((owner.token, name, snapshot.unwrap_or_default()));
        }
        store.instances_mut().remove_group(&self.name)?;
        self.captured = Some(CapturedGroup { width, rows });
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let captured = self.captured.take().ok_or_else(|| not_executed(self.label()))?;
        store.instances_mut().create_group(&self.name, captured.width)?;
        for (token, name, snapshot) in &captured.rows {
            let owner = store.objects().require_key(*token, name)?;
            store
                .instances_mut()
                .attach_instance_pack(&self.name, owner, Some(snapshot), None)?;
        }
        Ok(())
    }
}

/// Attaches an object's instance row to a group.
///
/// Without a snapshot the row adopts the group's width with default records;
/// with one, the row takes the snapshot's records.
pub struct AttachInstances {
    group: String,
    owner_type: TypeToken,
    owner_name: String,
    snapshot: Option<RowSnapshot>,
    // Width of the group before the row made it non-empty.
    adopted_from: Option<usize>,
}

impl AttachInstances {
    /// Attaches the row of the `T` named `owner` to `group`.
    pub fn new<T: Object>(group: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::erased(group, T::token(), owner)
    }

    /// Attaches the row of the `owner_type` object named `owner` to `group`.
    pub fn erased(
        group: impl Into<String>,
        owner_type: TypeToken,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            owner_type,
            owner_name: owner.into(),
            snapshot: None,
            adopted_from: None,
        }
    }

    /// Restores the row's records from `snapshot` instead of adopting the width.
    pub fn with_snapshot(mut self, snapshot: RowSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

impl Command<Store> for AttachInstances {
    fn label(&self) -> String {
        format!(
            "attach {}:{} to group '{}'",
            self.owner_type, self.owner_name, self.group
        )
    }

    fn valid(&self, store: &Store) -> Validation {
        let group = require_group(store, &self.group)?;
        let owner = require_object(store, self.owner_type, &self.owner_name)?;
        if !store.instances().has_row(owner) {
            return Err(Rejection::new(format!(
                "{} objects have no instance row",
                self.owner_type
            )));
        }
        if let Some(current) = store.instances().group_of(owner) {
            return Err(Rejection::new(format!(
                "{}:{} is already attached to group '{current}'",
                self.owner_type, self.owner_name
            )));
        }
        if let Some(snapshot) = &self.snapshot {
            let count = snapshot
                .instance_count()
                .map_err(|err| Rejection::new(format!("unreadable snapshot: {err}")))?;
            if group.row_count() > 0 && count != group.width() {
                return Err(Rejection::new(format!(
                    "snapshot holds {count} instances, group '{}' has width {}",
                    self.group,
                    group.width()
                )));
            }
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let owner = store.objects().require_key(self.owner_type, &self.owner_name)?;
        let group = store.instances().require_group(&self.group)?;
        let adopted_from = (group.row_count() == 0).then_some(group.width());
        store
            .instances_mut()
            .attach_instance_pack(&self.group, owner, self.snapshot.as_ref(), None)?;
        self.adopted_from = adopted_from;
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let owner = store.objects().require_key(self.owner_type, &self.owner_name)?;
        let instances = store.instances_mut();
        instances.detach_instance_pack(&self.group, owner, false)?;
        if let Some(width) = self.adopted_from {
            instances.require_group_mut(&self.group)?.set_width(width)?;
        }
        Ok(())
    }
}

/// Detaches an object's instance row from its group, keeping a snapshot for undo.
pub struct DetachInstances {
    group: String,
    owner_type: TypeToken,
    owner_name: String,
    captured: Option<(usize, RowSnapshot)>,
}

impl DetachInstances {
    /// Detaches the row of the `T` named `owner` from `group`.
    pub fn new<T: Object>(group: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::erased(group, T::token(), owner)
    }

    /// Detaches the row of the `owner_type` object named `owner` from `group`.
    pub fn erased(
        group: impl Into<String>,
        owner_type: TypeToken,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            owner_type,
            owner_name: owner.into(),
            captured: None,
        }
    }

    /// Returns the snapshot taken by the last execution.
    pub fn snapshot(&self) -> Option<&RowSnapshot> {
        self.captured.as_ref().map(|(_, snapshot)| snapshot)
    }
}

impl Command<Store> for DetachInstances {
    fn label(&self) -> String {
        format!(
            "detach {}:{} from group '{}'",
            self.owner_type, self.owner_name, self.group
        )
    }

    fn valid(&self, store: &Store) -> Validation {
        require_group(store, &self.group)?;
        let owner = require_object(store, self.owner_type, &self.owner_name)?;
        if store.instances().group_of(owner) != Some(self.group.as_str()) {
            return Err(Rejection::new(format!(
                "{}:{} is not attached to group '{}'",
                self.owner_type, self.owner_name, self.group
            )));
        }
        Ok(())
    }

    fn execute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let owner = store.objects().require_key(self.owner_type, &self.owner_name)?;
        let (position, snapshot) = store
            .instances_mut()
            .detach_instance_pack(&self.group, owner, true)?;
        self.captured = Some((position, snapshot.unwrap_or_default()));
        Ok(())
    }

    fn unexecute(&mut self, store: &mut Store) -> Result<(), StructuralError> {
        let (position, snapshot) = self
            .captured
            .as_ref()
            .ok_or_else(|| not_executed(self.label()))?;
        let owner = store.objects().require_key(self.owner_type, &self.owner_name)?;
        store
            .instances_mut()
            .attach_instance_pack(&self.group, owner, Some(snapshot), Some(*position))
    }
}
