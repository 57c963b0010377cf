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

use tessera_core::{ByteReader, ByteWriter, StructuralError};

use crate::instance::InstanceRow;
use crate::object::{ObjectKey, ObjectManager};

/// An ordered set of instance rows sharing one width.
///
/// The group is the only place where the record count of an attached row
/// changes. Every operation below is applied to all rows identically, which is
/// what keeps the rows in lock-step.
pub struct InstanceGroup {
    name: String,
    rows: Vec<InstanceRow>,
    width: usize,
}

impl InstanceGroup {
    /// Creates an empty group of width zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_width(name, 0)
    }

    /// Creates an empty group with a preset width, adopted by the first
    /// snapshot-less row attached to it.
    pub fn with_width(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            width,
        }
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of instances every attached row holds.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of attached rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the attached rows in attachment order.
    pub fn rows(&self) -> &[InstanceRow] {
        &self.rows
    }

    /// Iterates over the owners of the attached rows, in order.
    pub fn owners(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.rows.iter().map(InstanceRow::owner)
    }

    /// Returns the position of `owner`'s row in the group.
    pub fn position_of(&self, owner: ObjectKey) -> Option<usize> {
        self.rows.iter().position(|row| row.owner() == owner)
    }

    /// Returns the row owned by `owner`.
    pub fn row(&self, owner: ObjectKey) -> Option<&InstanceRow> {
        self.rows.iter().find(|row| row.owner() == owner)
    }

    /// Returns the row owned by `owner`, mutably.
    pub fn row_mut(&mut self, owner: ObjectKey) -> Option<&mut InstanceRow> {
        self.rows.iter_mut().find(|row| row.owner() == owner)
    }

    /// Appends `count` default instances to every row.
    pub fn add_instances(&mut self, count: usize) {
        for row in &mut self.rows {
            row.table_mut().enlarge(count);
        }
        self.width += count;
    }

    /// Removes the newest `count` instances from every row.
    pub fn pop_instances(&mut self, count: usize) -> Result<(), StructuralError> {
        if count > self.width {
            return Err(StructuralError::IndexOutOfBounds {
                index: count,
                len: self.width,
            });
        }
        for row in &mut self.rows {
            row.table_mut().reduce(count);
        }
        self.width -= count;
        Ok(())
    }

    /// Swaps instances `a` and `b` in every row.
    pub fn swap_instances(&mut self, a: usize, b: usize) -> Result<(), StructuralError> {
        for index in [a, b] {
            if index >= self.width {
                return Err(StructuralError::IndexOutOfBounds {
                    index,
                    len: self.width,
                });
            }
        }
        for row in &mut self.rows {
            row.table_mut().swap(a, b);
        }
        Ok(())
    }

    /// Writes the newest `count` instances of every row.
    ///
    /// Layout: `[rowCount: u32]` followed by one row frame per attached row.
    pub fn export_tail_to(
        &self,
        count: usize,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError> {
        if count > self.width {
            return Err(StructuralError::IndexOutOfBounds {
                index: count,
                len: self.width,
            });
        }
        out.write_u32(self.rows.len() as u32);
        for row in &self.rows {
            row.export_tail(count, out)?;
        }
        Ok(())
    }

    /// Appends `count` instances to every row from a stream written by
    /// [`export_tail_to`](Self::export_tail_to).
    ///
    /// The stream must hold one frame of exactly `count` records per attached row.
    /// On failure every row is trimmed back to the previous width.
    pub fn import_tail_from(
        &mut self,
        count: usize,
        input: &mut ByteReader<'_>,
    ) -> Result<(), StructuralError> {
        let row_count = input.read_u32()? as usize;
        if row_count != self.rows.len() {
            return Err(StructuralError::InvalidState(format!(
                "tail stream for group '{}' holds {row_count} rows, the group has {}",
                self.name,
                self.rows.len()
            )));
        }

        let previous = self.width;
        let result = self.rows.iter_mut().try_for_each(|row| {
            let imported = row.import_frame(input)?;
            if imported != count {
                return Err(StructuralError::WidthMismatch {
                    group: String::new(),
                    expected: count,
                    found: imported,
                });
            }
            Ok(())
        });

        if let Err(err) = result {
            for row in &mut self.rows {
                let extra = row.len().saturating_sub(previous);
                row.table_mut().reduce(extra);
            }
            return Err(match err {
                StructuralError::WidthMismatch {
                    expected, found, ..
                } => StructuralError::WidthMismatch {
                    group: self.name.clone(),
                    expected,
                    found,
                },
                other => other,
            });
        }
        self.width += count;
        Ok(())
    }

    /// Writes every attached row with its owner's name and type.
    ///
    /// Layout: `[rowCount: u32]`, then per row `[ownerName][ownerType]` followed
    /// by the row frame.
    pub fn export_all_to(
        &self,
        objects: &ObjectManager,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError> {
        out.write_u32(self.rows.len() as u32);
        for row in &self.rows {
            let owner = row.owner();
            let name = objects
                .name_of(owner)
                .ok_or_else(|| StructuralError::MissingObject {
                    type_name: owner.token.name().to_string(),
                    name: format!("#{}", owner.id.index),
                })?;
            out.write_str(name);
            out.write_str(owner.token.name());
            row.export_all(out)?;
        }
        Ok(())
    }

    /// Inserts a prepared row at `position` (or at the end).
    ///
    /// A group without rows adopts the row's count as its width; otherwise the
    /// count must already match.
    pub(crate) fn insert_row(
        &mut self,
        row: InstanceRow,
        position: Option<usize>,
    ) -> Result<(), (StructuralError, InstanceRow)> {
        if self.rows.is_empty() {
            self.width = row.len();
        } else if row.len() != self.width {
            let err = StructuralError::WidthMismatch {
                group: self.name.clone(),
                expected: self.width,
                found: row.len(),
            };
            return Err((err, row));
        }
        let position = position.map_or(self.rows.len(), |p| p.min(self.rows.len()));
        self.rows.insert(position, row);
        Ok(())
    }

    /// Removes `owner`'s row and returns it with the position it occupied.
    pub(crate) fn remove_row(&mut self, owner: ObjectKey) -> Option<(usize, InstanceRow)> {
        let position = self.position_of(owner)?;
        Some((position, self.rows.remove(position)))
    }

    /// Presets the width of a group that has no rows.
    pub(crate) fn set_width(&mut self, width: usize) -> Result<(), StructuralError> {
        if !self.rows.is_empty() {
            return Err(StructuralError::InvalidState(format!(
                "cannot reset the width of group '{}' while it holds rows",
                self.name
            )));
        }
        self.width = width;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PodTable;
    use crate::object::ObjectId;
    use tessera_core::TypeToken;

    fn row(index: u32, len: usize) -> InstanceRow {
        let owner = ObjectKey::new(
            TypeToken::new("Emitter"),
            ObjectId {
                index,
                generation: 0,
            },
        );
        let mut row = InstanceRow::new(owner, Box::new(PodTable::<u32>::new()));
        row.table_mut().enlarge(len);
        row
    }

    #[test]
    fn test_rows_stay_in_lock_step() {
        // --- ARRANGE ---
        let mut group = InstanceGroup::new("particles");
        assert!(group.insert_row(row(0, 0), None).is_ok());
        assert!(group.insert_row(row(1, 0), None).is_ok());

        // --- ACT ---
        group.add_instances(5);
        group.pop_instances(2).unwrap();

        // --- ASSERT ---
        assert_eq!(group.width(), 3);
        assert!(group.rows().iter().all(|row| row.len() == 3));
        assert!(group.pop_instances(4).is_err());
    }

    #[test]
    fn test_first_row_sets_width_and_others_must_match() {
        let mut group = InstanceGroup::new("particles");
        assert!(group.insert_row(row(0, 4), None).is_ok());
        assert_eq!(group.width(), 4);

        let (err, rejected) = group.insert_row(row(1, 2), None).unwrap_err();
        assert!(matches!(err, StructuralError::WidthMismatch { expected: 4, found: 2, .. }));
        assert_eq!(rejected.len(), 2);
        assert_eq!(group.row_count(), 1);
    }

    #[test]
    fn test_insert_at_position_and_remove() {
        let mut group = InstanceGroup::new("particles");
        let a = row(0, 0);
        let b = row(1, 0);
        let b_owner = b.owner();
        assert!(group.insert_row(a, None).is_ok());
        assert!(group.insert_row(b, Some(0)).is_ok());

        assert_eq!(group.position_of(b_owner), Some(0));
        let (position, removed) = group.remove_row(b_owner).unwrap();
        assert_eq!(position, 0);
        assert_eq!(removed.owner(), b_owner);
        assert!(group.remove_row(b_owner).is_none());
    }

    #[test]
    fn test_swap_applies_to_every_row() {
        let mut group = InstanceGroup::new("particles");
        assert!(group.insert_row(row(0, 3), None).is_ok());
        assert!(group.insert_row(row(1, 3), None).is_ok());
        for row in group.rows.iter_mut() {
            row.records_mut::<u32>().unwrap().copy_from_slice(&[1, 2, 3]);
        }

        group.swap_instances(0, 2).unwrap();

        for row in group.rows() {
            assert_eq!(row.records::<u32>().unwrap(), &[3, 2, 1]);
        }
        assert!(group.swap_instances(0, 3).is_err());
    }

    #[test]
    fn test_tail_transfer_round_trip() {
        // --- ARRANGE ---
        let mut group = InstanceGroup::new("particles");
        assert!(group.insert_row(row(0, 4), None).is_ok());
        for row in group.rows.iter_mut() {
            row.records_mut::<u32>().unwrap().copy_from_slice(&[10, 20, 30, 40]);
        }
        let mut out = ByteWriter::new();
        group.export_tail_to(2, &mut out).unwrap();
        group.pop_instances(2).unwrap();

        // --- ACT ---
        let bytes = out.into_inner();
        group
            .import_tail_from(2, &mut ByteReader::new(&bytes))
            .unwrap();

        // --- ASSERT ---
        assert_eq!(group.width(), 4);
        assert_eq!(group.rows()[0].records::<u32>().unwrap(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_tail_import_with_wrong_count_rolls_back() {
        let mut group = InstanceGroup::new("particles");
        assert!(group.insert_row(row(0, 3), None).is_ok());
        let mut out = ByteWriter::new();
        group.export_tail_to(1, &mut out).unwrap();

        let bytes = out.into_inner();
        let result = group.import_tail_from(2, &mut ByteReader::new(&bytes));

        assert!(matches!(result, Err(StructuralError::WidthMismatch { .. })));
        assert_eq!(group.width(), 3);
        assert_eq!(group.rows()[0].len(), 3);
    }
}
