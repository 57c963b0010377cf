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

use crate::instance::{InstanceTable, PodTable, RecordTable};
use crate::object::{Object, ObjectKey};

/// Declares that every object of `Self` owns an instance row.
pub trait Occurrence: Object {
    /// Creates the empty record table backing a new object's row.
    fn instance_table() -> Box<dyn InstanceTable>;
}

/// A framed, self-describing copy of a row's records.
///
/// Layout: `[count: u64][byteLen: u64][payload]`. The byte length lets readers
/// skip rows they cannot place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSnapshot(Vec<u8>);

impl RowSnapshot {
    /// Wraps already-framed bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Frames a raw record payload holding `count` records.
    pub fn from_payload(count: usize, payload: &[u8]) -> Self {
        let mut out = ByteWriter::new();
        out.write_u64(count as u64);
        out.write_blob(payload);
        Self(out.into_inner())
    }

    /// Returns the framed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if the snapshot carries no frame at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of records the snapshot restores.
    pub fn instance_count(&self) -> Result<usize, StructuralError> {
        Ok(ByteReader::new(&self.0).read_len()?)
    }
}

/// One object's column of instance records.
pub struct InstanceRow {
    owner: ObjectKey,
    table: Box<dyn InstanceTable>,
}

impl InstanceRow {
    /// Creates a row for `owner` backed by `table`.
    pub fn new(owner: ObjectKey, table: Box<dyn InstanceTable>) -> Self {
        Self { owner, table }
    }

    /// Returns the object owning the row.
    pub fn owner(&self) -> ObjectKey {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ObjectKey) {
        self.owner = owner;
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the row holds no record.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the backing table.
    pub fn table(&self) -> &dyn InstanceTable {
        self.table.as_ref()
    }

    pub(crate) fn table_mut(&mut self) -> &mut dyn InstanceTable {
        self.table.as_mut()
    }

    /// Returns the records if the row stores `R`, whichever table flavour backs it.
    pub fn records<R: 'static>(&self) -> Option<&[R]> {
        let any = self.table.as_any();
        if let Some(table) = any.downcast_ref::<PodTable<R>>() {
            return Some(&table.records);
        }
        any.downcast_ref::<RecordTable<R>>()
            .map(|table| table.records.as_slice())
    }

    /// Returns the records mutably if the row stores `R`.
    ///
    /// Only record values can be changed this way; the count stays under the
    /// control of the owning group.
    pub fn records_mut<R: 'static>(&mut self) -> Option<&mut [R]> {
        let any = self.table.as_any_mut();
        if any.is::<PodTable<R>>() {
            return any
                .downcast_mut::<PodTable<R>>()
                .map(|table| table.records.as_mut_slice());
        }
        any.downcast_mut::<RecordTable<R>>()
            .map(|table| table.records.as_mut_slice())
    }

    /// Writes the newest `count` records as one frame.
    pub fn export_tail(&self, count: usize, out: &mut ByteWriter) -> Result<(), StructuralError> {
        let len = self.table.len();
        if count > len {
            return Err(StructuralError::IndexOutOfBounds { index: count, len });
        }
        out.write_u64(count as u64);
        let length_at = out.position();
        out.write_u64(0);
        let start = out.position();
        self.table.export_range(len - count, count, out)?;
        let byte_len = (out.position() - start) as u64;
        out.patch_u64(length_at, byte_len);
        Ok(())
    }

    /// Writes every record as one frame.
    pub fn export_all(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        self.export_tail(self.table.len(), out)
    }

    /// Reads one frame and appends its records. Returns the number appended.
    pub fn import_frame(&mut self, input: &mut ByteReader<'_>) -> Result<usize, StructuralError> {
        let count = input.read_len()?;
        let payload = input.read_blob()?;
        self.table.import_append(count, payload)?;
        Ok(count)
    }

    /// Captures every record into a snapshot.
    pub fn snapshot(&self) -> Result<RowSnapshot, StructuralError> {
        let mut out = ByteWriter::new();
        self.export_all(&mut out)?;
        Ok(RowSnapshot(out.into_inner()))
    }

    /// Replaces every record with the content of `snapshot`.
    pub fn restore(&mut self, snapshot: &RowSnapshot) -> Result<(), StructuralError> {
        let mut input = ByteReader::new(snapshot.as_bytes());
        let count = input.read_len()?;
        let payload = input.read_blob()?;
        let previous = self.table.len();
        if let Err(err) = self.table.import_append(count, payload) {
            self.table.reduce(self.table.len() - previous);
            return Err(err);
        }
        // Drop the old records only once the new ones decoded cleanly.
        let fresh = self.table.len() - previous;
        if previous > 0 {
            for i in 0..fresh {
                self.table.swap(i, previous + i);
            }
            self.table.reduce(previous);
        }
        debug_assert_eq!(self.table.len(), fresh);
        Ok(())
    }
}
