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

use std::any::Any;

use serde::{de::DeserializeOwned, Serialize};
use tessera_core::{ByteReader, ByteWriter, StreamError, StructuralError};

/// An internal helper trait to drive a record column without knowing its type.
///
/// This is what lets an [`InstanceGroup`](crate::instance::InstanceGroup) resize,
/// reorder and stream rows whose record types differ from one another.
pub trait InstanceTable {
    /// Returns the Rust type name of the stored records.
    fn record_type(&self) -> &'static str;

    /// Returns `true` for tables of plain-old-data records copied as raw bytes.
    fn is_transferable(&self) -> bool;

    /// Returns the number of records.
    fn len(&self) -> usize;

    /// Returns `true` if the table holds no record.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `count` default records.
    fn enlarge(&mut self, count: usize);

    /// Removes the last `count` records (all of them if `count` exceeds the length).
    fn reduce(&mut self, count: usize);

    /// Swaps two records.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    fn swap(&mut self, a: usize, b: usize);

    /// Removes every record.
    fn clear(&mut self);

    /// Writes the payload of records `start..start + count`.
    fn export_range(
        &self,
        start: usize,
        count: usize,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError>;

    /// Decodes `count` records from `payload` and appends them.
    fn import_append(&mut self, count: usize, payload: &[u8]) -> Result<(), StructuralError>;

    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

fn check_range(start: usize, count: usize, len: usize) -> Result<(), StructuralError> {
    if start.checked_add(count).map_or(true, |end| end > len) {
        return Err(StructuralError::IndexOutOfBounds {
            index: start.saturating_add(count),
            len,
        });
    }
    Ok(())
}

/// A table of transferable records.
///
/// Records are `bytemuck::Pod`, so ranges are streamed as one contiguous block of
/// raw bytes and read back without per-element decoding.
#[derive(Debug, Clone, Default)]
pub struct PodTable<R> {
    pub(crate) records: Vec<R>,
}

impl<R: bytemuck::Pod + Default> PodTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Returns the records.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Returns the records, mutably.
    pub fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }
}

impl<R: bytemuck::Pod + Default> InstanceTable for PodTable<R> {
    fn record_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn is_transferable(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn enlarge(&mut self, count: usize) {
        self.records
            .resize(self.records.len() + count, R::default());
    }

    fn reduce(&mut self, count: usize) {
        let len = self.records.len().saturating_sub(count);
        self.records.truncate(len);
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.records.swap(a, b);
    }

    fn clear(&mut self) {
        self.records.clear();
    }

    fn export_range(
        &self,
        start: usize,
        count: usize,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError> {
        check_range(start, count, self.records.len())?;
        out.write_raw(bytemuck::cast_slice(&self.records[start..start + count]));
        Ok(())
    }

    fn import_append(&mut self, count: usize, payload: &[u8]) -> Result<(), StructuralError> {
        let stride = std::mem::size_of::<R>();
        if stride == 0 {
            self.enlarge(count);
            return Ok(());
        }
        let expected = count
            .checked_mul(stride)
            .ok_or(StreamError::LengthOverflow(count as u64))?;
        if payload.len() != expected {
            return Err(StreamError::Codec(format!(
                "expected {expected} bytes for {count} {} records, found {}",
                std::any::type_name::<R>(),
                payload.len()
            ))
            .into());
        }
        self.records.reserve(count);
        // The payload slice carries no alignment guarantee.
        self.records.extend(
            payload
                .chunks_exact(stride)
                .map(bytemuck::pod_read_unaligned::<R>),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A table of general records, constructed and streamed one element at a time.
///
/// Each record is encoded with bincode as its own length-prefixed blob.
#[derive(Debug, Clone, Default)]
pub struct RecordTable<R> {
    pub(crate) records: Vec<R>,
}

impl<R> RecordTable<R>
where
    R: Serialize + DeserializeOwned + Default + 'static,
{
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Returns the records.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Returns the records, mutably.
    pub fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }
}

impl<R> InstanceTable for RecordTable<R>
where
    R: Serialize + DeserializeOwned + Default + 'static,
{
    fn record_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn is_transferable(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn enlarge(&mut self, count: usize) {
        self.records.extend((0..count).map(|_| R::default()));
    }

    fn reduce(&mut self, count: usize) {
        let len = self.records.len().saturating_sub(count);
        self.records.truncate(len);
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.records.swap(a, b);
    }

    fn clear(&mut self) {
        self.records.clear();
    }

    fn export_range(
        &self,
        start: usize,
        count: usize,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError> {
        check_range(start, count, self.records.len())?;
        for record in &self.records[start..start + count] {
            let bytes = bincode::serde::encode_to_vec(record, bincode::config::standard())
                .map_err(|e| StreamError::Codec(e.to_string()))?;
            out.write_blob(&bytes);
        }
        Ok(())
    }

    fn import_append(&mut self, count: usize, payload: &[u8]) -> Result<(), StructuralError> {
        // Every record carries at least its u64 length prefix.
        if count > payload.len() / 8 {
            return Err(StreamError::LengthOverflow(count as u64).into());
        }
        let mut input = ByteReader::new(payload);
        let mut decoded = Vec::with_capacity(count);
        for _ in 0..count {
            let bytes = input.read_blob()?;
            let (record, _): (R, usize) =
                bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                    .map_err(|e| StreamError::Codec(e.to_string()))?;
            decoded.push(record);
        }
        self.records.extend(decoded);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
