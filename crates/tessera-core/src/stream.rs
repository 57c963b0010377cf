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

//! Little-endian binary codec shared by every persistence path.
//!
//! Integers are written in little-endian order. Strings and blobs are prefixed with
//! their byte length as a `u64`.

use std::convert::TryInto;

use crate::error::StreamError;

/// An append-only byte buffer with typed little-endian writers.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Writes a `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) {
        self.write_blob(value.as_bytes());
    }

    /// Writes a length-prefixed byte blob.
    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.write_u64(bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Overwrites an `i64` previously written at `offset`.
    ///
    /// Used to back-patch placeholders such as a section's end offset once the
    /// payload length is known.
    ///
    /// # Panics
    /// Panics if `offset + 8` exceeds the bytes written so far.
    pub fn patch_i64(&mut self, offset: usize, value: i64) {
        self.buffer[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Overwrites a `u64` previously written at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + 8` exceeds the bytes written so far.
    pub fn patch_u64(&mut self, offset: usize, value: u64) {
        self.buffer[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Returns the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns its buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// A cursor over a byte slice with typed little-endian readers.
///
/// Every read is bounds-checked and fails with [`StreamError::UnexpectedEof`]
/// instead of panicking.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns the current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns `true` if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `len` raw bytes.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], StreamError> {
        if len > self.remaining() {
            return Err(StreamError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Skips `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), StreamError> {
        self.read_raw(len).map(|_| ())
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        let bytes = self.read_raw(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("slice of length 4")))
    }

    /// Reads a `u64`.
    pub fn read_u64(&mut self) -> Result<u64, StreamError> {
        let bytes = self.read_raw(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("slice of length 8")))
    }

    /// Reads an `i64`.
    pub fn read_i64(&mut self) -> Result<i64, StreamError> {
        let bytes = self.read_raw(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().expect("slice of length 8")))
    }

    /// Reads a `u64` length or count and converts it to `usize`.
    pub fn read_len(&mut self) -> Result<usize, StreamError> {
        let len = self.read_u64()?;
        usize::try_from(len).map_err(|_| StreamError::LengthOverflow(len))
    }

    /// Reads a length-prefixed byte blob.
    pub fn read_blob(&mut self) -> Result<&'a [u8], StreamError> {
        let len = self.read_len()?;
        self.read_raw(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, StreamError> {
        let bytes = self.read_blob()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| StreamError::InvalidUtf8)
    }

    /// Splits off a reader over the next `len` bytes and advances past them.
    ///
    /// The returned reader cannot see anything beyond those `len` bytes, which is
    /// how section and row payloads are fenced off from their consumers.
    pub fn limited(&mut self, len: usize) -> Result<ByteReader<'a>, StreamError> {
        self.read_raw(len).map(ByteReader::new)
    }
}
