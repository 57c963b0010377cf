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

//! The two error tiers of the store.
//!
//! [`StructuralError`] reports a broken internal invariant: a logic bug, a corrupt
//! stream, or a command whose `execute` found a state its `valid` should have ruled
//! out. It aborts the current operation and propagates to the caller.
//!
//! [`Rejection`] is the expected, recoverable outcome of a failed precondition check.
//! It never aborts anything; the invoker logs it and the command is dropped.

use std::fmt;

/// Errors raised by the little-endian binary codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The reader ran out of bytes.
    UnexpectedEof {
        /// The number of bytes the read required.
        needed: usize,
        /// The number of bytes left in the stream.
        remaining: usize,
    },
    /// A length-prefixed string was not valid UTF-8.
    InvalidUtf8,
    /// A length or count read from the stream does not fit in memory.
    LengthOverflow(u64),
    /// A record could not be encoded or decoded.
    Codec(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::UnexpectedEof { needed, remaining } => {
                write!(
                    f,
                    "Unexpected end of stream: needed {needed} bytes, {remaining} remaining"
                )
            }
            StreamError::InvalidUtf8 => write!(f, "Stream string is not valid UTF-8"),
            StreamError::LengthOverflow(len) => {
                write!(f, "Stream length {len} does not fit in memory")
            }
            StreamError::Codec(details) => write!(f, "Record codec failure: {details}"),
        }
    }
}

impl std::error::Error for StreamError {}

/// A fatal violation of one of the store's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// An object with this name already exists for this type.
    DuplicateName {
        /// The object type.
        type_name: String,
        /// The conflicting name.
        name: String,
    },
    /// No object with this name exists for this type.
    MissingObject {
        /// The object type.
        type_name: String,
        /// The name that failed to resolve.
        name: String,
    },
    /// The type was never registered with the store.
    UnknownType {
        /// The unregistered type name.
        type_name: String,
    },
    /// A stream or captured value belongs to a different type than expected.
    TypeMismatch {
        /// The type the consumer expected.
        expected: String,
        /// The type that was found.
        found: String,
    },
    /// No instance group with this name exists.
    MissingGroup {
        /// The group name.
        group: String,
    },
    /// An instance group with this name already exists.
    DuplicateGroup {
        /// The group name.
        group: String,
    },
    /// The instance row is already attached to a group.
    RowAlreadyAttached {
        /// The row owner, formatted as `Type:name`.
        row: String,
        /// The group currently holding the row.
        group: String,
    },
    /// The instance row is not a member of the group.
    RowNotAttached {
        /// The row owner, formatted as `Type:name`.
        row: String,
        /// The group the row was expected in.
        group: String,
    },
    /// The object has no instance row (its type has no occurrence table).
    MissingRow {
        /// The row owner, formatted as `Type:name`.
        row: String,
    },
    /// A row's instance count disagrees with its group's width.
    WidthMismatch {
        /// The group name.
        group: String,
        /// The group width.
        expected: usize,
        /// The row's instance count.
        found: usize,
    },
    /// An instance or child index is outside the valid range.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The length of the indexed sequence.
        len: usize,
    },
    /// A parent/child link could not be established or removed.
    BondViolation(String),
    /// A command was driven out of its `Executed ⇄ Unexecuted` cycle.
    InvalidState(String),
    /// A settings consumer read past the end of its section.
    SectionOverrun {
        /// The section name.
        section: String,
    },
    /// A settings section header points outside the stream.
    CorruptSection {
        /// The section name, if it could be read.
        section: String,
        /// The recorded end offset.
        end_offset: i64,
    },
    /// The binary codec failed.
    Stream(StreamError),
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::DuplicateName { type_name, name } => {
                write!(f, "An object named '{name}' already exists for type {type_name}")
            }
            StructuralError::MissingObject { type_name, name } => {
                write!(f, "No object named '{name}' exists for type {type_name}")
            }
            StructuralError::UnknownType { type_name } => {
                write!(f, "Type {type_name} is not registered with the store")
            }
            StructuralError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, found {found}")
            }
            StructuralError::MissingGroup { group } => {
                write!(f, "Instance group '{group}' does not exist")
            }
            StructuralError::DuplicateGroup { group } => {
                write!(f, "Instance group '{group}' already exists")
            }
            StructuralError::RowAlreadyAttached { row, group } => {
                write!(f, "Instance row {row} is already attached to group '{group}'")
            }
            StructuralError::RowNotAttached { row, group } => {
                write!(f, "Instance row {row} is not attached to group '{group}'")
            }
            StructuralError::MissingRow { row } => {
                write!(f, "Object {row} has no instance row")
            }
            StructuralError::WidthMismatch {
                group,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Group '{group}' has width {expected} but a row holds {found} instances"
                )
            }
            StructuralError::IndexOutOfBounds { index, len } => {
                write!(f, "Index {index} is out of bounds for length {len}")
            }
            StructuralError::BondViolation(details) => write!(f, "Bond violation: {details}"),
            StructuralError::InvalidState(details) => {
                write!(f, "Invalid command state: {details}")
            }
            StructuralError::SectionOverrun { section } => {
                write!(f, "Settings consumer for '{section}' read past its section end")
            }
            StructuralError::CorruptSection {
                section,
                end_offset,
            } => {
                write!(
                    f,
                    "Settings section '{section}' has an invalid end offset {end_offset}"
                )
            }
            StructuralError::Stream(err) => write!(f, "Stream error: {err}"),
        }
    }
}

impl std::error::Error for StructuralError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StructuralError::Stream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StreamError> for StructuralError {
    fn from(err: StreamError) -> Self {
        StructuralError::Stream(err)
    }
}

/// An expected precondition failure reported by a command's `valid()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// A human-readable description of the failed precondition.
    pub reason: String,
}

impl Rejection {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for Rejection {}
