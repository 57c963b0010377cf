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

//! Instance rows and the groups that keep them at a common width.
//!
//! An object whose type has an *occurrence* table owns one [`InstanceRow`]: a
//! column of lightweight records distinct from the object itself. A row can be
//! attached to at most one [`InstanceGroup`]. Every row of a group holds exactly
//! as many records as the group's width, and every resize or reorder is applied
//! to all of them at once.

mod group;
mod manager;
mod row;
mod table;

pub use group::InstanceGroup;
pub use manager::InstanceManager;
pub use row::{InstanceRow, Occurrence, RowSnapshot};
pub use table::{InstanceTable, PodTable, RecordTable};
