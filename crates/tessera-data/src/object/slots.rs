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

//! Slot bookkeeping for object packs.

use crate::object::ObjectId;

/// Maps stable [`ObjectId`]s to the current dense row of their object.
///
/// The table keeps every slot that has ever been allocated. A slot holds the
/// current `ObjectId` (including generation) and the row of the live object, or
/// `None` once the object is destroyed. Freed slot indices are recycled with a
/// bumped generation.
#[derive(Debug, Default, Clone)]
pub(crate) struct SlotTable {
    slots: Vec<(ObjectId, Option<u32>)>,
    freed: Vec<u32>,
}

impl SlotTable {
    /// Allocates a new or recycled slot pointing at `row`.
    pub(crate) fn allocate(&mut self, row: u32) -> ObjectId {
        if let Some(index) = self.freed.pop() {
            let (id_slot, row_slot) = &mut self.slots[index as usize];
            id_slot.generation += 1;
            *row_slot = Some(row);
            *id_slot
        } else {
            let id = ObjectId {
                index: self.slots.len() as u32,
                generation: 0,
            };
            self.slots.push((id, Some(row)));
            id
        }
    }

    /// Returns the dense row of a live object.
    pub(crate) fn row_of(&self, id: ObjectId) -> Option<u32> {
        self.slots
            .get(id.index as usize)
            .and_then(|(slot_id, row)| if *slot_id == id { *row } else { None })
    }

    /// Points a live slot at a new row after a swap-remove moved its object.
    pub(crate) fn relocate(&mut self, id: ObjectId, row: u32) {
        if let Some((slot_id, slot_row)) = self.slots.get_mut(id.index as usize) {
            if *slot_id == id {
                *slot_row = Some(row);
            }
        }
    }

    /// Frees a live slot and returns the row its object occupied.
    pub(crate) fn release(&mut self, id: ObjectId) -> Option<u32> {
        let (slot_id, slot_row) = self.slots.get_mut(id.index as usize)?;
        if *slot_id != id {
            return None;
        }
        let row = slot_row.take()?;
        self.freed.push(id.index);
        Some(row)
    }
}
