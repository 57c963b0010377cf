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

//! Binary export and import of a store's packs, bonds and groups.
//!
//! The three stream kinds are independent: packs must be imported before the
//! bonds and groups referring to their objects, and anything that does not
//! resolve against the receiving store is skipped with a warning.

use tessera_core::settings::{self, SectionStatus};
use tessera_core::{ByteReader, ByteWriter, StructuralError, TypeToken};

use crate::bond::ParentHandle;
use crate::object::ObjectKey;
use crate::store::Store;

const PACK_SECTION_PREFIX: &str = "pack:";
const BONDS_SECTION: &str = "bonds";
const INSTANCES_SECTION: &str = "instances";

impl Store {
    /// Writes the pack stream of type `token`.
    pub fn export_pack(
        &self,
        token: TypeToken,
        out: &mut ByteWriter,
    ) -> Result<(), StructuralError> {
        self.objects.require_pack(token)?.export_pack(out)
    }

    /// Reads a pack stream into the pack of type `token`, creating the rows of
    /// the new objects. Returns the keys of the imported objects.
    pub fn import_pack(
        &mut self,
        token: TypeToken,
        input: &mut ByteReader<'_>,
    ) -> Result<Vec<ObjectKey>, StructuralError> {
        let ids = self.objects.require_pack_mut(token)?.import_pack(input)?;
        let keys: Vec<ObjectKey> = ids.into_iter().map(|id| ObjectKey::new(token, id)).collect();
        for key in &keys {
            self.instances.spawn_row(*key);
        }
        Ok(keys)
    }

    /// Writes every bond link.
    ///
    /// Layout: `[relationCount: u32]`, then per relation
    /// `[childType][parentType][linkCount: u64]` followed by one
    /// `[childName][parentName]` pair per link, each parent's children in order.
    pub fn export_bonds(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        let descriptors: Vec<_> = self.bonds.descriptors().copied().collect();
        out.write_u32(descriptors.len() as u32);
        for descriptor in descriptors {
            let (child_type, parent_type) = (descriptor.child, descriptor.parent);
            let mut pairs = Vec::new();
            if let Some(parents) = self.objects.pack_dyn(parent_type) {
                for parent_id in parents.object_ids() {
                    let parent = ObjectKey::new(parent_type, parent_id);
                    let parent_name = self.objects.name_of(parent).unwrap_or_default();
                    for child in self.child_names(parent, child_type) {
                        pairs.push((child, parent_name.to_string()));
                    }
                }
            }
            out.write_str(child_type.name());
            out.write_str(parent_type.name());
            out.write_u64(pairs.len() as u64);
            for (child, parent) in &pairs {
                out.write_str(child);
                out.write_str(parent);
            }
        }
        Ok(())
    }

    /// Reads a bond stream, appending each link to its parent's children.
    ///
    /// Returns the number of links established.
    pub fn import_bonds(&mut self, input: &mut ByteReader<'_>) -> Result<usize, StructuralError> {
        let relation_count = input.read_u32()?;
        let mut linked = 0;
        for _ in 0..relation_count {
            let child_type_name = input.read_str()?;
            let parent_type_name = input.read_str()?;
            let link_count = input.read_len()?;

            let types = self
                .objects
                .token_by_name(&child_type_name)
                .zip(self.objects.token_by_name(&parent_type_name))
                .filter(|(child, parent)| self.bonds.relation(*child, *parent).is_some());
            let Some((child_type, parent_type)) = types else {
                log::warn!("Skipping undeclared bond {child_type_name} -> {parent_type_name}");
                for _ in 0..link_count {
                    input.read_str()?;
                    input.read_str()?;
                }
                continue;
            };

            for _ in 0..link_count {
                let child_name = input.read_str()?;
                let parent_name = input.read_str()?;
                let Some(child) = self.objects.key_of(child_type, &child_name) else {
                    log::warn!("Skipping bond of unknown {child_type}:{child_name}");
                    continue;
                };
                if self.set_parent(child, &ParentHandle::erased(parent_type, parent_name)) {
                    linked += 1;
                }
            }
        }
        Ok(linked)
    }

    /// Writes every instance group.
    ///
    /// Layout: `[groupCount: u32]`, then per group `[name][width: u64]` followed by
    /// the group's row stream.
    pub fn export_instances(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        let groups: Vec<_> = self.instances.groups().collect();
        out.write_u32(groups.len() as u32);
        for group in groups {
            out.write_str(group.name());
            out.write_u64(group.width() as u64);
            group.export_all_to(&self.objects, out)?;
        }
        Ok(())
    }

    /// Reads an instance stream, creating missing groups and attaching rows.
    pub fn import_instances(&mut self, input: &mut ByteReader<'_>) -> Result<(), StructuralError> {
        let group_count = input.read_u32()?;
        for _ in 0..group_count {
            let name = input.read_str()?;
            let width = input.read_len()?;
            if self.instances.group(&name).is_none() {
                self.instances.create_group(&name, width)?;
            }
            self.instances
                .import_all_from(&name, input, &self.objects)?;
        }
        Ok(())
    }

    /// Writes the store as a settings stream: one `pack:<TypeName>` section per
    /// registered type, then `bonds`, then `instances`.
    pub fn export_settings(&self, out: &mut ByteWriter) -> Result<(), StructuralError> {
        for &token in self.objects.tokens() {
            let section = format!("{PACK_SECTION_PREFIX}{token}");
            settings::write_section(out, &section, |w| self.export_pack(token, w))?;
        }
        settings::write_section(out, BONDS_SECTION, |w| self.export_bonds(w))?;
        settings::write_section(out, INSTANCES_SECTION, |w| self.export_instances(w))
    }

    /// Reads a settings stream written by [`export_settings`](Self::export_settings)
    /// on top of the current content.
    ///
    /// Sections for types this store does not register are skipped. The import is
    /// staged in an empty copy of the store and swapped in only once every section
    /// applied, so a failure leaves the store untouched. On success every object
    /// gets a fresh [`ObjectKey`]; names are preserved.
    pub fn import_settings(&mut self, data: &[u8]) -> Result<(), StructuralError> {
        let mut current = ByteWriter::new();
        self.export_settings(&mut current)?;
        let mut staged = self.empty_like();
        staged.apply_sections(current.as_slice())?;
        staged.apply_sections(data)?;
        *self = staged;
        Ok(())
    }

    fn apply_sections(&mut self, data: &[u8]) -> Result<(), StructuralError> {
        settings::read_sections(data, |section, input| {
            if let Some(type_name) = section.strip_prefix(PACK_SECTION_PREFIX) {
                let Some(token) = self.objects.token_by_name(type_name) else {
                    return Ok(SectionStatus::Unknown);
                };
                self.import_pack(token, input)?;
                return Ok(SectionStatus::Consumed);
            }
            match section {
                BONDS_SECTION => self.import_bonds(input).map(|_| SectionStatus::Consumed),
                INSTANCES_SECTION => self.import_instances(input).map(|_| SectionStatus::Consumed),
                _ => Ok(SectionStatus::Unknown),
            }
        })
    }
}
