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

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tessera_core::{ByteWriter, Command};

use crate::bond::{BondKind, Bonded, ParentHandle};
use crate::commands::*;
use crate::instance::{InstanceTable, Occurrence, PodTable, RecordTable, RowSnapshot};
use crate::object::ObjectKey;
use crate::store::Store;
use crate::Object;

// --- FIXTURE TYPES ---

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Folder {
    color: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Archive {
    shelf: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Document {
    pages: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Cover {
    title: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Emitter {
    rate: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Object)]
struct Labeler {
    prefix: String,
}

/// A transferable instance record.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Spark {
    x: f32,
    y: f32,
}

impl Bonded<Folder> for Document {
    const KIND: BondKind = BondKind::ManyToOne;
}

impl Bonded<Archive> for Document {
    const KIND: BondKind = BondKind::OneToOne;
}

impl Bonded<Document> for Cover {
    const KIND: BondKind = BondKind::OneToOne;
}

impl Bonded<Folder> for Emitter {
    const KIND: BondKind = BondKind::ManyToOne;
}

impl Occurrence for Emitter {
    fn instance_table() -> Box<dyn InstanceTable> {
        Box::new(PodTable::<Spark>::new())
    }
}

impl Occurrence for Labeler {
    fn instance_table() -> Box<dyn InstanceTable> {
        Box::new(RecordTable::<String>::new())
    }
}

// --- HELPERS ---

fn store() -> Store {
    Store::builder()
        .register::<Folder>()
        .register::<Archive>()
        .register_occurrence::<Emitter>()
        .register_occurrence::<Labeler>()
        .bond::<Document, Folder>()
        .bond::<Document, Archive>()
        .bond::<Cover, Document>()
        .bond::<Emitter, Folder>()
        .build()
}

fn run(store: &mut Store, history: &mut StoreHistory, command: impl Command<Store>) -> bool {
    history.invoke(store, command).unwrap()
}

fn key<T: Object>(store: &Store, name: &str) -> ObjectKey {
    store.key_of(T::token(), name).unwrap()
}

fn sparks(store: &Store, emitter: &str) -> Vec<Spark> {
    let owner = key::<Emitter>(store, emitter);
    store
        .instances()
        .row(owner)
        .unwrap()
        .records::<Spark>()
        .unwrap()
        .to_vec()
}

fn set_sparks(store: &mut Store, emitter: &str, values: &[f32]) {
    let owner = key::<Emitter>(store, emitter);
    let records = store
        .instances_mut()
        .row_mut(owner)
        .unwrap()
        .records_mut::<Spark>()
        .unwrap();
    for (record, value) in records.iter_mut().zip(values) {
        *record = Spark { x: *value, y: -*value };
    }
}

fn xs(store: &Store, emitter: &str) -> Vec<f32> {
    sparks(store, emitter).iter().map(|spark| spark.x).collect()
}

fn children(store: &Store, folder: &str) -> Vec<String> {
    store.children_named::<Document, Folder>(folder)
}

fn settings(store: &Store) -> Vec<u8> {
    let mut out = ByteWriter::new();
    store.export_settings(&mut out).unwrap();
    out.into_inner()
}

/// Runs `command`, then checks that undo brings back the exact prior state and
/// that redo followed by undo does so again.
fn assert_undo_restores(store: &mut Store, command: impl Command<Store>) {
    let mut history = StoreHistory::new();
    let before = settings(store);

    assert!(run(store, &mut history, command));
    let after = settings(store);
    assert_ne!(after, before, "The command must change the store");

    assert!(history.undo(store).unwrap());
    assert_eq!(settings(store), before);
    assert!(history.redo(store).unwrap());
    assert_eq!(settings(store), after);
    assert!(history.undo(store).unwrap());
    assert_eq!(settings(store), before);
}

/// A folder `f` holding `d1`, `d2`, `d3`, where `d2` carries the cover `c`.
fn populated(history: &mut StoreHistory) -> Store {
    let mut store = store();
    assert!(run(&mut store, history, CreateObject::new::<Folder>("f")));
    for name in ["d1", "d2", "d3"] {
        assert!(run(&mut store, history, CreateObject::new::<Document>(name)));
        assert!(run(&mut store, history, AdoptObject::new::<Document, Folder>(name, "f")));
    }
    assert!(run(&mut store, history, CreateObject::new::<Cover>("c")));
    assert!(run(&mut store, history, AdoptObject::new::<Cover, Document>("c", "d2")));
    history.clear();
    store
}

/// A group `g` of the given width holding the rows of the given emitters.
fn with_group(history: &mut StoreHistory, width: usize, emitters: &[&str]) -> Store {
    let mut store = store();
    assert!(run(&mut store, history, CreateGroup::with_width("g", width)));
    for name in emitters {
        assert!(run(&mut store, history, CreateObject::new::<Emitter>(*name)));
        assert!(run(&mut store, history, AttachInstances::new::<Emitter>("g", *name)));
    }
    history.clear();
    store
}

// --- SCENARIOS ---

#[test]
fn test_duplicate_create_is_rejected() {
    // --- ARRANGE ---
    let mut store = store();
    let mut history = StoreHistory::new();

    // --- ACT ---
    let first = run(&mut store, &mut history, CreateObject::new::<Folder>("w1"));
    let second = run(&mut store, &mut history, CreateObject::new::<Folder>("w1"));

    // --- ASSERT ---
    assert!(first);
    assert!(!second, "A second object with the same name must be rejected");
    assert_eq!(store.objects().count(Folder::token()), 1);
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn test_enlarge_on_empty_group_and_undo() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 0, &["e1"]);

    assert!(run(&mut store, &mut history, EnlargeGroup::new("g", 5)));
    assert_eq!(sparks(&store, "e1"), vec![Spark::default(); 5]);

    assert!(history.undo(&mut store).unwrap());
    assert!(sparks(&store, "e1").is_empty());
    assert_eq!(store.instances().group("g").unwrap().width(), 0);
}

#[test]
fn test_swapping_an_instance_with_itself_is_rejected() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 4, &["e1"]);
    set_sparks(&mut store, "e1", &[0.0, 1.0, 2.0, 3.0]);

    assert!(!run(&mut store, &mut history, SwapInstances::new("g", 2, 2)));

    assert_eq!(xs(&store, "e1"), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(history.undo_len(), 0);
}

#[test]
fn test_destroy_instance_swaps_with_last_and_undo_restores_order() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 5, &["e1", "e2"]);
    set_sparks(&mut store, "e1", &[0.0, 1.0, 2.0, 3.0, 4.0]);
    set_sparks(&mut store, "e2", &[10.0, 11.0, 12.0, 13.0, 14.0]);

    // --- ACT ---
    assert!(run(&mut store, &mut history, DestroyInstance::new("g", 3)));

    // --- ASSERT ---
    assert_eq!(xs(&store, "e1"), vec![0.0, 1.0, 2.0, 4.0]);
    assert_eq!(xs(&store, "e2"), vec![10.0, 11.0, 12.0, 14.0]);

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(xs(&store, "e1"), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(xs(&store, "e2"), vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    assert_eq!(sparks(&store, "e1")[3], Spark { x: 3.0, y: -3.0 });
}

#[test]
fn test_detach_snapshot_reattach_restores_records() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 7, &["r"]);
    assert_eq!(sparks(&store, "r"), vec![Spark::default(); 7]);
    set_sparks(&mut store, "r", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    let original = sparks(&store, "r");

    // --- ACT ---
    let mut detach = DetachInstances::new::<Emitter>("g", "r");
    assert!(detach.valid(&store).is_ok());
    detach.execute(&mut store).unwrap();
    assert!(sparks(&store, "r").is_empty());
    let snapshot = detach.snapshot().unwrap().clone();

    let reattach = AttachInstances::new::<Emitter>("g", "r").with_snapshot(snapshot);
    assert!(run(&mut store, &mut history, reattach));

    // --- ASSERT ---
    assert_eq!(sparks(&store, "r"), original);
}

// --- COMMAND INVERTIBILITY ---

#[test]
fn test_destroy_object_restores_bonds_children_and_row() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    store.find_mut::<Document>("d2").unwrap().pages = 42;

    // --- ACT ---
    assert!(run(&mut store, &mut history, DestroyObject::new::<Document>("d2")));

    // --- ASSERT ---
    assert!(store.find::<Document>("d2").is_none());
    assert_eq!(children(&store, "f"), vec!["d1", "d3"]);
    let cover = key::<Cover>(&store, "c");
    assert!(!store.has_parent(cover, Document::token()));

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(store.find::<Document>("d2").unwrap().pages, 42);
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
    assert_eq!(store.parent_of::<Cover, Document>("c").unwrap().pages, 42);

    // Redo destroys the same object again.
    assert!(history.redo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d3"]);
}

#[test]
fn test_destroyed_row_returns_to_its_group_position() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 3, &["e1", "e2", "e3"]);
    set_sparks(&mut store, "e2", &[5.0, 6.0, 7.0]);

    assert!(run(&mut store, &mut history, DestroyObject::new::<Emitter>("e2")));
    assert_eq!(store.instances().group("g").unwrap().row_count(), 2);

    assert!(history.undo(&mut store).unwrap());
    let group = store.instances().group("g").unwrap();
    let owners: Vec<_> = group
        .owners()
        .map(|owner| store.objects().name_of(owner).unwrap().to_string())
        .collect();
    assert_eq!(owners, vec!["e1", "e2", "e3"]);
    assert_eq!(xs(&store, "e2"), vec![5.0, 6.0, 7.0]);
}

#[test]
fn test_create_undo_removes_object_and_row() {
    let mut store = store();
    let mut history = StoreHistory::new();

    assert!(run(&mut store, &mut history, CreateObject::new::<Emitter>("e1")));
    let owner = key::<Emitter>(&store, "e1");
    assert!(store.instances().has_row(owner));

    assert!(history.undo(&mut store).unwrap());
    assert!(store.find::<Emitter>("e1").is_none());
    assert!(!store.instances().has_row(owner));

    assert!(history.redo(&mut store).unwrap());
    assert!(store.find::<Emitter>("e1").is_some());
}

#[test]
fn test_rename_keeps_bonds_and_undoes() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);

    assert!(run(&mut store, &mut history, RenameObject::new::<Document>("d2", "draft")));
    assert_eq!(children(&store, "f"), vec!["d1", "draft", "d3"]);
    assert!(!run(&mut store, &mut history, RenameObject::new::<Document>("d1", "d3")));
    assert!(!run(&mut store, &mut history, RenameObject::new::<Document>("d1", "")));

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
}

#[test]
fn test_adopt_undo_restores_previous_parent_and_position() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Folder>("other")));

    // --- ACT ---
    assert!(run(&mut store, &mut history, AdoptObject::new::<Document, Folder>("d2", "other")));

    // --- ASSERT ---
    assert_eq!(children(&store, "f"), vec!["d1", "d3"]);
    assert_eq!(children(&store, "other"), vec!["d2"]);

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
    assert!(children(&store, "other").is_empty());
}

#[test]
fn test_adopt_validation() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Cover>("c2")));

    // Same parent again.
    assert!(!run(&mut store, &mut history, AdoptObject::new::<Document, Folder>("d1", "f")));
    // One-to-one parent already holds a cover.
    assert!(!run(&mut store, &mut history, AdoptObject::new::<Cover, Document>("c2", "d2")));
    // Missing parent.
    assert!(!run(&mut store, &mut history, AdoptObject::new::<Cover, Document>("c2", "nope")));
    // Undeclared relation.
    let handle = ParentHandle::new::<Archive>("a");
    assert!(!run(&mut store, &mut history, AdoptObject::erased(Cover::token(), "c2", handle)));
    // Invalid handle.
    let invalid = AdoptObject::erased(Cover::token(), "c2", ParentHandle::invalid());
    assert!(!run(&mut store, &mut history, invalid));

    assert!(run(&mut store, &mut history, AdoptObject::new::<Cover, Document>("c2", "d1")));
}

#[test]
fn test_orphan_detaches_every_parent_and_undo_relinks() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Archive>("a")));
    assert!(run(&mut store, &mut history, AdoptObject::new::<Document, Archive>("d2", "a")));
    let d2 = key::<Document>(&store, "d2");

    // --- ACT ---
    assert!(run(&mut store, &mut history, OrphanObject::new::<Document>("d2")));

    // --- ASSERT ---
    assert!(!store.has_parent(d2, Folder::token()));
    assert!(!store.has_parent(d2, Archive::token()));
    assert!(!run(&mut store, &mut history, OrphanObject::new::<Document>("d2")));

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
    assert_eq!(
        store.get_parent_handle(d2, Archive::token()),
        ParentHandle::new::<Archive>("a")
    );
}

#[test]
fn test_orphan_from_single_parent_type() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Archive>("a")));
    assert!(run(&mut store, &mut history, AdoptObject::new::<Document, Archive>("d1", "a")));

    assert!(run(&mut store, &mut history, OrphanObject::from_parent::<Document, Folder>("d1")));

    let d1 = key::<Document>(&store, "d1");
    assert!(!store.has_parent(d1, Folder::token()));
    assert!(store.has_parent(d1, Archive::token()));
}

#[test]
fn test_destroy_children_of_type_materialises_once() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Emitter>("spark")));
    assert!(run(&mut store, &mut history, AdoptObject::new::<Emitter, Folder>("spark", "f")));

    // --- ACT ---
    assert!(run(&mut store, &mut history, DestroyChildrenOfType::new::<Document, Folder>("f")));

    // --- ASSERT ---
    assert_eq!(store.objects().count(Document::token()), 0);
    assert!(store.find::<Emitter>("spark").is_some(), "Other child types survive");

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
    assert_eq!(store.parent_of::<Cover, Document>("c"), store.find::<Document>("d2"));

    assert!(history.redo(&mut store).unwrap());
    assert!(children(&store, "f").is_empty());
    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
}

#[test]
fn test_destroy_children_without_children_is_rejected() {
    let mut store = store();
    let mut history = StoreHistory::new();
    assert!(run(&mut store, &mut history, CreateObject::new::<Folder>("empty")));

    let by_type = DestroyChildrenOfType::new::<Document, Folder>("empty");
    assert!(!run(&mut store, &mut history, by_type));
    assert!(!run(&mut store, &mut history, DestroyAllChildren::new::<Folder>("empty")));
}

#[test]
fn test_destroy_all_children_covers_every_child_type() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Emitter>("spark")));
    assert!(run(&mut store, &mut history, AdoptObject::new::<Emitter, Folder>("spark", "f")));

    assert!(run(&mut store, &mut history, DestroyAllChildren::new::<Folder>("f")));
    assert_eq!(store.objects().count(Document::token()), 0);
    assert_eq!(store.objects().count(Emitter::token()), 0);
    assert!(store.find::<Cover>("c").is_some(), "Grandchildren are orphaned, not destroyed");

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(children(&store, "f"), vec!["d1", "d2", "d3"]);
    let f = key::<Folder>(&store, "f");
    assert_eq!(store.child_count(f, Emitter::token()), 1);
}

#[test]
fn test_destroy_group_undo_reattaches_rows_in_order() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 2, &["e1", "e2"]);
    set_sparks(&mut store, "e1", &[1.0, 2.0]);
    set_sparks(&mut store, "e2", &[3.0, 4.0]);

    assert!(run(&mut store, &mut history, DestroyGroup::new("g")));
    assert!(store.instances().group("g").is_none());
    assert!(sparks(&store, "e1").is_empty());

    assert!(history.undo(&mut store).unwrap());
    assert_eq!(xs(&store, "e1"), vec![1.0, 2.0]);
    assert_eq!(xs(&store, "e2"), vec![3.0, 4.0]);
    assert_eq!(store.instances().group("g").unwrap().width(), 2);
}

#[test]
fn test_reduce_and_enlarge_redo_replay_exact_tails() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 4, &["e1"]);
    set_sparks(&mut store, "e1", &[1.0, 2.0, 3.0, 4.0]);

    // --- ACT ---
    assert!(!run(&mut store, &mut history, ReduceGroup::new("g", 5)));
    assert!(!run(&mut store, &mut history, ReduceGroup::new("g", 0)));
    assert!(run(&mut store, &mut history, ReduceGroup::new("g", 2)));
    assert_eq!(xs(&store, "e1"), vec![1.0, 2.0]);

    // --- ASSERT ---
    assert!(history.undo(&mut store).unwrap());
    assert_eq!(xs(&store, "e1"), vec![1.0, 2.0, 3.0, 4.0]);

    assert!(run(&mut store, &mut history, EnlargeGroup::new("g", 1)));
    set_sparks(&mut store, "e1", &[1.0, 2.0, 3.0, 4.0, 9.0]);
    assert!(history.undo(&mut store).unwrap());
    assert!(history.redo(&mut store).unwrap());
    assert_eq!(xs(&store, "e1"), vec![1.0, 2.0, 3.0, 4.0, 9.0]);
}

#[test]
fn test_attach_validation() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 2, &["e1"]);
    assert!(run(&mut store, &mut history, CreateGroup::new("other")));
    assert!(run(&mut store, &mut history, CreateObject::new::<Folder>("f")));

    assert!(!run(&mut store, &mut history, AttachInstances::new::<Emitter>("other", "e1")));
    assert!(!run(&mut store, &mut history, AttachInstances::new::<Folder>("g", "f")));
    assert!(!run(&mut store, &mut history, DetachInstances::new::<Emitter>("other", "e1")));
    assert!(!run(&mut store, &mut history, CreateGroup::new("g")));
}

#[test]
fn test_record_table_rows_survive_detach_and_attach() {
    let mut store = store();
    let mut history = StoreHistory::new();
    assert!(run(&mut store, &mut history, CreateGroup::with_width("labels", 2)));
    assert!(run(&mut store, &mut history, CreateObject::new::<Labeler>("l")));
    assert!(run(&mut store, &mut history, AttachInstances::new::<Labeler>("labels", "l")));
    let owner = key::<Labeler>(&store, "l");
    store
        .instances_mut()
        .row_mut(owner)
        .unwrap()
        .records_mut::<String>()
        .unwrap()
        .clone_from_slice(&["alpha".to_string(), "beta".to_string()]);

    assert!(run(&mut store, &mut history, DetachInstances::new::<Labeler>("labels", "l")));
    assert!(store.instances().row(owner).unwrap().is_empty());
    assert!(history.undo(&mut store).unwrap());

    let records = store.instances().row(owner).unwrap().records::<String>().unwrap();
    assert_eq!(records, &["alpha".to_string(), "beta".to_string()]);
    assert!(!store.instances().row(owner).unwrap().table().is_transferable());
}

#[test]
fn test_attach_with_snapshot_undo_restores_preset_width() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 3, &["e1"]);
    assert!(run(&mut store, &mut history, DetachInstances::new::<Emitter>("g", "e1")));
    assert!(run(&mut store, &mut history, EnlargeGroup::new("g", 4)));
    assert_eq!(store.instances().group("g").unwrap().width(), 7);
    let records = [Spark { x: 1.0, y: 1.0 }; 3];
    let snapshot = RowSnapshot::from_payload(3, bytemuck::cast_slice(&records));

    // --- ACT ---
    let attach = AttachInstances::new::<Emitter>("g", "e1").with_snapshot(snapshot);
    assert!(run(&mut store, &mut history, attach));
    assert_eq!(store.instances().group("g").unwrap().width(), 3);
    assert!(history.undo(&mut store).unwrap());

    // --- ASSERT ---
    assert_eq!(store.instances().group("g").unwrap().width(), 7);
    assert!(run(&mut store, &mut history, AttachInstances::new::<Emitter>("g", "e1")));
    assert_eq!(sparks(&store, "e1").len(), 7);
}

#[test]
fn test_group_commands_undo_to_identical_settings() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 3, &["e1", "e2", "e3"]);
    for (name, base) in [("e1", 0.0), ("e2", 10.0), ("e3", 20.0)] {
        set_sparks(&mut store, name, &[base, base + 1.0, base + 2.0]);
    }
    assert!(run(&mut store, &mut history, CreateObject::new::<Emitter>("loose")));
    assert!(run(&mut store, &mut history, CreateGroup::with_width("spare", 5)));

    assert_undo_restores(&mut store, CreateGroup::with_width("extra", 2));
    assert_undo_restores(&mut store, SwapInstances::new("g", 0, 2));
    assert_undo_restores(&mut store, EnlargeGroup::new("g", 2));
    assert_undo_restores(&mut store, ReduceGroup::new("g", 2));
    assert_undo_restores(&mut store, DestroyInstance::new("g", 1));
    assert_undo_restores(&mut store, DetachInstances::new::<Emitter>("g", "e2"));
    assert_undo_restores(&mut store, AttachInstances::new::<Emitter>("g", "loose"));
    let records = [Spark { x: 4.0, y: 2.0 }; 2];
    let snapshot = RowSnapshot::from_payload(2, bytemuck::cast_slice(&records));
    assert_undo_restores(
        &mut store,
        AttachInstances::new::<Emitter>("spare", "loose").with_snapshot(snapshot),
    );
    assert_undo_restores(&mut store, DestroyGroup::new("g"));
}

#[test]
fn test_object_and_bond_commands_undo_to_identical_settings() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    assert!(run(&mut store, &mut history, CreateObject::new::<Folder>("other")));

    assert_undo_restores(&mut store, CreateObject::new::<Archive>("a"));
    assert_undo_restores(&mut store, RenameObject::new::<Document>("d2", "draft"));
    assert_undo_restores(&mut store, AdoptObject::new::<Document, Folder>("d2", "other"));
    assert_undo_restores(&mut store, OrphanObject::new::<Document>("d1"));
}

// --- BONDS ---

#[test]
fn test_detach_from_parent_is_idempotent() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    let d2 = key::<Document>(&store, "d2");

    let first = store.detach_from_parent(d2, Folder::token());
    let after_first = children(&store, "f");
    let second = store.detach_from_parent(d2, Folder::token());

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(children(&store, "f"), after_first);
    assert_eq!(after_first, vec!["d1", "d3"]);
}

#[test]
fn test_set_parent_fails_silently_on_unresolvable_parent() {
    let mut history = StoreHistory::new();
    let mut store = populated(&mut history);
    let d1 = key::<Document>(&store, "d1");

    assert!(!store.set_parent(d1, &ParentHandle::new::<Folder>("missing")));

    assert!(!store.has_parent(d1, Folder::token()), "The child is left without a parent");
    assert_eq!(store.get_parent_handle(d1, Folder::token()), ParentHandle::invalid());
}

#[test]
fn test_sibling_navigation() {
    let mut history = StoreHistory::new();
    let store = populated(&mut history);
    let f = key::<Folder>(&store, "f");
    let d2 = key::<Document>(&store, "d2");

    let first = store.first_child(f, Document::token()).unwrap();
    let last = store.last_child(f, Document::token()).unwrap();
    assert_eq!(store.objects().name_of(first), Some("d1"));
    assert_eq!(store.objects().name_of(last), Some("d3"));
    assert_eq!(store.next_sibling(d2, Folder::token()), Some(last));
    assert_eq!(store.prev_sibling(d2, Folder::token()), Some(first));
    assert_eq!(store.child_count(f, Document::token()), 3);
}

// --- GROUP INVARIANTS ---

#[test]
fn test_width_invariant_across_mixed_commands() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 1, &["e1", "e2"]);

    assert!(run(&mut store, &mut history, EnlargeGroup::new("g", 4)));
    assert!(run(&mut store, &mut history, CreateObject::new::<Emitter>("e3")));
    assert!(run(&mut store, &mut history, AttachInstances::new::<Emitter>("g", "e3")));
    assert!(run(&mut store, &mut history, ReduceGroup::new("g", 2)));
    assert!(run(&mut store, &mut history, DetachInstances::new::<Emitter>("g", "e1")));
    assert!(run(&mut store, &mut history, DestroyInstance::new("g", 0)));

    let group = store.instances().group("g").unwrap();
    assert_eq!(group.row_count(), 2);
    assert!(group.rows().iter().all(|row| row.len() == group.width()));
    assert_eq!(group.width(), 2);

    while history.undo(&mut store).unwrap() {}
    let group = store.instances().group("g").unwrap();
    assert!(group.rows().iter().all(|row| row.len() == 1));
}

#[test]
fn test_batch_is_rejected_atomically() {
    let mut history = StoreHistory::new();
    let mut store = with_group(&mut history, 3, &["e1"]);

    let batch = StoreBatch::new("resize")
        .with(EnlargeGroup::new("g", 2))
        .with(SwapInstances::new("g", 1, 1));
    assert!(!run(&mut store, &mut history, batch));
    assert_eq!(store.instances().group("g").unwrap().width(), 3);

    let batch = StoreBatch::new("resize")
        .with(EnlargeGroup::new("g", 2))
        .with(SwapInstances::new("g", 0, 2));
    assert!(run(&mut store, &mut history, batch));
    assert_eq!(store.instances().group("g").unwrap().width(), 5);
    assert!(history.undo(&mut store).unwrap());
    assert_eq!(store.instances().group("g").unwrap().width(), 3);
}

// --- PERSISTENCE ---

#[test]
fn test_settings_round_trip_into_a_fresh_store() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let mut source = populated(&mut history);
    assert!(run(&mut source, &mut history, CreateGroup::new("g")));
    for name in ["e1", "e2"] {
        assert!(run(&mut source, &mut history, CreateObject::new::<Emitter>(name)));
        assert!(run(&mut source, &mut history, AttachInstances::new::<Emitter>("g", name)));
        assert!(run(&mut source, &mut history, AdoptObject::new::<Emitter, Folder>(name, "f")));
    }
    assert!(run(&mut source, &mut history, EnlargeGroup::new("g", 3)));
    set_sparks(&mut source, "e2", &[7.0, 8.0, 9.0]);
    source.find_mut::<Document>("d3").unwrap().pages = 12;

    let mut out = ByteWriter::new();
    source.export_settings(&mut out).unwrap();

    // --- ACT ---
    let mut target = store();
    target.import_settings(out.as_slice()).unwrap();

    // --- ASSERT ---
    assert_eq!(children(&target, "f"), vec!["d1", "d2", "d3"]);
    assert_eq!(target.find::<Document>("d3").unwrap().pages, 12);
    assert_eq!(target.parent_of::<Cover, Document>("c"), target.find::<Document>("d2"));
    assert_eq!(xs(&target, "e2"), vec![7.0, 8.0, 9.0]);
    assert_eq!(sparks(&target, "e1"), sparks(&source, "e1"));
    let group = target.instances().group("g").unwrap();
    let owners: Vec<_> = group
        .owners()
        .map(|owner| target.objects().name_of(owner).unwrap().to_string())
        .collect();
    assert_eq!(owners, vec!["e1", "e2"]);
}

#[test]
fn test_settings_import_skips_unregistered_types() {
    let mut history = StoreHistory::new();
    let source = populated(&mut history);
    let mut out = ByteWriter::new();
    source.export_settings(&mut out).unwrap();

    // A store that only knows folders.
    let mut target = Store::builder().register::<Folder>().build();
    target.import_settings(out.as_slice()).unwrap();

    assert!(target.find::<Folder>("f").is_some());
    assert_eq!(target.objects().tokens().len(), 1);
}

#[test]
fn test_failed_settings_import_leaves_store_untouched() {
    // --- ARRANGE ---
    let mut history = StoreHistory::new();
    let incoming = settings(&populated(&mut history));
    let mut target = store();
    assert!(run(&mut target, &mut history, CreateObject::new::<Archive>("a")));
    assert!(run(&mut target, &mut history, CreateObject::new::<Document>("d2")));
    let before = settings(&target);
    let archive = key::<Archive>(&target, "a");

    // --- ACT ---
    let result = target.import_settings(&incoming);

    // --- ASSERT ---
    assert!(result.is_err(), "d2 exists on both sides");
    assert!(target.find::<Folder>("f").is_none(), "Earlier sections are not applied");
    assert_eq!(settings(&target), before);
    assert_eq!(target.key_of(Archive::token(), "a"), Some(archive));
}

#[test]
fn test_settings_import_appends_to_existing_content() {
    let mut history = StoreHistory::new();
    let incoming = settings(&populated(&mut history));
    let mut target = store();
    assert!(run(&mut target, &mut history, CreateObject::new::<Archive>("a")));

    target.import_settings(&incoming).unwrap();

    assert!(target.find::<Archive>("a").is_some());
    assert_eq!(children(&target, "f"), vec!["d1", "d2", "d3"]);
}
