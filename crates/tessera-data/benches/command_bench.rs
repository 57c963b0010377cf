use std::hint::black_box;

use bytemuck::{Pod, Zeroable};
use criterion::{criterion_group, criterion_main, Criterion};
use serde::{Deserialize, Serialize};
use tessera_data::commands::{
    AttachInstances, CreateGroup, CreateObject, DestroyObject, EnlargeGroup, StoreHistory,
};
use tessera_data::instance::{InstanceTable, PodTable};
use tessera_data::{Object, Occurrence, Store};

#[derive(Debug, Default, Serialize, Deserialize, Object)]
struct Particle {
    mass: f32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, Pod, Zeroable)]
struct Sample {
    value: [f32; 4],
}

impl Occurrence for Particle {
    fn instance_table() -> Box<dyn InstanceTable> {
        Box::new(PodTable::<Sample>::new())
    }
}

fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("Store Commands");

    group.bench_function("Create + Undo (1k objects)", |b| {
        b.iter(|| {
            let mut store = Store::builder().register_occurrence::<Particle>().build();
            let mut history = StoreHistory::new();
            for i in 0..1_000 {
                let _ = history.invoke(&mut store, CreateObject::new::<Particle>(format!("p{i}")));
            }
            while history.undo(&mut store).unwrap_or(false) {}
            black_box(store.objects().count(Particle::token()));
        });
    });

    // 64 rows attached to one group, each resize touching every row.
    let mut store = Store::builder().register_occurrence::<Particle>().build();
    let mut history = StoreHistory::new();
    let _ = history.invoke(&mut store, CreateGroup::new("g"));
    for i in 0..64 {
        let name = format!("p{i}");
        let _ = history.invoke(&mut store, CreateObject::new::<Particle>(name.clone()));
        let _ = history.invoke(&mut store, AttachInstances::new::<Particle>("g", name));
    }

    group.bench_function("Enlarge + Undo (64 rows x 256)", |b| {
        b.iter(|| {
            let _ = history.invoke(&mut store, EnlargeGroup::new("g", 256));
            let _ = history.undo(&mut store);
            black_box(store.instances().group("g").map(|g| g.width()));
        });
    });

    group.bench_function("Destroy + Undo attached object", |b| {
        b.iter(|| {
            let _ = history.invoke(&mut store, DestroyObject::new::<Particle>("p10"));
            let _ = history.undo(&mut store);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_commands);
criterion_main!(benches);
