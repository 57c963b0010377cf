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

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tessera_data::instance::{InstanceTable, PodTable};
use tessera_sdk::prelude::*;
use tessera_sdk::init_logging;

#[derive(Debug, Default, Serialize, Deserialize, Object)]
struct Playlist {
    shuffle: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, Object)]
struct Track {
    seconds: u32,
}

/// One beat marker of a track.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, Pod, Zeroable)]
struct Beat {
    time: f32,
    strength: f32,
}

impl Bonded<Playlist> for Track {
    const KIND: BondKind = BondKind::ManyToOne;
}

impl Occurrence for Track {
    fn instance_table() -> Box<dyn InstanceTable> {
        Box::new(PodTable::<Beat>::new())
    }
}

fn print_playlist(session: &Session, name: &str) {
    let tracks = session.store().children_named::<Track, Playlist>(name);
    log::info!("{name}: {}", tracks.join(", "));
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    init_logging(&config);

    let store = Store::builder()
        .register_occurrence::<Track>()
        .bond::<Track, Playlist>()
        .build();
    let mut session = Session::with_config(store, config);

    session.invoke(CreateObject::new::<Playlist>("evening"))?;
    session.invoke(CreateGroup::with_width("beats", 4))?;
    for track in ["intro", "drift", "outro"] {
        let batch = StoreBatch::new(format!("add {track}"))
            .with(CreateObject::new::<Track>(track));
        session.invoke_batch(batch)?;
        session.invoke(AdoptObject::new::<Track, Playlist>(track, "evening"))?;
        session.invoke(AttachInstances::new::<Track>("beats", track))?;
    }
    print_playlist(&session, "evening");

    // Rejected: the name is taken.
    session.invoke(CreateObject::new::<Track>("drift"))?;

    session.invoke(DestroyObject::new::<Track>("drift"))?;
    print_playlist(&session, "evening");
    session.undo()?;
    print_playlist(&session, "evening");

    let bytes = session.export_settings()?;
    log::info!("Settings stream: {} bytes", bytes.len());
    Ok(())
}
