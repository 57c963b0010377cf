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

//! The public-facing session API of the Tessera store.
//!
//! A [`Session`] owns a [`Store`] and the undo/redo history of the commands run
//! against it. It is the single entry point host applications need: invoke
//! commands, undo and redo them, and persist the whole store to a settings file.

mod config;
mod logging;

pub use config::SessionConfig;
pub use logging::init_logging;

pub mod prelude {
    //! The types most sessions work with.
    pub use tessera_core::{Command, StructuralError};
    pub use tessera_data::commands::*;
    pub use tessera_data::{
        BondKind, Bonded, Object, ObjectKey, Occurrence, ParentHandle, Store, StoreBuilder,
    };

    pub use crate::{Session, SessionConfig};
}

use std::path::Path;

use anyhow::{Context, Result};
use tessera_core::{ByteWriter, Command, StructuralError};
use tessera_data::commands::{StoreBatch, StoreHistory};
use tessera_data::Store;

/// A store together with its command history.
pub struct Session {
    store: Store,
    history: StoreHistory,
    config: SessionConfig,
}

impl Session {
    /// Opens a session over `store` with the default configuration.
    pub fn new(store: Store) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    /// Opens a session over `store`.
    pub fn with_config(store: Store, config: SessionConfig) -> Self {
        let history = match config.undo_limit {
            Some(limit) => StoreHistory::with_limit(limit),
            None => StoreHistory::new(),
        };
        Self {
            store,
            history,
            config,
        }
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the store mutably, for editing object values and records.
    ///
    /// Structural changes made here bypass the history and cannot be undone.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Returns the command history.
    pub fn history(&self) -> &StoreHistory {
        &self.history
    }

    /// Validates and executes `command`.
    ///
    /// Returns `Ok(false)` if the command was rejected; the rejection is logged.
    pub fn invoke(&mut self, command: impl Command<Store>) -> Result<bool, StructuralError> {
        self.history.invoke(&mut self.store, command)
    }

    /// Validates every command of `batch`, then executes them as one undoable step.
    pub fn invoke_batch(&mut self, batch: StoreBatch) -> Result<bool, StructuralError> {
        if batch.is_empty() {
            log::warn!("Ignoring an empty command batch");
            return Ok(false);
        }
        self.invoke(batch)
    }

    /// Reverses the most recent command.
    pub fn undo(&mut self) -> Result<bool, StructuralError> {
        self.history.undo(&mut self.store)
    }

    /// Re-applies the most recently undone command.
    pub fn redo(&mut self) -> Result<bool, StructuralError> {
        self.history.redo(&mut self.store)
    }

    /// Serialises the whole store as a settings stream.
    pub fn export_settings(&self) -> Result<Vec<u8>, StructuralError> {
        let mut out = ByteWriter::new();
        self.store.export_settings(&mut out)?;
        Ok(out.into_inner())
    }

    /// Loads a settings stream into the store and forgets the command history.
    ///
    /// Objects already present under an imported name make the import fail; the
    /// store and the history are then left as they were.
    pub fn import_settings(&mut self, data: &[u8]) -> Result<(), StructuralError> {
        self.store.import_settings(data)?;
        self.history.clear();
        Ok(())
    }

    /// Writes the store to a settings file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self
            .export_settings()
            .context("Failed to serialize the store")?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write settings file '{}'", path.display()))?;
        log::info!("Saved {} bytes of settings to '{}'", bytes.len(), path.display());
        Ok(())
    }

    /// Loads a settings file written by [`save_to_file`](Self::save_to_file).
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
        self.import_settings(&bytes)
            .with_context(|| format!("Invalid settings file '{}'", path.display()))?;
        log::info!("Loaded settings from '{}'", path.display());
        Ok(())
    }
}
