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

//! Session configuration, read from RON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables of a [`Session`](crate::Session).
///
/// ```ron
/// (
///     undo_limit: Some(256),
///     log_filter: "tessera_data=debug,info",
/// )
/// ```
///
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The maximum number of undoable commands; `None` keeps every command.
    pub undo_limit: Option<usize>,
    /// The `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            undo_limit: None,
            log_filter: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse session configuration")
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;
        Self::from_ron(&text)
            .with_context(|| format!("Invalid configuration file '{}'", path.display()))
    }

    /// Renders the configuration as pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty)
            .context("Failed to serialize session configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = SessionConfig::from_ron("(undo_limit: Some(8))").unwrap();
        assert_eq!(config.undo_limit, Some(8));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SessionConfig {
            undo_limit: None,
            log_filter: "tessera_data=trace".to_string(),
        };
        let text = config.to_ron().unwrap();
        assert_eq!(SessionConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        assert!(SessionConfig::from_ron("(undo_limit: \"many\")").is_err());
    }
}
