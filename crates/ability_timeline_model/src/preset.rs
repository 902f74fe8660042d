// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reusable groups of keys.

use crate::error::{ModelError, Result};
use crate::key::{Key, KeyId};
use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named group of keys placed relative to a pivot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPreset {
    /// Preset name
    pub name: String,
    /// Description shown in pickers
    #[serde(default)]
    pub description: String,
    /// Time in `keys` that lands on the target time
    #[serde(default)]
    pub pivot_time: f32,
    /// Keys of the preset
    pub keys: Vec<Key>,
}

/// Outcome of applying a preset
#[derive(Debug, Default)]
pub struct PresetApplication {
    /// Ids of the keys added
    pub added: Vec<KeyId>,
    /// Keys the track rejected
    pub rejected: Vec<ModelError>,
}

impl KeyPreset {
    /// Create a preset from keys
    pub fn new(name: impl Into<String>, pivot_time: f32, keys: Vec<Key>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            pivot_time,
            keys,
        }
    }

    /// Load a preset from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }

    /// Copy the preset onto a track so the pivot lands at `target_time`.
    ///
    /// Keys are shifted by `target_time - pivot_time`, clamped at 0 and given
    /// fresh ids. Keys the track does not accept are reported, not added.
    pub fn apply(&self, track: &mut Track, target_time: f32) -> PresetApplication {
        let offset = target_time - self.pivot_time;
        let mut result = PresetApplication::default();
        for key in &self.keys {
            let mut copy = key.duplicate(offset);
            copy.time = copy.time.max(0.0);
            match track.add_key(copy) {
                Ok(id) => result.added.push(id),
                Err(err) => result.rejected.push(err),
            }
        }
        result
    }
}
