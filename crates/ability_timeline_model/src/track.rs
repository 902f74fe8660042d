// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions.

use crate::clip::{Clip, ClipId};
use crate::error::{ModelError, Result};
use crate::key::{Key, KeyId};
use crate::rules;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Role of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    /// Hit detection windows
    Hitbox,
    /// Animation clips and animator events
    Animation,
    /// Visual effects
    Vfx,
    /// Sound effects
    Sfx,
    /// Camera impulses
    Camera,
    /// Script hooks
    Script,
    /// Anything
    Custom,
}

impl TrackType {
    /// Every track type, in declaration order
    pub const ALL: [TrackType; 7] = [
        Self::Hitbox,
        Self::Animation,
        Self::Vfx,
        Self::Sfx,
        Self::Camera,
        Self::Script,
        Self::Custom,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hitbox => "Hitbox",
            Self::Animation => "Animation",
            Self::Vfx => "VFX",
            Self::Sfx => "SFX",
            Self::Camera => "Camera",
            Self::Script => "Script",
            Self::Custom => "Custom",
        }
    }

    /// Get the track color
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Hitbox => [230, 77, 77],
            Self::Animation => [77, 153, 230],
            Self::Vfx => [153, 77, 230],
            Self::Sfx => [77, 204, 128],
            Self::Camera => [230, 179, 51],
            Self::Script => [179, 179, 179],
            Self::Custom => [128, 128, 128],
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A typed lane of keys and clips within a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    #[serde(default)]
    pub id: TrackId,
    /// Track name
    #[serde(default)]
    pub name: String,
    /// Track role
    pub track_type: TrackType,
    /// Whether the track is evaluated at all
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Whether the track is silenced
    #[serde(default)]
    pub muted: bool,
    /// Whether the track is soloed within its phase
    #[serde(default)]
    pub solo: bool,
    /// Whether the track rejects edits
    #[serde(default)]
    pub locked: bool,
    /// Point events
    #[serde(default)]
    keys: Vec<Key>,
    /// Interval events
    #[serde(default)]
    clips: Vec<Clip>,
}

impl Track {
    /// Create a new track
    pub fn new(name: impl Into<String>, track_type: TrackType) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            track_type,
            enabled: true,
            muted: false,
            solo: false,
            locked: false,
            keys: Vec::new(),
            clips: Vec::new(),
        }
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(ModelError::TrackLocked(self.name.clone()));
        }
        Ok(())
    }

    /// Add a key, rejecting types the track does not accept
    pub fn add_key(&mut self, key: Key) -> Result<KeyId> {
        self.ensure_unlocked()?;
        rules::check_key(self.track_type, key.key_type())?;
        let id = key.id;
        self.keys.push(key);
        self.sort_keys();
        Ok(id)
    }

    /// Add a clip, rejecting types the track does not accept
    pub fn add_clip(&mut self, clip: Clip) -> Result<ClipId> {
        self.ensure_unlocked()?;
        rules::check_clip(self.track_type, clip.clip_type())?;
        let id = clip.id;
        self.clips.push(clip);
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(id)
    }

    /// Remove a key
    pub fn remove_key(&mut self, key_id: KeyId) -> Option<Key> {
        let index = self.keys.iter().position(|k| k.id == key_id)?;
        Some(self.keys.remove(index))
    }

    /// Remove a clip
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == clip_id)?;
        Some(self.clips.remove(index))
    }

    /// Sort keys by time
    pub fn sort_keys(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Keys in authored order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Clips in authored order
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Mutable clips, for duration resolution and clip moves
    pub fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    /// Get a key
    pub fn key(&self, key_id: KeyId) -> Option<&Key> {
        self.keys.iter().find(|k| k.id == key_id)
    }

    /// Get a mutable key
    pub fn key_mut(&mut self, key_id: KeyId) -> Option<&mut Key> {
        self.keys.iter_mut().find(|k| k.id == key_id)
    }

    /// Get a clip
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// Get a mutable clip
    pub fn clip_mut(&mut self, clip_id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == clip_id)
    }

    /// Keys with time in the closed range `[start, end]`
    pub fn keys_in_range(&self, start: f32, end: f32) -> impl Iterator<Item = &Key> {
        self.keys.iter().filter(move |k| k.time >= start && k.time <= end)
    }

    /// Key closest to `time`
    pub fn nearest_key(&self, time: f32) -> Option<&Key> {
        self.keys
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    /// Duplicate a key, shifted by `offset`
    pub fn duplicate_key(&mut self, key_id: KeyId, offset: f32) -> Result<KeyId> {
        let copy = self
            .key(key_id)
            .map(|k| k.duplicate(offset))
            .ok_or_else(|| ModelError::InvalidAddress(format!("key {:?}", key_id.0)))?;
        self.add_key(copy)
    }

    /// Drop keys and clips the track type does not accept, returning how many
    pub(crate) fn retain_compatible(&mut self) -> (usize, usize) {
        let track_type = self.track_type;
        let keys_before = self.keys.len();
        let clips_before = self.clips.len();
        self.keys.retain(|k| rules::can_add_key(track_type, k.key_type()));
        self.clips.retain(|c| rules::can_add_clip(track_type, c.clip_type()));
        (keys_before - self.keys.len(), clips_before - self.clips.len())
    }

    /// Mutable keys for the crate's bake pass
    pub(crate) fn keys_mut(&mut self) -> &mut [Key] {
        &mut self.keys
    }
}
