// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interval events (clips) and resource-derived durations.

use crate::error::Result;
use crate::hash::NameRef;
use crate::key::Key;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Duration used when a clip's resource is missing or has no length
pub const FALLBACK_CLIP_DURATION: f32 = 0.25;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Discriminant of a clip payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipType {
    /// Animation clip
    Animation,
    /// Audio clip
    Sfx,
    /// Particle effect
    Vfx,
    /// Explicit-length clip
    Custom,
}

impl ClipType {
    /// Every clip type, in declaration order
    pub const ALL: [ClipType; 4] = [Self::Animation, Self::Sfx, Self::Vfx, Self::Custom];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "Animation",
            Self::Sfx => "SFX",
            Self::Vfx => "VFX",
            Self::Custom => "Custom",
        }
    }
}

/// Typed clip payload; the variant is the clip type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClipKind {
    /// Plays an animation clip
    Animation {
        /// Animation resource
        clip: NameRef,
    },
    /// Plays an audio clip
    Sfx {
        /// Audio resource
        clip: NameRef,
        /// Volume
        #[serde(default = "one")]
        volume: f32,
    },
    /// Spawns a particle system
    Vfx {
        /// Effect prefab
        prefab: NameRef,
        /// Uniform scale
        #[serde(default = "one")]
        scale: f32,
    },
    /// Explicit length, no resource
    Custom {
        /// Length in seconds; non-positive falls back
        length: f32,
        /// Free parameters
        #[serde(default)]
        params: [f32; 4],
    },
}

fn one() -> f32 {
    1.0
}

impl ClipKind {
    /// Default payload for a clip type
    pub fn default_for(clip_type: ClipType) -> Self {
        match clip_type {
            ClipType::Animation => Self::Animation { clip: NameRef::default() },
            ClipType::Sfx => Self::Sfx { clip: NameRef::default(), volume: 1.0 },
            ClipType::Vfx => Self::Vfx { prefab: NameRef::default(), scale: 1.0 },
            ClipType::Custom => Self::Custom { length: 1.0, params: [0.0; 4] },
        }
    }

    /// The clip type this payload belongs to
    pub fn clip_type(&self) -> ClipType {
        match self {
            Self::Animation { .. } => ClipType::Animation,
            Self::Sfx { .. } => ClipType::Sfx,
            Self::Vfx { .. } => ClipType::Vfx,
            Self::Custom { .. } => ClipType::Custom,
        }
    }

    /// Resource backing the clip, if any
    pub fn resource(&self) -> Option<&NameRef> {
        match self {
            Self::Animation { clip } | Self::Sfx { clip, .. } => Some(clip),
            Self::Vfx { prefab, .. } => Some(prefab),
            Self::Custom { .. } => None,
        }
    }
}

/// Lengths of the resources clips may reference
pub trait ResourceDurations {
    /// Length of an animation clip
    fn animation_length(&self, clip: &NameRef) -> Option<f32>;
    /// Length of an audio clip
    fn audio_length(&self, clip: &NameRef) -> Option<f32>;
    /// Duration plus start lifetime of a particle system
    fn particle_lifetime(&self, prefab: &NameRef) -> Option<f32>;
}

/// Catalog that knows no resources; every resource-backed clip falls back
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceDurations for NoResources {
    fn animation_length(&self, _clip: &NameRef) -> Option<f32> {
        None
    }

    fn audio_length(&self, _clip: &NameRef) -> Option<f32> {
        None
    }

    fn particle_lifetime(&self, _prefab: &NameRef) -> Option<f32> {
        None
    }
}

/// Particle system timing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleTiming {
    /// System duration
    pub duration: f32,
    /// Start lifetime of emitted particles
    pub start_lifetime: f32,
}

/// Resource length tables keyed by resource name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCatalog {
    /// Animation lengths
    pub animations: IndexMap<String, f32>,
    /// Audio lengths
    pub audio: IndexMap<String, f32>,
    /// Particle system timings
    pub particles: IndexMap<String, ParticleTiming>,
}

impl ResourceCatalog {
    /// Load a catalog from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }
}

impl ResourceDurations for ResourceCatalog {
    fn animation_length(&self, clip: &NameRef) -> Option<f32> {
        self.animations.get(clip.name()).copied()
    }

    fn audio_length(&self, clip: &NameRef) -> Option<f32> {
        self.audio.get(clip.name()).copied()
    }

    fn particle_lifetime(&self, prefab: &NameRef) -> Option<f32> {
        self.particles
            .get(prefab.name())
            .map(|timing| timing.duration + timing.start_lifetime)
    }
}

/// An interval event within a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    #[serde(default)]
    pub id: ClipId,
    /// Start time local to the owning phase
    pub start: f32,
    /// Typed payload
    pub kind: ClipKind,
    /// Keys local to the clip, timed from its start
    #[serde(default)]
    pub keys: Vec<Key>,
    /// Duration derived from the resource; filled by [`Clip::resolve_duration`]
    #[serde(default)]
    resolved_duration: Option<f32>,
}

impl Clip {
    /// Create a new clip
    pub fn new(start: f32, kind: ClipKind) -> Self {
        Self {
            id: ClipId::new(),
            start,
            kind,
            keys: Vec::new(),
            resolved_duration: None,
        }
    }

    /// The clip type
    pub fn clip_type(&self) -> ClipType {
        self.kind.clip_type()
    }

    /// Add a clip-local key
    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    /// Derive and cache the duration from a resource catalog.
    ///
    /// Returns `false` when the fallback duration had to be used.
    pub fn resolve_duration(&mut self, resources: &dyn ResourceDurations) -> bool {
        let length = match &self.kind {
            ClipKind::Animation { clip } => resources.animation_length(clip),
            ClipKind::Sfx { clip, .. } => resources.audio_length(clip),
            ClipKind::Vfx { prefab, .. } => resources.particle_lifetime(prefab),
            ClipKind::Custom { length, .. } => Some(*length),
        };
        let found = length.filter(|length| length.is_finite() && *length > 0.0);
        self.resolved_duration = Some(found.unwrap_or(FALLBACK_CLIP_DURATION));
        found.is_some()
    }

    /// Whether a duration has been resolved
    pub fn is_resolved(&self) -> bool {
        self.resolved_duration.is_some()
    }

    /// Clip duration.
    ///
    /// Unresolved resource-backed clips report the fallback; custom clips
    /// report their explicit length when finite and positive.
    pub fn duration(&self) -> f32 {
        if let Some(duration) = self.resolved_duration {
            return duration;
        }
        match &self.kind {
            ClipKind::Custom { length, .. } if length.is_finite() && *length > 0.0 => *length,
            _ => FALLBACK_CLIP_DURATION,
        }
    }

    /// End time local to the owning phase
    pub fn end(&self) -> f32 {
        self.start + self.duration()
    }

    /// Whether local time `t` lies in `[start, end)`
    pub fn contains(&self, t: f32) -> bool {
        t >= self.start && t < self.end()
    }
}
