// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic cue events produced by evaluation and consumed by dispatch.

use crate::clips::ClipInstanceId;
use ability_timeline_model::{AbilityId, ClipAddress, ClipType, KeyPayload, KeyType};

/// Where a cue came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueSource {
    /// A key or clip on an ability track
    Ability {
        /// Ability
        ability: AbilityId,
        /// Phase index
        phase: usize,
        /// Track index
        track: usize,
    },
    /// A key inside a running clip instance
    Clip {
        /// Clip instance
        instance: ClipInstanceId,
        /// Clip definition
        clip: ClipAddress,
    },
}

/// A clip entered on an ability track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipTrigger {
    /// Clip definition
    pub address: ClipAddress,
    /// Clip type
    pub clip_type: ClipType,
    /// Resource hash (0 for custom clips)
    pub resource_hash: u32,
    /// Resolved duration
    pub duration: f32,
}

/// Type-tagged cue payload
#[derive(Debug, Clone, PartialEq)]
pub enum CuePayload {
    /// A key fired
    Key(KeyPayload),
    /// A clip started
    Clip(ClipTrigger),
}

/// Discriminant of a cue, for counting and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    /// Key cue of this type
    Key(KeyType),
    /// Clip cue of this type
    Clip(ClipType),
}

/// A fired cue
#[derive(Debug, Clone, PartialEq)]
pub struct CueEvent {
    /// Origin
    pub source: CueSource,
    /// Authored time of the cue, in the time base of its source.
    ///
    /// [`CueSource::Ability`] cues carry ability time (phase start plus the
    /// key or clip start). [`CueSource::Clip`] cues carry clip-local time,
    /// measured from the clip instance's start.
    pub time: f32,
    /// Hash of the key's event name; the cue's numeric id
    pub id: u32,
    /// Payload
    pub payload: CuePayload,
}

impl CueEvent {
    /// Discriminant
    pub fn kind(&self) -> CueKind {
        match &self.payload {
            CuePayload::Key(payload) => CueKind::Key(payload.key_type()),
            CuePayload::Clip(trigger) => CueKind::Clip(trigger.clip_type),
        }
    }
}
