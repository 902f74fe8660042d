// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track type compatibility matrix.
//!
//! Each track type accepts a fixed set of key and clip types. Additions that
//! violate the table are rejected, never coerced.

use crate::clip::ClipType;
use crate::error::{ModelError, Result};
use crate::key::KeyType;
use crate::track::TrackType;

const HITBOX_KEYS: &[KeyType] = &[KeyType::Hitbox];
const ANIMATION_KEYS: &[KeyType] = &[KeyType::AnimationEvent, KeyType::Signal];
const VFX_KEYS: &[KeyType] = &[KeyType::Vfx, KeyType::Signal, KeyType::Custom];
const SFX_KEYS: &[KeyType] = &[KeyType::Sfx, KeyType::Footstep, KeyType::Signal, KeyType::Custom];
const CAMERA_KEYS: &[KeyType] = &[KeyType::CameraShake, KeyType::TimeScale, KeyType::Signal];
const SCRIPT_KEYS: &[KeyType] = &[KeyType::Signal, KeyType::TimeScale, KeyType::Custom];

const NO_CLIPS: &[ClipType] = &[];
const ANIMATION_CLIPS: &[ClipType] = &[ClipType::Animation];
const VFX_CLIPS: &[ClipType] = &[ClipType::Vfx, ClipType::Custom];
const SFX_CLIPS: &[ClipType] = &[ClipType::Sfx, ClipType::Custom];
const CUSTOM_CLIPS: &[ClipType] = &[ClipType::Custom];

/// Key types a track type accepts
pub fn allowed_key_types(track_type: TrackType) -> &'static [KeyType] {
    match track_type {
        TrackType::Hitbox => HITBOX_KEYS,
        TrackType::Animation => ANIMATION_KEYS,
        TrackType::Vfx => VFX_KEYS,
        TrackType::Sfx => SFX_KEYS,
        TrackType::Camera => CAMERA_KEYS,
        TrackType::Script => SCRIPT_KEYS,
        TrackType::Custom => &KeyType::ALL,
    }
}

/// Clip types a track type accepts
pub fn allowed_clip_types(track_type: TrackType) -> &'static [ClipType] {
    match track_type {
        TrackType::Hitbox => NO_CLIPS,
        TrackType::Animation => ANIMATION_CLIPS,
        TrackType::Vfx => VFX_CLIPS,
        TrackType::Sfx => SFX_CLIPS,
        TrackType::Camera | TrackType::Script => CUSTOM_CLIPS,
        TrackType::Custom => &ClipType::ALL,
    }
}

/// Whether a track type accepts a key type
pub fn can_add_key(track_type: TrackType, key_type: KeyType) -> bool {
    allowed_key_types(track_type).contains(&key_type)
}

/// Whether a track type accepts a clip type
pub fn can_add_clip(track_type: TrackType, clip_type: ClipType) -> bool {
    allowed_clip_types(track_type).contains(&clip_type)
}

/// Whether a track type accepts any clips at all
pub fn supports_clips(track_type: TrackType) -> bool {
    !allowed_clip_types(track_type).is_empty()
}

/// Check a key type against the matrix
pub fn check_key(track_type: TrackType, key_type: KeyType) -> Result<()> {
    if can_add_key(track_type, key_type) {
        Ok(())
    } else {
        Err(ModelError::IncompatibleKey { track_type, key_type })
    }
}

/// Check a clip type against the matrix
pub fn check_clip(track_type: TrackType, clip_type: ClipType) -> Result<()> {
    if can_add_clip(track_type, clip_type) {
        Ok(())
    } else {
        Err(ModelError::IncompatibleClip { track_type, clip_type })
    }
}

/// Key type created by default on a track type
pub fn default_key_type(track_type: TrackType) -> KeyType {
    match track_type {
        TrackType::Hitbox => KeyType::Hitbox,
        TrackType::Animation => KeyType::AnimationEvent,
        TrackType::Vfx => KeyType::Vfx,
        TrackType::Sfx => KeyType::Footstep,
        TrackType::Camera => KeyType::CameraShake,
        TrackType::Script => KeyType::Signal,
        TrackType::Custom => KeyType::Custom,
    }
}

/// Clip type created by default on a track type, if it takes clips
pub fn default_clip_type(track_type: TrackType) -> Option<ClipType> {
    match track_type {
        TrackType::Hitbox => None,
        TrackType::Animation => Some(ClipType::Animation),
        TrackType::Vfx => Some(ClipType::Vfx),
        TrackType::Sfx => Some(ClipType::Sfx),
        TrackType::Camera | TrackType::Script | TrackType::Custom => Some(ClipType::Custom),
    }
}

/// Human-readable summary of what a track type accepts
pub fn restriction_summary(track_type: TrackType) -> String {
    let keys: Vec<&str> = allowed_key_types(track_type).iter().map(KeyType::name).collect();
    let clips: Vec<&str> = allowed_clip_types(track_type).iter().map(ClipType::name).collect();
    let clips = if clips.is_empty() { "none".to_string() } else { clips.join(", ") };
    format!("{} track: keys [{}], clips [{}]", track_type.name(), keys.join(", "), clips)
}
