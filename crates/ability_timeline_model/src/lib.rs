// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability definition model.
//!
//! This crate holds the authored, then baked, description of abilities:
//! - Phases executed strictly in sequence
//! - Typed tracks holding point keys and interval clips
//! - The track/key/clip compatibility matrix
//! - Validation and baking into an immutable table keyed by id hash
//! - The pure cue evaluator shared by the simulation and the preview
//!
//! ## Time
//!
//! Key and clip times are local to their phase. Global ability time is the
//! sum of the preceding phase durations plus the local time.

pub mod ability;
pub mod clip;
pub mod db;
pub mod error;
pub mod evaluate;
pub mod hash;
pub mod key;
pub mod phase;
pub mod preset;
pub mod rules;
pub mod track;
pub mod validate;

pub use ability::{AbilityDefinition, Marker, MarkerKind, PhaseCursor, MIN_TOTAL_DURATION};
pub use clip::{
    Clip, ClipId, ClipKind, ClipType, NoResources, ParticleTiming, ResourceCatalog,
    ResourceDurations, FALLBACK_CLIP_DURATION,
};
pub use db::{AbilityDb, AbilitySet, BakeOutput, ClipAddress, DocumentFormat, KeyAddress, BAKED_FORMAT_VERSION};
pub use error::{ModelError, Result};
pub use evaluate::{
    active_clips_at, clip_samples, evaluate_track, fired_keys, ClipSample, CueCursor, CueWindow,
    TrackEvaluation,
};
pub use hash::{hash_name, AbilityId, NameRef};
pub use key::{
    AnimationEventKey, CameraShakeKey, FootstepKey, HitboxKey, HitboxShape, Key, KeyId, KeyPayload,
    KeyType, ParamBlock, SfxKey, TimeScaleKey, TimeScaleScope, VfxKey,
};
pub use phase::Phase;
pub use preset::{KeyPreset, PresetApplication};
pub use track::{Track, TrackId, TrackType};
pub use validate::{validate_ability, Severity, ValidationIssue};
