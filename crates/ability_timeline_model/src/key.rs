// SPDX-License-Identifier: MIT OR Apache-2.0
//! Point events (keys) and their typed payloads.

use crate::hash::NameRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub Uuid);

impl KeyId {
    /// Create a new random key ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Discriminant of a key payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Hit detection window
    Hitbox,
    /// Generic gameplay signal
    Signal,
    /// Animator trigger
    AnimationEvent,
    /// Camera impulse
    CameraShake,
    /// Footstep sound
    Footstep,
    /// Visual effect spawn
    Vfx,
    /// Sound effect
    Sfx,
    /// Hit-stop or slow motion
    TimeScale,
    /// User-defined event
    Custom,
}

impl KeyType {
    /// Every key type, in declaration order
    pub const ALL: [KeyType; 9] = [
        Self::Hitbox,
        Self::Signal,
        Self::AnimationEvent,
        Self::CameraShake,
        Self::Footstep,
        Self::Vfx,
        Self::Sfx,
        Self::TimeScale,
        Self::Custom,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hitbox => "Hitbox",
            Self::Signal => "Signal",
            Self::AnimationEvent => "Animation Event",
            Self::CameraShake => "Camera Shake",
            Self::Footstep => "Footstep",
            Self::Vfx => "VFX",
            Self::Sfx => "SFX",
            Self::TimeScale => "Time Scale",
            Self::Custom => "Custom",
        }
    }

    /// Get the key marker color
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Hitbox => [255, 90, 90],
            Self::Signal => [255, 200, 100],
            Self::AnimationEvent => [100, 150, 255],
            Self::CameraShake => [255, 100, 150],
            Self::Footstep => [180, 140, 90],
            Self::Vfx => [150, 255, 100],
            Self::Sfx => [200, 100, 255],
            Self::TimeScale => [90, 220, 220],
            Self::Custom => [150, 150, 150],
        }
    }
}

/// Hitbox volume shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitboxShape {
    /// Sphere of `radius`
    #[default]
    Sphere,
    /// Cone of `radius` and half-`angle` along the heading
    Cone,
    /// Capsule of `radius` and `height`
    Capsule,
}

/// Hitbox activation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxKey {
    /// Volume shape
    pub shape: HitboxShape,
    /// Radius in meters
    pub radius: f32,
    /// Cone angle in degrees
    pub angle: f32,
    /// Capsule height
    pub height: f32,
    /// Damage applied on hit
    pub damage: f32,
    /// How long the hitbox stays live
    pub active_duration: f32,
    /// Teams this hitbox can hit
    pub team_mask: u8,
    /// Offset from the owner
    pub offset: [f32; 3],
    /// Rotate `offset` by the owner's heading
    pub use_heading: bool,
}

impl Default for HitboxKey {
    fn default() -> Self {
        Self {
            shape: HitboxShape::Sphere,
            radius: 1.0,
            angle: 90.0,
            height: 2.0,
            damage: 10.0,
            active_duration: 0.1,
            team_mask: 0xff,
            offset: [0.0; 3],
            use_heading: true,
        }
    }
}

/// Generic parameters of signal and custom keys
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamBlock {
    /// String parameter (hashed at runtime)
    pub string_param: NameRef,
    /// Integer parameter
    pub int_param: i32,
    /// Float parameters
    pub params: [f32; 4],
}

/// Animator parameter trigger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationEventKey {
    /// Animator parameter name
    pub parameter: NameRef,
    /// Integer parameter
    pub int_param: i32,
    /// Float parameter
    pub float_param: f32,
}

/// Camera impulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraShakeKey {
    /// Radius of effect around the owner
    pub radius: f32,
    /// Impulse magnitude
    pub intensity: f32,
    /// Impulse duration in seconds
    pub duration: f32,
    /// Shake profile
    pub profile: u8,
}

impl Default for CameraShakeKey {
    fn default() -> Self {
        Self {
            radius: 10.0,
            intensity: 1.0,
            duration: 0.2,
            profile: 0,
        }
    }
}

/// Footstep sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootstepKey {
    /// Sound to play; empty uses the engine fallback
    pub sound: NameRef,
    /// Which foot (0 = left, 1 = right)
    pub foot: u8,
    /// Volume; non-positive uses the engine default
    pub volume: f32,
    /// Seed in `[0, 1]` mapped to a pitch offset
    pub jitter: f32,
}

impl Default for FootstepKey {
    fn default() -> Self {
        Self {
            sound: NameRef::default(),
            foot: 0,
            volume: 0.0,
            jitter: 0.5,
        }
    }
}

/// Visual effect spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfxKey {
    /// Effect prefab
    pub prefab: NameRef,
    /// Offset from the owner
    pub offset: [f32; 3],
    /// Extra rotation (quaternion xyzw)
    pub rotation: [f32; 4],
    /// Uniform scale
    pub scale: f32,
    /// Attach the effect to the owner
    pub attach_to_owner: bool,
}

impl Default for VfxKey {
    fn default() -> Self {
        Self {
            prefab: NameRef::default(),
            offset: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: 1.0,
            attach_to_owner: false,
        }
    }
}

/// Sound effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfxKey {
    /// Audio clip
    pub clip: NameRef,
    /// Volume
    pub volume: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Loop the sound
    pub looped: bool,
}

impl Default for SfxKey {
    fn default() -> Self {
        Self {
            clip: NameRef::default(),
            volume: 1.0,
            pitch: 1.0,
            looped: false,
        }
    }
}

/// Who a time-scale change affects
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TimeScaleScope {
    /// Whole simulation
    #[default]
    Global,
    /// Only the owning entity
    Owner,
    /// Entities within `radius` of the owner
    Area {
        /// Radius in meters
        radius: f32,
    },
}

/// Hit-stop or slow motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeScaleKey {
    /// Time multiplier
    pub scale: f32,
    /// Real-time duration
    pub duration: f32,
    /// Affected scope
    pub scope: TimeScaleScope,
}

impl Default for TimeScaleKey {
    fn default() -> Self {
        Self {
            scale: 0.1,
            duration: 0.08,
            scope: TimeScaleScope::Global,
        }
    }
}

/// Typed key payload; the variant is the key type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyPayload {
    /// Hitbox activation
    Hitbox(HitboxKey),
    /// Generic signal
    Signal(ParamBlock),
    /// Animator trigger
    AnimationEvent(AnimationEventKey),
    /// Camera impulse
    CameraShake(CameraShakeKey),
    /// Footstep sound
    Footstep(FootstepKey),
    /// Visual effect
    Vfx(VfxKey),
    /// Sound effect
    Sfx(SfxKey),
    /// Time-scale change
    TimeScale(TimeScaleKey),
    /// User-defined event
    Custom(ParamBlock),
}

impl KeyPayload {
    /// Default payload for a key type
    pub fn default_for(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Hitbox => Self::Hitbox(HitboxKey::default()),
            KeyType::Signal => Self::Signal(ParamBlock::default()),
            KeyType::AnimationEvent => Self::AnimationEvent(AnimationEventKey::default()),
            KeyType::CameraShake => Self::CameraShake(CameraShakeKey::default()),
            KeyType::Footstep => Self::Footstep(FootstepKey::default()),
            KeyType::Vfx => Self::Vfx(VfxKey::default()),
            KeyType::Sfx => Self::Sfx(SfxKey::default()),
            KeyType::TimeScale => Self::TimeScale(TimeScaleKey::default()),
            KeyType::Custom => Self::Custom(ParamBlock::default()),
        }
    }

    /// The key type this payload belongs to
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Hitbox(_) => KeyType::Hitbox,
            Self::Signal(_) => KeyType::Signal,
            Self::AnimationEvent(_) => KeyType::AnimationEvent,
            Self::CameraShake(_) => KeyType::CameraShake,
            Self::Footstep(_) => KeyType::Footstep,
            Self::Vfx(_) => KeyType::Vfx,
            Self::Sfx(_) => KeyType::Sfx,
            Self::TimeScale(_) => KeyType::TimeScale,
            Self::Custom(_) => KeyType::Custom,
        }
    }
}

/// A point event within a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Unique key ID
    #[serde(default)]
    pub id: KeyId,
    /// Local time within the owning phase (or clip)
    pub time: f32,
    /// Event name; its hash is the cue id
    #[serde(default)]
    pub event: NameRef,
    /// Typed payload
    pub payload: KeyPayload,
}

impl Key {
    /// Create a new key
    pub fn new(time: f32, payload: KeyPayload) -> Self {
        Self {
            id: KeyId::new(),
            time,
            event: NameRef::default(),
            payload,
        }
    }

    /// Create a key with the default payload of a type
    pub fn of_type(time: f32, key_type: KeyType) -> Self {
        Self::new(time, KeyPayload::default_for(key_type))
    }

    /// Set the event name
    pub fn with_event(mut self, event: impl Into<NameRef>) -> Self {
        self.event = event.into();
        self
    }

    /// The key type
    pub fn key_type(&self) -> KeyType {
        self.payload.key_type()
    }

    /// Copy of this key with a fresh id, shifted in time
    pub fn duplicate(&self, offset: f32) -> Self {
        Self {
            id: KeyId::new(),
            time: self.time + offset,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults_match_type() {
        for key_type in KeyType::ALL {
            assert_eq!(KeyPayload::default_for(key_type).key_type(), key_type);
        }
    }

    #[test]
    fn test_duplicate_gets_new_id() {
        let key = Key::of_type(0.5, KeyType::Signal).with_event("Charge");
        let copy = key.duplicate(0.25);

        assert_ne!(copy.id, key.id);
        assert!((copy.time - 0.75).abs() < 1e-6);
        assert_eq!(copy.event, key.event);
    }

    #[test]
    fn test_key_parses_from_sparse_ron() {
        let key: Key = ron::from_str(
            "(time: 0.4, event: \"Slash\", payload: Hitbox((radius: 2.5, damage: 30.0)))",
        )
        .unwrap();

        assert_eq!(key.key_type(), KeyType::Hitbox);
        let KeyPayload::Hitbox(hitbox) = &key.payload else {
            panic!("expected hitbox payload");
        };
        assert_eq!(hitbox.radius, 2.5);
        assert_eq!(hitbox.team_mask, 0xff);
    }
}
