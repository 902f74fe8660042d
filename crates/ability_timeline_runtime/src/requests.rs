// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed request records and per-entity request queues.
//!
//! Every fired cue becomes exactly one request. Queues live for one tick:
//! they are cleared at the start of the next tick whether drained or not.

use crate::entity::{EntityId, Pose};
use ability_timeline_model::{ClipAddress, ClipType, HitboxShape};

/// Activate a hit detection volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitboxActivateRequest {
    /// Hash of the key's event name
    pub hitbox_id: u32,
    /// Volume shape
    pub shape: HitboxShape,
    /// Radius
    pub radius: f32,
    /// Cone angle in degrees
    pub angle: f32,
    /// Capsule height
    pub height: f32,
    /// Damage
    pub damage: f32,
    /// How long the volume stays live
    pub active_duration: f32,
    /// Teams the volume can hit
    pub team_mask: u8,
    /// World-space center
    pub origin: [f32; 3],
    /// Orientation (quaternion xyzw)
    pub rotation: [f32; 4],
    /// Target slot for lock-on abilities (-1 for none)
    pub target_slot: i32,
}

/// Spawn a visual effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VfxSpawnRequest {
    /// Prefab hash
    pub vfx_id: u32,
    /// World-space position
    pub position: [f32; 3],
    /// Orientation (quaternion xyzw)
    pub rotation: [f32; 4],
    /// Uniform scale
    pub scale: f32,
    /// Entity to attach to
    pub attach_to: Option<EntityId>,
}

/// Play a sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SfxPlayRequest {
    /// Audio clip hash
    pub sfx_id: u32,
    /// World-space position
    pub position: [f32; 3],
    /// Volume
    pub volume: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Loop the sound
    pub looped: bool,
    /// Entity to attach to
    pub attach_to: Option<EntityId>,
}

/// Kind of animator parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationParamKind {
    /// Float parameter
    Float,
    /// Integer parameter
    Int,
    /// Boolean parameter
    Bool,
    /// Trigger parameter
    Trigger,
}

/// Set an animator parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParamRequest {
    /// Parameter name hash
    pub param_hash: u32,
    /// Parameter kind
    pub kind: AnimationParamKind,
    /// Float value
    pub float_value: f32,
    /// Integer value
    pub int_value: i32,
    /// Bool value
    pub bool_value: bool,
}

/// Shake the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraImpulseRequest {
    /// Impulse direction
    pub direction: [f32; 3],
    /// Impulse magnitude
    pub magnitude: f32,
    /// Duration
    pub duration: f32,
    /// Radius of effect
    pub radius: f32,
    /// World-space source
    pub origin: [f32; 3],
    /// Shake profile
    pub profile: u8,
}

/// Who a time-scale change affects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeScaleTarget {
    /// Whole simulation
    Global,
    /// One entity
    Entity(EntityId),
    /// Entities within a sphere
    Area {
        /// Center
        center: [f32; 3],
        /// Radius
        radius: f32,
    },
}

/// Change the time scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScaleRequest {
    /// Multiplier
    pub time_scale: f32,
    /// Duration
    pub duration: f32,
    /// Affected scope
    pub target: TimeScaleTarget,
}

/// Invoke a script hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptHookRequest {
    /// Hash of the key's event name
    pub hook_id: u32,
    /// Integer parameter
    pub int_param: i32,
    /// Float parameters
    pub params: [f32; 4],
    /// String parameter hash
    pub string_hash: u32,
    /// Entity the hook runs for
    pub context: EntityId,
}

/// Start a clip instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipActivateRequest {
    /// Clip definition
    pub clip: ClipAddress,
    /// Resource hash (0 for custom clips)
    pub clip_id: u32,
    /// Clip type
    pub clip_type: ClipType,
    /// Duration
    pub duration: f32,
    /// Owning entity
    pub owner: EntityId,
    /// Owner pose when the clip started
    pub origin: Pose,
}

/// Kind of request queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// [`HitboxActivateRequest`]
    Hitbox,
    /// [`VfxSpawnRequest`]
    Vfx,
    /// [`SfxPlayRequest`]
    Sfx,
    /// [`AnimationParamRequest`]
    AnimationParam,
    /// [`CameraImpulseRequest`]
    CameraImpulse,
    /// [`TimeScaleRequest`]
    TimeScale,
    /// [`ScriptHookRequest`]
    ScriptHook,
    /// [`ClipActivateRequest`]
    ClipActivate,
}

/// One typed request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    /// Hitbox activation
    Hitbox(HitboxActivateRequest),
    /// VFX spawn
    Vfx(VfxSpawnRequest),
    /// SFX play
    Sfx(SfxPlayRequest),
    /// Animator parameter
    AnimationParam(AnimationParamRequest),
    /// Camera impulse
    CameraImpulse(CameraImpulseRequest),
    /// Time scale
    TimeScale(TimeScaleRequest),
    /// Script hook
    ScriptHook(ScriptHookRequest),
    /// Clip activation
    ClipActivate(ClipActivateRequest),
}

impl Request {
    /// Queue this request belongs in
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Hitbox(_) => RequestKind::Hitbox,
            Self::Vfx(_) => RequestKind::Vfx,
            Self::Sfx(_) => RequestKind::Sfx,
            Self::AnimationParam(_) => RequestKind::AnimationParam,
            Self::CameraImpulse(_) => RequestKind::CameraImpulse,
            Self::TimeScale(_) => RequestKind::TimeScale,
            Self::ScriptHook(_) => RequestKind::ScriptHook,
            Self::ClipActivate(_) => RequestKind::ClipActivate,
        }
    }
}

/// The request queues of one entity
#[derive(Debug, Clone, Default)]
pub struct RequestQueues {
    /// Hitbox activations
    pub hitbox: Vec<HitboxActivateRequest>,
    /// VFX spawns
    pub vfx: Vec<VfxSpawnRequest>,
    /// SFX plays
    pub sfx: Vec<SfxPlayRequest>,
    /// Animator parameters
    pub animation: Vec<AnimationParamRequest>,
    /// Camera impulses
    pub camera: Vec<CameraImpulseRequest>,
    /// Time-scale changes
    pub time_scale: Vec<TimeScaleRequest>,
    /// Script hooks
    pub script: Vec<ScriptHookRequest>,
    /// Clip activations
    pub clip: Vec<ClipActivateRequest>,
}

impl RequestQueues {
    /// Append a request to its queue
    pub fn push(&mut self, request: Request) {
        match request {
            Request::Hitbox(r) => self.hitbox.push(r),
            Request::Vfx(r) => self.vfx.push(r),
            Request::Sfx(r) => self.sfx.push(r),
            Request::AnimationParam(r) => self.animation.push(r),
            Request::CameraImpulse(r) => self.camera.push(r),
            Request::TimeScale(r) => self.time_scale.push(r),
            Request::ScriptHook(r) => self.script.push(r),
            Request::ClipActivate(r) => self.clip.push(r),
        }
    }

    /// Number of queued requests of a kind
    pub fn count(&self, kind: RequestKind) -> usize {
        match kind {
            RequestKind::Hitbox => self.hitbox.len(),
            RequestKind::Vfx => self.vfx.len(),
            RequestKind::Sfx => self.sfx.len(),
            RequestKind::AnimationParam => self.animation.len(),
            RequestKind::CameraImpulse => self.camera.len(),
            RequestKind::TimeScale => self.time_scale.len(),
            RequestKind::ScriptHook => self.script.len(),
            RequestKind::ClipActivate => self.clip.len(),
        }
    }

    /// Total queued requests
    pub fn len(&self) -> usize {
        self.hitbox.len()
            + self.vfx.len()
            + self.sfx.len()
            + self.animation.len()
            + self.camera.len()
            + self.time_scale.len()
            + self.script.len()
            + self.clip.len()
    }

    /// Whether every queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty every queue
    pub fn clear(&mut self) {
        self.hitbox.clear();
        self.vfx.clear();
        self.sfx.clear();
        self.animation.clear();
        self.camera.clear();
        self.time_scale.clear();
        self.script.clear();
        self.clip.clear();
    }
}
