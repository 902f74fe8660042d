// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability simulation runtime.
//!
//! Drives baked abilities from `ability_timeline_model` with a fixed tick:
//! - A per-entity state machine (idle or one active ability)
//! - Exactly-once key firing through the shared cue evaluator
//! - A clip sub-engine with its own instances and clip-local keys
//! - Dispatch of every cue into one typed request
//!
//! Structural changes are deferred to the end of the tick; see [`engine`] for
//! the pass order.

pub mod clips;
pub mod commands;
pub mod components;
pub mod config;
pub mod cue;
pub mod dispatch;
pub mod engine;
pub mod entity;
pub mod error;
pub mod requests;
pub mod sink;
pub mod state_machine;
pub mod world;

pub use clips::{ClipInstance, ClipInstanceId, ClipStatus};
pub use commands::{ApplyStats, CommandBuffer, CommandEffect, CommandError, WorldCommand};
pub use components::{ActiveAbility, CastRequest, CooldownEntry, CooldownTable, Loadout, LoadoutSlot};
pub use config::{EngineConfig, FootstepDefaults, CONFIG_FORMAT_VERSION};
pub use cue::{ClipTrigger, CueEvent, CueKind, CuePayload, CueSource};
pub use dispatch::CueDispatcher;
pub use engine::{AbilityEngine, TickReport};
pub use entity::{quat_mul, EntityId, Pose};
pub use error::{Result, RuntimeError};
pub use requests::{
    AnimationParamKind, AnimationParamRequest, CameraImpulseRequest, ClipActivateRequest,
    HitboxActivateRequest, Request, RequestKind, RequestQueues, ScriptHookRequest, SfxPlayRequest,
    TimeScaleRequest, TimeScaleTarget, VfxSpawnRequest,
};
pub use sink::{RequestLog, RequestSink};
pub use state_machine::CastStats;
pub use world::{AbilityWorld, EntityRecord};
