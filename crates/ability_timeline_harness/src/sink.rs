// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request sink that logs every request.

use ability_timeline_runtime::{
    AnimationParamRequest, CameraImpulseRequest, EntityId, HitboxActivateRequest, RequestSink,
    ScriptHookRequest, SfxPlayRequest, TimeScaleRequest, VfxSpawnRequest,
};
use serde::Serialize;
use std::fmt;

/// Requests received, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestTotals {
    /// Hitbox activations
    pub hitbox: usize,
    /// VFX spawns
    pub vfx: usize,
    /// SFX plays
    pub sfx: usize,
    /// Animator parameters
    pub animation: usize,
    /// Camera impulses
    pub camera: usize,
    /// Time-scale changes
    pub time_scale: usize,
    /// Script hooks
    pub script: usize,
}

impl RequestTotals {
    /// Sum over every kind
    pub fn total(&self) -> usize {
        self.hitbox + self.vfx + self.sfx + self.animation + self.camera + self.time_scale + self.script
    }
}

impl fmt::Display for RequestTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hitbox {} | vfx {} | sfx {} | animation {} | camera {} | time scale {} | script {}",
            self.hitbox, self.vfx, self.sfx, self.animation, self.camera, self.time_scale, self.script
        )
    }
}

/// Stands in for gameplay systems: logs requests and counts them
#[derive(Debug, Default)]
pub struct TracingSink {
    /// Tick the drained requests belong to
    pub tick: u64,
    totals: RequestTotals,
}

impl TracingSink {
    /// Create a sink with zeroed totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals so far
    pub fn totals(&self) -> RequestTotals {
        self.totals
    }
}

impl RequestSink for TracingSink {
    fn hitbox(&mut self, entity: EntityId, request: &HitboxActivateRequest) {
        self.totals.hitbox += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            hitbox = request.hitbox_id,
            shape = ?request.shape,
            damage = request.damage,
            origin = ?request.origin,
            "Hitbox"
        );
    }

    fn vfx(&mut self, entity: EntityId, request: &VfxSpawnRequest) {
        self.totals.vfx += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            vfx = request.vfx_id,
            position = ?request.position,
            attached = request.attach_to.is_some(),
            "VFX"
        );
    }

    fn sfx(&mut self, entity: EntityId, request: &SfxPlayRequest) {
        self.totals.sfx += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            sfx = request.sfx_id,
            volume = request.volume,
            pitch = request.pitch,
            "SFX"
        );
    }

    fn animation(&mut self, entity: EntityId, request: &AnimationParamRequest) {
        self.totals.animation += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            param = request.param_hash,
            kind = ?request.kind,
            "Animation"
        );
    }

    fn camera(&mut self, entity: EntityId, request: &CameraImpulseRequest) {
        self.totals.camera += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            magnitude = request.magnitude,
            duration = request.duration,
            "Camera impulse"
        );
    }

    fn time_scale(&mut self, entity: EntityId, request: &TimeScaleRequest) {
        self.totals.time_scale += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            scale = request.time_scale,
            target = ?request.target,
            "Time scale"
        );
    }

    fn script(&mut self, entity: EntityId, request: &ScriptHookRequest) {
        self.totals.script += 1;
        tracing::info!(
            tick = self.tick,
            %entity,
            hook = request.hook_id,
            int_param = request.int_param,
            "Script hook"
        );
    }
}
