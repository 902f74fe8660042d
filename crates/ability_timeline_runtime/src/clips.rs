// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip sub-engine.
//!
//! A clip instance is created from a [`ClipActivateRequest`] and snapshots
//! its owner's pose at that moment. Every tick it advances its elapsed time
//! and fires clip-local keys over `[0, duration]`. On the tick elapsed reaches
//! the duration it is marked [`ClipStatus::PendingDestroy`]; its keys still
//! fire that tick. The cleanup pass of the following tick removes it.

use crate::commands::{CommandBuffer, WorldCommand};
use crate::cue::{CueEvent, CuePayload, CueSource};
use crate::entity::{EntityId, Pose};
use crate::requests::ClipActivateRequest;
use crate::world::AbilityWorld;
use ability_timeline_model::{fired_keys, AbilityDb, ClipAddress, ClipType, CueCursor};
use rayon::prelude::*;

/// Unique identifier for a clip instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipInstanceId(pub u64);

/// Lifecycle of a clip instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStatus {
    /// Advancing
    Running,
    /// Completed; removed by the next cleanup pass
    PendingDestroy,
}

/// A running clip
#[derive(Debug, Clone)]
pub struct ClipInstance {
    /// Instance id
    pub id: ClipInstanceId,
    /// Clip definition
    pub clip: ClipAddress,
    /// Resource hash (0 for custom clips)
    pub clip_id: u32,
    /// Clip type
    pub clip_type: ClipType,
    /// Owning entity
    pub owner: EntityId,
    /// Seconds since the instance started
    pub elapsed: f32,
    /// Clip duration
    pub duration: f32,
    /// Lifecycle status
    pub status: ClipStatus,
    /// Owner pose at creation
    pub origin: Pose,
    cursor: CueCursor,
    pub(crate) cues: Vec<CueEvent>,
}

impl ClipInstance {
    pub(crate) fn from_request(id: ClipInstanceId, request: &ClipActivateRequest) -> Self {
        Self {
            id,
            clip: request.clip,
            clip_id: request.clip_id,
            clip_type: request.clip_type,
            owner: request.owner,
            elapsed: 0.0,
            duration: request.duration,
            status: ClipStatus::Running,
            origin: request.origin,
            cursor: CueCursor::new(0.0),
            cues: Vec::new(),
        }
    }

    /// Whether the instance still advances
    pub fn is_running(&self) -> bool {
        self.status == ClipStatus::Running
    }

    /// Cues produced but not yet dispatched
    pub fn pending_cues(&self) -> &[CueEvent] {
        &self.cues
    }
}

/// Turn queued clip activation requests into spawn commands
pub fn activate_clips(world: &mut AbilityWorld, commands: &mut CommandBuffer) -> usize {
    let mut count = 0;
    for (_, queues) in world.all_requests_mut() {
        for request in queues.clip.drain(..) {
            commands.push(WorldCommand::SpawnClip(request));
            count += 1;
        }
    }
    count
}

/// Record removal of every instance marked on an earlier tick
pub fn cleanup_clips(world: &AbilityWorld, commands: &mut CommandBuffer) -> usize {
    let mut count = 0;
    for instance in world.clips().filter(|c| c.status == ClipStatus::PendingDestroy) {
        commands.push(WorldCommand::DestroyClip(instance.id));
        count += 1;
    }
    count
}

/// Advance every running clip instance by `dt`
pub fn advance_clips(world: &mut AbilityWorld, db: &AbilityDb, dt: f32, parallel_threshold: usize) {
    let instances = world.clip_instances_mut();
    if instances.len() > parallel_threshold {
        instances
            .into_par_iter()
            .for_each(|instance| advance_clip(instance, db, dt));
    } else {
        for instance in instances {
            advance_clip(instance, db, dt);
        }
    }
}

fn advance_clip(instance: &mut ClipInstance, db: &AbilityDb, dt: f32) {
    if instance.status == ClipStatus::PendingDestroy {
        return;
    }
    instance.elapsed += dt;

    if let Some(window) = instance.cursor.advance(instance.elapsed) {
        let window = window.clamp_end(instance.duration);
        if let Some(clip) = db.clip(&instance.clip) {
            let source = CueSource::Clip {
                instance: instance.id,
                clip: instance.clip,
            };
            for (_, key) in fired_keys(&clip.keys, window) {
                instance.cues.push(CueEvent {
                    source,
                    time: key.time,
                    id: key.event.hash(),
                    payload: CuePayload::Key(key.payload.clone()),
                });
            }
        }
    }

    if instance.elapsed >= instance.duration {
        tracing::trace!("Clip {:?} completed after {}s", instance.id, instance.elapsed);
        instance.status = ClipStatus::PendingDestroy;
    }
}
