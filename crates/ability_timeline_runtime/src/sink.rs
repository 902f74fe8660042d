// SPDX-License-Identifier: MIT OR Apache-2.0
//! Downstream consumers of request queues.
//!
//! Hitbox, audio, camera and scripting systems live outside this crate. They
//! implement [`RequestSink`] and are handed the queued requests once per tick.

use crate::entity::EntityId;
use crate::requests::{
    AnimationParamRequest, CameraImpulseRequest, HitboxActivateRequest, Request, RequestKind,
    ScriptHookRequest, SfxPlayRequest, TimeScaleRequest, VfxSpawnRequest,
};
use crate::world::AbilityWorld;

/// A consumer of typed requests; every method defaults to ignoring
#[allow(unused_variables)]
pub trait RequestSink {
    /// Hitbox activation
    fn hitbox(&mut self, entity: EntityId, request: &HitboxActivateRequest) {}
    /// VFX spawn
    fn vfx(&mut self, entity: EntityId, request: &VfxSpawnRequest) {}
    /// SFX play
    fn sfx(&mut self, entity: EntityId, request: &SfxPlayRequest) {}
    /// Animator parameter
    fn animation(&mut self, entity: EntityId, request: &AnimationParamRequest) {}
    /// Camera impulse
    fn camera(&mut self, entity: EntityId, request: &CameraImpulseRequest) {}
    /// Time-scale change
    fn time_scale(&mut self, entity: EntityId, request: &TimeScaleRequest) {}
    /// Script hook
    fn script(&mut self, entity: EntityId, request: &ScriptHookRequest) {}
}

/// Hand every queued request to `sink`, emptying the queues.
///
/// Clip activations are consumed by the engine itself and never reach a sink.
pub fn drain_requests(world: &mut AbilityWorld, sink: &mut dyn RequestSink) -> usize {
    let mut count = 0;
    for (entity, queues) in world.all_requests_mut() {
        count += queues.len() - queues.clip.len();
        for request in queues.hitbox.drain(..) {
            sink.hitbox(entity, &request);
        }
        for request in queues.vfx.drain(..) {
            sink.vfx(entity, &request);
        }
        for request in queues.sfx.drain(..) {
            sink.sfx(entity, &request);
        }
        for request in queues.animation.drain(..) {
            sink.animation(entity, &request);
        }
        for request in queues.camera.drain(..) {
            sink.camera(entity, &request);
        }
        for request in queues.time_scale.drain(..) {
            sink.time_scale(entity, &request);
        }
        for request in queues.script.drain(..) {
            sink.script(entity, &request);
        }
    }
    count
}

/// Sink that records every request it receives
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    entries: Vec<(EntityId, Request)>,
}

impl RequestLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded requests in arrival order
    pub fn entries(&self) -> &[(EntityId, Request)] {
        &self.entries
    }

    /// Number of recorded requests of a kind
    pub fn count(&self, kind: RequestKind) -> usize {
        self.entries.iter().filter(|(_, r)| r.kind() == kind).count()
    }

    /// Number of recorded requests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything recorded
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl RequestSink for RequestLog {
    fn hitbox(&mut self, entity: EntityId, request: &HitboxActivateRequest) {
        self.entries.push((entity, Request::Hitbox(*request)));
    }

    fn vfx(&mut self, entity: EntityId, request: &VfxSpawnRequest) {
        self.entries.push((entity, Request::Vfx(*request)));
    }

    fn sfx(&mut self, entity: EntityId, request: &SfxPlayRequest) {
        self.entries.push((entity, Request::Sfx(*request)));
    }

    fn animation(&mut self, entity: EntityId, request: &AnimationParamRequest) {
        self.entries.push((entity, Request::AnimationParam(*request)));
    }

    fn camera(&mut self, entity: EntityId, request: &CameraImpulseRequest) {
        self.entries.push((entity, Request::CameraImpulse(*request)));
    }

    fn time_scale(&mut self, entity: EntityId, request: &TimeScaleRequest) {
        self.entries.push((entity, Request::TimeScale(*request)));
    }

    fn script(&mut self, entity: EntityId, request: &ScriptHookRequest) {
        self.entries.push((entity, Request::ScriptHook(*request)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Pose;
    use crate::requests::TimeScaleTarget;

    #[test]
    fn test_drain_empties_queues() {
        let mut world = AbilityWorld::new();
        world.spawn(EntityId(1), Pose::default()).unwrap();
        let queues = world.request_queues(EntityId(1));
        queues.push(Request::TimeScale(TimeScaleRequest {
            time_scale: 0.1,
            duration: 0.08,
            target: TimeScaleTarget::Global,
        }));
        queues.push(Request::Vfx(VfxSpawnRequest {
            vfx_id: 7,
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: 1.0,
            attach_to: None,
        }));

        let mut log = RequestLog::new();
        assert_eq!(drain_requests(&mut world, &mut log), 2);
        assert_eq!(log.count(RequestKind::Vfx), 1);
        assert_eq!(log.count(RequestKind::TimeScale), 1);
        assert_eq!(world.request_count(), 0);
    }

    #[test]
    fn test_default_sink_ignores_everything() {
        struct Nothing;
        impl RequestSink for Nothing {}

        let mut world = AbilityWorld::new();
        world.request_queues(EntityId(1)).push(Request::Hitbox(HitboxActivateRequest {
            hitbox_id: 1,
            shape: Default::default(),
            radius: 1.0,
            angle: 90.0,
            height: 2.0,
            damage: 5.0,
            active_duration: 0.1,
            team_mask: 0xff,
            origin: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            target_slot: -1,
        }));
        assert_eq!(drain_requests(&mut world, &mut Nothing), 1);
        assert_eq!(world.request_count(), 0);
    }
}
