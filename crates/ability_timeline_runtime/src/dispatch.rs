// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue dispatch.
//!
//! Translates every fired cue into exactly one typed request and appends it
//! to the owning entity's queues. Ability cues use the owner's current pose;
//! clip cues use the pose snapshot taken when the clip started.

use crate::config::EngineConfig;
use crate::cue::{CueEvent, CuePayload};
use crate::entity::{quat_mul, EntityId, Pose};
use crate::requests::{
    AnimationParamKind, AnimationParamRequest, CameraImpulseRequest, ClipActivateRequest,
    HitboxActivateRequest, Request, ScriptHookRequest, SfxPlayRequest, TimeScaleRequest,
    TimeScaleTarget, VfxSpawnRequest,
};
use crate::world::AbilityWorld;
use ability_timeline_model::{hash_name, KeyPayload, ParamBlock, TimeScaleScope};

const CAMERA_IMPULSE_DIRECTION: [f32; 3] = [0.0, 0.0, 1.0];

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Maps cues to requests using the engine's fallback values
#[derive(Debug, Clone, PartialEq)]
pub struct CueDispatcher {
    footstep_sound: u32,
    footstep_volume: f32,
    footstep_pitch_span: f32,
    camera_impulse_duration: f32,
}

impl Default for CueDispatcher {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl CueDispatcher {
    /// Dispatcher using the fallbacks of `config`
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            footstep_sound: hash_name(&config.footstep.fallback_sound),
            footstep_volume: config.footstep.volume,
            footstep_pitch_span: config.footstep.pitch_jitter,
            camera_impulse_duration: config.camera_impulse_duration,
        }
    }

    /// The request a cue becomes when fired by `entity` at `pose`
    pub fn map_cue(&self, cue: &CueEvent, entity: EntityId, pose: &Pose) -> Request {
        let key = match &cue.payload {
            CuePayload::Clip(trigger) => {
                return Request::ClipActivate(ClipActivateRequest {
                    clip: trigger.address,
                    clip_id: trigger.resource_hash,
                    clip_type: trigger.clip_type,
                    duration: trigger.duration,
                    owner: entity,
                    origin: *pose,
                });
            }
            CuePayload::Key(key) => key,
        };

        match key {
            KeyPayload::Hitbox(hitbox) => Request::Hitbox(HitboxActivateRequest {
                hitbox_id: cue.id,
                shape: hitbox.shape,
                radius: hitbox.radius,
                angle: hitbox.angle,
                height: hitbox.height,
                damage: hitbox.damage,
                active_duration: hitbox.active_duration,
                team_mask: hitbox.team_mask,
                origin: pose.offset_position(hitbox.offset, hitbox.use_heading),
                rotation: pose.rotation(),
                target_slot: -1,
            }),
            KeyPayload::Vfx(vfx) => Request::Vfx(VfxSpawnRequest {
                vfx_id: vfx.prefab.hash(),
                position: pose.offset_position(vfx.offset, true),
                rotation: quat_mul(pose.rotation(), vfx.rotation),
                scale: positive_or(vfx.scale, 1.0),
                attach_to: vfx.attach_to_owner.then_some(entity),
            }),
            KeyPayload::Sfx(sfx) => Request::Sfx(SfxPlayRequest {
                sfx_id: sfx.clip.hash(),
                position: pose.position,
                volume: positive_or(sfx.volume, 1.0),
                pitch: positive_or(sfx.pitch, 1.0),
                looped: sfx.looped,
                attach_to: Some(entity),
            }),
            KeyPayload::Footstep(step) => {
                let sound = if step.sound.is_empty() {
                    self.footstep_sound
                } else {
                    step.sound.hash()
                };
                let span = self.footstep_pitch_span;
                let jitter = step.jitter.clamp(0.0, 1.0);
                Request::Sfx(SfxPlayRequest {
                    sfx_id: sound,
                    position: pose.position,
                    volume: positive_or(step.volume, self.footstep_volume),
                    pitch: 1.0 + (jitter * span - span * 0.5),
                    looped: false,
                    attach_to: None,
                })
            }
            KeyPayload::AnimationEvent(event) => Request::AnimationParam(AnimationParamRequest {
                param_hash: event.parameter.hash(),
                kind: AnimationParamKind::Trigger,
                float_value: event.float_param,
                int_value: event.int_param,
                bool_value: true,
            }),
            KeyPayload::CameraShake(shake) => Request::CameraImpulse(CameraImpulseRequest {
                direction: CAMERA_IMPULSE_DIRECTION,
                magnitude: positive_or(shake.intensity, 1.0),
                duration: positive_or(shake.duration, self.camera_impulse_duration),
                radius: shake.radius,
                origin: pose.position,
                profile: shake.profile,
            }),
            KeyPayload::TimeScale(time_scale) => Request::TimeScale(TimeScaleRequest {
                time_scale: time_scale.scale.max(0.0),
                duration: time_scale.duration.max(0.0),
                target: match time_scale.scope {
                    TimeScaleScope::Global => TimeScaleTarget::Global,
                    TimeScaleScope::Owner => TimeScaleTarget::Entity(entity),
                    TimeScaleScope::Area { radius } => TimeScaleTarget::Area {
                        center: pose.position,
                        radius,
                    },
                },
            }),
            KeyPayload::Signal(params) | KeyPayload::Custom(params) => {
                Request::ScriptHook(script_hook(cue.id, params, entity))
            }
        }
    }
}

fn script_hook(hook_id: u32, params: &ParamBlock, context: EntityId) -> ScriptHookRequest {
    ScriptHookRequest {
        hook_id,
        int_param: params.int_param,
        params: params.params,
        string_hash: params.string_param.hash(),
        context,
    }
}

/// Move every entity's pending cues into its request queues
pub fn dispatch_ability_cues(world: &mut AbilityWorld, dispatcher: &CueDispatcher) -> usize {
    let outboxes: Vec<(EntityId, Pose, Vec<CueEvent>)> = world
        .records_mut_iter()
        .filter(|record| !record.cues.is_empty())
        .map(|record| (record.id, record.pose, std::mem::take(&mut record.cues)))
        .collect();

    let mut count = 0;
    for (entity, pose, cues) in outboxes {
        let queues = world.request_queues(entity);
        for cue in &cues {
            queues.push(dispatcher.map_cue(cue, entity, &pose));
        }
        count += cues.len();
    }
    count
}

/// Move every clip instance's pending cues into its owner's request queues.
///
/// Cues of clips whose owner no longer exists are dropped.
pub fn dispatch_clip_cues(world: &mut AbilityWorld, dispatcher: &CueDispatcher) -> usize {
    let outboxes: Vec<(EntityId, Pose, Vec<CueEvent>)> = world
        .clip_instances_mut()
        .into_iter()
        .filter(|instance| !instance.cues.is_empty())
        .map(|instance| (instance.owner, instance.origin, std::mem::take(&mut instance.cues)))
        .collect();

    let mut count = 0;
    for (owner, origin, cues) in outboxes {
        if !world.contains(owner) {
            tracing::trace!("Dropping {} clip cues of missing {owner}", cues.len());
            continue;
        }
        let queues = world.request_queues(owner);
        for cue in &cues {
            queues.push(dispatcher.map_cue(cue, owner, &origin));
        }
        count += cues.len();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{ClipTrigger, CueSource};
    use crate::requests::RequestKind;
    use ability_timeline_model::{
        AbilityId, CameraShakeKey, ClipAddress, ClipType, FootstepKey, HitboxKey, KeyType, NameRef,
        SfxKey, TimeScaleKey, VfxKey,
    };

    const OWNER: EntityId = EntityId(3);

    fn cue(payload: KeyPayload) -> CueEvent {
        CueEvent {
            source: CueSource::Ability {
                ability: AbilityId::from_name("Test"),
                phase: 0,
                track: 0,
            },
            time: 0.0,
            id: hash_name("Event"),
            payload: CuePayload::Key(payload),
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_every_key_type_maps_to_one_request() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::default();
        let expected = |key_type: KeyType| match key_type {
            KeyType::Hitbox => RequestKind::Hitbox,
            KeyType::Vfx => RequestKind::Vfx,
            KeyType::Sfx | KeyType::Footstep => RequestKind::Sfx,
            KeyType::AnimationEvent => RequestKind::AnimationParam,
            KeyType::CameraShake => RequestKind::CameraImpulse,
            KeyType::TimeScale => RequestKind::TimeScale,
            KeyType::Signal | KeyType::Custom => RequestKind::ScriptHook,
        };
        for key_type in KeyType::ALL {
            let request = dispatcher.map_cue(&cue(KeyPayload::default_for(key_type)), OWNER, &pose);
            assert_eq!(request.kind(), expected(key_type), "{key_type:?}");
        }
    }

    #[test]
    fn test_hitbox_offset_follows_heading() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::at([1.0, 0.0, 1.0]).facing([1.0, 0.0, 0.0]);
        let hitbox = HitboxKey {
            offset: [0.0, 1.0, 2.0],
            ..HitboxKey::default()
        };
        let Request::Hitbox(request) = dispatcher.map_cue(&cue(KeyPayload::Hitbox(hitbox)), OWNER, &pose) else {
            panic!("expected a hitbox request");
        };
        assert!(approx(request.origin[0], 3.0));
        assert!(approx(request.origin[1], 1.0));
        assert!(approx(request.origin[2], 1.0));
        assert_eq!(request.hitbox_id, hash_name("Event"));
        assert_eq!(request.target_slot, -1);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::default();

        let vfx = VfxKey { scale: 0.0, attach_to_owner: true, ..VfxKey::default() };
        let Request::Vfx(vfx) = dispatcher.map_cue(&cue(KeyPayload::Vfx(vfx)), OWNER, &pose) else {
            panic!("expected a vfx request");
        };
        assert_eq!(vfx.scale, 1.0);
        assert_eq!(vfx.attach_to, Some(OWNER));

        let sfx = SfxKey { volume: -1.0, pitch: 0.0, ..SfxKey::default() };
        let Request::Sfx(sfx) = dispatcher.map_cue(&cue(KeyPayload::Sfx(sfx)), OWNER, &pose) else {
            panic!("expected a sfx request");
        };
        assert_eq!((sfx.volume, sfx.pitch), (1.0, 1.0));

        let shake = CameraShakeKey { intensity: 0.0, duration: 0.0, ..CameraShakeKey::default() };
        let Request::CameraImpulse(shake) =
            dispatcher.map_cue(&cue(KeyPayload::CameraShake(shake)), OWNER, &pose)
        else {
            panic!("expected a camera request");
        };
        assert_eq!(shake.magnitude, 1.0);
        assert!(approx(shake.duration, 0.2));
        assert_eq!(shake.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_footstep_fallbacks() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::default();

        let Request::Sfx(step) =
            dispatcher.map_cue(&cue(KeyPayload::Footstep(FootstepKey::default())), OWNER, &pose)
        else {
            panic!("expected a sfx request");
        };
        assert_eq!(step.sfx_id, hash_name("Footstep"));
        assert!(approx(step.volume, 0.6));
        assert!(approx(step.pitch, 1.0));
        assert_eq!(step.attach_to, None);

        let loud = FootstepKey {
            sound: NameRef::new("Gravel"),
            volume: 0.9,
            jitter: 1.0,
            ..FootstepKey::default()
        };
        let Request::Sfx(step) = dispatcher.map_cue(&cue(KeyPayload::Footstep(loud)), OWNER, &pose) else {
            panic!("expected a sfx request");
        };
        assert_eq!(step.sfx_id, hash_name("Gravel"));
        assert!(approx(step.volume, 0.9));
        assert!(approx(step.pitch, 1.1));
    }

    #[test]
    fn test_time_scale_scopes() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::at([5.0, 0.0, 0.0]);
        let scoped = |scope| {
            let key = TimeScaleKey { scope, ..TimeScaleKey::default() };
            match dispatcher.map_cue(&cue(KeyPayload::TimeScale(key)), OWNER, &pose) {
                Request::TimeScale(request) => request.target,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(scoped(TimeScaleScope::Global), TimeScaleTarget::Global);
        assert_eq!(scoped(TimeScaleScope::Owner), TimeScaleTarget::Entity(OWNER));
        assert_eq!(
            scoped(TimeScaleScope::Area { radius: 4.0 }),
            TimeScaleTarget::Area { center: [5.0, 0.0, 0.0], radius: 4.0 }
        );
    }

    #[test]
    fn test_clip_cue_snapshots_pose() {
        let dispatcher = CueDispatcher::default();
        let pose = Pose::at([2.0, 0.0, 2.0]);
        let address = ClipAddress {
            ability: AbilityId::from_name("Test"),
            phase: 0,
            track: 1,
            clip: 0,
        };
        let event = CueEvent {
            source: CueSource::Ability { ability: address.ability, phase: 0, track: 1 },
            time: 0.3,
            id: hash_name("Sparks"),
            payload: CuePayload::Clip(ClipTrigger {
                address,
                clip_type: ClipType::Vfx,
                resource_hash: hash_name("Sparks"),
                duration: 1.5,
            }),
        };
        let Request::ClipActivate(request) = dispatcher.map_cue(&event, OWNER, &pose) else {
            panic!("expected a clip request");
        };
        assert_eq!(request.owner, OWNER);
        assert_eq!(request.origin, pose);
        assert_eq!(request.duration, 1.5);
        assert_eq!(request.clip_id, hash_name("Sparks"));
    }

    #[test]
    fn test_dispatch_moves_cues_into_queues() {
        let mut world = AbilityWorld::new();
        world.spawn(OWNER, Pose::default()).unwrap();
        let record = world.entity_mut(OWNER).unwrap();
        record.cues.push(cue(KeyPayload::default_for(KeyType::Hitbox)));
        record.cues.push(cue(KeyPayload::default_for(KeyType::Signal)));

        assert_eq!(dispatch_ability_cues(&mut world, &CueDispatcher::default()), 2);
        assert!(world.entity(OWNER).unwrap().pending_cues().is_empty());
        let queues = world.requests(OWNER).unwrap();
        assert_eq!(queues.hitbox.len(), 1);
        assert_eq!(queues.script.len(), 1);
    }
}
