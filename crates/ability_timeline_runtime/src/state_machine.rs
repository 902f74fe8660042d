// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability state machine.
//!
//! Each entity is either idle or runs one [`ActiveAbility`]. Per tick:
//!
//! 1. cooldowns count down
//! 2. idle entities accept at most one cast request; every queue is cleared
//! 3. active instances advance, firing keys of the audible tracks of the
//!    current phase through the cue evaluator
//!
//! A phase completes when its local time reaches its duration. Leftover time
//! is dropped, the next enabled phase starts at 0, and after the last phase
//! the instance is removed and its cooldown written. Creation and removal are
//! recorded as commands and applied at the end of the tick, so a cast
//! accepted in one tick first advances in the next.

use crate::commands::{CommandBuffer, WorldCommand};
use crate::components::ActiveAbility;
use crate::cue::{ClipTrigger, CueEvent, CuePayload, CueSource};
use crate::entity::EntityId;
use crate::world::{AbilityWorld, EntityRecord};
use ability_timeline_model::{evaluate_track, AbilityDb, AbilityDefinition, ClipAddress, NameRef};
use rayon::prelude::*;

/// Outcome of the cast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastStats {
    /// Casts turned into start commands
    pub accepted: usize,
    /// Requests dropped
    pub rejected: usize,
}

/// Count every entity's cooldowns down by `dt`
pub fn tick_cooldowns(world: &mut AbilityWorld, dt: f32) {
    for record in world.records_mut_iter() {
        record.cooldowns.tick(dt);
    }
}

/// Turn cast requests of idle entities into start commands.
///
/// Only the first queued request of an entity is considered; the queue is
/// always cleared. Requests for busy entities, unknown abilities or abilities
/// on cooldown are dropped.
pub fn accept_casts(world: &mut AbilityWorld, db: &AbilityDb, commands: &mut CommandBuffer) -> CastStats {
    let mut stats = CastStats::default();
    for record in world.records_mut_iter() {
        let requests = std::mem::take(&mut record.cast_requests);
        let Some(request) = requests.first() else {
            continue;
        };
        stats.rejected += requests.len() - 1;

        if record.active.is_some() {
            tracing::trace!("{} is busy; dropping cast {request:?}", record.id);
            stats.rejected += 1;
            continue;
        }
        let Some(id) = request.resolve(&record.loadout) else {
            tracing::debug!("{} cast {request:?} resolves to no ability", record.id);
            stats.rejected += 1;
            continue;
        };
        let Some(ability) = db.get(id) else {
            tracing::warn!("{} requested unknown ability {id}", record.id);
            stats.rejected += 1;
            continue;
        };
        if !record.cooldowns.is_ready(id) {
            tracing::trace!("{} cast of {id} rejected: on cooldown", record.id);
            stats.rejected += 1;
            continue;
        }

        let first_phase = ability.next_enabled_phase(0).unwrap_or(ability.phases.len());
        commands.push(WorldCommand::StartAbility { entity: record.id, ability: id, first_phase });
        stats.accepted += 1;
    }
    stats
}

/// Advance every active instance by `dt`.
///
/// Runs on the rayon pool when the entity count exceeds `parallel_threshold`.
/// Completion commands are appended to `commands` in entity order either way.
pub fn advance_abilities(
    world: &mut AbilityWorld,
    db: &AbilityDb,
    dt: f32,
    parallel_threshold: usize,
    commands: &mut CommandBuffer,
) {
    let finished: Vec<WorldCommand> = if world.entity_count() > parallel_threshold {
        world
            .records_mut()
            .into_par_iter()
            .filter_map(|record| advance_entity(record, db, dt))
            .collect()
    } else {
        world
            .records_mut_iter()
            .filter_map(|record| advance_entity(record, db, dt))
            .collect()
    };
    commands.extend(finished);
}

fn finish(entity: EntityId, active: &mut ActiveAbility, ability: &AbilityDefinition) -> WorldCommand {
    active.phase_index = ability.phases.len();
    active.time_in_phase = 0.0;
    WorldCommand::FinishAbility {
        entity,
        ability: active.ability,
        cooldown: ability.cooldown,
    }
}

fn advance_entity(record: &mut EntityRecord, db: &AbilityDb, dt: f32) -> Option<WorldCommand> {
    let entity = record.id;
    let active = record.active.as_mut()?;
    let Some(ability) = db.get(active.ability) else {
        tracing::warn!("{entity} runs unknown ability {}; dropping it", active.ability);
        return Some(WorldCommand::DropAbility { entity });
    };

    active.elapsed += dt;
    let Some(phase) = ability.phases.get(active.phase_index) else {
        return Some(finish(entity, active, ability));
    };

    active.time_in_phase += dt;
    if let Some(window) = active.cursor.advance(active.time_in_phase) {
        let window = window.clamp_end(phase.duration);
        let phase_start = active.elapsed - active.time_in_phase;
        for (track_index, track) in phase.audible_tracks() {
            let evaluation = evaluate_track(track, window);
            let source = CueSource::Ability {
                ability: active.ability,
                phase: active.phase_index,
                track: track_index,
            };
            for (_, key) in evaluation.keys {
                tracing::trace!("{entity} fired {:?} at {}", key.key_type(), key.time);
                record.cues.push(CueEvent {
                    source,
                    time: phase_start + key.time,
                    id: key.event.hash(),
                    payload: CuePayload::Key(key.payload.clone()),
                });
            }
            for sample in evaluation.clips.iter().filter(|s| s.entered) {
                let clip = &track.clips()[sample.index];
                let resource_hash = clip.kind.resource().map_or(0, NameRef::hash);
                record.cues.push(CueEvent {
                    source,
                    time: phase_start + clip.start,
                    id: resource_hash,
                    payload: CuePayload::Clip(ClipTrigger {
                        address: ClipAddress {
                            ability: active.ability,
                            phase: active.phase_index,
                            track: track_index,
                            clip: sample.index,
                        },
                        clip_type: clip.clip_type(),
                        resource_hash,
                        duration: clip.duration(),
                    }),
                });
            }
        }
    }

    if active.time_in_phase >= phase.duration {
        match ability.next_enabled_phase(active.phase_index + 1) {
            Some(next) => {
                tracing::trace!("{entity} entering phase {next} of {}", active.ability);
                active.enter_phase(next);
            }
            None => return Some(finish(entity, active, ability)),
        }
    }
    None
}
