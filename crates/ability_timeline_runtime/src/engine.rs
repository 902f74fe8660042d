// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick driver.
//!
//! [`AbilityEngine::tick`] runs the passes in a fixed order:
//!
//! 1. clear last tick's request queues
//! 2. record removal of clip instances completed on an earlier tick
//! 3. count cooldowns down
//! 4. accept cast requests
//! 5. advance ability instances and dispatch their cues
//! 6. turn clip activation requests into clip instances
//! 7. advance clip instances and dispatch their cues
//! 8. apply every recorded structural change
//!
//! Requests produced by a tick stay queued until the next tick starts; drain
//! them in between with [`AbilityEngine::drain_requests`].

use crate::clips::{activate_clips, advance_clips, cleanup_clips};
use crate::commands::{ApplyStats, CommandBuffer};
use crate::components::CastRequest;
use crate::config::EngineConfig;
use crate::dispatch::{dispatch_ability_cues, dispatch_clip_cues, CueDispatcher};
use crate::entity::{EntityId, Pose};
use crate::error::Result;
use crate::sink::{drain_requests, RequestSink};
use crate::state_machine::{accept_casts, advance_abilities, tick_cooldowns, CastStats};
use crate::world::{AbilityWorld, EntityRecord};
use ability_timeline_model::AbilityDb;
use std::sync::Arc;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Delta actually simulated
    pub dt: f32,
    /// Cast pass outcome
    pub casts: CastStats,
    /// Cues fired by ability instances
    pub ability_cues: usize,
    /// Cues fired by clip instances
    pub clip_cues: usize,
    /// Clip activation requests consumed
    pub clips_activated: usize,
    /// Structural changes applied
    pub applied: ApplyStats,
    /// Requests left queued for consumers
    pub requests: usize,
}

/// The simulation: a baked ability table plus a world of entities
#[derive(Debug)]
pub struct AbilityEngine {
    db: Arc<AbilityDb>,
    world: AbilityWorld,
    config: EngineConfig,
    dispatcher: CueDispatcher,
    commands: CommandBuffer,
    tick: u64,
}

impl AbilityEngine {
    /// Create an engine with the default config
    pub fn new(db: Arc<AbilityDb>) -> Self {
        Self::with_config(db, EngineConfig::default())
    }

    /// Create an engine with a config
    pub fn with_config(db: Arc<AbilityDb>, config: EngineConfig) -> Self {
        tracing::info!(
            "Ability engine ready: {} abilities, parallel above {} entities",
            db.len(),
            config.parallel_threshold
        );
        Self {
            db,
            world: AbilityWorld::new(),
            dispatcher: CueDispatcher::new(&config),
            config,
            commands: CommandBuffer::new(),
            tick: 0,
        }
    }

    /// The ability table
    pub fn db(&self) -> &Arc<AbilityDb> {
        &self.db
    }

    /// Swap the ability table.
    ///
    /// Instances of abilities missing from the new table are dropped on the
    /// next tick without a cooldown.
    pub fn set_db(&mut self, db: Arc<AbilityDb>) {
        tracing::info!("Replacing ability table ({} abilities)", db.len());
        self.db = db;
    }

    /// The world
    pub fn world(&self) -> &AbilityWorld {
        &self.world
    }

    /// Mutable world
    pub fn world_mut(&mut self) -> &mut AbilityWorld {
        &mut self.world
    }

    /// The config
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Add an entity
    pub fn spawn(&mut self, id: EntityId, pose: Pose) -> Result<&mut EntityRecord> {
        self.world.spawn(id, pose)
    }

    /// Queue a cast for the next tick
    pub fn request_cast(&mut self, id: EntityId, request: CastRequest) -> Result<()> {
        self.world.request_cast(id, request)
    }

    /// Stop an entity's ability immediately without firing further cues.
    ///
    /// Returns whether an ability was running. With `write_cooldown` the
    /// ability's cooldown starts as if it had completed.
    pub fn cancel_ability(&mut self, id: EntityId, write_cooldown: bool) -> Result<bool> {
        let record = self.world.expect_entity_mut(id)?;
        let Some(active) = record.active.take() else {
            return Ok(false);
        };
        if write_cooldown {
            let cooldown = self.db.get(active.ability).map_or(0.0, |a| a.cooldown);
            record.cooldowns.start(active.ability, cooldown);
        }
        tracing::debug!("{id} cancelled ability {}", active.ability);
        Ok(true)
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let dt = self.config.sanitize_dt(dt);
        self.tick += 1;
        let db = Arc::clone(&self.db);
        let threshold = self.config.parallel_threshold;

        self.world.clear_requests();
        cleanup_clips(&self.world, &mut self.commands);

        tick_cooldowns(&mut self.world, dt);
        let casts = accept_casts(&mut self.world, &db, &mut self.commands);
        advance_abilities(&mut self.world, &db, dt, threshold, &mut self.commands);
        let ability_cues = dispatch_ability_cues(&mut self.world, &self.dispatcher);

        let clips_activated = activate_clips(&mut self.world, &mut self.commands);
        advance_clips(&mut self.world, &db, dt, threshold);
        let clip_cues = dispatch_clip_cues(&mut self.world, &self.dispatcher);

        let applied = self.commands.apply(&mut self.world);

        let report = TickReport {
            tick: self.tick,
            dt,
            casts,
            ability_cues,
            clip_cues,
            clips_activated,
            applied,
            requests: self.world.request_count(),
        };
        tracing::trace!("Tick {}: {report:?}", self.tick);
        report
    }

    /// Hand the requests of the last tick to `sink`
    pub fn drain_requests(&mut self, sink: &mut dyn RequestSink) -> usize {
        drain_requests(&mut self.world, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::RequestKind;
    use crate::sink::RequestLog;
    use ability_timeline_model::{
        AbilityDefinition, AbilityId, AbilitySet, Clip, ClipKind, Key, KeyType, NoResources, Phase,
        Track, TrackType,
    };

    const HERO: EntityId = EntityId(1);

    fn engine() -> AbilityEngine {
        let mut hitbox = Track::new("Hits", TrackType::Hitbox);
        hitbox.add_key(Key::of_type(0.2, KeyType::Hitbox).with_event("Slash")).unwrap();
        let mut vfx = Track::new("Trail", TrackType::Vfx);
        vfx.add_clip(
            Clip::new(0.1, ClipKind::Custom { length: 0.5, params: [0.0; 4] })
                .with_key(Key::of_type(0.25, KeyType::Vfx)),
        )
        .unwrap();
        let ability = AbilityDefinition::new("Slash")
            .with_cooldown(2.0)
            .with_phase(Phase::new("Swing", 1.0).with_track(hitbox).with_track(vfx));
        let db = AbilityDb::bake(&AbilitySet { abilities: vec![ability] }, &NoResources).db;

        let mut engine = AbilityEngine::new(Arc::new(db));
        engine.spawn(HERO, Pose::default()).unwrap();
        engine
    }

    fn slash() -> CastRequest {
        CastRequest::Ability(AbilityId::from_name("Slash"))
    }

    #[test]
    fn test_cast_starts_next_tick_and_fires() {
        let mut engine = engine();
        engine.request_cast(HERO, slash()).unwrap();

        let report = engine.tick(0.1);
        assert_eq!(report.casts.accepted, 1);
        assert_eq!(report.applied.started, 1);
        assert_eq!(report.ability_cues, 0);

        let report = engine.tick(0.25);
        assert_eq!(report.ability_cues, 2);
        assert_eq!(report.clips_activated, 1);
        assert_eq!(report.applied.clips_spawned, 1);

        let mut log = RequestLog::new();
        engine.drain_requests(&mut log);
        assert_eq!(log.count(RequestKind::Hitbox), 1);
        assert_eq!(engine.world().request_count(), 0);
    }

    #[test]
    fn test_undrained_requests_are_cleared_next_tick() {
        let mut engine = engine();
        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.1);
        engine.tick(0.25);
        assert_eq!(engine.world().request_count(), 1);
        assert_eq!(engine.world().requests(HERO).unwrap().hitbox.len(), 1);

        // nothing fires in this step; last tick's hitbox is gone
        let report = engine.tick(0.01);
        assert_eq!(report.ability_cues + report.clip_cues, 0);
        assert_eq!(engine.world().request_count(), 0);
        assert!(engine.world().requests(HERO).unwrap().hitbox.is_empty());
    }

    #[test]
    fn test_clip_keys_fire_relative_to_clip_start() {
        let mut engine = engine();
        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.1);
        engine.tick(0.25);

        // clip instance advances from the next tick on
        assert_eq!(engine.tick(0.2).clip_cues, 0);
        let report = engine.tick(0.1);
        assert_eq!(report.clip_cues, 1);
        assert_eq!(engine.world().requests(HERO).unwrap().vfx.len(), 1);
    }

    #[test]
    fn test_completion_writes_cooldown() {
        let mut engine = engine();
        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.0);
        let report = engine.tick(1.0);
        assert_eq!(report.applied.finished, 1);

        let record = engine.world().entity(HERO).unwrap();
        assert!(record.is_idle());
        assert_eq!(record.cooldowns.remaining(AbilityId::from_name("Slash")), 2.0);
    }

    #[test]
    fn test_cancel_ability() {
        let mut engine = engine();
        assert!(!engine.cancel_ability(HERO, true).unwrap());
        assert!(engine.cancel_ability(EntityId(9), false).is_err());

        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.0);
        assert!(engine.cancel_ability(HERO, false).unwrap());
        assert!(engine.world().entity(HERO).unwrap().cooldowns.is_empty());

        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.0);
        assert!(engine.cancel_ability(HERO, true).unwrap());
        assert!(!engine.world().entity(HERO).unwrap().cooldowns.is_ready(AbilityId::from_name("Slash")));

        let report = engine.tick(0.5);
        assert_eq!(report.ability_cues, 0);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut engine = engine();
        assert_eq!(engine.tick(f32::NAN).dt, 0.0);
        assert_eq!(engine.tick(-1.0).dt, 0.0);
        assert_eq!(engine.tick_count(), 2);
    }

    #[test]
    fn test_swapping_table_drops_unknown_instances() {
        let mut engine = engine();
        engine.request_cast(HERO, slash()).unwrap();
        engine.tick(0.0);
        engine.set_db(Arc::new(AbilityDb::default()));
        let report = engine.tick(0.1);
        assert_eq!(report.applied.dropped, 1);
        assert!(engine.world().entity(HERO).unwrap().is_idle());
    }
}
