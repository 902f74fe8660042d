// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted simulation runs.
//!
//! A scenario names an ability document, spawns entities and schedules
//! casts, cancels and moves at fixed ticks. Paths inside a scenario are
//! relative to the scenario file.

use crate::error::{HarnessError, Result};
use crate::sink::{RequestTotals, TracingSink};
use ability_timeline_model::{AbilityDb, AbilityId, BakeOutput, ResourceCatalog};
use ability_timeline_runtime::{AbilityEngine, CastRequest, EngineConfig, EntityId, Pose};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_dt() -> f32 {
    1.0 / 60.0
}

/// An equipped slot, by ability name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSlot {
    /// Slot number
    pub slot: i32,
    /// Ability id
    pub ability: String,
}

/// An entity present from the first tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntity {
    /// Entity id
    pub id: u64,
    /// Starting pose
    #[serde(default)]
    pub pose: Pose,
    /// Equipped abilities
    #[serde(default)]
    pub loadout: Vec<ScenarioSlot>,
}

/// Something done to an entity before a tick runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioAction {
    /// Cast an ability by id
    Cast(String),
    /// Cast whatever is in a loadout slot
    CastSlot(i32),
    /// Cancel the running ability
    Cancel {
        /// Start the cooldown as if the ability had completed
        write_cooldown: bool,
    },
    /// Teleport
    Move {
        /// New position
        position: [f32; 3],
        /// New heading
        heading: [f32; 3],
    },
}

/// An action scheduled for a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Tick number (1-based) the action precedes
    pub tick: u64,
    /// Target entity
    pub entity: u64,
    /// What to do
    pub action: ScenarioAction,
}

/// A simulation script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Ability document (RON, JSON or baked)
    pub abilities: PathBuf,
    /// Resource catalog for clip durations
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Engine config
    #[serde(default)]
    pub config: Option<PathBuf>,
    /// Ticks to run
    pub ticks: u64,
    /// Fixed tick delta
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Entities
    #[serde(default)]
    pub entities: Vec<ScenarioEntity>,
    /// Scheduled actions
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

/// Outcome of a scenario run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Ticks run
    pub ticks: u64,
    /// Casts that started an ability
    pub casts_accepted: usize,
    /// Casts dropped
    pub casts_rejected: usize,
    /// Abilities that ran to completion
    pub abilities_finished: usize,
    /// Abilities cancelled by the scenario
    pub abilities_cancelled: usize,
    /// Clip instances spawned
    pub clips_spawned: usize,
    /// Requests handed to the sink
    pub requests: RequestTotals,
}

impl Scenario {
    /// Parse a scenario from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a scenario, resolving its paths against the file's directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut scenario = Self::from_ron_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        scenario.abilities = base.join(&scenario.abilities);
        scenario.catalog = scenario.catalog.map(|p| base.join(p));
        scenario.config = scenario.config.map(|p| base.join(p));
        Ok(scenario)
    }

    /// Load and bake the ability document
    pub fn load_abilities(&self) -> Result<BakeOutput> {
        let catalog = match &self.catalog {
            Some(path) => ResourceCatalog::load(path)?,
            None => ResourceCatalog::default(),
        };
        Ok(AbilityDb::load(&self.abilities, &catalog)?)
    }

    /// Load the engine config, or the defaults
    pub fn load_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => Ok(EngineConfig::load(path)?),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Run the scenario to completion
    pub fn run(&self, db: Arc<AbilityDb>, config: EngineConfig) -> Result<SimulationSummary> {
        let mut engine = AbilityEngine::with_config(db, config);
        for entity in &self.entities {
            let record = engine.spawn(EntityId(entity.id), entity.pose)?;
            for slot in &entity.loadout {
                record.loadout.equip(slot.slot, AbilityId::from_name(&slot.ability));
            }
        }

        let mut events: Vec<&ScheduledEvent> = self.events.iter().collect();
        events.sort_by_key(|e| e.tick);
        let mut events = events.into_iter().peekable();

        let mut sink = TracingSink::new();
        let mut summary = SimulationSummary::default();
        for tick in 1..=self.ticks {
            while let Some(event) = events.next_if(|e| e.tick <= tick) {
                if self.apply(&mut engine, event)? {
                    summary.abilities_cancelled += 1;
                }
            }
            let report = engine.tick(self.dt);
            sink.tick = report.tick;
            engine.drain_requests(&mut sink);

            summary.ticks = report.tick;
            summary.casts_accepted += report.casts.accepted;
            summary.casts_rejected += report.casts.rejected;
            summary.abilities_finished += report.applied.finished;
            summary.clips_spawned += report.applied.clips_spawned;
        }
        summary.requests = sink.totals();
        Ok(summary)
    }

    /// Apply one event. Returns whether it cancelled a running ability.
    fn apply(&self, engine: &mut AbilityEngine, event: &ScheduledEvent) -> Result<bool> {
        let id = EntityId(event.entity);
        tracing::debug!("Tick {}: {id} {:?}", event.tick, event.action);
        match &event.action {
            ScenarioAction::Cast(name) => {
                engine.request_cast(id, CastRequest::Ability(AbilityId::from_name(name)))?;
            }
            ScenarioAction::CastSlot(slot) => engine.request_cast(id, CastRequest::Slot(*slot))?,
            ScenarioAction::Cancel { write_cooldown } => {
                return Ok(engine.cancel_ability(id, *write_cooldown)?);
            }
            ScenarioAction::Move { position, heading } => {
                engine
                    .world_mut()
                    .set_pose(id, Pose::at(*position).facing(*heading))?;
            }
        }
        Ok(false)
    }
}

/// Run a scenario file end to end
pub fn run_file(path: &Path) -> Result<SimulationSummary> {
    let scenario = Scenario::load(path)?;
    let baked = scenario.load_abilities()?;
    for issue in &baked.issues {
        tracing::warn!("{issue}");
    }
    if baked.db.is_empty() {
        return Err(HarnessError::UnknownAbility(scenario.abilities.display().to_string()));
    }
    let config = scenario.load_config()?;
    scenario.run(Arc::new(baked.db), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(path: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data").join(path)
    }

    #[test]
    fn test_parse_inline_scenario() {
        let scenario = Scenario::from_ron_str(
            r#"(
                abilities: "abilities.ron",
                ticks: 10,
                entities: [(id: 3)],
                events: [(tick: 2, entity: 3, action: Cancel(write_cooldown: true))],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.dt, default_dt());
        assert_eq!(scenario.entities[0].pose, Pose::default());
        assert_eq!(
            scenario.events[0].action,
            ScenarioAction::Cancel { write_cooldown: true }
        );
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let scenario = Scenario::load(&data("scenarios/duel.ron")).unwrap();
        assert!(scenario.abilities.ends_with("../abilities/sample.ron"));
        assert!(scenario.abilities.exists());
        assert!(scenario.catalog.as_ref().is_some_and(|p| p.exists()));
        assert_eq!(scenario.load_config().unwrap().max_dt, Some(0.1));
    }

    #[test]
    fn test_duel_scenario() {
        let summary = run_file(&data("scenarios/duel.ron")).unwrap();
        assert_eq!(summary.ticks, 120);
        // Slash once, Dash once (cancelled); busy, cooldown and unknown casts dropped
        assert_eq!(summary.casts_accepted, 2);
        assert_eq!(summary.casts_rejected, 3);
        assert_eq!(summary.abilities_finished, 1);
        assert_eq!(summary.abilities_cancelled, 1);
        // Windup animation clip and the trail effect clip
        assert_eq!(summary.clips_spawned, 2);

        let requests = summary.requests;
        assert_eq!(requests.hitbox, 1);
        assert_eq!(requests.vfx, 1);
        assert_eq!(requests.sfx, 3);
        assert_eq!(requests.animation, 1);
        assert_eq!(requests.camera, 1);
        assert_eq!(requests.time_scale, 1);
        assert_eq!(requests.script, 1);
    }

    #[test]
    fn test_unknown_entity_fails() {
        let scenario = Scenario::from_ron_str(
            r#"(
                abilities: "unused.ron",
                ticks: 2,
                events: [(tick: 1, entity: 9, action: CastSlot(0))],
            )"#,
        )
        .unwrap();
        let result = scenario.run(Arc::new(AbilityDb::default()), EngineConfig::default());
        assert!(matches!(result, Err(HarnessError::Runtime(_))));
    }
}
