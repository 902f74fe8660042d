// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred structural changes.
//!
//! Evaluation passes never create or destroy ability or clip instances
//! directly. They record [`WorldCommand`]s which are applied in recorded
//! order at the end of the tick, after every per-entity evaluation finished.

use crate::clips::ClipInstanceId;
use crate::components::ActiveAbility;
use crate::entity::EntityId;
use crate::requests::ClipActivateRequest;
use crate::world::AbilityWorld;
use ability_timeline_model::AbilityId;

/// Error type for command application
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Entity not found
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
    /// Entity already runs an ability
    #[error("{0} already has an active ability")]
    AlreadyActive(EntityId),
    /// Entity has no active ability
    #[error("{0} has no active ability")]
    NotActive(EntityId),
    /// Clip instance not found
    #[error("Clip instance not found: {0:?}")]
    ClipNotFound(ClipInstanceId),
}

/// A structural change recorded during evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCommand {
    /// Create the live instance of an accepted cast
    StartAbility {
        /// Caster
        entity: EntityId,
        /// Ability
        ability: AbilityId,
        /// First phase to run
        first_phase: usize,
    },
    /// Remove a completed instance and start its cooldown
    FinishAbility {
        /// Caster
        entity: EntityId,
        /// Ability
        ability: AbilityId,
        /// Cooldown to write
        cooldown: f32,
    },
    /// Remove an instance without cooldown (its definition disappeared)
    DropAbility {
        /// Caster
        entity: EntityId,
    },
    /// Start a clip instance
    SpawnClip(ClipActivateRequest),
    /// Remove a clip instance
    DestroyClip(ClipInstanceId),
}

/// What applying a command changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    /// An ability instance was created
    Started,
    /// An ability instance completed
    Finished,
    /// An ability instance was dropped
    Dropped,
    /// A clip instance was created
    ClipSpawned(ClipInstanceId),
    /// A clip instance was removed
    ClipDestroyed,
}

impl WorldCommand {
    /// Apply the command
    pub fn apply(self, world: &mut AbilityWorld) -> Result<CommandEffect, CommandError> {
        match self {
            Self::StartAbility { entity, ability, first_phase } => {
                let record = world
                    .entity_mut(entity)
                    .ok_or(CommandError::EntityNotFound(entity))?;
                if record.active.is_some() {
                    return Err(CommandError::AlreadyActive(entity));
                }
                record.active = Some(ActiveAbility::new(ability, first_phase));
                tracing::debug!("{entity} started ability {ability}");
                Ok(CommandEffect::Started)
            }
            Self::FinishAbility { entity, ability, cooldown } => {
                let record = world
                    .entity_mut(entity)
                    .ok_or(CommandError::EntityNotFound(entity))?;
                if record.active.take().is_none() {
                    return Err(CommandError::NotActive(entity));
                }
                record.cooldowns.start(ability, cooldown);
                tracing::debug!("{entity} finished ability {ability} (cooldown {cooldown}s)");
                Ok(CommandEffect::Finished)
            }
            Self::DropAbility { entity } => {
                if !world.contains(entity) {
                    return Err(CommandError::EntityNotFound(entity));
                }
                world.take_active(entity).ok_or(CommandError::NotActive(entity))?;
                Ok(CommandEffect::Dropped)
            }
            Self::SpawnClip(request) => {
                if !world.contains(request.owner) {
                    return Err(CommandError::EntityNotFound(request.owner));
                }
                let id = world.spawn_clip(&request);
                tracing::trace!("Spawned clip {id:?} ({:?}) for {}", request.clip_type, request.owner);
                Ok(CommandEffect::ClipSpawned(id))
            }
            Self::DestroyClip(id) => {
                world.destroy_clip(id).ok_or(CommandError::ClipNotFound(id))?;
                Ok(CommandEffect::ClipDestroyed)
            }
        }
    }
}

/// Counts of what a buffer application changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Ability instances created
    pub started: usize,
    /// Ability instances completed
    pub finished: usize,
    /// Ability instances dropped
    pub dropped: usize,
    /// Clip instances created
    pub clips_spawned: usize,
    /// Clip instances removed
    pub clips_destroyed: usize,
    /// Commands that no longer applied
    pub failed: usize,
}

/// Ordered list of deferred commands
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<WorldCommand>,
}

impl CommandBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command
    pub fn push(&mut self, command: WorldCommand) {
        self.commands.push(command);
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded commands
    pub fn commands(&self) -> &[WorldCommand] {
        &self.commands
    }

    /// Apply every command in recorded order and empty the buffer.
    ///
    /// Commands that no longer apply are logged and skipped.
    pub fn apply(&mut self, world: &mut AbilityWorld) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for command in self.commands.drain(..) {
            match command.apply(world) {
                Ok(CommandEffect::Started) => stats.started += 1,
                Ok(CommandEffect::Finished) => stats.finished += 1,
                Ok(CommandEffect::Dropped) => stats.dropped += 1,
                Ok(CommandEffect::ClipSpawned(_)) => stats.clips_spawned += 1,
                Ok(CommandEffect::ClipDestroyed) => stats.clips_destroyed += 1,
                Err(err) => {
                    tracing::warn!("Skipped deferred command: {err}");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}

impl Extend<WorldCommand> for CommandBuffer {
    fn extend<T: IntoIterator<Item = WorldCommand>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}
