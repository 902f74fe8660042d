// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulation world: entities, clip instances and request queues.

use crate::clips::{ClipInstance, ClipInstanceId};
use crate::components::{ActiveAbility, CastRequest, CooldownTable, Loadout};
use crate::cue::CueEvent;
use crate::entity::{EntityId, Pose};
use crate::error::{Result, RuntimeError};
use crate::requests::{ClipActivateRequest, RequestQueues};
use indexmap::IndexMap;

/// Everything the simulation tracks for one entity
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// Entity id
    pub id: EntityId,
    /// Current pose
    pub pose: Pose,
    /// Equipped abilities
    pub loadout: Loadout,
    /// Cooldowns
    pub cooldowns: CooldownTable,
    pub(crate) cast_requests: Vec<CastRequest>,
    pub(crate) active: Option<ActiveAbility>,
    pub(crate) cues: Vec<CueEvent>,
}

impl EntityRecord {
    fn new(id: EntityId, pose: Pose) -> Self {
        Self {
            id,
            pose,
            loadout: Loadout::default(),
            cooldowns: CooldownTable::default(),
            cast_requests: Vec::new(),
            active: None,
            cues: Vec::new(),
        }
    }

    /// The live ability instance, if any
    pub fn active(&self) -> Option<&ActiveAbility> {
        self.active.as_ref()
    }

    /// Whether no ability is running
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Cast requests waiting for the next tick
    pub fn pending_casts(&self) -> &[CastRequest] {
        &self.cast_requests
    }

    /// Cues produced but not yet dispatched
    pub fn pending_cues(&self) -> &[CueEvent] {
        &self.cues
    }
}

/// Container for all simulation state
#[derive(Debug, Default)]
pub struct AbilityWorld {
    entities: IndexMap<EntityId, EntityRecord>,
    clips: IndexMap<ClipInstanceId, ClipInstance>,
    requests: IndexMap<EntityId, RequestQueues>,
    next_clip: u64,
}

impl AbilityWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity
    pub fn spawn(&mut self, id: EntityId, pose: Pose) -> Result<&mut EntityRecord> {
        if self.entities.contains_key(&id) {
            return Err(RuntimeError::EntityExists(id));
        }
        Ok(self.entities.entry(id).or_insert_with(|| EntityRecord::new(id, pose)))
    }

    /// Remove an entity and its request queues.
    ///
    /// Clip instances it owns keep running; their cues are dropped.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.requests.swap_remove(&id);
        self.entities.shift_remove(&id)
    }

    /// Get an entity
    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Get a mutable entity
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&id)
    }

    /// Get a mutable entity or fail
    pub fn expect_entity_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord> {
        self.entities.get_mut(&id).ok_or(RuntimeError::EntityNotFound(id))
    }

    /// Iterate entities in spawn order
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Update an entity's pose
    pub fn set_pose(&mut self, id: EntityId, pose: Pose) -> Result<()> {
        self.expect_entity_mut(id)?.pose = pose;
        Ok(())
    }

    /// Queue a cast request for the next tick
    pub fn request_cast(&mut self, id: EntityId, request: CastRequest) -> Result<()> {
        self.expect_entity_mut(id)?.cast_requests.push(request);
        Ok(())
    }

    /// Request queues of an entity, if any were created
    pub fn requests(&self, id: EntityId) -> Option<&RequestQueues> {
        self.requests.get(&id)
    }

    /// Mutable request queues of an entity, if any were created
    pub fn requests_mut(&mut self, id: EntityId) -> Option<&mut RequestQueues> {
        self.requests.get_mut(&id)
    }

    /// Iterate request queues
    pub fn all_requests(&self) -> impl Iterator<Item = (EntityId, &RequestQueues)> {
        self.requests.iter().map(|(id, queues)| (*id, queues))
    }

    /// Total requests queued across all entities
    pub fn request_count(&self) -> usize {
        self.requests.values().map(RequestQueues::len).sum()
    }

    /// Request queues of an entity, created on first use
    pub(crate) fn request_queues(&mut self, id: EntityId) -> &mut RequestQueues {
        self.requests.entry(id).or_default()
    }

    pub(crate) fn all_requests_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut RequestQueues)> {
        self.requests.iter_mut().map(|(id, queues)| (*id, queues))
    }

    pub(crate) fn clear_requests(&mut self) {
        for queues in self.requests.values_mut() {
            queues.clear();
        }
    }

    pub(crate) fn records_mut(&mut self) -> Vec<&mut EntityRecord> {
        self.entities.values_mut().collect()
    }

    pub(crate) fn records_mut_iter(&mut self) -> impl Iterator<Item = &mut EntityRecord> {
        self.entities.values_mut()
    }

    /// Remove an entity's live ability instance without firing anything
    pub(crate) fn take_active(&mut self, id: EntityId) -> Option<ActiveAbility> {
        self.entities.get_mut(&id)?.active.take()
    }

    /// Start a clip instance
    pub fn spawn_clip(&mut self, request: &ClipActivateRequest) -> ClipInstanceId {
        self.next_clip += 1;
        let id = ClipInstanceId(self.next_clip);
        self.clips.insert(id, ClipInstance::from_request(id, request));
        id
    }

    /// Remove a clip instance
    pub fn destroy_clip(&mut self, id: ClipInstanceId) -> Option<ClipInstance> {
        self.clips.shift_remove(&id)
    }

    /// Get a clip instance
    pub fn clip(&self, id: ClipInstanceId) -> Option<&ClipInstance> {
        self.clips.get(&id)
    }

    /// Iterate clip instances in creation order
    pub fn clips(&self) -> impl Iterator<Item = &ClipInstance> {
        self.clips.values()
    }

    /// Number of clip instances
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub(crate) fn clip_instances_mut(&mut self) -> Vec<&mut ClipInstance> {
        self.clips.values_mut().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_timeline_model::AbilityId;

    #[test]
    fn test_spawn_and_despawn() {
        let mut world = AbilityWorld::new();
        world.spawn(EntityId(1), Pose::default()).unwrap();
        assert!(world.spawn(EntityId(1), Pose::default()).is_err());

        world.request_queues(EntityId(1));
        assert!(world.requests(EntityId(1)).is_some());

        assert!(world.despawn(EntityId(1)).is_some());
        assert!(world.requests(EntityId(1)).is_none());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_request_cast_needs_entity() {
        let mut world = AbilityWorld::new();
        let request = CastRequest::Ability(AbilityId::from_name("Fireball"));
        assert!(matches!(
            world.request_cast(EntityId(7), request),
            Err(RuntimeError::EntityNotFound(EntityId(7)))
        ));

        world.spawn(EntityId(7), Pose::default()).unwrap();
        world.request_cast(EntityId(7), request).unwrap();
        assert_eq!(world.entity(EntityId(7)).unwrap().pending_casts(), &[request]);
    }

    #[test]
    fn test_request_queues_created_lazily() {
        let mut world = AbilityWorld::new();
        world.spawn(EntityId(1), Pose::default()).unwrap();
        assert!(world.requests(EntityId(1)).is_none());
        assert!(world.request_queues(EntityId(1)).is_empty());
        assert_eq!(world.request_count(), 0);
    }
}
