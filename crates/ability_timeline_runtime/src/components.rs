// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-entity simulation records.

use ability_timeline_model::{AbilityId, CueCursor};
use serde::{Deserialize, Serialize};

/// One loadout entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutSlot {
    /// Slot number
    pub slot: i32,
    /// Ability equipped in the slot
    pub ability: AbilityId,
}

/// Abilities equipped by an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    slots: Vec<LoadoutSlot>,
}

impl Loadout {
    /// Equip an ability in a slot, replacing what was there
    pub fn equip(&mut self, slot: i32, ability: AbilityId) {
        match self.slots.iter_mut().find(|s| s.slot == slot) {
            Some(entry) => entry.ability = ability,
            None => self.slots.push(LoadoutSlot { slot, ability }),
        }
    }

    /// Empty a slot
    pub fn unequip(&mut self, slot: i32) {
        self.slots.retain(|s| s.slot != slot);
    }

    /// Ability in a slot
    pub fn ability_in(&self, slot: i32) -> Option<AbilityId> {
        self.slots.iter().find(|s| s.slot == slot).map(|s| s.ability)
    }

    /// Equipped slots
    pub fn slots(&self) -> &[LoadoutSlot] {
        &self.slots
    }
}

/// Request to cast an ability, by explicit id or by loadout slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastRequest {
    /// Cast this ability
    Ability(AbilityId),
    /// Cast whatever is equipped in this slot
    Slot(i32),
}

impl CastRequest {
    /// Resolve to an ability id through a loadout
    pub fn resolve(&self, loadout: &Loadout) -> Option<AbilityId> {
        match self {
            Self::Ability(id) => Some(*id).filter(|id| !id.is_none()),
            Self::Slot(slot) => loadout.ability_in(*slot).filter(|id| !id.is_none()),
        }
    }
}

/// Remaining cooldown of one ability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownEntry {
    /// Ability on cooldown
    pub ability: AbilityId,
    /// Seconds left, never negative
    pub remaining: f32,
}

/// Cooldowns of one entity, one entry per ability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownTable {
    entries: Vec<CooldownEntry>,
}

impl CooldownTable {
    /// Start (or restart) a cooldown. Non-positive durations write nothing.
    pub fn start(&mut self, ability: AbilityId, seconds: f32) {
        if seconds <= 0.0 {
            return;
        }
        match self.entries.iter_mut().find(|e| e.ability == ability) {
            Some(entry) => entry.remaining = seconds,
            None => self.entries.push(CooldownEntry { ability, remaining: seconds }),
        }
    }

    /// Count every cooldown down by `dt`, dropping finished ones
    pub fn tick(&mut self, dt: f32) {
        for entry in &mut self.entries {
            entry.remaining = (entry.remaining - dt).max(0.0);
        }
        self.entries.retain(|e| e.remaining > 0.0);
    }

    /// Seconds left for an ability (0 when ready)
    pub fn remaining(&self, ability: AbilityId) -> f32 {
        self.entries
            .iter()
            .find(|e| e.ability == ability)
            .map_or(0.0, |e| e.remaining)
    }

    /// Whether an ability is off cooldown
    pub fn is_ready(&self, ability: AbilityId) -> bool {
        self.remaining(ability) <= 0.0
    }

    /// Active entries
    pub fn entries(&self) -> &[CooldownEntry] {
        &self.entries
    }

    /// Whether nothing is on cooldown
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Progress of a live ability instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAbility {
    /// Ability being executed
    pub ability: AbilityId,
    /// Current phase index; past the last phase means complete
    pub phase_index: usize,
    /// Seconds into the current phase
    pub time_in_phase: f32,
    /// Seconds since the cast
    pub elapsed: f32,
    /// Edge-trigger state of the current phase pass
    pub(crate) cursor: CueCursor,
}

impl ActiveAbility {
    /// Instance at the start of a phase
    pub fn new(ability: AbilityId, phase_index: usize) -> Self {
        Self {
            ability,
            phase_index,
            time_in_phase: 0.0,
            elapsed: 0.0,
            cursor: CueCursor::new(0.0),
        }
    }

    /// Move to the start of another phase. Leftover time is dropped.
    pub(crate) fn enter_phase(&mut self, phase_index: usize) {
        self.phase_index = phase_index;
        self.time_in_phase = 0.0;
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_loadout_equip_and_resolve() {
        let fireball = AbilityId::from_name("Fireball");
        let mut loadout = Loadout::default();
        loadout.equip(1, fireball);

        assert_eq!(CastRequest::Slot(1).resolve(&loadout), Some(fireball));
        assert_eq!(CastRequest::Slot(2).resolve(&loadout), None);
        assert_eq!(CastRequest::Ability(AbilityId::NONE).resolve(&loadout), None);

        loadout.unequip(1);
        assert!(loadout.slots().is_empty());
    }

    #[test]
    fn test_cooldown_counts_down_and_prunes() {
        let id = AbilityId::from_name("Dash");
        let mut cooldowns = CooldownTable::default();
        cooldowns.start(id, 1.0);

        cooldowns.tick(0.4);
        assert!((cooldowns.remaining(id) - 0.6).abs() < 1e-6);
        assert!(!cooldowns.is_ready(id));

        cooldowns.tick(5.0);
        assert_eq!(cooldowns.remaining(id), 0.0);
        assert!(cooldowns.is_empty());
    }

    #[test]
    fn test_zero_cooldown_writes_nothing() {
        let mut cooldowns = CooldownTable::default();
        cooldowns.start(AbilityId::from_name("Jab"), 0.0);
        assert!(cooldowns.is_empty());
    }

    #[test]
    fn test_restart_overwrites_entry() {
        let id = AbilityId::from_name("Dash");
        let mut cooldowns = CooldownTable::default();
        cooldowns.start(id, 1.0);
        cooldowns.tick(0.5);
        cooldowns.start(id, 2.0);
        assert_eq!(cooldowns.entries().len(), 1);
        assert_eq!(cooldowns.remaining(id), 2.0);
    }

    proptest! {
        #[test]
        fn prop_cooldown_never_increases_or_goes_negative(
            start in 0.0f32..10.0,
            steps in prop::collection::vec(0.0f32..1.0, 1..50),
        ) {
            let id = AbilityId::from_name("Blink");
            let mut cooldowns = CooldownTable::default();
            cooldowns.start(id, start);
            let mut last = cooldowns.remaining(id);

            for dt in steps {
                cooldowns.tick(dt);
                let now = cooldowns.remaining(id);
                prop_assert!(now >= 0.0);
                prop_assert!(now <= last);
                last = now;
            }
        }
    }
}
