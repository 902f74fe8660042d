// SPDX-License-Identifier: MIT OR Apache-2.0
//! Key selection.

use ability_timeline_model::{AbilityDefinition, Key, KeyId, Track};
use indexmap::IndexSet;

/// Address of a key in the edited ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRef {
    /// Phase index
    pub phase: usize,
    /// Track index within the phase
    pub track: usize,
    /// Key id
    pub key: KeyId,
}

impl KeyRef {
    /// Create a key reference
    pub fn new(phase: usize, track: usize, key: KeyId) -> Self {
        Self { phase, track, key }
    }

    /// The track holding the key
    pub fn track<'a>(&self, ability: &'a AbilityDefinition) -> Option<&'a Track> {
        ability.phases.get(self.phase)?.tracks.get(self.track)
    }

    /// Resolve the key
    pub fn resolve<'a>(&self, ability: &'a AbilityDefinition) -> Option<&'a Key> {
        self.track(ability)?.key(self.key)
    }
}

/// Ordered set of selected keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    keys: IndexSet<KeyRef>,
}

impl Selection {
    /// Select only `key`
    pub fn select(&mut self, key: KeyRef) {
        self.keys.clear();
        self.keys.insert(key);
    }

    /// Add `key` to the selection. Returns whether it was new.
    pub fn add(&mut self, key: KeyRef) -> bool {
        self.keys.insert(key)
    }

    /// Flip `key`'s membership. Returns whether it is now selected.
    pub fn toggle(&mut self, key: KeyRef) -> bool {
        if self.keys.shift_remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    /// Replace the selection
    pub fn set(&mut self, keys: impl IntoIterator<Item = KeyRef>) {
        self.keys = keys.into_iter().collect();
    }

    /// Add several keys
    pub fn extend(&mut self, keys: impl IntoIterator<Item = KeyRef>) {
        self.keys.extend(keys);
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Whether `key` is selected
    pub fn contains(&self, key: &KeyRef) -> bool {
        self.keys.contains(key)
    }

    /// Selected keys in selection order
    pub fn iter(&self) -> impl Iterator<Item = &KeyRef> {
        self.keys.iter()
    }

    /// The first selected key
    pub fn primary(&self) -> Option<&KeyRef> {
        self.keys.first()
    }

    /// Number of selected keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop keys that no longer exist in `ability`
    pub fn retain_existing(&mut self, ability: &AbilityDefinition) {
        self.keys.retain(|key| key.resolve(ability).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_timeline_model::{KeyType, Phase, TrackType};

    fn key() -> KeyRef {
        KeyRef::new(0, 0, KeyId::new())
    }

    #[test]
    fn test_select_add_toggle() {
        let (a, b) = (key(), key());
        let mut selection = Selection::default();

        selection.select(a);
        assert!(selection.add(b));
        assert!(!selection.add(b));
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.primary(), Some(&a));

        assert!(!selection.toggle(a));
        assert!(selection.toggle(a));
        assert_eq!(selection.iter().copied().collect::<Vec<_>>(), vec![b, a]);

        selection.select(a);
        assert_eq!(selection.len(), 1);
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_existing() {
        let mut track = Track::new("Hits", TrackType::Hitbox);
        let kept = track.add_key(Key::of_type(0.1, KeyType::Hitbox)).unwrap();
        let ability = AbilityDefinition::new("Slash").with_phase(Phase::new("Active", 1.0).with_track(track));

        let mut selection = Selection::default();
        selection.set([KeyRef::new(0, 0, kept), key(), KeyRef::new(3, 0, kept)]);
        selection.retain_existing(&ability);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&KeyRef::new(0, 0, kept)));
    }
}
