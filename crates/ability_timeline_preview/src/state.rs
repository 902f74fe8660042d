// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline state.
//!
//! [`TimelineState`] is the single owner of the view, selection, playback
//! driver, active gesture and the edited ability. Every mutation goes through
//! it and publishes a [`TimelineChange`] on its [`ChangeBus`].

use crate::bus::{ChangeBus, ChangeCallback, ChangeKind, SubscriptionId, TimelineChange};
use crate::error::{PreviewError, Result};
use crate::gesture::Gesture;
use crate::playback::{PlaybackDriver, SnapSettings};
use crate::selection::{KeyRef, Selection};
use ability_timeline_model::{AbilityDefinition, Key, ModelError};
use serde::{Deserialize, Serialize};

/// Smallest zoom in pixels per second
pub const MIN_PIXELS_PER_SECOND: f32 = 50.0;
/// Largest zoom in pixels per second
pub const MAX_PIXELS_PER_SECOND: f32 = 600.0;
const PLAYHEAD_MARGIN: f32 = 50.0;

/// Zoom and scroll of the timeline view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// Horizontal zoom
    pub pixels_per_second: f32,
    /// Horizontal scroll in pixels
    pub scroll_x: f32,
    /// Vertical scroll in pixels
    pub scroll_y: f32,
    /// Width of the visible time area in pixels
    pub viewport_width: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pixels_per_second: 200.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            viewport_width: 800.0,
        }
    }
}

impl ViewState {
    /// Pixel offset of `time` from the left edge of the time area
    pub fn time_to_x(&self, time: f32) -> f32 {
        time * self.pixels_per_second - self.scroll_x
    }

    /// Time under pixel offset `x`
    pub fn x_to_time(&self, x: f32) -> f32 {
        (x + self.scroll_x) / self.pixels_per_second.max(1.0)
    }

    /// Multiply the zoom by `factor`, keeping the time under `cursor_x` fixed
    pub fn zoom(&mut self, factor: f32, cursor_x: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.x_to_time(cursor_x);
        self.pixels_per_second =
            (self.pixels_per_second * factor).clamp(MIN_PIXELS_PER_SECOND, MAX_PIXELS_PER_SECOND);
        self.scroll_x = (anchor * self.pixels_per_second - cursor_x).max(0.0);
    }

    /// Scroll by a pointer movement of `dx` pixels
    pub fn pan(&mut self, dx: f32) {
        self.scroll_x = (self.scroll_x - dx).max(0.0);
    }

    /// Scroll so `time` is at least a margin inside the viewport.
    ///
    /// Returns whether the scroll changed.
    pub fn ensure_visible(&mut self, time: f32) -> bool {
        let x = time * self.pixels_per_second;
        let before = self.scroll_x;
        if x < self.scroll_x + PLAYHEAD_MARGIN {
            self.scroll_x = (x - PLAYHEAD_MARGIN).max(0.0);
        } else if x > self.scroll_x + self.viewport_width - PLAYHEAD_MARGIN {
            self.scroll_x = x - self.viewport_width + PLAYHEAD_MARGIN;
        }
        self.scroll_x != before
    }
}

/// Observable editor state for one ability
#[derive(Debug, Default)]
pub struct TimelineState {
    pub(crate) ability: Option<AbilityDefinition>,
    pub(crate) view: ViewState,
    pub(crate) playback: PlaybackDriver,
    pub(crate) selection: Selection,
    pub(crate) gesture: Gesture,
    bus: ChangeBus,
}

impl TimelineState {
    /// Empty state with no ability
    pub fn new() -> Self {
        Self::default()
    }

    /// State editing `ability`
    pub fn with_ability(ability: AbilityDefinition) -> Self {
        Self {
            ability: Some(ability),
            ..Self::default()
        }
    }

    /// The edited ability
    pub fn ability(&self) -> Option<&AbilityDefinition> {
        self.ability.as_ref()
    }

    /// Replace the edited ability, ending any gesture and clearing selection
    pub fn set_ability(&mut self, ability: Option<AbilityDefinition>) {
        self.cancel_gesture();
        self.ability = ability;
        self.selection.clear();
        let total = self.total_duration();
        self.playback.ensure_playhead_in_range(total);
        if self.playback.playhead() > total {
            self.playback.scrub(total, total);
        }
        self.publish(TimelineChange::Data);
        self.notify_selection();
        self.notify_playback();
    }

    /// Edit the ability in place
    pub fn edit_ability<R>(&mut self, edit: impl FnOnce(&mut AbilityDefinition) -> R) -> Result<R> {
        let ability = self.ability.as_mut().ok_or(PreviewError::NoAbility)?;
        let result = edit(ability);
        self.selection.retain_existing(ability);
        let total = ability.total_duration();
        self.playback.ensure_range_valid(total);
        self.publish(TimelineChange::Data);
        Ok(result)
    }

    /// Add a key to a track and select it
    pub fn add_key(&mut self, phase: usize, track: usize, key: Key) -> Result<KeyRef> {
        let ability = self.ability.as_mut().ok_or(PreviewError::NoAbility)?;
        let target = ability
            .phases
            .get_mut(phase)
            .ok_or(ModelError::PhaseOutOfRange(phase))?
            .tracks
            .get_mut(track)
            .ok_or(ModelError::TrackOutOfRange(track))?;
        let id = target.add_key(key)?;
        let key = KeyRef::new(phase, track, id);
        self.publish(TimelineChange::Data);
        self.selection.select(key);
        self.notify_selection();
        Ok(key)
    }

    /// Delete every selected key on unlocked tracks. Returns how many were removed.
    pub fn delete_selected_keys(&mut self) -> Result<usize> {
        let ability = self.ability.as_mut().ok_or(PreviewError::NoAbility)?;
        let mut removed = 0;
        for key in self.selection.iter() {
            let Some(track) = ability
                .phases
                .get_mut(key.phase)
                .and_then(|p| p.tracks.get_mut(key.track))
            else {
                continue;
            };
            if track.locked {
                tracing::debug!("Skipping key on locked track '{}'", track.name);
                continue;
            }
            if track.remove_key(key.key).is_some() {
                removed += 1;
            }
        }
        self.selection.retain_existing(ability);
        if removed > 0 {
            self.publish(TimelineChange::Data);
            self.notify_selection();
        }
        Ok(removed)
    }

    /// Length of the edited ability; 1 s without one
    pub fn total_duration(&self) -> f32 {
        self.ability.as_ref().map_or(1.0, AbilityDefinition::total_duration)
    }

    /// Global start time of a phase
    pub fn phase_start_offset(&self, phase: usize) -> f32 {
        self.ability.as_ref().map_or(0.0, |a| a.phase_start_offset(phase))
    }

    /// (phase, track) of every track row, top to bottom
    pub fn track_rows(&self) -> Vec<(usize, usize)> {
        let Some(ability) = &self.ability else {
            return Vec::new();
        };
        ability
            .phases
            .iter()
            .enumerate()
            .flat_map(|(p, phase)| (0..phase.tracks.len()).map(move |t| (p, t)))
            .collect()
    }

    /// View state
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Playback driver
    pub fn playback(&self) -> &PlaybackDriver {
        &self.playback
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Register a change callback
    pub fn subscribe(&mut self, filter: Option<ChangeKind>, callback: ChangeCallback) -> SubscriptionId {
        self.bus.subscribe(filter, callback)
    }

    /// Remove a change callback
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Changes published so far
    pub fn published_count(&self) -> u64 {
        self.bus.published_count()
    }

    pub(crate) fn publish(&mut self, change: TimelineChange) {
        self.bus.publish(change);
    }

    pub(crate) fn notify_view(&mut self) {
        self.publish(TimelineChange::View {
            pixels_per_second: self.view.pixels_per_second,
            scroll_x: self.view.scroll_x,
        });
    }

    pub(crate) fn notify_selection(&mut self) {
        self.publish(TimelineChange::Selection {
            selected: self.selection.len(),
        });
    }

    pub(crate) fn notify_playback(&mut self) {
        self.publish(TimelineChange::Playback {
            playhead: self.playback.playhead(),
            state: self.playback.state(),
        });
    }

    /// Advance playback by one frame, keeping the playhead visible.
    ///
    /// Returns whether the playhead moved.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.playback.is_playing() {
            return false;
        }
        let total = self.total_duration();
        let moved = self.playback.update(dt, total);
        if self.view.ensure_visible(self.playback.playhead()) {
            self.notify_view();
        }
        self.notify_playback();
        moved
    }

    /// Toggle play and pause
    pub fn toggle_play(&mut self) {
        self.playback.toggle();
        self.notify_playback();
    }

    /// Start playing
    pub fn play(&mut self) {
        self.playback.play();
        self.notify_playback();
    }

    /// Pause, snapping the playhead
    pub fn pause(&mut self) {
        self.playback.pause();
        self.notify_playback();
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.playback.stop();
        self.notify_playback();
    }

    /// Move the playhead
    pub fn scrub(&mut self, time: f32) {
        let total = self.total_duration();
        self.playback.scrub(time, total);
        self.notify_playback();
    }

    /// Set playback speed
    pub fn set_speed(&mut self, speed: f32) {
        self.playback.set_speed(speed);
        self.notify_playback();
    }

    /// Set looping
    pub fn set_loop(&mut self, looping: bool) {
        self.playback.set_loop(looping);
        self.notify_playback();
    }

    /// Set the playback range
    pub fn set_range(&mut self, start: f32, end: f32, enabled: bool) {
        let total = self.total_duration();
        self.playback.set_range(start, end, enabled, total);
        self.notify_playback();
    }

    /// Replace grid snapping
    pub fn set_snap(&mut self, snap: SnapSettings) {
        self.playback.set_snap(snap);
        self.notify_view();
    }

    /// Zoom around a pointer position
    pub fn zoom(&mut self, factor: f32, cursor_x: f32) {
        self.view.zoom(factor, cursor_x);
        self.notify_view();
    }

    /// Select only `key`
    pub fn select_key(&mut self, key: KeyRef) -> Result<()> {
        self.ensure_key(key)?;
        self.selection.select(key);
        self.notify_selection();
        Ok(())
    }

    /// Add `key` to the selection
    pub fn add_to_selection(&mut self, key: KeyRef) -> Result<bool> {
        self.ensure_key(key)?;
        let added = self.selection.add(key);
        self.notify_selection();
        Ok(added)
    }

    /// Flip `key`'s membership in the selection
    pub fn toggle_selection(&mut self, key: KeyRef) -> Result<bool> {
        self.ensure_key(key)?;
        let selected = self.selection.toggle(key);
        self.notify_selection();
        Ok(selected)
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.notify_selection();
        }
    }

    fn ensure_key(&self, key: KeyRef) -> Result<()> {
        let ability = self.ability.as_ref().ok_or(PreviewError::NoAbility)?;
        key.resolve(ability).map(|_| ()).ok_or(PreviewError::KeyNotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_timeline_model::{KeyType, Phase, Track, TrackType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn state() -> TimelineState {
        let mut hits = Track::new("Hits", TrackType::Hitbox);
        hits.add_key(Key::of_type(0.25, KeyType::Hitbox)).unwrap();
        TimelineState::with_ability(
            AbilityDefinition::new("Slash")
                .with_phase(Phase::new("Windup", 0.5).with_track(hits))
                .with_phase(Phase::new("Active", 1.5).with_track(Track::new("Anim", TrackType::Animation))),
        )
    }

    fn record(state: &mut TimelineState, filter: Option<ChangeKind>) -> Rc<RefCell<Vec<ChangeKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        state.subscribe(filter, Box::new(move |change| sink.borrow_mut().push(change.kind())));
        log
    }

    #[test]
    fn test_zoom_is_clamped_and_anchored() {
        let mut view = ViewState::default();
        let anchor = view.x_to_time(400.0);
        view.zoom(2.0, 400.0);
        assert_eq!(view.pixels_per_second, 400.0);
        assert!((view.x_to_time(400.0) - anchor).abs() < 1e-4);

        view.zoom(10.0, 0.0);
        assert_eq!(view.pixels_per_second, MAX_PIXELS_PER_SECOND);
        view.zoom(0.001, 0.0);
        assert_eq!(view.pixels_per_second, MIN_PIXELS_PER_SECOND);
    }

    #[test]
    fn test_ensure_visible_scrolls() {
        let mut view = ViewState::default();
        assert!(!view.ensure_visible(1.0));
        assert!(view.ensure_visible(5.0));
        assert_eq!(view.scroll_x, 5.0 * 200.0 - 800.0 + 50.0);
        assert!(view.ensure_visible(0.0));
        assert_eq!(view.scroll_x, 0.0);
    }

    #[test]
    fn test_playback_publishes_changes() {
        let mut state = state();
        let log = record(&mut state, Some(ChangeKind::Playback));

        state.play();
        assert!(state.update(0.5));
        state.stop();
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(state.playback().playhead(), 0.0);
    }

    #[test]
    fn test_update_follows_playhead() {
        let mut state = state();
        state.zoom(3.0, 0.0);
        state.play();
        for _ in 0..10 {
            state.update(0.15);
        }
        let playhead = state.playback().playhead();
        let x = state.view().time_to_x(playhead);
        assert!(x >= 0.0 && x <= state.view().viewport_width);
    }

    #[test]
    fn test_selection_validates_keys() {
        let mut state = state();
        let id = state.ability().unwrap().phases[0].tracks[0].keys()[0].id;
        let key = KeyRef::new(0, 0, id);

        state.select_key(key).unwrap();
        assert!(state.selection().contains(&key));
        assert!(matches!(
            state.select_key(KeyRef::new(1, 0, id)),
            Err(PreviewError::KeyNotFound(_))
        ));
        assert!(!state.toggle_selection(key).unwrap());
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_add_and_delete_keys() {
        let mut state = state();
        let log = record(&mut state, Some(ChangeKind::Data));

        let added = state.add_key(1, 0, Key::of_type(0.3, KeyType::AnimationEvent)).unwrap();
        assert_eq!(state.selection().primary(), Some(&added));
        assert!(matches!(
            state.add_key(1, 0, Key::of_type(0.3, KeyType::Hitbox)),
            Err(PreviewError::Model(ModelError::IncompatibleKey { .. }))
        ));
        assert!(matches!(
            state.add_key(5, 0, Key::of_type(0.3, KeyType::Hitbox)),
            Err(PreviewError::Model(ModelError::PhaseOutOfRange(5)))
        ));

        assert_eq!(state.delete_selected_keys().unwrap(), 1);
        assert!(state.selection().is_empty());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_set_ability_resets() {
        let mut state = state();
        state.scrub(1.8);
        let id = state.ability().unwrap().phases[0].tracks[0].keys()[0].id;
        state.select_key(KeyRef::new(0, 0, id)).unwrap();

        state.set_ability(Some(AbilityDefinition::new("Short").with_phase(Phase::new("Only", 0.5))));
        assert!(state.selection().is_empty());
        assert!((state.playback().playhead() - 0.5).abs() < 1e-4);

        state.set_ability(None);
        assert_eq!(state.total_duration(), 1.0);
        assert!(state.track_rows().is_empty());
    }

    #[test]
    fn test_track_rows() {
        assert_eq!(state().track_rows(), vec![(0, 0), (1, 0)]);
    }
}
