// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gestures on the timeline.
//!
//! A gesture runs from `begin_*` through any number of
//! [`TimelineState::update_gesture`] calls to [`TimelineState::end_gesture`].
//! Only one gesture is active at a time; beginning a new one ends the current
//! one first.

use crate::bus::TimelineChange;
use crate::error::{PreviewError, Result};
use crate::selection::KeyRef;
use crate::state::TimelineState;
use ability_timeline_model::ClipId;

/// Pointer position over the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Horizontal offset in pixels from the left edge of the time area
    pub x: f32,
    /// Track row under the pointer, see [`TimelineState::track_rows`]
    pub row: usize,
}

impl Pointer {
    /// Pointer at `x` over `row`
    pub fn new(x: f32, row: usize) -> Self {
        Self { x, row }
    }
}

/// End of the playback range being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeHandle {
    /// Range start
    In,
    /// Range end
    Out,
}

/// Discriminant of [`Gesture`], published with edit notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureKind {
    /// No gesture
    #[default]
    None,
    /// Dragging the playhead
    Scrub,
    /// Scrolling the view
    Pan,
    /// Moving selected keys
    KeyDrag,
    /// Moving a clip
    ClipMove,
    /// Rubber-band selection
    BoxSelect,
    /// Dragging a range handle
    RangeHandle,
}

/// Active pointer interaction
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// Idle
    #[default]
    None,
    /// Dragging the playhead
    Scrub,
    /// Scrolling the view
    Pan {
        /// Pointer x at the previous update
        last_x: f32,
    },
    /// Moving selected keys
    KeyDrag {
        /// Time under the pointer when the drag began
        start_time: f32,
        /// Dragged keys with their local times before the drag
        origins: Vec<(KeyRef, f32)>,
    },
    /// Moving one clip
    ClipMove {
        /// Phase index
        phase: usize,
        /// Track index
        track: usize,
        /// Clip being moved
        clip: ClipId,
        /// Time under the pointer when the drag began
        start_time: f32,
        /// Clip start before the drag
        origin_start: f32,
    },
    /// Rubber-band selection
    BoxSelect {
        /// Anchor time
        start_time: f32,
        /// Anchor row
        start_row: usize,
        /// Time under the pointer
        current_time: f32,
        /// Row under the pointer
        current_row: usize,
        /// Add to the existing selection instead of replacing it
        additive: bool,
    },
    /// Dragging a range handle
    RangeHandle(RangeHandle),
}

impl Gesture {
    /// Discriminant
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::None => GestureKind::None,
            Gesture::Scrub => GestureKind::Scrub,
            Gesture::Pan { .. } => GestureKind::Pan,
            Gesture::KeyDrag { .. } => GestureKind::KeyDrag,
            Gesture::ClipMove { .. } => GestureKind::ClipMove,
            Gesture::BoxSelect { .. } => GestureKind::BoxSelect,
            Gesture::RangeHandle(_) => GestureKind::RangeHandle,
        }
    }
}

impl TimelineState {
    /// Kind of the active gesture
    pub fn gesture_kind(&self) -> GestureKind {
        self.gesture.kind()
    }

    fn pointer_time(&self, pointer: Pointer) -> f32 {
        self.view.x_to_time(pointer.x).max(0.0)
    }

    fn start_gesture(&mut self, gesture: Gesture) {
        if self.gesture != Gesture::None {
            tracing::warn!("{:?} gesture still active, ending it", self.gesture.kind());
            self.end_gesture();
        }
        self.gesture = gesture;
        self.publish(TimelineChange::State);
    }

    /// Start dragging the playhead
    pub fn begin_scrub(&mut self, pointer: Pointer) {
        self.start_gesture(Gesture::Scrub);
        let time = self.pointer_time(pointer);
        self.scrub(time);
    }

    /// Start scrolling the view
    pub fn begin_pan(&mut self, pointer: Pointer) {
        self.start_gesture(Gesture::Pan { last_x: pointer.x });
    }

    /// Start moving the selected keys. Keys on locked tracks stay put.
    pub fn begin_key_drag(&mut self, pointer: Pointer) -> Result<()> {
        let ability = self.ability.as_ref().ok_or(PreviewError::NoAbility)?;
        let origins: Vec<(KeyRef, f32)> = self
            .selection
            .iter()
            .filter(|key| key.track(ability).is_some_and(|track| !track.locked))
            .filter_map(|key| key.resolve(ability).map(|k| (*key, k.time)))
            .collect();
        if origins.is_empty() {
            return Err(PreviewError::EmptySelection);
        }
        let start_time = self.pointer_time(pointer);
        self.start_gesture(Gesture::KeyDrag { start_time, origins });
        Ok(())
    }

    /// Start moving a clip
    pub fn begin_clip_move(&mut self, phase: usize, track: usize, clip: ClipId, pointer: Pointer) -> Result<()> {
        let ability = self.ability.as_ref().ok_or(PreviewError::NoAbility)?;
        let target = ability
            .phases
            .get(phase)
            .and_then(|p| p.tracks.get(track))
            .ok_or(PreviewError::ClipNotFound(clip))?;
        if target.locked {
            return Err(PreviewError::TrackLocked(target.name.clone()));
        }
        let origin_start = target.clip(clip).ok_or(PreviewError::ClipNotFound(clip))?.start;
        let start_time = self.pointer_time(pointer);
        self.start_gesture(Gesture::ClipMove {
            phase,
            track,
            clip,
            start_time,
            origin_start,
        });
        Ok(())
    }

    /// Start a rubber-band selection
    pub fn begin_box_select(&mut self, pointer: Pointer, additive: bool) {
        let time = self.pointer_time(pointer);
        self.start_gesture(Gesture::BoxSelect {
            start_time: time,
            start_row: pointer.row,
            current_time: time,
            current_row: pointer.row,
            additive,
        });
    }

    /// Start dragging a playback range handle
    pub fn begin_range_handle(&mut self, handle: RangeHandle) {
        self.start_gesture(Gesture::RangeHandle(handle));
    }

    /// Feed a pointer move to the active gesture
    pub fn update_gesture(&mut self, pointer: Pointer) {
        let time = self.pointer_time(pointer);
        match self.gesture.clone() {
            Gesture::None => {}
            Gesture::Scrub => self.scrub(time),
            Gesture::Pan { last_x } => {
                self.gesture = Gesture::Pan { last_x: pointer.x };
                self.view.pan(pointer.x - last_x);
                self.notify_view();
            }
            Gesture::KeyDrag { start_time, origins } => self.drag_keys(&origins, time - start_time),
            Gesture::ClipMove {
                phase,
                track,
                clip,
                start_time,
                origin_start,
            } => self.move_clip(phase, track, clip, origin_start + time - start_time),
            Gesture::BoxSelect {
                start_time,
                start_row,
                additive,
                ..
            } => {
                self.gesture = Gesture::BoxSelect {
                    start_time,
                    start_row,
                    current_time: time,
                    current_row: pointer.row,
                    additive,
                };
            }
            Gesture::RangeHandle(handle) => {
                let time = self.playback.snap.snap_if_enabled(time);
                let range = self.playback.range();
                match handle {
                    RangeHandle::In => self.set_range(time, range.end, true),
                    RangeHandle::Out => self.set_range(range.start, time, true),
                }
            }
        }
    }

    /// Finish the active gesture and commit its result
    pub fn end_gesture(&mut self) {
        let gesture = std::mem::take(&mut self.gesture);
        let kind = gesture.kind();
        match gesture {
            Gesture::None => return,
            Gesture::KeyDrag { origins, .. } => self.end_drag_sort(&origins),
            Gesture::ClipMove { phase, track, .. } => {
                let target = self
                    .ability
                    .as_mut()
                    .and_then(|a| a.phases.get_mut(phase))
                    .and_then(|p| p.tracks.get_mut(track));
                if let Some(track) = target {
                    track.clips_mut().sort_by(|a, b| a.start.total_cmp(&b.start));
                }
            }
            Gesture::BoxSelect {
                start_time,
                start_row,
                current_time,
                current_row,
                additive,
            } => {
                let hits = self.keys_in_box(
                    start_time.min(current_time),
                    start_time.max(current_time),
                    start_row.min(current_row),
                    start_row.max(current_row),
                );
                if additive {
                    self.selection.extend(hits);
                } else {
                    self.selection.set(hits);
                }
                self.notify_selection();
            }
            Gesture::Scrub | Gesture::Pan { .. } | Gesture::RangeHandle(_) => {}
        }
        self.publish(TimelineChange::Edit { gesture: kind });
        self.publish(TimelineChange::State);
    }

    /// Abandon the active gesture, restoring anything it moved
    pub fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::None => return,
            Gesture::KeyDrag { origins, .. } => {
                self.drag_keys(&origins, 0.0);
                self.end_drag_sort(&origins);
            }
            Gesture::ClipMove {
                phase,
                track,
                clip,
                origin_start,
                ..
            } => self.move_clip(phase, track, clip, origin_start),
            _ => {}
        }
        self.publish(TimelineChange::State);
    }

    fn end_drag_sort(&mut self, origins: &[(KeyRef, f32)]) {
        let Some(ability) = self.ability.as_mut() else {
            return;
        };
        for (key, _) in origins {
            if let Some(track) = ability.phases.get_mut(key.phase).and_then(|p| p.tracks.get_mut(key.track)) {
                track.sort_keys();
            }
        }
    }

    fn drag_keys(&mut self, origins: &[(KeyRef, f32)], delta: f32) {
        let snap = self.playback.snap;
        let Some(ability) = self.ability.as_mut() else {
            return;
        };
        for (key, base) in origins {
            let Some(phase) = ability.phases.get_mut(key.phase) else {
                continue;
            };
            let duration = phase.duration.max(0.0);
            let Some(track) = phase.tracks.get_mut(key.track) else {
                continue;
            };
            if track.locked {
                continue;
            }
            if let Some(k) = track.key_mut(key.key) {
                k.time = snap.snap_if_enabled(base + delta).clamp(0.0, duration);
            }
        }
        self.publish(TimelineChange::Data);
    }

    fn move_clip(&mut self, phase: usize, track: usize, clip: ClipId, start: f32) {
        let snap = self.playback.snap;
        let Some(target) = self
            .ability
            .as_mut()
            .and_then(|a| a.phases.get_mut(phase))
            .and_then(|p| p.tracks.get_mut(track))
            .filter(|t| !t.locked)
        else {
            return;
        };
        if let Some(c) = target.clip_mut(clip) {
            c.start = snap.snap_if_enabled(start).max(0.0);
            self.publish(TimelineChange::Data);
        }
    }

    fn keys_in_box(&self, t0: f32, t1: f32, row0: usize, row1: usize) -> Vec<KeyRef> {
        let Some(ability) = &self.ability else {
            return Vec::new();
        };
        let rows = self.track_rows();
        let Some(rows) = rows.get(row0..=row1.min(rows.len().saturating_sub(1))) else {
            return Vec::new();
        };
        rows.iter()
            .flat_map(|&(phase, track)| {
                let offset = ability.phase_start_offset(phase);
                ability.phases[phase].tracks[track]
                    .keys()
                    .iter()
                    .filter(move |k| (t0..=t1).contains(&(offset + k.time)))
                    .map(move |k| KeyRef::new(phase, track, k.id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ChangeKind;
    use ability_timeline_model::{AbilityDefinition, Clip, ClipKind, ClipType, Key, KeyType, Phase, Track, TrackType};
    use std::cell::RefCell;
    use std::rc::Rc;

    // Default view: 200 px/s, no scroll, so x = time * 200.
    fn px(time: f32) -> f32 {
        time * 200.0
    }

    fn state() -> TimelineState {
        let mut hits = Track::new("Hits", TrackType::Hitbox);
        hits.add_key(Key::of_type(0.1, KeyType::Hitbox)).unwrap();
        hits.add_key(Key::of_type(0.4, KeyType::Hitbox)).unwrap();
        let mut vfx = Track::new("Vfx", TrackType::Vfx);
        vfx.add_clip(Clip::new(0.2, ClipKind::default_for(ClipType::Vfx))).unwrap();
        let mut cam = Track::new("Cam", TrackType::Camera);
        cam.add_key(Key::of_type(0.3, KeyType::CameraShake)).unwrap();
        TimelineState::with_ability(
            AbilityDefinition::new("Slash")
                .with_phase(Phase::new("Windup", 0.5).with_track(hits).with_track(vfx))
                .with_phase(Phase::new("Active", 1.0).with_track(cam)),
        )
    }

    fn key(state: &TimelineState, phase: usize, track: usize, index: usize) -> KeyRef {
        let id = state.ability().unwrap().phases[phase].tracks[track].keys()[index].id;
        KeyRef::new(phase, track, id)
    }

    fn key_time(state: &TimelineState, key: KeyRef) -> f32 {
        key.resolve(state.ability().unwrap()).unwrap().time
    }

    #[test]
    fn test_scrub_gesture() {
        let mut state = state();
        state.begin_scrub(Pointer::new(px(0.5), 0));
        assert_eq!(state.gesture_kind(), GestureKind::Scrub);
        state.update_gesture(Pointer::new(px(1.234), 0));
        assert!((state.playback().playhead() - 1.23).abs() < 1e-4);
        state.update_gesture(Pointer::new(px(9.0), 0));
        assert_eq!(state.playback().playhead(), state.total_duration());
        state.end_gesture();
        assert_eq!(state.gesture_kind(), GestureKind::None);
    }

    #[test]
    fn test_key_drag_snaps_and_clamps() {
        let mut state = state();
        let first = key(&state, 0, 0, 0);
        let second = key(&state, 0, 0, 1);
        state.select_key(first).unwrap();
        state.add_to_selection(second).unwrap();

        state.begin_key_drag(Pointer::new(px(0.1), 0)).unwrap();
        state.update_gesture(Pointer::new(px(0.2033), 0));
        assert!((key_time(&state, first) - 0.2).abs() < 1e-4);
        assert!((key_time(&state, second) - 0.5).abs() < 1e-4);

        state.update_gesture(Pointer::new(px(0.6), 0));
        assert!((key_time(&state, second) - 0.5).abs() < 1e-4);
        state.end_gesture();

        let keys = state.ability().unwrap().phases[0].tracks[0].keys();
        assert!(keys.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_key_drag_needs_selection() {
        let mut state = state();
        assert!(matches!(
            state.begin_key_drag(Pointer::new(0.0, 0)),
            Err(PreviewError::EmptySelection)
        ));
    }

    #[test]
    fn test_key_drag_skips_locked_tracks() {
        let mut state = state();
        let locked = key(&state, 1, 0, 0);
        state.select_key(locked).unwrap();
        state.edit_ability(|a| a.phases[1].tracks[0].locked = true).unwrap();
        assert!(matches!(
            state.begin_key_drag(Pointer::new(0.0, 0)),
            Err(PreviewError::EmptySelection)
        ));
    }

    #[test]
    fn test_cancel_restores_keys() {
        let mut state = state();
        let first = key(&state, 0, 0, 0);
        state.select_key(first).unwrap();
        state.begin_key_drag(Pointer::new(px(0.1), 0)).unwrap();
        state.update_gesture(Pointer::new(px(0.3), 0));
        state.cancel_gesture();
        assert!((key_time(&state, first) - 0.1).abs() < 1e-4);
        assert_eq!(state.gesture_kind(), GestureKind::None);
    }

    #[test]
    fn test_clip_move() {
        let mut state = state();
        let clip = state.ability().unwrap().phases[0].tracks[1].clips()[0].id;
        state.begin_clip_move(0, 1, clip, Pointer::new(px(0.2), 1)).unwrap();
        state.update_gesture(Pointer::new(px(0.05), 1));
        state.end_gesture();
        let start = state.ability().unwrap().phases[0].tracks[1].clips()[0].start;
        assert!((start - 0.05).abs() < 1e-4);

        state.edit_ability(|a| a.phases[0].tracks[1].locked = true).unwrap();
        assert!(matches!(
            state.begin_clip_move(0, 1, clip, Pointer::new(0.0, 1)),
            Err(PreviewError::TrackLocked(_))
        ));
        assert!(matches!(
            state.begin_clip_move(0, 0, clip, Pointer::new(0.0, 0)),
            Err(PreviewError::ClipNotFound(_))
        ));
    }

    #[test]
    fn test_box_select_uses_global_time() {
        let mut state = state();
        // Rows: (0,0) Hits, (0,1) Vfx, (1,0) Cam. Cam key sits at 0.5 + 0.3 = 0.8.
        state.begin_box_select(Pointer::new(px(0.35), 0), false);
        state.update_gesture(Pointer::new(px(0.85), 2));
        state.end_gesture();
        let selected: Vec<_> = state.selection().iter().copied().collect();
        assert_eq!(selected, vec![key(&state, 0, 0, 1), key(&state, 1, 0, 0)]);

        state.begin_box_select(Pointer::new(0.0, 0), true);
        state.update_gesture(Pointer::new(px(0.15), 0));
        state.end_gesture();
        assert_eq!(state.selection().len(), 3);
    }

    #[test]
    fn test_new_gesture_ends_previous() {
        let mut state = state();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        state.subscribe(
            Some(ChangeKind::Edit),
            Box::new(move |change| {
                if let TimelineChange::Edit { gesture } = change {
                    sink.borrow_mut().push(*gesture);
                }
            }),
        );

        state.begin_pan(Pointer::new(100.0, 0));
        state.begin_scrub(Pointer::new(0.0, 0));
        assert_eq!(state.gesture_kind(), GestureKind::Scrub);
        state.end_gesture();
        assert_eq!(*log.borrow(), vec![GestureKind::Pan, GestureKind::Scrub]);
    }

    #[test]
    fn test_pan_and_range_handles() {
        let mut state = state();
        state.begin_pan(Pointer::new(300.0, 0));
        state.update_gesture(Pointer::new(200.0, 0));
        state.end_gesture();
        assert_eq!(state.view().scroll_x, 100.0);

        state.begin_range_handle(RangeHandle::Out);
        state.update_gesture(Pointer::new(100.0, 0));
        state.end_gesture();
        let range = state.playback().range();
        assert!(range.enabled);
        assert!((range.end - 1.0).abs() < 1e-4);
    }
}
