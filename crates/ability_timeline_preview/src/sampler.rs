// SPDX-License-Identifier: MIT OR Apache-2.0
//! Continuous preview sampling.
//!
//! Unlike the simulation, the preview does not fire keys once. Every frame
//! re-samples the whole ability at the playhead: the phase under it, the
//! clips covering it and the keys near it.

use ability_timeline_model::{
    active_clips_at, fired_keys, AbilityDefinition, ClipId, ClipType, CueWindow, KeyId, KeyType,
};
use indexmap::IndexMap;

/// Keys closer than this to the playhead are shown
pub const KEY_DISPLAY_WINDOW: f32 = 0.1;
/// Local time changes larger than this restart a previewed clip
pub const CLIP_JUMP_THRESHOLD: f32 = 0.1;

/// A clip covering the playhead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPreview {
    /// Phase index
    pub phase: usize,
    /// Track index
    pub track: usize,
    /// Clip id
    pub clip: ClipId,
    /// Clip type
    pub clip_type: ClipType,
    /// Global start time
    pub start_time: f32,
    /// Time since the clip started
    pub local_time: f32,
    /// Clip duration
    pub duration: f32,
}

/// A key near the playhead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPreview {
    /// Phase index
    pub phase: usize,
    /// Track index
    pub track: usize,
    /// Key id
    pub key: KeyId,
    /// Key type
    pub key_type: KeyType,
    /// Global key time
    pub time: f32,
}

/// Everything the preview shows at one playhead position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewFrame {
    /// Sampled time
    pub time: f32,
    /// Phase under the playhead
    pub phase: Option<usize>,
    /// Active clips on audible tracks
    pub clips: Vec<ClipPreview>,
    /// Keys within [`KEY_DISPLAY_WINDOW`] on audible tracks
    pub keys: Vec<KeyPreview>,
}

/// Sample an ability at global time `time`.
///
/// A phase contains `time` when `start <= time < end`; disabled phases are
/// never sampled.
pub fn sample_ability(ability: &AbilityDefinition, time: f32) -> PreviewFrame {
    let mut frame = PreviewFrame {
        time,
        ..PreviewFrame::default()
    };
    let Some(cursor) = ability.locate(time) else {
        return frame;
    };
    let phase = &ability.phases[cursor.index];
    if !phase.enabled {
        return frame;
    }
    frame.phase = Some(cursor.index);

    let window = CueWindow::closed(cursor.local - KEY_DISPLAY_WINDOW, cursor.local + KEY_DISPLAY_WINDOW);
    for (track_index, track) in phase.audible_tracks() {
        for (_, clip, local_time) in active_clips_at(track.clips(), cursor.local) {
            frame.clips.push(ClipPreview {
                phase: cursor.index,
                track: track_index,
                clip: clip.id,
                clip_type: clip.clip_type(),
                start_time: cursor.start + clip.start,
                local_time,
                duration: clip.duration(),
            });
        }
        for (_, key) in fired_keys(track.keys(), window) {
            frame.keys.push(KeyPreview {
                phase: cursor.index,
                track: track_index,
                key: key.id,
                key_type: key.key_type(),
                time: cursor.start + key.time,
            });
        }
    }
    frame
}

/// Lifecycle event of a previewed effect clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewClipEvent {
    /// Create the preview instance
    Spawned {
        /// Clip id
        clip: ClipId,
        /// Clip type
        clip_type: ClipType,
        /// Local time to start at
        local_time: f32,
    },
    /// Move an existing instance to a local time
    Sampled {
        /// Clip id
        clip: ClipId,
        /// Local time
        local_time: f32,
        /// The time moved backwards or jumped; restart the effect
        restart: bool,
    },
    /// Destroy the preview instance
    Despawned {
        /// Clip id
        clip: ClipId,
    },
}

/// Tracks which VFX and SFX clips have a preview instance
#[derive(Debug, Clone, Default)]
pub struct PreviewClipTracker {
    live: IndexMap<ClipId, f32>,
}

impl PreviewClipTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff a frame against the previous one
    pub fn update(&mut self, frame: &PreviewFrame) -> Vec<PreviewClipEvent> {
        let mut events = Vec::new();
        let mut seen = Vec::new();

        for clip in frame
            .clips
            .iter()
            .filter(|c| matches!(c.clip_type, ClipType::Vfx | ClipType::Sfx))
        {
            seen.push(clip.clip);
            match self.live.insert(clip.clip, clip.local_time) {
                None => events.push(PreviewClipEvent::Spawned {
                    clip: clip.clip,
                    clip_type: clip.clip_type,
                    local_time: clip.local_time,
                }),
                Some(last) => events.push(PreviewClipEvent::Sampled {
                    clip: clip.clip,
                    local_time: clip.local_time,
                    restart: clip.local_time < last || clip.local_time - last > CLIP_JUMP_THRESHOLD,
                }),
            }
        }

        self.live.retain(|clip, _| {
            let keep = seen.contains(clip);
            if !keep {
                events.push(PreviewClipEvent::Despawned { clip: *clip });
            }
            keep
        });
        events
    }

    /// Despawn every live instance
    pub fn clear(&mut self) -> Vec<PreviewClipEvent> {
        self.live
            .drain(..)
            .map(|(clip, _)| PreviewClipEvent::Despawned { clip })
            .collect()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no instance is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ability_timeline_model::{Clip, ClipKind, Key, NameRef, Phase, Track, TrackType};

    fn ability() -> AbilityDefinition {
        let mut hits = Track::new("Hits", TrackType::Hitbox);
        hits.add_key(Key::of_type(0.45, KeyType::Hitbox)).unwrap();
        hits.add_key(Key::of_type(0.9, KeyType::Hitbox)).unwrap();

        let mut vfx = Track::new("Vfx", TrackType::Vfx);
        vfx.add_clip(Clip::new(0.2, ClipKind::Vfx { prefab: NameRef::new("Trail"), scale: 1.0 }))
            .unwrap();
        let mut muted = Track::new("Muted", TrackType::Hitbox);
        muted.muted = true;
        muted.add_key(Key::of_type(0.5, KeyType::Hitbox)).unwrap();

        let mut disabled = Phase::new("Skipped", 1.0);
        disabled.enabled = false;

        AbilityDefinition::new("Slash")
            .with_phase(Phase::new("Windup", 0.5))
            .with_phase(Phase::new("Active", 1.0).with_track(hits).with_track(vfx).with_track(muted))
            .with_phase(disabled)
    }

    #[test]
    fn test_sample_reports_phase_clips_and_keys() {
        let frame = sample_ability(&ability(), 0.9);
        assert_eq!(frame.phase, Some(1));

        assert_eq!(frame.keys.len(), 1);
        assert_eq!(frame.keys[0].track, 0);
        assert!((frame.keys[0].time - 0.95).abs() < 1e-5);

        assert_eq!(frame.clips.len(), 1);
        let clip = frame.clips[0];
        assert_eq!(clip.clip_type, ClipType::Vfx);
        assert!((clip.start_time - 0.7).abs() < 1e-5);
        assert!((clip.local_time - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_phase_boundaries_and_disabled_phases() {
        let ability = ability();
        assert_eq!(sample_ability(&ability, 0.5).phase, Some(1));
        assert_eq!(sample_ability(&ability, 0.499).phase, Some(0));
        assert_eq!(sample_ability(&ability, 2.0).phase, None);
        assert_eq!(sample_ability(&ability, 9.0).phase, None);
    }

    #[test]
    fn test_resampling_is_not_edge_triggered() {
        let ability = ability();
        let first = sample_ability(&ability, 0.96);
        let again = sample_ability(&ability, 0.96);
        assert_eq!(first, again);
        assert_eq!(first.keys.len(), 1);
    }

    #[test]
    fn test_tracker_spawn_sample_despawn() {
        let ability = ability();
        let mut tracker = PreviewClipTracker::new();

        let events = tracker.update(&sample_ability(&ability, 0.8));
        assert!(matches!(events.as_slice(), [PreviewClipEvent::Spawned { clip_type: ClipType::Vfx, .. }]));

        let events = tracker.update(&sample_ability(&ability, 0.85));
        assert!(matches!(events.as_slice(), [PreviewClipEvent::Sampled { restart: false, .. }]));

        let events = tracker.update(&sample_ability(&ability, 0.75));
        assert!(matches!(events.as_slice(), [PreviewClipEvent::Sampled { restart: true, .. }]));

        let events = tracker.update(&sample_ability(&ability, 1.4));
        assert!(matches!(events.as_slice(), [PreviewClipEvent::Despawned { .. }]));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_tracker_clear() {
        let mut tracker = PreviewClipTracker::new();
        tracker.update(&sample_ability(&ability(), 0.8));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.clear().len(), 1);
        assert!(tracker.is_empty());
    }
}
