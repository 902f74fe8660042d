// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cue evaluation.
//!
//! Pure functions that, given a track and a time window local to its phase
//! (or clip), report which keys fire and which clips are active. Windows are
//! half-open `(prev, curr]` so a key at exactly `prev` never fires again and a
//! key at `curr` fires once no matter how large the step was. The first window
//! of a pass is closed at its start so keys at the very beginning fire too.
//!
//! Callers never evaluate a window that runs backwards. Loop wraps are split
//! into two windows by the caller; [`CueCursor`] tracks the high-water mark of
//! a pass and refuses to evaluate backwards.

use crate::clip::Clip;
use crate::key::Key;
use crate::track::Track;

/// Time window for key firing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueWindow {
    start: f32,
    end: f32,
    include_start: bool,
}

impl CueWindow {
    /// Half-open window `(prev, curr]`; empty when `curr < prev`
    pub fn after(prev: f32, curr: f32) -> Self {
        Self {
            start: prev,
            end: curr.max(prev),
            include_start: false,
        }
    }

    /// Closed window `[start, end]`
    pub fn closed(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            include_start: true,
        }
    }

    /// Window start
    pub fn start(&self) -> f32 {
        self.start
    }

    /// Window end, the "current" time
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Whether `start` itself is inside the window
    pub fn includes_start(&self) -> bool {
        self.include_start
    }

    /// Whether `t` lies in the window
    pub fn contains(&self, t: f32) -> bool {
        let after_start = if self.include_start { t >= self.start } else { t > self.start };
        after_start && t <= self.end
    }

    /// Whether no time lies in the window
    pub fn is_empty(&self) -> bool {
        if self.include_start {
            self.start > self.end
        } else {
            self.start >= self.end
        }
    }

    /// Limit the end of the window, e.g. to a phase duration
    pub fn clamp_end(self, max: f32) -> Self {
        Self {
            end: self.end.min(max),
            ..self
        }
    }
}

/// Edge-trigger cursor for one pass over a timeline.
///
/// Remembers the furthest time evaluated so far. Moving backwards yields no
/// window and keeps the high-water mark, so moving forward again does not
/// re-fire keys already passed. [`CueCursor::reset`] starts a new pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CueCursor {
    origin: f32,
    high_water: Option<f32>,
}

impl CueCursor {
    /// Cursor whose first window starts (inclusively) at `origin`
    pub fn new(origin: f32) -> Self {
        Self {
            origin,
            high_water: None,
        }
    }

    /// Window to evaluate when moving to `to`, if any
    pub fn advance(&mut self, to: f32) -> Option<CueWindow> {
        match self.high_water {
            None if to >= self.origin => {
                self.high_water = Some(to);
                Some(CueWindow::closed(self.origin, to))
            }
            Some(high) if to > high => {
                self.high_water = Some(to);
                Some(CueWindow::after(high, to))
            }
            _ => None,
        }
    }

    /// Start a new pass from the origin
    pub fn reset(&mut self) {
        self.high_water = None;
    }

    /// Start a new pass as if everything up to `t` had already fired
    pub fn reset_to(&mut self, t: f32) {
        self.high_water = Some(t);
    }

    /// Furthest time evaluated in this pass
    pub fn high_water(&self) -> Option<f32> {
        self.high_water
    }
}

/// Keys whose time lies in the window, with their indices
pub fn fired_keys<'a>(keys: &'a [Key], window: CueWindow) -> impl Iterator<Item = (usize, &'a Key)> + 'a {
    keys.iter()
        .enumerate()
        .filter(move |(_, key)| window.contains(key.time))
}

/// A clip's relation to an evaluation window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSample {
    /// Index of the clip in its track
    pub index: usize,
    /// `current - start`, clamped to `[0, duration]`
    pub local_time: f32,
    /// The clip start lies in the window
    pub entered: bool,
    /// The clip end lies in the window
    pub exited: bool,
    /// The clip covers the window end (`start <= end < start + duration`)
    pub active: bool,
}

/// Clips entered, exited or active over the window
pub fn clip_samples(clips: &[Clip], window: CueWindow) -> Vec<ClipSample> {
    let now = window.end();
    clips
        .iter()
        .enumerate()
        .filter_map(|(index, clip)| {
            let active = clip.contains(now);
            let entered = window.contains(clip.start);
            let exited = window.contains(clip.end());
            (active || entered || exited).then(|| ClipSample {
                index,
                local_time: (now - clip.start).clamp(0.0, clip.duration()),
                entered,
                exited,
                active,
            })
        })
        .collect()
}

/// Clips covering time `t`, with local clip time, for continuous sampling
pub fn active_clips_at(clips: &[Clip], t: f32) -> impl Iterator<Item = (usize, &Clip, f32)> {
    clips
        .iter()
        .enumerate()
        .filter(move |(_, clip)| clip.contains(t))
        .map(move |(index, clip)| (index, clip, t - clip.start))
}

/// Result of evaluating one track over a window
#[derive(Debug, Clone, Default)]
pub struct TrackEvaluation<'a> {
    /// Fired keys with their indices, in track order
    pub keys: Vec<(usize, &'a Key)>,
    /// Clip samples, in track order
    pub clips: Vec<ClipSample>,
}

impl TrackEvaluation<'_> {
    /// Whether nothing fired and no clip is involved
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.clips.is_empty()
    }
}

/// Evaluate a track over a window
pub fn evaluate_track(track: &Track, window: CueWindow) -> TrackEvaluation<'_> {
    if window.is_empty() {
        return TrackEvaluation::default();
    }
    TrackEvaluation {
        keys: fired_keys(track.keys(), window).collect(),
        clips: clip_samples(track.clips(), window),
    }
}
