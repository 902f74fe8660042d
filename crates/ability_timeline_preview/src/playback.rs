// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive playback driver.
//!
//! The playhead advances by `dt * speed` per frame while playing. With a
//! range enabled it is kept inside `[range.start, min(range.end, total)]`,
//! otherwise inside `[0, total]`. Overflow wraps when looping and otherwise
//! clamps to the bound and stops. Pausing snaps the playhead to the grid
//! once; nothing snaps while playing.

use serde::{Deserialize, Serialize};

/// Slowest playback speed
pub const MIN_SPEED: f32 = 0.1;
/// Fastest playback speed
pub const MAX_SPEED: f32 = 4.0;
const MIN_RANGE_LENGTH: f32 = 1e-4;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped at the start
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Grid snapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Snap scrubs and drags to the grid
    pub enabled: bool,
    /// Grid step in seconds
    pub step: f32,
    /// Snap to frames instead of `step`
    pub frame_mode: bool,
    /// Frame rate used in frame mode
    pub fps: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            step: 0.01,
            frame_mode: false,
            fps: 60.0,
        }
    }
}

impl SnapSettings {
    /// Active grid step
    pub fn grid_step(&self) -> f32 {
        if self.frame_mode {
            1.0 / self.fps
        } else {
            self.step
        }
    }

    /// Round `time` to the nearest grid line
    pub fn snap(&self, time: f32) -> f32 {
        let step = self.grid_step();
        if !step.is_finite() || step <= 0.0 {
            return time;
        }
        (time / step).round() * step
    }

    /// Round `time` to the grid when snapping is enabled
    pub fn snap_if_enabled(&self, time: f32) -> f32 {
        if self.enabled {
            self.snap(time)
        } else {
            time
        }
    }
}

/// Playback sub-range
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackRange {
    /// Restrict playback to the range
    pub enabled: bool,
    /// Range in point
    pub start: f32,
    /// Range out point
    pub end: f32,
}

/// `t` wrapped into `[0, length)`
fn repeat(t: f32, length: f32) -> f32 {
    (t - (t / length).floor() * length).clamp(0.0, length)
}

/// Drives the preview playhead from an external per-frame clock
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackDriver {
    playhead: f32,
    state: PlaybackState,
    speed: f32,
    looping: bool,
    range: PlaybackRange,
    /// Grid snapping
    pub snap: SnapSettings,
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackDriver {
    /// Stopped driver at 0, speed 1, looping
    pub fn new() -> Self {
        Self {
            playhead: 0.0,
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: true,
            range: PlaybackRange::default(),
            snap: SnapSettings::default(),
        }
    }

    /// Current playhead
    pub fn playhead(&self) -> f32 {
        self.playhead
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the playhead is advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Speed multiplier
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Whether overflow wraps
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Playback range
    pub fn range(&self) -> PlaybackRange {
        self.range
    }

    /// Advance by one frame. Returns whether the playhead moved.
    pub fn update(&mut self, dt: f32, total: f32) -> bool {
        if !self.is_playing() || !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        let before = self.playhead;
        self.playhead += dt * self.speed;

        if self.range.enabled {
            self.ensure_range_valid(total);
            let start = self.range.start;
            let end = self.range.end.min(total);
            let length = (end - start).max(MIN_RANGE_LENGTH);
            if self.playhead > end || self.playhead < start {
                if self.looping {
                    self.playhead = start + repeat(self.playhead - start, length);
                } else {
                    self.playhead = if self.playhead > end { end } else { start };
                    self.state = PlaybackState::Paused;
                }
            }
        } else if self.playhead > total {
            if self.looping {
                self.playhead = repeat(self.playhead, total.max(MIN_RANGE_LENGTH));
            } else {
                self.playhead = total;
                self.state = PlaybackState::Paused;
            }
        }
        self.playhead != before
    }

    /// Start playing from the playhead
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause, snapping the playhead to the grid
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = PlaybackState::Paused;
            self.playhead = self.snap.snap(self.playhead);
        }
    }

    /// Toggle between playing and paused
    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop and rewind to 0
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.playhead = 0.0;
    }

    /// Move the playhead directly, snapping first when enabled
    pub fn scrub(&mut self, time: f32, total: f32) {
        self.playhead = self.snap.snap_if_enabled(time).clamp(0.0, total.max(0.0));
    }

    /// Set the speed multiplier
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() { speed.clamp(MIN_SPEED, MAX_SPEED) } else { 1.0 };
    }

    /// Set looping
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Set the range, fixing inverted bounds and pulling the playhead inside
    pub fn set_range(&mut self, start: f32, end: f32, enabled: bool, total: f32) {
        self.range = PlaybackRange { enabled, start, end };
        self.ensure_playhead_in_range(total);
    }

    /// Clamp the range into `[0, total]` and order its bounds
    pub fn ensure_range_valid(&mut self, total: f32) {
        let total = total.max(0.0);
        self.range.start = self.range.start.clamp(0.0, total);
        self.range.end = self.range.end.clamp(0.0, total);
        if self.range.end < self.range.start {
            std::mem::swap(&mut self.range.start, &mut self.range.end);
        }
    }

    /// Clamp the playhead into an enabled range
    pub fn ensure_playhead_in_range(&mut self, total: f32) {
        self.ensure_range_valid(total);
        if self.range.enabled {
            self.playhead = self.playhead.clamp(self.range.start, self.range.end.min(total));
        }
    }

    /// Replace the snap settings
    pub fn set_snap(&mut self, snap: SnapSettings) {
        self.snap = snap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_range_loop_wraps() {
        let mut driver = PlaybackDriver::new();
        driver.set_range(1.0, 3.0, true, 5.0);
        driver.scrub(2.9, 5.0);
        driver.play();
        driver.update(0.3, 5.0);
        assert!(approx(driver.playhead(), 1.2), "{}", driver.playhead());
        assert!(driver.is_playing());
    }

    #[test]
    fn test_range_without_loop_clamps_and_stops() {
        let mut driver = PlaybackDriver::new();
        driver.set_loop(false);
        driver.set_range(1.0, 3.0, true, 5.0);
        driver.scrub(2.9, 5.0);
        driver.play();
        driver.update(0.3, 5.0);
        assert_eq!(driver.playhead(), 3.0);
        assert!(!driver.is_playing());
    }

    #[test]
    fn test_full_length_loop_and_clamp() {
        let mut driver = PlaybackDriver::new();
        driver.play();
        driver.update(2.5, 2.0);
        assert!(approx(driver.playhead(), 0.5));

        driver.set_loop(false);
        driver.update(2.0, 2.0);
        assert_eq!(driver.playhead(), 2.0);
        assert_eq!(driver.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_speed_scales_and_is_clamped() {
        let mut driver = PlaybackDriver::new();
        driver.set_speed(2.0);
        driver.play();
        driver.update(0.25, 10.0);
        assert!(approx(driver.playhead(), 0.5));

        driver.set_speed(100.0);
        assert_eq!(driver.speed(), MAX_SPEED);
        driver.set_speed(f32::NAN);
        assert_eq!(driver.speed(), 1.0);
    }

    #[test]
    fn test_not_playing_does_not_move() {
        let mut driver = PlaybackDriver::new();
        assert!(!driver.update(0.5, 2.0));
        assert_eq!(driver.playhead(), 0.0);
    }

    #[test]
    fn test_pause_snaps_once() {
        let mut driver = PlaybackDriver::new();
        driver.play();
        driver.update(0.123_4, 2.0);
        assert!(approx(driver.playhead(), 0.1234));
        driver.pause();
        assert!(approx(driver.playhead(), 0.12));

        driver.snap.frame_mode = true;
        driver.snap.fps = 10.0;
        driver.play();
        driver.update(0.04, 2.0);
        driver.pause();
        assert!(approx(driver.playhead(), 0.2));
    }

    #[test]
    fn test_scrub_snaps_then_clamps() {
        let mut driver = PlaybackDriver::new();
        driver.scrub(0.456, 1.0);
        assert!(approx(driver.playhead(), 0.46));
        driver.scrub(7.0, 1.0);
        assert_eq!(driver.playhead(), 1.0);
        driver.scrub(-1.0, 1.0);
        assert_eq!(driver.playhead(), 0.0);

        driver.snap.enabled = false;
        driver.scrub(0.456, 1.0);
        assert!(approx(driver.playhead(), 0.456));
    }

    #[test]
    fn test_stop_rewinds() {
        let mut driver = PlaybackDriver::new();
        driver.scrub(0.5, 1.0);
        driver.play();
        driver.stop();
        assert_eq!(driver.playhead(), 0.0);
        assert_eq!(driver.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_set_range_fixes_bounds() {
        let mut driver = PlaybackDriver::new();
        driver.scrub(0.2, 4.0);
        driver.set_range(3.0, 9.0, true, 4.0);
        assert_eq!(driver.range(), PlaybackRange { enabled: true, start: 3.0, end: 4.0 });
        assert_eq!(driver.playhead(), 3.0);

        driver.set_range(2.0, 1.0, true, 4.0);
        assert_eq!((driver.range().start, driver.range().end), (1.0, 2.0));
        assert_eq!(driver.playhead(), 2.0);
    }
}
