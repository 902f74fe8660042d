// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview mode.
//!
//! While preview is active every update re-samples the ability at the
//! playhead and diffs effect clips against the previous frame.

use crate::error::{PreviewError, Result};
use crate::sampler::{sample_ability, PreviewClipEvent, PreviewClipTracker, PreviewFrame};
use crate::state::TimelineState;

/// Result of one preview update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewUpdate {
    /// Sample at the playhead
    pub frame: PreviewFrame,
    /// Effect clip lifecycle changes since the last update
    pub events: Vec<PreviewClipEvent>,
}

/// Timeline state plus preview mode
#[derive(Debug, Default)]
pub struct PreviewSession {
    state: TimelineState,
    tracker: PreviewClipTracker,
    active: bool,
}

impl PreviewSession {
    /// Wrap a timeline state
    pub fn new(state: TimelineState) -> Self {
        Self {
            state,
            tracker: PreviewClipTracker::new(),
            active: false,
        }
    }

    /// Timeline state
    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Mutable timeline state
    pub fn state_mut(&mut self) -> &mut TimelineState {
        &mut self.state
    }

    /// Whether preview mode is on
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Live effect clip instances
    pub fn live_clips(&self) -> usize {
        self.tracker.len()
    }

    /// Turn preview on and sample the current playhead
    pub fn enter_preview(&mut self) -> Result<PreviewUpdate> {
        if self.state.ability().is_none() {
            return Err(PreviewError::NoAbility);
        }
        if !self.active {
            tracing::debug!("Entering preview");
            self.active = true;
        }
        self.sample().ok_or(PreviewError::NoAbility)
    }

    /// Turn preview off, despawning every effect instance
    pub fn exit_preview(&mut self) -> Vec<PreviewClipEvent> {
        if !self.active {
            return Vec::new();
        }
        tracing::debug!("Exiting preview");
        self.active = false;
        self.tracker.clear()
    }

    /// Advance playback and, in preview, re-sample at the playhead
    pub fn update(&mut self, dt: f32) -> Option<PreviewUpdate> {
        self.state.update(dt);
        self.sample()
    }

    /// Re-sample at the playhead without advancing, e.g. after a scrub
    pub fn sample(&mut self) -> Option<PreviewUpdate> {
        if !self.active {
            return None;
        }
        let Some(ability) = self.state.ability() else {
            let events = self.exit_preview();
            return Some(PreviewUpdate {
                frame: PreviewFrame::default(),
                events,
            });
        };
        let frame = sample_ability(ability, self.state.playback().playhead());
        let events = self.tracker.update(&frame);
        Some(PreviewUpdate { frame, events })
    }
}
