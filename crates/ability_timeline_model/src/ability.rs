// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability definitions.

use crate::hash::{AbilityId, NameRef};
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// Smallest total duration reported for an ability
pub const MIN_TOTAL_DURATION: f32 = 0.001;

/// Kind of editor marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Free-form note
    #[default]
    Note,
    /// Point after which the ability may be cancelled
    Cancel,
    /// Window for chaining into a follow-up
    Combo,
    /// Moment of impact
    Impact,
}

/// A labelled point on the ability timeline (editor-facing only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Global time
    pub time: f32,
    /// Marker kind
    #[serde(default)]
    pub kind: MarkerKind,
    /// Label
    #[serde(default)]
    pub label: String,
}

/// Phase under a global time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseCursor {
    /// Phase index
    pub index: usize,
    /// Global start time of the phase
    pub start: f32,
    /// Time local to the phase
    pub local: f32,
}

/// A castable behaviour made of timed phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Stable string id
    pub id: NameRef,
    /// Display name
    #[serde(default)]
    pub display_name: String,
    /// Cooldown in seconds
    #[serde(default)]
    pub cooldown: f32,
    /// Phases in execution order
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Editor markers, sorted by time
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl AbilityDefinition {
    /// Create a new ability
    pub fn new(id: impl Into<NameRef>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            cooldown: 0.0,
            phases: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Set the cooldown
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Append a phase
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Hashed id
    pub fn ability_id(&self) -> AbilityId {
        AbilityId(self.id.hash())
    }

    /// Sum of all phase durations, never below [`MIN_TOTAL_DURATION`]
    pub fn total_duration(&self) -> f32 {
        self.phases
            .iter()
            .map(|p| p.duration)
            .sum::<f32>()
            .max(MIN_TOTAL_DURATION)
    }

    /// Global start time of a phase
    pub fn phase_start_offset(&self, index: usize) -> f32 {
        self.phases.iter().take(index).map(|p| p.duration).sum()
    }

    /// Phase containing global time `t`, using `start <= t < end`
    pub fn locate(&self, t: f32) -> Option<PhaseCursor> {
        let mut start = 0.0;
        for (index, phase) in self.phases.iter().enumerate() {
            let end = start + phase.duration;
            if t >= start && t < end {
                return Some(PhaseCursor { index, start, local: t - start });
            }
            start = end;
        }
        None
    }

    /// First enabled phase at or after `from`
    pub fn next_enabled_phase(&self, from: usize) -> Option<usize> {
        self.phases
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, p)| p.enabled)
            .map(|(i, _)| i)
    }

    /// Add a marker, keeping markers sorted
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
        self.markers.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Convert time to a frame number
    pub fn time_to_frame(time: f32, fps: f32) -> u32 {
        (time * fps).round().max(0.0) as u32
    }

    /// Convert a frame number to time
    pub fn frame_to_time(frame: u32, fps: f32) -> f32 {
        frame as f32 / fps
    }
}
