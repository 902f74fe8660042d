// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequential ability phases.

use crate::track::{Track, TrackId};
use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// A sequential segment of an ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase name
    #[serde(default)]
    pub name: String,
    /// Duration in seconds
    pub duration: f32,
    /// Disabled phases are skipped
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Tracks in evaluation order
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Phase {
    /// Create a new phase
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            enabled: true,
            tracks: Vec::new(),
        }
    }

    /// Add a track (builder)
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Add a track, returning its index
    pub fn add_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    /// Remove a track by id
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id == track_id)?;
        Some(self.tracks.remove(index))
    }

    /// Whether any track is soloed
    pub fn has_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    /// Whether the track at `index` should play.
    ///
    /// Disabled and muted tracks never play; once any track is soloed only
    /// soloed tracks play.
    pub fn is_track_audible(&self, index: usize) -> bool {
        let Some(track) = self.tracks.get(index) else {
            return false;
        };
        track.enabled && !track.muted && (!self.has_solo() || track.solo)
    }

    /// Audible tracks with their indices, in evaluation order
    pub fn audible_tracks(&self) -> impl Iterator<Item = (usize, &Track)> {
        let any_solo = self.has_solo();
        self.tracks
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.enabled && !t.muted && (!any_solo || t.solo))
    }

    /// Whether the duration is finite and positive
    pub fn has_valid_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Whether local time `t` lies in `[0, duration]`
    pub fn contains_local(&self, t: f32) -> bool {
        (0.0..=self.duration).contains(&t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackType;

    fn phase() -> Phase {
        Phase::new("Active", 1.0)
            .with_track(Track::new("Hits", TrackType::Hitbox))
            .with_track(Track::new("Anim", TrackType::Animation))
            .with_track(Track::new("Sfx", TrackType::Sfx))
    }

    #[test]
    fn test_all_tracks_audible_by_default() {
        assert_eq!(phase().audible_tracks().count(), 3);
    }

    #[test]
    fn test_muted_and_disabled_tracks_silent() {
        let mut phase = phase();
        phase.tracks[0].muted = true;
        phase.tracks[2].enabled = false;

        let audible: Vec<usize> = phase.audible_tracks().map(|(i, _)| i).collect();
        assert_eq!(audible, vec![1]);
        assert!(!phase.is_track_audible(0));
    }

    #[test]
    fn test_solo_silences_others() {
        let mut phase = phase();
        phase.tracks[2].solo = true;

        let audible: Vec<usize> = phase.audible_tracks().map(|(i, _)| i).collect();
        assert_eq!(audible, vec![2]);
        assert!(phase.is_track_audible(2));
        assert!(!phase.is_track_audible(1));
    }

    #[test]
    fn test_muted_solo_track_stays_silent() {
        let mut phase = phase();
        phase.tracks[1].solo = true;
        phase.tracks[1].muted = true;
        assert_eq!(phase.audible_tracks().count(), 0);
    }
}
