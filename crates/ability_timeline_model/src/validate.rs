// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural validation of ability definitions.

use crate::ability::AbilityDefinition;
use crate::rules;
use std::fmt;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Advisory; baking proceeds unchanged or with a clamp
    Warning,
    /// The offending item is skipped on bake
    Error,
}

/// A problem found in an ability definition
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Severity
    pub severity: Severity,
    /// Location, e.g. `Slash/phases[1]/tracks[0]/keys[2]`
    pub path: String,
    /// Description
    pub message: String,
}

impl ValidationIssue {
    pub(crate) fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.path, self.message)
    }
}

/// Validate one ability.
///
/// Clip bounds are checked against [`crate::clip::Clip::duration`], so resolve
/// durations first for accurate results.
pub fn validate_ability(ability: &AbilityDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let root = if ability.id.is_empty() { "<unnamed>" } else { ability.id.name() };

    if ability.id.is_empty() {
        issues.push(ValidationIssue::error(root, "ability id is empty"));
    }
    if ability.cooldown < 0.0 {
        issues.push(ValidationIssue::warning(
            root,
            format!("negative cooldown {} clamped to 0", ability.cooldown),
        ));
    }

    for (p, phase) in ability.phases.iter().enumerate() {
        let phase_path = format!("{root}/phases[{p}]");
        if !phase.has_valid_duration() {
            issues.push(ValidationIssue::error(
                &phase_path,
                format!("phase duration {} is not finite and positive", phase.duration),
            ));
        }

        for (t, track) in phase.tracks.iter().enumerate() {
            let track_path = format!("{phase_path}/tracks[{t}]");
            for (k, key) in track.keys().iter().enumerate() {
                let key_path = format!("{track_path}/keys[{k}]");
                if !rules::can_add_key(track.track_type, key.key_type()) {
                    issues.push(ValidationIssue::error(
                        &key_path,
                        format!(
                            "{} track does not accept {} keys",
                            track.track_type.name(),
                            key.key_type().name()
                        ),
                    ));
                } else if !phase.contains_local(key.time) {
                    issues.push(ValidationIssue::warning(
                        &key_path,
                        format!("key time {} outside [0, {}]", key.time, phase.duration),
                    ));
                }
            }

            for (c, clip) in track.clips().iter().enumerate() {
                let clip_path = format!("{track_path}/clips[{c}]");
                if !rules::can_add_clip(track.track_type, clip.clip_type()) {
                    issues.push(ValidationIssue::error(
                        &clip_path,
                        format!(
                            "{} track does not accept {} clips",
                            track.track_type.name(),
                            clip.clip_type().name()
                        ),
                    ));
                    continue;
                }
                if clip.start < 0.0 {
                    issues.push(ValidationIssue::warning(
                        &clip_path,
                        format!("clip start {} is negative", clip.start),
                    ));
                }
                if clip.end() > phase.duration {
                    issues.push(ValidationIssue::warning(
                        &clip_path,
                        format!("clip ends at {} past phase end {}", clip.end(), phase.duration),
                    ));
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Clip, ClipKind};
    use crate::key::{Key, KeyType};
    use crate::phase::Phase;
    use crate::track::{Track, TrackType};

    #[test]
    fn test_clean_ability_has_no_issues() {
        let mut track = Track::new("Hits", TrackType::Hitbox);
        track.add_key(Key::of_type(0.5, KeyType::Hitbox)).unwrap();
        let ability = AbilityDefinition::new("Slash")
            .with_phase(Phase::new("Active", 1.0).with_track(track));

        assert!(validate_ability(&ability).is_empty());
    }

    #[test]
    fn test_reports_each_problem() {
        let mut track = Track::new("Anim", TrackType::Animation);
        track.add_key(Key::of_type(1.5, KeyType::AnimationEvent)).unwrap();
        track
            .add_clip(Clip::new(0.9, ClipKind::Animation { clip: "Swing".into() }))
            .unwrap();
        let ability = AbilityDefinition::new("")
            .with_cooldown(-1.0)
            .with_phase(Phase::new("Active", 1.0).with_track(track))
            .with_phase(Phase::new("Broken", 0.0));

        let issues = validate_ability(&ability);
        let errors = issues.iter().filter(|i| i.is_error()).count();
        let warnings = issues.len() - errors;

        // empty id, zero duration
        assert_eq!(errors, 2);
        // negative cooldown, key out of range, clip past phase end
        assert_eq!(warnings, 3);
        assert!(issues.iter().any(|i| i.path == "<unnamed>/phases[0]/tracks[0]/clips[0]"));
    }

    #[test]
    fn test_non_finite_duration_is_error() {
        let ability = AbilityDefinition::new("Endless")
            .with_phase(Phase::new("Hold", f32::INFINITY))
            .with_phase(Phase::new("Release", f32::NAN));

        let issues = validate_ability(&ability);
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 2);
        assert!(issues.iter().any(|i| i.path == "Endless/phases[0]"));
        assert!(issues.iter().any(|i| i.path == "Endless/phases[1]"));
    }

    #[test]
    fn test_display() {
        let issue = ValidationIssue::error("Slash/phases[0]", "phase duration 0 is not positive");
        assert_eq!(issue.to_string(), "error: Slash/phases[0]: phase duration 0 is not positive");
    }
}
