// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use crate::error::{Result, RuntimeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config file format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Defaults for footstep cues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootstepDefaults {
    /// Sound used when a footstep key names none
    pub fallback_sound: String,
    /// Volume used when a footstep key's volume is not positive
    pub volume: f32,
    /// Total pitch spread; a jitter seed of 0.5 maps to pitch 1.0
    pub pitch_jitter: f32,
}

impl Default for FootstepDefaults {
    fn default() -> Self {
        Self {
            fallback_sound: "Footstep".to_string(),
            volume: 0.6,
            pitch_jitter: 0.2,
        }
    }
}

/// Tunables of the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Config format version
    pub version: u32,
    /// Entity (or clip) count above which evaluation runs in parallel
    pub parallel_threshold: usize,
    /// Largest accepted tick delta; larger deltas are clamped
    pub max_dt: Option<f32>,
    /// Camera impulse duration when a key's is not positive
    pub camera_impulse_duration: f32,
    /// Footstep defaults
    pub footstep: FootstepDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            parallel_threshold: 64,
            max_dt: None,
            camera_impulse_duration: 0.2,
            footstep: FootstepDefaults::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: EngineConfig = ron::from_str(text)?;
        if config.version != CONFIG_FORMAT_VERSION {
            return Err(RuntimeError::ConfigVersion {
                found: config.version,
                expected: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::default().enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Clamp a tick delta into `[0, max_dt]`; invalid deltas become 0
    pub fn sanitize_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!("Ignoring invalid tick delta {dt}");
            return 0.0;
        }
        match self.max_dt {
            Some(max) if dt > max => {
                tracing::warn!("Clamping tick delta {dt} to {max}");
                max
            }
            _ => dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_ron_str("(parallel_threshold: 8)").unwrap();
        assert_eq!(config.parallel_threshold, 8);
        assert_eq!(config.footstep.fallback_sound, "Footstep");
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let err = EngineConfig::from_ron_str("(version: 99)").unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigVersion { found: 99, .. }));
        let err = EngineConfig::from_ron_str("(version: 0)").unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigVersion { found: 0, .. }));
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = EngineConfig::default();
        config.max_dt = Some(0.1);
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_sanitize_dt() {
        let mut config = EngineConfig::default();
        assert_eq!(config.sanitize_dt(-1.0), 0.0);
        assert_eq!(config.sanitize_dt(f32::NAN), 0.0);
        assert_eq!(config.sanitize_dt(1.5), 1.5);

        config.max_dt = Some(0.25);
        assert_eq!(config.sanitize_dt(1.0), 0.25);
        assert_eq!(config.sanitize_dt(0.016), 0.016);
    }
}
