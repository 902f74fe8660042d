// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ability documents and the baked definition table.
//!
//! Authoring documents ([`AbilitySet`]) are RON or JSON. Baking validates
//! them, resolves clip durations, clamps out-of-range times, drops whatever
//! cannot be repaired and produces an immutable [`AbilityDb`] keyed by
//! [`AbilityId`]. The table can be stored in a versioned binary form.

use crate::ability::AbilityDefinition;
use crate::clip::{Clip, ClipKind, ResourceDurations};
use crate::error::{ModelError, Result};
use crate::hash::AbilityId;
use crate::key::Key;
use crate::phase::Phase;
use crate::track::Track;
use crate::validate::{validate_ability, ValidationIssue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the binary table format
pub const BAKED_FORMAT_VERSION: u32 = 1;

/// Document format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.ron`
    Ron,
    /// `.json`
    Json,
    /// `.bin` baked table
    Baked,
}

impl DocumentFormat {
    /// Detect the format of a path
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Ok(Self::Ron),
            Some("json") => Ok(Self::Json),
            Some("bin") => Ok(Self::Baked),
            _ => Err(ModelError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// An authoring document holding abilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilitySet {
    /// Abilities in authored order
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
}

impl AbilitySet {
    /// Parse a RON document
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a RON or JSON document
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let set = match DocumentFormat::from_path(path)? {
            DocumentFormat::Ron => Self::from_ron_str(&text)?,
            DocumentFormat::Json => Self::from_json_str(&text)?,
            DocumentFormat::Baked => {
                return Err(ModelError::UnsupportedFormat(path.display().to_string()))
            }
        };
        tracing::info!("Loaded {} abilities from {}", set.abilities.len(), path.display());
        Ok(set)
    }

    /// Save as RON or JSON, by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = match DocumentFormat::from_path(path)? {
            DocumentFormat::Ron => self.to_ron_string()?,
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Baked => {
                return Err(ModelError::UnsupportedFormat(path.display().to_string()))
            }
        };
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Location of a key inside the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyAddress {
    /// Ability
    pub ability: AbilityId,
    /// Phase index
    pub phase: usize,
    /// Track index
    pub track: usize,
    /// Key index
    pub key: usize,
}

/// Location of a clip inside the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipAddress {
    /// Ability
    pub ability: AbilityId,
    /// Phase index
    pub phase: usize,
    /// Track index
    pub track: usize,
    /// Clip index
    pub clip: usize,
}

/// Output of a bake
#[derive(Debug)]
pub struct BakeOutput {
    /// The baked table
    pub db: AbilityDb,
    /// Everything found along the way
    pub issues: Vec<ValidationIssue>,
}

impl BakeOutput {
    /// Number of error-level issues
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }
}

#[derive(Serialize, Deserialize)]
struct BakedTable {
    version: u32,
    abilities: Vec<AbilityDefinition>,
}

/// Immutable table of baked abilities, addressed by id hash
#[derive(Debug, Clone, Default)]
pub struct AbilityDb {
    abilities: IndexMap<AbilityId, AbilityDefinition>,
}

impl AbilityDb {
    /// Bake an authoring set.
    ///
    /// Abilities with an empty or duplicate id or a phase duration that is
    /// not finite and positive are skipped. Incompatible keys and clips are dropped, key
    /// times are clamped into their phase (or clip) and clip durations are
    /// resolved, falling back when a resource is missing.
    pub fn bake(set: &AbilitySet, resources: &dyn ResourceDurations) -> BakeOutput {
        let mut abilities = IndexMap::new();
        let mut issues = Vec::new();

        for source in &set.abilities {
            let mut ability = source.clone();
            let mut ability_issues = Vec::new();
            for track in ability.phases.iter_mut().flat_map(|p| p.tracks.iter_mut()) {
                resolve_track(track, resources, ability.id.name(), &mut ability_issues);
            }
            ability_issues.extend(validate_ability(&ability));

            let fatal =
                ability.id.is_empty() || ability.phases.iter().any(|p| !p.has_valid_duration());
            let id = ability.ability_id();
            if !fatal && abilities.contains_key(&id) {
                ability_issues.push(ValidationIssue::error(
                    ability.id.name(),
                    format!("duplicate ability id {id}"),
                ));
            }

            for issue in &ability_issues {
                tracing::warn!("{issue}");
            }
            let skip = fatal || abilities.contains_key(&id);
            issues.extend(ability_issues);
            if skip {
                continue;
            }

            ability.cooldown = ability.cooldown.max(0.0);
            for phase in &mut ability.phases {
                repair_phase(phase);
            }
            abilities.insert(id, ability);
        }

        tracing::info!(
            "Baked {} of {} abilities ({} issues)",
            abilities.len(),
            set.abilities.len(),
            issues.len()
        );
        BakeOutput {
            db: Self { abilities },
            issues,
        }
    }

    /// Look up an ability
    pub fn get(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        self.abilities.get(&id)
    }

    /// Look up an ability, failing with [`ModelError::UnknownAbility`]
    pub fn resolve(&self, id: AbilityId) -> Result<&AbilityDefinition> {
        self.get(id).ok_or(ModelError::UnknownAbility(id))
    }

    /// Whether an ability exists
    pub fn contains(&self, id: AbilityId) -> bool {
        self.abilities.contains_key(&id)
    }

    /// Number of abilities
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Iterate abilities in bake order
    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, &AbilityDefinition)> {
        self.abilities.iter().map(|(id, ability)| (*id, ability))
    }

    /// Resolve a track
    pub fn track(&self, ability: AbilityId, phase: usize, track: usize) -> Option<&Track> {
        self.get(ability)?.phases.get(phase)?.tracks.get(track)
    }

    /// Resolve a key address
    pub fn key(&self, address: &KeyAddress) -> Option<&Key> {
        self.track(address.ability, address.phase, address.track)?
            .keys()
            .get(address.key)
    }

    /// Resolve a clip address
    pub fn clip(&self, address: &ClipAddress) -> Option<&Clip> {
        self.track(address.ability, address.phase, address.track)?
            .clips()
            .get(address.clip)
    }

    /// Encode the table in the versioned binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let table = BakedTable {
            version: BAKED_FORMAT_VERSION,
            abilities: self.abilities.values().cloned().collect(),
        };
        Ok(bincode::serialize(&table)?)
    }

    /// Decode a table written by [`AbilityDb::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let table: BakedTable = bincode::deserialize(bytes)?;
        if table.version != BAKED_FORMAT_VERSION {
            return Err(ModelError::VersionMismatch {
                found: table.version,
                expected: BAKED_FORMAT_VERSION,
            });
        }
        let abilities = table
            .abilities
            .into_iter()
            .map(|ability| (ability.ability_id(), ability))
            .collect();
        Ok(Self { abilities })
    }

    /// Write the binary table to disk
    pub fn save_baked(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a binary table from disk
    pub fn load_baked(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let db = Self::from_bytes(&bytes)?;
        tracing::info!("Loaded baked table with {} abilities from {}", db.len(), path.display());
        Ok(db)
    }

    /// Load a table from any supported document, baking authoring formats
    pub fn load(path: &Path, resources: &dyn ResourceDurations) -> Result<BakeOutput> {
        match DocumentFormat::from_path(path)? {
            DocumentFormat::Baked => Ok(BakeOutput {
                db: Self::load_baked(path)?,
                issues: Vec::new(),
            }),
            DocumentFormat::Ron | DocumentFormat::Json => {
                Ok(Self::bake(&AbilitySet::load(path)?, resources))
            }
        }
    }
}

fn resolve_track(
    track: &mut Track,
    resources: &dyn ResourceDurations,
    ability: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let track_name = track.name.clone();
    for clip in track.clips_mut() {
        let found = clip.resolve_duration(resources);
        if !found && !matches!(clip.kind, ClipKind::Custom { .. }) {
            let resource = clip.kind.resource().map(|r| r.name().to_string()).unwrap_or_default();
            issues.push(ValidationIssue::warning(
                format!("{ability}/{track_name}"),
                format!("missing resource '{resource}', using fallback duration"),
            ));
        }
    }
}

fn repair_phase(phase: &mut Phase) {
    let duration = phase.duration;
    for track in &mut phase.tracks {
        track.retain_compatible();
        for key in track.keys_mut() {
            key.time = key.time.clamp(0.0, duration);
        }
        track.sort_keys();
        for clip in track.clips_mut() {
            clip.start = clip.start.max(0.0);
            let clip_duration = clip.duration();
            for key in &mut clip.keys {
                key.time = key.time.clamp(0.0, clip_duration);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{NoResources, ResourceCatalog, FALLBACK_CLIP_DURATION};
    use crate::key::KeyType;
    use crate::track::TrackType;

    const SAMPLE: &str = r#"(
        abilities: [
            (
                id: "Slash",
                cooldown: 1.5,
                phases: [
                    (
                        name: "Active",
                        duration: 1.0,
                        tracks: [
                            (
                                track_type: Hitbox,
                                keys: [
                                    (time: 0.5, event: "SlashHit", payload: Hitbox((damage: 25.0))),
                                    (time: 0.6, payload: Footstep(())),
                                    (time: 1.4, payload: Hitbox(())),
                                ],
                            ),
                            (
                                track_type: Animation,
                                clips: [
                                    (start: 0.0, kind: Animation(clip: "Swing")),
                                ],
                            ),
                        ],
                    ),
                ],
            ),
            (id: "Slash", phases: [(duration: 1.0)]),
            (id: "Broken", phases: [(duration: 0.0)]),
        ],
    )"#;

    fn catalog() -> ResourceCatalog {
        let mut catalog = ResourceCatalog::default();
        catalog.animations.insert("Swing".to_string(), 0.75);
        catalog
    }

    #[test]
    fn test_bake_repairs_and_skips() {
        let set = AbilitySet::from_ron_str(SAMPLE).unwrap();
        let output = AbilityDb::bake(&set, &catalog());

        assert_eq!(output.db.len(), 1);
        // incompatible footstep, duplicate id, zero duration
        assert_eq!(output.error_count(), 3);

        let slash = output.db.resolve(AbilityId::from_name("Slash")).unwrap();
        let hits = &slash.phases[0].tracks[0];
        assert_eq!(hits.keys().len(), 2);
        assert!(hits.keys().iter().all(|k| k.key_type() == KeyType::Hitbox));
        assert_eq!(hits.keys()[1].time, 1.0);

        let swing = &slash.phases[0].tracks[1].clips()[0];
        assert!((swing.duration() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_missing_resource_warns_and_falls_back() {
        let set = AbilitySet::from_ron_str(SAMPLE).unwrap();
        let output = AbilityDb::bake(&set, &NoResources);

        assert!(output.issues.iter().any(|i| i.message.contains("missing resource 'Swing'")));
        let slash = output.db.resolve(AbilityId::from_name("Slash")).unwrap();
        assert_eq!(slash.phases[0].tracks[1].clips()[0].duration(), FALLBACK_CLIP_DURATION);
    }

    #[test]
    fn test_unknown_ability() {
        let db = AbilityDb::default();
        let err = db.resolve(AbilityId::from_name("Nope")).unwrap_err();
        assert!(matches!(err, ModelError::UnknownAbility(_)));
    }

    #[test]
    fn test_addresses_resolve() {
        let set = AbilitySet::from_ron_str(SAMPLE).unwrap();
        let db = AbilityDb::bake(&set, &catalog()).db;
        let ability = AbilityId::from_name("Slash");

        let key = db.key(&KeyAddress { ability, phase: 0, track: 0, key: 0 }).unwrap();
        assert_eq!(key.event.name(), "SlashHit");
        assert!(db.clip(&ClipAddress { ability, phase: 0, track: 1, clip: 0 }).is_some());
        assert!(db.clip(&ClipAddress { ability, phase: 0, track: 1, clip: 1 }).is_none());
        assert!(db.key(&KeyAddress { ability, phase: 3, track: 0, key: 0 }).is_none());
    }

    #[test]
    fn test_binary_table_keeps_resolved_durations() {
        let set = AbilitySet::from_ron_str(SAMPLE).unwrap();
        let db = AbilityDb::bake(&set, &catalog()).db;

        let loaded = AbilityDb::from_bytes(&db.to_bytes().unwrap()).unwrap();
        let slash = loaded.resolve(AbilityId::from_name("Slash")).unwrap();
        assert!((slash.phases[0].tracks[1].clips()[0].duration() - 0.75).abs() < 1e-6);
        assert_eq!(slash.cooldown, 1.5);
    }

    #[test]
    fn test_binary_version_checked() {
        let table = BakedTable { version: 99, abilities: Vec::new() };
        let bytes = bincode::serialize(&table).unwrap();
        let err = AbilityDb::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ModelError::VersionMismatch { found: 99, .. }));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{"abilities": [{"id": "Dash", "cooldown": 3.0, "phases": [{"duration": 0.4}]}]}"#;
        let set = AbilitySet::from_json_str(json).unwrap();
        let db = AbilityDb::bake(&set, &NoResources).db;
        assert!(db.contains(AbilityId::from_name("Dash")));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.ron")).unwrap(), DocumentFormat::Ron);
        assert_eq!(DocumentFormat::from_path(Path::new("a.bin")).unwrap(), DocumentFormat::Baked);
        assert!(DocumentFormat::from_path(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_non_finite_phase_duration_skipped() {
        let text = r#"(
            abilities: [
                (id: "Nan", phases: [(duration: NaN, tracks: [(track_type: Hitbox, keys: [(time: 0.5, payload: Hitbox(()))])])]),
                (id: "Forever", phases: [(duration: 0.2), (duration: inf)]),
                (id: "Ok", phases: [(duration: 0.5)]),
            ],
        )"#;
        let set = AbilitySet::from_ron_str(text).unwrap();
        let output = AbilityDb::bake(&set, &NoResources);

        assert_eq!(output.db.len(), 1);
        assert_eq!(output.error_count(), 2);
        assert!(output.db.resolve(AbilityId::from_name("Nan")).is_err());
        assert!(output.db.resolve(AbilityId::from_name("Forever")).is_err());
        assert!(output.db.resolve(AbilityId::from_name("Ok")).is_ok());
    }

    #[test]
    fn test_non_finite_clip_length_falls_back() {
        let mut track = Track::new("Custom", TrackType::Custom);
        track
            .add_clip(
                Clip::new(0.0, ClipKind::Custom { length: f32::INFINITY, params: [0.0; 4] })
                    .with_key(Key::of_type(3.0, KeyType::Custom)),
            )
            .unwrap();
        let ability = AbilityDefinition::new("Loop").with_phase(Phase::new("Active", 1.0).with_track(track));
        let output = AbilityDb::bake(&AbilitySet { abilities: vec![ability] }, &NoResources);

        let baked = output.db.resolve(AbilityId::from_name("Loop")).unwrap();
        let clip = &baked.phases[0].tracks[0].clips()[0];
        assert_eq!(clip.duration(), FALLBACK_CLIP_DURATION);
        assert_eq!(clip.keys[0].time, FALLBACK_CLIP_DURATION);
    }

    #[test]
    fn test_ron_round_trip_preserves_set() {
        let set = AbilitySet::from_ron_str(SAMPLE).unwrap();
        let text = set.to_ron_string().unwrap();
        assert_eq!(AbilitySet::from_ron_str(&text).unwrap(), set);
    }
}
