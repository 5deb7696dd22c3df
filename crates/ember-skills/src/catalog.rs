//! Skill catalog: loads [`SkillDefinition`]s from a RON manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ember_core::{CharacterClass, SkillId};
use serde::Deserialize;
use thiserror::Error;

use crate::{LevelScaling, SkillCategory, SkillDefinition, SkillGate, SkillTuning};

/// Catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../assets/skills.ron");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error reading the manifest file.
    #[error("failed to read skill catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// RON deserialization error.
    #[error("skill catalog parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Two entries share an id.
    #[error("duplicate skill id {0}")]
    Duplicate(SkillId),

    /// An entry is internally inconsistent.
    #[error("invalid definition for {skill}: {reason}")]
    Invalid { skill: SkillId, reason: String },
}

// ---------------------------------------------------------------------------
// RON manifest types
// ---------------------------------------------------------------------------

/// Top-level RON manifest.
#[derive(Deserialize)]
struct CatalogManifest {
    skills: Vec<SkillEntry>,
}

/// A single skill entry in the RON manifest.
#[derive(Deserialize)]
struct SkillEntry {
    id: u32,
    name: String,
    category: SkillCategory,
    #[serde(default)]
    passive: bool,
    #[serde(default)]
    class: Option<CharacterClass>,
    #[serde(default = "default_min_level")]
    min_level: u32,
    base_cooldown_ms: u64,
    max_level: u32,
    scaling: Vec<LevelScaling>,
    #[serde(default)]
    xp_thresholds: Vec<u32>,
    #[serde(default)]
    xp_per_cast: u32,
    #[serde(default)]
    xp_per_target: u32,
    #[serde(default)]
    tuning: SkillTuning,
}

fn default_min_level() -> u32 {
    1
}

impl SkillEntry {
    fn into_definition(self) -> Result<SkillDefinition, CatalogError> {
        let id = SkillId(self.id);
        let invalid = |reason: String| CatalogError::Invalid { skill: id, reason };

        if self.max_level == 0 {
            return Err(invalid("max_level must be at least 1".into()));
        }
        if self.scaling.len() != self.max_level as usize {
            return Err(invalid(format!(
                "expected {} scaling rows, found {}",
                self.max_level,
                self.scaling.len()
            )));
        }
        if self.xp_thresholds.len() + 1 != self.max_level as usize {
            return Err(invalid(format!(
                "expected {} xp thresholds, found {}",
                self.max_level - 1,
                self.xp_thresholds.len()
            )));
        }
        if self.xp_thresholds.contains(&0) {
            return Err(invalid("xp thresholds must be positive".into()));
        }
        if let Some(row) = self.scaling.iter().find(|row| row.cooldown < 0.0) {
            return Err(invalid(format!(
                "negative cooldown multiplier {}",
                row.cooldown
            )));
        }

        Ok(SkillDefinition {
            id,
            name: self.name,
            category: self.category,
            passive: self.passive,
            gate: SkillGate {
                class: self.class,
                min_level: self.min_level,
            },
            base_cooldown: Duration::from_millis(self.base_cooldown_ms),
            max_level: self.max_level,
            scaling: self.scaling,
            xp_thresholds: self.xp_thresholds,
            xp_per_cast: self.xp_per_cast,
            xp_per_target: self.xp_per_target,
            tuning: self.tuning,
        })
    }
}

// ---------------------------------------------------------------------------
// SkillCatalog
// ---------------------------------------------------------------------------

/// Immutable id → definition lookup, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    definitions: BTreeMap<SkillId, SkillDefinition>,
}

impl SkillCatalog {
    /// The catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded manifest is broken.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_ron_str(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a RON file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on I/O, parse, or validation failures.
    pub fn from_ron(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Loads the file at `path`, or the built-in catalog when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on I/O, parse, or validation failures.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_ron(path),
            None => Self::builtin(),
        }
    }

    /// Parses and validates a RON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on parse or validation failures.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, CatalogError> {
        let manifest: CatalogManifest = ron::from_str(ron_str)?;
        let mut definitions = BTreeMap::new();
        for entry in manifest.skills {
            let definition = entry.into_definition()?;
            let id = definition.id;
            if definitions.insert(id, definition).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        tracing::debug!(skills = definitions.len(), "skill catalog loaded");
        Ok(Self { definitions })
    }

    /// Builds a catalog from already-constructed definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] if two definitions share an id.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = SkillDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut definitions = BTreeMap::new();
        for definition in defs {
            let id = definition.id;
            if definitions.insert(id, definition).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        Ok(Self { definitions })
    }

    /// Definition of `id`, if known.
    pub fn get(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.definitions.get(&id)
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.definitions.contains_key(&id)
    }

    /// Definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.definitions.values()
    }

    /// Looks a definition up by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&SkillDefinition> {
        self.definitions.values().find(|def| def.name == name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
