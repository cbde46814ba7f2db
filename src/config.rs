//! Known-sections configuration table.
//!
//! The table describes, per version and canonical section name, whether the
//! section is required, whether it carries header rows or a data matrix,
//! and which title aliases map onto it. It ships embedded in the binary,
//! is loaded exactly once, and is never mutated afterwards; the splitter,
//! validator and orchestrator borrow it read-only.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::models::{SectionKind, Version};
use crate::error::{LasError, Result};

/// Embedded default table
const EMBEDDED_TABLE: &str = include_str!("known_sections.json");

static EMBEDDED: Lazy<KnownSections> = Lazy::new(|| {
    KnownSections::from_json(EMBEDDED_TABLE).expect("embedded known-sections table is valid")
});

/// Payload kind declared for a known section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownKind {
    Header,
    Data,
}

impl From<KnownKind> for SectionKind {
    fn from(kind: KnownKind) -> Self {
        match kind {
            KnownKind::Header => SectionKind::Header,
            KnownKind::Data => SectionKind::Data,
        }
    }
}

/// Per-section entry in the known-sections table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub required: bool,
    pub kind: KnownKind,
    /// Title aliases, stored lowercase; titles are lowercased before lookup
    /// so matching is case-insensitive by construction
    #[serde(default)]
    pub titles: Vec<String>,
}

/// The full table, keyed by version then canonical section name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownSections {
    versions: HashMap<String, HashMap<String, SectionSpec>>,
}

impl KnownSections {
    /// Process-wide embedded table
    pub fn embedded() -> &'static KnownSections {
        &EMBEDDED
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let table: KnownSections = serde_json::from_str(json)?;
        for version in crate::constants::KNOWN_VERSIONS {
            if !table.versions.contains_key(*version) {
                return Err(LasError::InvalidSectionsTable {
                    reason: format!("missing entry for version {version}"),
                });
            }
        }
        Ok(table)
    }

    /// Load an override table from a file
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading known-sections table from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn for_version(&self, version: Version) -> &HashMap<String, SectionSpec> {
        // Presence is checked at load time
        &self.versions[version.as_str()]
    }

    pub fn spec(&self, version: Version, name: &str) -> Option<&SectionSpec> {
        self.for_version(version).get(name)
    }

    pub fn is_required(&self, version: Version, name: &str) -> bool {
        self.spec(version, name).is_some_and(|spec| spec.required)
    }

    /// Declared payload kind for a canonical section name
    pub fn kind_of(&self, version: Version, name: &str) -> Option<SectionKind> {
        self.spec(version, name).map(|spec| spec.kind.into())
    }

    /// Canonical names of required sections for a version
    pub fn required_names(&self, version: Version) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .for_version(version)
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Match an extracted (already lowercased) title against exact known
    /// section names first, then against each known section's alias list
    pub fn resolve_title<'a>(&'a self, version: Version, title: &str) -> Option<&'a str> {
        let sections = self.for_version(version);
        if let Some((name, _)) = sections.get_key_value(title) {
            return Some(name.as_str());
        }
        sections
            .iter()
            .find(|(_, spec)| spec.titles.iter().any(|alias| alias == title))
            .map(|(name, _)| name.as_str())
    }
}
