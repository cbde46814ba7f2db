//! Section splitting
//!
//! Partitions the full document text into named raw blocks per the version
//! grammar. 1.2/2.0 documents use the fixed single-letter marker set
//! `~{V,W,C,P,O,A}` mapped to canonical names by first letter; 3.0
//! documents accept any alphabetic marker, parse the title line for a name
//! and an optional `|association` tag, and resolve the title through the
//! known-sections alias table. Unmatched 3.0 titles are kept verbatim.

use tracing::{debug, warn};

use crate::app::models::{ErrorRecord, Stage, Version};
use crate::app::services::version_resolver::title_marker_offsets;
use crate::config::KnownSections;

/// One raw section block in document order
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// Canonical lowercase name (or verbatim lowercased 3.0 title)
    pub name: String,
    /// 3.0 `title|association` tag
    pub association: Option<String>,
    /// Block text, title line included
    pub text: String,
}

pub struct SectionSplitter<'a> {
    known: &'a KnownSections,
}

impl<'a> SectionSplitter<'a> {
    pub fn new(known: &'a KnownSections) -> Self {
        Self { known }
    }

    /// Split the document into an ordered list of named raw blocks.
    /// A later block with the same resolved name replaces the earlier one.
    pub fn split(&self, text: &str, version: Version) -> Result<Vec<RawSection>, ErrorRecord> {
        let mut sections: Vec<RawSection> = Vec::new();
        for (start, end, letter) in block_bounds(text, version) {
            let block = &text[start..end];
            let raw = match version {
                Version::V1_2 | Version::V2_0 => self.v2_section(block, letter)?,
                Version::V3_0 => self.v3_section(block)?,
            };
            debug!(name = %raw.name, bytes = raw.text.len(), "split section");
            match sections.iter_mut().find(|s| s.name == raw.name) {
                Some(existing) => {
                    warn!(name = %raw.name, "duplicate section title, later block wins");
                    *existing = raw;
                }
                None => sections.push(raw),
            }
        }
        Ok(sections)
    }

    fn v2_section(&self, block: &str, letter: char) -> Result<RawSection, ErrorRecord> {
        // Fixed set was filtered by block_bounds; map by first letter
        let name = match letter.to_ascii_uppercase() {
            'V' => "version",
            'W' => "well",
            'C' => "curves",
            'P' => "parameters",
            'O' => "other",
            'A' => "data",
            other => {
                return Err(ErrorRecord::critical(
                    Stage::Split,
                    format!("unexpected section marker '~{other}'"),
                ));
            }
        };
        require_body(block)?;
        Ok(RawSection {
            name: name.to_string(),
            association: None,
            text: block.trim_end().to_string(),
        })
    }

    fn v3_section(&self, block: &str) -> Result<RawSection, ErrorRecord> {
        let title_end = require_body(block)?;
        let title_line = block[..title_end].trim();
        let (title, association) = parse_v3_title(title_line)?;

        let name = self
            .known
            .resolve_title(Version::V3_0, &title)
            .map(|canonical| canonical.to_string())
            // Unmatched titles are kept verbatim as their own section name
            .unwrap_or(title);

        Ok(RawSection {
            name,
            association,
            text: block.trim_end().to_string(),
        })
    }
}

/// Block boundaries `(start, end, marker_letter)` for the dialect's marker
/// set, in document order
fn block_bounds(text: &str, version: Version) -> Vec<(usize, usize, char)> {
    let accepted = |letter: char| {
        if version.is_v2_family() {
            matches!(letter.to_ascii_uppercase(), 'V' | 'W' | 'C' | 'P' | 'O' | 'A')
        } else {
            letter.is_ascii_alphabetic()
        }
    };
    let markers: Vec<(usize, char)> = title_marker_offsets(text)
        .into_iter()
        .filter(|(_, letter)| accepted(*letter))
        .collect();
    markers
        .iter()
        .enumerate()
        .map(|(i, &(start, letter))| {
            let end = markers
                .get(i + 1)
                .map(|&(next, _)| next)
                .unwrap_or(text.len());
            (start, end, letter)
        })
        .collect()
}

/// A block must contain a line break separating the title line from the
/// body; returns the title-line end offset
fn require_body(block: &str) -> Result<usize, ErrorRecord> {
    block.find('\n').ok_or_else(|| {
        ErrorRecord::critical(
            Stage::Split,
            "could not find the end of the title line for a section",
        )
    })
}

/// Parse a 3.0 title line `~Title | association` into a lowercased title
/// and optional association tag
fn parse_v3_title(title_line: &str) -> Result<(String, Option<String>), ErrorRecord> {
    let stripped = title_line.strip_prefix('~').ok_or_else(|| {
        ErrorRecord::critical(
            Stage::Split,
            format!("cannot parse title line '{title_line}': must begin with '~'"),
        )
    })?;

    let (title_part, association) = match stripped.split_once('|') {
        Some((title, tail)) => {
            let tag = tail.trim().split_whitespace().next();
            (title, tag.map(|t| t.to_lowercase()))
        }
        None => (stripped, None),
    };

    let title = title_part
        .trim()
        .split_whitespace()
        .next()
        .map(|t| t.to_lowercase())
        .ok_or_else(|| {
            ErrorRecord::critical(
                Stage::Split,
                format!("cannot parse title line '{title_line}': empty section title"),
            )
        })?;
    Ok((title, association))
}
