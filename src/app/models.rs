//! Core data model for parsed LAS documents
//!
//! Everything the pipeline produces is plain data: parsed header fields,
//! numeric matrices, sections, and classified error records. Optional
//! facts are explicit `Option` fields, never implied by absence.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DATA_SUFFIX, DEFINITION_SUFFIX, IDENTIFIER_MNEMONICS};

// =============================================================================
// Version
// =============================================================================

/// LAS grammar dialect, immutable once resolved for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V1_2,
    V2_0,
    V3_0,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1_2 => "1.2",
            Version::V2_0 => "2.0",
            Version::V3_0 => "3.0",
        }
    }

    /// Whether this dialect uses the fixed single-letter section markers
    pub fn is_v2_family(&self) -> bool {
        matches!(self, Version::V1_2 | Version::V2_0)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.2" => Ok(Version::V1_2),
            "2.0" => Ok(Version::V2_0),
            "3.0" => Ok(Version::V3_0),
            other => Err(format!(
                "unknown version '{other}', must be '1.2', '2.0', or '3.0'"
            )),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Delimiter
// =============================================================================

/// Data-section delimiter declared by the DLM mnemonic (3.0) or implied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Space,
    Comma,
    Tab,
}

impl DelimiterKind {
    pub fn as_char(&self) -> char {
        match self {
            DelimiterKind::Space => ' ',
            DelimiterKind::Comma => ',',
            DelimiterKind::Tab => '\t',
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            DelimiterKind::Space => "SPACE",
            DelimiterKind::Comma => "COMMA",
            DelimiterKind::Tab => "TAB",
        }
    }

    /// Resolve a DLM tag or literal delimiter character. Tags are matched
    /// case-insensitively; the empty string resolves to `None` (whitespace
    /// splitting). Unrecognized input returns `Err` with the offending text.
    pub fn from_tag(tag: &str) -> Result<Option<DelimiterKind>, String> {
        match tag.trim().to_uppercase().as_str() {
            "" => Ok(None),
            "SPACE" | " " => Ok(Some(DelimiterKind::Space)),
            "COMMA" | "," => Ok(Some(DelimiterKind::Comma)),
            "TAB" | "\t" => Ok(Some(DelimiterKind::Tab)),
            _ => Err(tag.trim().to_string()),
        }
    }
}

/// Resolved version-section facts that drive the rest of the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VersionInfo {
    pub version: Version,
    pub wrap: bool,
    /// Absent only when the dialect allows it (3.0 with an empty DLM)
    pub delimiter: Option<DelimiterKind>,
}

// =============================================================================
// Errors as data
// =============================================================================

/// Error severity: critical errors compromise document integrity, minor
/// errors are recorded for later inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Minor,
}

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    Read,
    Version,
    Split,
    Parse,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Open => "open",
            Stage::Read => "read",
            Stage::Version => "version",
            Stage::Split => "split",
            Stage::Parse => "parse",
            Stage::Validate => "validate",
        };
        f.write_str(s)
    }
}

/// A single classified pipeline error
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub severity: Severity,
    pub stage: Stage,
    pub section: Option<String>,
    pub message: String,
}

impl ErrorRecord {
    pub fn critical(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            stage,
            section: None,
            message: message.into(),
        }
    }

    pub fn minor(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Minor,
            stage,
            section: None,
            message: message.into(),
        }
    }

    pub fn for_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Critical => "critical",
            Severity::Minor => "minor",
        };
        match &self.section {
            Some(section) => write!(f, "[{sev}/{}] {}: {}", self.stage, section, self.message),
            None => write!(f, "[{sev}/{}] {}", self.stage, self.message),
        }
    }
}

// =============================================================================
// Header fields
// =============================================================================

/// One parsed header-section line
///
/// Mnemonic uniqueness is not guaranteed; duplicates are a recognized
/// condition resolved later by the congruency pass. Empty-string fields are
/// normalized to `None` at parse time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderField {
    pub mnemonic: Option<String>,
    pub unit: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    /// 3.0 only: brace-delimited format descriptor
    pub format: Option<String>,
    /// 3.0 only: pipe-delimited association list
    pub associations: Option<String>,
    /// Attached when the line failed the header grammar
    pub error: Option<ErrorRecord>,
}

impl HeaderField {
    /// Case-insensitive mnemonic comparison
    pub fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.mnemonic
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(mnemonic))
    }
}

// =============================================================================
// Data matrix
// =============================================================================

/// Row-major numeric data block
///
/// Missing or non-numeric cells are carried as `f64::NAN` sentinels rather
/// than failing the row. Ragged rows are padded with the sentinel up to the
/// matrix width (or truncated when wider) and each contributes an entry to
/// `read_errors`.
#[derive(Debug, Clone, Default)]
pub struct DataMatrix {
    pub rows: Vec<Vec<f64>>,
    /// Assigned by the congruency pass when curve definitions line up
    pub column_labels: Option<Vec<String>>,
    pub column_count: usize,
    /// Descriptive entries for rows that failed full parsing
    pub read_errors: Vec<String>,
}

impl DataMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// NaN sentinels must compare equal so two parses of the same input produce
// structurally equal matrices.
impl PartialEq for DataMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.column_labels == other.column_labels
            && self.column_count == other.column_count
            && self.read_errors == other.read_errors
            && self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| {
                    a.len() == b.len()
                        && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
                })
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Section payload kind; `Unknown` resolves to `Header` or `Data` after a
/// best-effort trial parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    Data,
    Unknown,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::Data => "data",
            SectionKind::Unknown => "unknown",
        }
    }
}

/// One named raw section block and its parsed artifacts
///
/// A section is never dropped after being added; a failed section is
/// retained with its errors attached so partial failures stay inspectable.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Canonical lowercase name
    pub name: String,
    pub kind: SectionKind,
    pub raw_text: String,
    /// Parsed header rows (header sections)
    pub rows: Vec<HeaderField>,
    /// Parsed numeric matrix (data sections)
    pub matrix: Option<DataMatrix>,
    /// 3.0 title association tag
    pub association: Option<String>,
    pub parse_errors: Vec<ErrorRecord>,
    pub validate_errors: Vec<ErrorRecord>,
    pub validated: bool,
}

impl Section {
    pub fn new(name: impl Into<String>, kind: SectionKind, raw_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            raw_text: raw_text.into(),
            rows: Vec::new(),
            matrix: None,
            association: None,
            parse_errors: Vec::new(),
            validate_errors: Vec::new(),
            validated: false,
        }
    }

    /// First row matching the mnemonic, case-insensitively
    pub fn field(&self, mnemonic: &str) -> Option<&HeaderField> {
        self.rows.iter().find(|row| row.has_mnemonic(mnemonic))
    }

    /// Value of the first row matching the mnemonic
    pub fn field_value(&self, mnemonic: &str) -> Option<&str> {
        self.field(mnemonic).and_then(|row| row.value.as_deref())
    }

    pub fn has_critical_parse_errors(&self) -> bool {
        self.parse_errors.iter().any(ErrorRecord::is_critical)
    }

    /// Whether this section is the definition half of a definition/data pair
    pub fn is_definition(&self) -> bool {
        self.name == "curves" || self.name.ends_with(DEFINITION_SUFFIX)
    }

    /// Name of the data section paired with this definition section
    pub fn paired_data_name(&self) -> Option<String> {
        if self.name == "curves" {
            Some("data".to_string())
        } else {
            self.name
                .strip_suffix(DEFINITION_SUFFIX)
                .map(|family| format!("{family}{DATA_SUFFIX}"))
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Section '{}'", self.name)?;
        writeln!(f, "    Kind: {}", self.kind.as_str())?;
        writeln!(f, "    Validated: {}", self.validated)?;
        match (&self.matrix, self.rows.is_empty()) {
            (Some(matrix), _) => writeln!(
                f,
                "    Matrix: {} rows x {} columns",
                matrix.row_count(),
                matrix.column_count
            )?,
            (None, false) => writeln!(f, "    Rows: {}", self.rows.len())?,
            _ => {}
        }
        for error in self.parse_errors.iter().chain(&self.validate_errors) {
            writeln!(f, "    {error}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Document
// =============================================================================

/// A fully processed LAS document
///
/// Sections keep their first-seen order from the source text; lookup by
/// canonical name goes through an index. Built once by the pipeline and
/// immutable afterwards except for the single congruency rename pass.
#[derive(Debug, Clone, Default)]
pub struct LasDocument {
    pub path: Option<PathBuf>,
    pub version_info: Option<VersionInfo>,
    sections: Vec<Section>,
    index: HashMap<String, usize>,
    /// Document-fatal errors from the Open/Read/Version/Split stages
    pub stage_errors: Vec<ErrorRecord>,
}

impl LasDocument {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Append a section, replacing any previous section of the same name
    /// in place (later blocks win, position of the first is kept)
    pub fn push_section(&mut self, section: Section) {
        match self.index.get(&section.name) {
            Some(&at) => self.sections[at] = section,
            None => {
                self.index.insert(section.name.clone(), self.sections.len());
                self.sections.push(section);
            }
        }
    }

    /// Sections in original document order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&at| &self.sections[at])
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        let at = *self.index.get(name)?;
        Some(&mut self.sections[at])
    }

    /// Take two sections out by name for a paired mutation, returning them
    /// afterwards via [`Self::restore_pair`]
    pub(crate) fn section_pair_mut(
        &mut self,
        first: &str,
        second: &str,
    ) -> Option<(&mut Section, &mut Section)> {
        let a = *self.index.get(first)?;
        let b = *self.index.get(second)?;
        if a == b {
            return None;
        }
        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.sections.split_at_mut(high);
        let (low_ref, high_ref) = (&mut head[low], &mut tail[0]);
        if a < b {
            Some((low_ref, high_ref))
        } else {
            Some((high_ref, low_ref))
        }
    }

    /// Every error attached anywhere on the document, keyed by origin:
    /// `None` for stage errors, section name otherwise
    pub fn all_errors(&self) -> impl Iterator<Item = (Option<&str>, &ErrorRecord)> {
        self.stage_errors
            .iter()
            .map(|e| (None, e))
            .chain(self.sections.iter().flat_map(|section| {
                section
                    .parse_errors
                    .iter()
                    .chain(&section.validate_errors)
                    .map(move |e| (Some(section.name.as_str()), e))
            }))
    }

    /// True iff no error of the requested severity class exists anywhere
    pub fn error_free(&self, critical_only: bool) -> bool {
        if critical_only {
            !self.all_errors().any(|(_, e)| e.is_critical())
        } else {
            self.all_errors().next().is_none()
        }
    }

    /// Raw UWI/API values found in the well section, in row order
    pub fn identifier_candidates(&self) -> Vec<&str> {
        let Some(well) = self.section("well") else {
            return Vec::new();
        };
        well.rows
            .iter()
            .filter(|row| {
                IDENTIFIER_MNEMONICS
                    .iter()
                    .any(|m| row.has_mnemonic(m))
            })
            .filter_map(|row| row.value.as_deref())
            .collect()
    }
}

/// Idempotence contract: two parses of the same text compare equal. The path
// participates since it is part of the document identity.
impl PartialEq for LasDocument {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.version_info == other.version_info
            && self.sections == other.sections
            && self.stage_errors == other.stage_errors
    }
}

impl fmt::Display for LasDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => writeln!(f, "LasDocument: {}", path.display())?,
            None => writeln!(f, "LasDocument: <in-memory>")?,
        }
        if let Some(info) = &self.version_info {
            writeln!(
                f,
                "Version: {} (wrap: {}, delimiter: {})",
                info.version,
                info.wrap,
                info.delimiter.map(|d| d.as_tag()).unwrap_or("none")
            )?;
        }
        for error in &self.stage_errors {
            writeln!(f, "{error}")?;
        }
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        Ok(())
    }
}
