//! Document pipeline orchestration
//!
//! Drives the pipeline stage by stage: open/read, version resolution,
//! section splitting, concurrent per-section parse+validate, and the final
//! congruency pass. Open/Read/Version/Split failures are document-fatal:
//! the partial document is returned with the stage error attached.
//! Parse/Validate failures are section-local; every other section keeps
//! processing independently. Nothing escapes [`read`] as an `Err`; every
//! failure is data on the returned document.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::app::models::{
    DelimiterKind, ErrorRecord, LasDocument, Section, SectionKind, Stage, Version, VersionInfo,
};
use crate::app::services::congruency;
use crate::app::services::data_parser::{DataSectionParser, DelimiterResolution, resolve_delimiter};
use crate::app::services::header_parser::parse_header_section;
use crate::app::services::section_splitter::{RawSection, SectionSplitter};
use crate::app::services::validator::validate_section;
use crate::app::services::version_resolver::VersionResolver;
use crate::config::KnownSections;
use crate::constants::{DATA_SUFFIX, DEFINITION_SUFFIX, PARAMETERS_SUFFIX};


/// Pipeline tuning knobs, mirroring the document read entry points
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Coerce common version spellings such as `"2"` into `"2.0"`
    pub handle_common_errors: bool,
    /// Let unknown numeric version values through version extraction
    /// (splitting still requires a known dialect)
    pub accept_unknown_versions: bool,
    /// With `accept_unknown_versions`, also let non-numeric values through
    pub allow_non_numeric: bool,
    /// Delimiter used when an unrecognized delimiter tag is permitted to
    /// fall back
    pub default_delimiter: DelimiterKind,
    /// Whether an unrecognized delimiter tag may fall back instead of
    /// being a critical configuration error
    pub allow_delimiter_fallback: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            handle_common_errors: true,
            accept_unknown_versions: false,
            allow_non_numeric: false,
            default_delimiter: DelimiterKind::Space,
            allow_delimiter_fallback: true,
        }
    }
}

/// Read and fully process a LAS file with default options
pub async fn read(path: impl AsRef<Path>) -> LasDocument {
    read_with_options(path, ReadOptions::default()).await
}

/// Read and fully process a LAS file
///
/// All failures, including open/read failures, are captured as structured
/// errors on the returned document.
pub async fn read_with_options(path: impl AsRef<Path>, options: ReadOptions) -> LasDocument {
    read_with_table(path, options, KnownSections::embedded()).await
}

/// Read and fully process a LAS file against a caller-supplied
/// known-sections table
pub async fn read_with_table(
    path: impl AsRef<Path>,
    options: ReadOptions,
    known: &KnownSections,
) -> LasDocument {
    let path = path.as_ref();
    info!("Reading LAS file: {}", path.display());
    let mut document = LasDocument::new(Some(path.to_path_buf()));

    // Scoped acquisition: the handle is released when read_to_string
    // returns, on success and failure alike
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(error) => {
            let stage = match error.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => Stage::Open,
                _ => Stage::Read,
            };
            warn!(path = %path.display(), %error, "could not read file");
            document.stage_errors.push(ErrorRecord::critical(
                stage,
                format!("could not read '{}': {error}", path.display()),
            ));
            return document;
        }
    };

    run_pipeline(document, &text, options, known).await
}

/// Run the pipeline over in-memory text with default options
pub async fn parse_str(text: &str) -> LasDocument {
    parse_str_with_options(text, ReadOptions::default()).await
}

/// Run the pipeline over in-memory text
pub async fn parse_str_with_options(text: &str, options: ReadOptions) -> LasDocument {
    let document = LasDocument::new(None);
    run_pipeline(document, text, options, KnownSections::embedded()).await
}

/// True iff no error of the requested severity class exists anywhere in
/// the document's aggregated error set
pub fn error_check(document: &LasDocument, critical_only: bool) -> bool {
    document.error_free(critical_only)
}

async fn run_pipeline(
    mut document: LasDocument,
    text: &str,
    options: ReadOptions,
    known: &KnownSections,
) -> LasDocument {
    // Version resolution halts everything on failure: no dialect, no
    // further parsing
    let resolver = VersionResolver::new(&options);
    let info = match resolver.resolve(text) {
        Ok((info, version_section)) => {
            document.version_info = Some(info);
            document.push_section(version_section);
            info
        }
        Err(error) => {
            document.stage_errors.push(error);
            return document;
        }
    };

    let splitter = SectionSplitter::new(known);
    let raw_sections = match splitter.split(text, info.version) {
        Ok(sections) => sections,
        Err(error) => {
            document.stage_errors.push(error);
            return document;
        }
    };

    if let Err(error) = check_required_sections(&raw_sections, info.version, known) {
        document.stage_errors.push(error);
        return document;
    }

    // Independent raw blocks parse and validate concurrently; join before
    // the cross-section congruency pass
    let mut names = Vec::new();
    let mut handles = Vec::new();
    for raw in raw_sections {
        if raw.name == "version" {
            continue;
        }
        let kind = section_kind(&raw.name, info.version, known);
        let required = known.is_required(info.version, &raw.name);
        names.push(raw.name.clone());
        handles.push(tokio::task::spawn_blocking(move || {
            parse_and_validate(raw, info, kind, required, options)
        }));
    }
    let results = futures::future::join_all(handles).await;
    for (name, result) in names.into_iter().zip(results) {
        let section = result.unwrap_or_else(|join_error| {
            let mut section = Section::new(name.clone(), SectionKind::Unknown, "");
            section.parse_errors.push(
                ErrorRecord::critical(Stage::Parse, format!("worker task failed: {join_error}"))
                    .for_section(name),
            );
            section
        });
        document.push_section(section);
    }

    congruency::resolve(&mut document);
    debug!(
        sections = document.sections().count(),
        clean = document.error_free(false),
        "pipeline complete"
    );
    document
}

/// 1.2/2.0 documents must split into the four minimum sections; 3.0
/// documents carry a variable section set and are gated per pair by the
/// congruency pass instead
fn check_required_sections(
    sections: &[RawSection],
    version: Version,
    known: &KnownSections,
) -> Result<(), ErrorRecord> {
    if !version.is_v2_family() {
        return Ok(());
    }
    let missing: Vec<&str> = known
        .required_names(version)
        .into_iter()
        .filter(|name| {
            !sections
                .iter()
                .any(|raw| raw.name == *name && !raw.text.trim().is_empty())
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ErrorRecord::critical(
            Stage::Split,
            format!("could not split into minimum required sections, missing or empty: {missing:?}"),
        ))
    }
}

/// Payload kind for a canonical section name: the known-sections table
/// first, then the 3.0 family suffixes, else unknown
fn section_kind(name: &str, version: Version, known: &KnownSections) -> SectionKind {
    if let Some(kind) = known.kind_of(version, name) {
        return kind;
    }
    if name.ends_with(DEFINITION_SUFFIX) || name.ends_with(PARAMETERS_SUFFIX) {
        SectionKind::Header
    } else if name.ends_with(DATA_SUFFIX) {
        SectionKind::Data
    } else {
        SectionKind::Unknown
    }
}

/// Parse one raw block per its kind, then validate it. Never fails: every
/// problem lands in the section's error lists.
fn parse_and_validate(
    raw: RawSection,
    info: VersionInfo,
    kind: SectionKind,
    required: bool,
    options: ReadOptions,
) -> Section {
    let mut section = Section::new(raw.name, kind, raw.text);
    section.association = raw.association;

    if !section.raw_text.contains('\n') {
        let message = "could not parse, raw section data is only one line or less";
        let record = if required {
            ErrorRecord::critical(Stage::Parse, message)
        } else {
            ErrorRecord::minor(Stage::Parse, message)
        };
        section.parse_errors.push(record.for_section(&section.name));
        return section;
    }

    match kind {
        SectionKind::Header => parse_header_kind(&mut section, info.version),
        SectionKind::Data => parse_data_kind(&mut section, info, options),
        SectionKind::Unknown => resolve_unknown_kind(&mut section, info, required),
    }

    validate_section(&mut section, info.version);
    section
}

fn parse_header_kind(section: &mut Section, version: Version) {
    section.rows = parse_header_section(&section.raw_text, version);
    let row_errors: Vec<ErrorRecord> = section
        .rows
        .iter()
        .filter_map(|row| row.error.clone())
        .map(|error| error.for_section(&section.name))
        .collect();
    section.parse_errors.extend(row_errors);
}

fn parse_data_kind(section: &mut Section, info: VersionInfo, options: ReadOptions) {
    let tag = info.delimiter.map(|d| d.as_tag().to_string());
    let delimiter = match resolve_delimiter(
        tag.as_deref(),
        options.default_delimiter,
        options.allow_delimiter_fallback,
    ) {
        DelimiterResolution::Resolved(delimiter) => delimiter,
        DelimiterResolution::Fallback(delimiter, note) => {
            section
                .parse_errors
                .push(ErrorRecord::minor(Stage::Parse, note).for_section(&section.name));
            Some(delimiter)
        }
        DelimiterResolution::Invalid(message) => {
            section
                .parse_errors
                .push(ErrorRecord::critical(Stage::Parse, message).for_section(&section.name));
            return;
        }
    };
    let parser = DataSectionParser::new(info.wrap, delimiter);
    section.matrix = Some(parser.parse(&section.raw_text));
}

/// Best-effort trial parse for sections of unknown kind: header first,
/// then data, per the dialect's fallback order
fn resolve_unknown_kind(section: &mut Section, info: VersionInfo, required: bool) {
    let rows = parse_header_section(&section.raw_text, info.version);
    if !rows.is_empty() && rows.iter().all(|row| row.error.is_none()) {
        debug!(section = %section.name, "unknown section resolved as header");
        section.kind = SectionKind::Header;
        section.rows = rows;
        return;
    }

    let parser = DataSectionParser::new(info.wrap, info.delimiter);
    let matrix = parser.parse(&section.raw_text);
    if matrix.row_count() > 0 && matrix.read_errors.is_empty() {
        debug!(section = %section.name, "unknown section resolved as data");
        section.kind = SectionKind::Data;
        section.matrix = Some(matrix);
        return;
    }

    let message = format!("could not parse '{}' as a header or data section", section.name);
    let record = if required {
        ErrorRecord::critical(Stage::Parse, message)
    } else {
        ErrorRecord::minor(Stage::Parse, message)
    };
    section.parse_errors.push(record.for_section(&section.name));
}
