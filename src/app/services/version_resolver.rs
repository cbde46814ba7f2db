//! Version resolution
//!
//! Locates the `~V` block, lexes it with a provisional 2.0 grammar (the
//! VERS mnemonic must be read before the real dialect is known), extracts
//! and normalizes VERS/WRAP/DLM, and validates the block. Every failure
//! here is a critical version-stage error that halts the pipeline: without
//! a dialect no further parsing is possible.

use tracing::{debug, info};

use crate::app::models::{
    DelimiterKind, ErrorRecord, HeaderField, Section, SectionKind, Stage, Version, VersionInfo,
};
use crate::app::services::document::ReadOptions;
use crate::app::services::header_parser::parse_header_section;
use crate::constants::{
    KNOWN_VERSIONS, V2_VERSION_REQUIRED, V3_VALID_DELIMITERS, V3_VERSION_REQUIRED,
};

/// Input to version-number extraction: raw text still to be lexed, or
/// fields already parsed by the provisional pass
#[derive(Debug)]
pub enum VersionSource<'a> {
    RawText(&'a str),
    Fields(&'a [HeaderField]),
}

pub struct VersionResolver<'a> {
    options: &'a ReadOptions,
}

impl<'a> VersionResolver<'a> {
    pub fn new(options: &'a ReadOptions) -> Self {
        Self { options }
    }

    /// Resolve the full version section: extraction, number normalization,
    /// validation. Returns the resolved facts plus the parsed, validated
    /// version [`Section`].
    pub fn resolve(&self, text: &str) -> Result<(VersionInfo, Section), ErrorRecord> {
        let block = extract_version_block(text)?;
        // Provisional dialect: the version mnemonics share the 2.0 grammar
        let mut fields = parse_header_section(block, Version::V2_0);

        let raw_number = self.version_number(VersionSource::Fields(&fields))?;
        let version: Version = raw_number.parse().map_err(|_| {
            ErrorRecord::critical(
                Stage::Version,
                format!(
                    "version '{raw_number}' was accepted but has no dialect grammar; \
                     cannot continue"
                ),
            )
        })?;
        debug!(%version, "resolved version number");

        let validate_errors = validate_version_fields(&mut fields, version);
        if !validate_errors.is_empty() {
            let combined = validate_errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ErrorRecord::critical(
                Stage::Version,
                format!("could not validate the version section: {combined}"),
            ));
        }

        let wrap = field_value(&fields, "WRAP")
            .map(|value| value.eq_ignore_ascii_case("YES"))
            .unwrap_or(false);
        let delimiter = match version {
            Version::V3_0 => field_value(&fields, "DLM")
                .map(DelimiterKind::from_tag)
                .transpose()
                // Validation already rejected unrecognized tags
                .unwrap_or(None)
                .flatten(),
            _ => None,
        };

        let mut section = Section::new("version", SectionKind::Header, block);
        section.rows = fields;
        section.validated = true;

        let info = VersionInfo {
            version,
            wrap,
            delimiter,
        };
        info!(version = %info.version, wrap = info.wrap, "version section resolved");
        Ok((info, section))
    }

    /// Extract and normalize the VERS value. Common numeric spellings
    /// (`"2"` → `"2.0"`) are coerced when enabled; unknown numbers pass
    /// through only under the configured escape hatches.
    pub fn version_number(&self, source: VersionSource<'_>) -> Result<String, ErrorRecord> {
        let parsed;
        let fields: &[HeaderField] = match source {
            VersionSource::Fields(fields) => fields,
            VersionSource::RawText(text) => {
                let block = extract_version_block(text)?;
                parsed = parse_header_section(block, Version::V2_0);
                &parsed
            }
        };

        let value = fields
            .iter()
            .find(|field| field.has_mnemonic("VERS"))
            .and_then(|field| field.value.as_deref())
            .ok_or_else(|| {
                ErrorRecord::critical(Stage::Version, "could not get version: no VERS value")
            })?;

        if KNOWN_VERSIONS.contains(&value) {
            return Ok(value.to_string());
        }

        let numeric = value.parse::<f64>().ok();
        if self.options.handle_common_errors
            && let Some(number) = numeric
            && let Some(known) = KNOWN_VERSIONS
                .iter()
                .find(|known| known.parse::<f64>() == Ok(number))
        {
            debug!(raw = value, coerced = known, "coerced version number");
            return Ok((*known).to_string());
        }

        if self.options.accept_unknown_versions
            && (numeric.is_some() || self.options.allow_non_numeric)
        {
            return Ok(value.to_string());
        }

        Err(ErrorRecord::critical(
            Stage::Version,
            format!("could not get version: version number '{value}' not recognized"),
        ))
    }
}

/// Extract the substring bounded by the version-section title marker and
/// the next version or well marker
fn extract_version_block(text: &str) -> Result<&str, ErrorRecord> {
    let markers = title_marker_offsets(text);
    let start = markers
        .iter()
        .find(|(_, letter)| letter.eq_ignore_ascii_case(&'V'))
        .map(|(offset, _)| *offset)
        .ok_or_else(|| {
            ErrorRecord::critical(
                Stage::Version,
                "could not extract version section: no '~V' title marker found",
            )
        })?;
    let end = markers
        .iter()
        .find(|(offset, letter)| {
            *offset > start && (letter.eq_ignore_ascii_case(&'V') || letter.eq_ignore_ascii_case(&'W'))
        })
        .map(|(offset, _)| *offset)
        .unwrap_or(text.len());
    Ok(&text[start..end])
}

/// Byte offsets of lines starting a titled section, with the marker letter
pub(crate) fn title_marker_offsets(text: &str) -> Vec<(usize, char)> {
    let mut offsets = Vec::new();
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('~')
            && let Some(letter) = rest.chars().next()
            && letter.is_ascii_alphabetic()
        {
            offsets.push((line_start + (line.len() - trimmed.len()), letter));
        }
        line_start += line.len();
    }
    offsets
}

/// Validate already-parsed version fields against the dialect rules.
/// Mnemonic case is auto-repaired to uppercase when only case differs.
/// Every violation is critical.
pub fn validate_version_fields(fields: &mut [HeaderField], version: Version) -> Vec<ErrorRecord> {
    let mut errors = Vec::new();
    let required: &[&str] = match version {
        Version::V1_2 | Version::V2_0 => V2_VERSION_REQUIRED,
        Version::V3_0 => V3_VERSION_REQUIRED,
    };

    let exact_present =
        |fields: &[HeaderField], m: &str| fields.iter().any(|f| f.mnemonic.as_deref() == Some(m));
    if !required.iter().all(|m| exact_present(fields, m)) {
        let case_insensitive_present = required
            .iter()
            .all(|m| fields.iter().any(|f| f.has_mnemonic(m)));
        if case_insensitive_present {
            // Auto-repair mnemonic case
            for field in fields.iter_mut() {
                if let Some(mnemonic) = &field.mnemonic {
                    field.mnemonic = Some(mnemonic.to_uppercase());
                }
            }
        } else {
            let missing: Vec<&str> = required
                .iter()
                .copied()
                .filter(|m| !fields.iter().any(|f| f.has_mnemonic(m)))
                .collect();
            errors.push(ErrorRecord::critical(
                Stage::Version,
                format!("missing required version section mnemonics: {missing:?}"),
            ));
            return errors;
        }
    }

    let wrap = field_value(fields, "WRAP");
    match version {
        Version::V1_2 | Version::V2_0 => match wrap {
            None => errors.push(ErrorRecord::critical(
                Stage::Version,
                "could not get WRAP value",
            )),
            Some(value) if !value.eq_ignore_ascii_case("YES") && !value.eq_ignore_ascii_case("NO") => {
                errors.push(ErrorRecord::critical(
                    Stage::Version,
                    "WRAP value for versions 1.2 and 2.0 must be 'YES' or 'NO'",
                ));
            }
            Some(_) => {}
        },
        Version::V3_0 => {
            if let Some(value) = wrap
                && !value.eq_ignore_ascii_case("NO")
            {
                errors.push(ErrorRecord::critical(
                    Stage::Version,
                    "invalid WRAP value, must be 'NO' for version 3.0",
                ));
            }
            let dlm = field_value(fields, "DLM").unwrap_or("");
            if !dlm.is_empty() && !V3_VALID_DELIMITERS.contains(&dlm.to_uppercase().as_str()) {
                errors.push(ErrorRecord::critical(
                    Stage::Version,
                    "invalid DLM value for version 3.0, should be 'SPACE', 'COMMA', or 'TAB'",
                ));
            }
        }
    }
    errors
}

fn field_value<'f>(fields: &'f [HeaderField], mnemonic: &str) -> Option<&'f str> {
    fields
        .iter()
        .find(|field| field.has_mnemonic(mnemonic))
        .and_then(|field| field.value.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    const V2_TEXT: &str = "\
~Version Information
 VERS.   2.0 : CWLS log ASCII Standard - VERSION 2.0
 WRAP.   NO  : One line per depth step
~Well Information
 STRT.M  100.0 : Start depth
";

    fn options() -> ReadOptions {
        ReadOptions::default()
    }

    #[test]
    fn test_resolve_v2() {
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        let (info, section) = resolver.resolve(V2_TEXT).unwrap();
        assert_eq!(info.version, Version::V2_0);
        assert!(!info.wrap);
        assert_eq!(info.delimiter, None);
        assert!(section.validated);
        assert_eq!(section.rows.len(), 2);
    }

    #[test]
    fn test_resolve_v3_with_comma_delimiter() {
        let text = "\
~Version
 VERS.  3.0 : CWLS LAS 3.0
 WRAP.  NO  : no wrap
 DLM .  COMMA : delimiter
~Well
";
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        let (info, _) = resolver.resolve(text).unwrap();
        assert_eq!(info.version, Version::V3_0);
        assert_eq!(info.delimiter, Some(DelimiterKind::Comma));
    }

    #[test]
    fn test_version_coercion_enabled() {
        let text = V2_TEXT.replace("2.0 : CWLS", "2 : CWLS");
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        let number = resolver
            .version_number(VersionSource::RawText(&text))
            .unwrap();
        assert_eq!(number, "2.0");
    }

    #[test]
    fn test_version_coercion_disabled() {
        let text = V2_TEXT.replace("2.0 : CWLS", "2 : CWLS");
        let opts = ReadOptions {
            handle_common_errors: false,
            ..ReadOptions::default()
        };
        let resolver = VersionResolver::new(&opts);
        let error = resolver
            .version_number(VersionSource::RawText(&text))
            .unwrap_err();
        assert!(error.is_critical());
        assert_eq!(error.stage, Stage::Version);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let text = V2_TEXT.replace("2.0 : CWLS", "9.9 : CWLS");
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        assert!(resolver.resolve(&text).is_err());
    }

    #[test]
    fn test_accepted_unknown_version_still_halts() {
        let text = V2_TEXT.replace("2.0 : CWLS", "2.5 : CWLS");
        let opts = ReadOptions {
            accept_unknown_versions: true,
            ..ReadOptions::default()
        };
        let resolver = VersionResolver::new(&opts);
        let number = resolver
            .version_number(VersionSource::RawText(&text))
            .unwrap();
        assert_eq!(number, "2.5");
        // No dialect grammar exists for 2.5, so the full resolve fails
        assert!(resolver.resolve(&text).is_err());
    }

    #[test]
    fn test_missing_vers_mnemonic() {
        let text = "~V\n WRAP. NO : wrap\n~W\n";
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        let error = resolver.resolve(text).unwrap_err();
        assert!(error.message.contains("could not get version"));
    }

    #[test]
    fn test_mnemonic_case_auto_repair() {
        let mut fields = parse_header_section(
            " vers. 2.0 : version\n wrap. NO : wrap\n",
            Version::V2_0,
        );
        let errors = validate_version_fields(&mut fields, Version::V2_0);
        assert!(errors.is_empty());
        assert_eq!(fields[0].mnemonic.as_deref(), Some("VERS"));
        assert_eq!(fields[1].mnemonic.as_deref(), Some("WRAP"));
    }

    #[test]
    fn test_invalid_wrap_value() {
        let mut fields = parse_header_section(
            " VERS. 2.0 : version\n WRAP. MAYBE : wrap\n",
            Version::V2_0,
        );
        let errors = validate_version_fields(&mut fields, Version::V2_0);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'YES' or 'NO'"));
    }

    #[test]
    fn test_v3_wrap_must_be_no() {
        let mut fields = parse_header_section(
            " VERS. 3.0 : version\n WRAP. YES : wrap\n DLM . SPACE : delim\n",
            Version::V2_0,
        );
        let errors = validate_version_fields(&mut fields, Version::V3_0);
        assert!(errors.iter().any(|e| e.message.contains("'NO'")));
    }

    #[test]
    fn test_v3_missing_dlm_is_critical() {
        let mut fields =
            parse_header_section(" VERS. 3.0 : version\n WRAP. NO : wrap\n", Version::V2_0);
        let errors = validate_version_fields(&mut fields, Version::V3_0);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("DLM"));
    }

    #[test]
    fn test_no_version_marker() {
        let opts = options();
        let resolver = VersionResolver::new(&opts);
        let error = resolver.resolve("just some text\n").unwrap_err();
        assert_eq!(error.stage, Stage::Version);
    }
}
