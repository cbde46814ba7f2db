//! Header-section line parser
//!
//! Parses one header line per the versioned LAS grammar. The contract is a
//! fixed delimiter order scanned left to right, not whitespace tokenization:
//! mnemonic before the first `.`, unit up to the next space, then the region
//! up to the *last* `:` and the trailing region after it. Descriptions may
//! themselves contain colons, which is why the last colon is the anchor.
//!
//! A line that fails the grammar still yields a [`HeaderField`] carrying
//! whatever was extractable plus an attached error record; the parser never
//! aborts a section.

use tracing::trace;

use crate::app::models::{ErrorRecord, HeaderField, Stage, Version};
use crate::constants::{COMMENT_MARKER, TITLE_MARKER, V12_SWAPPED_MNEMONICS};

/// Normalize an extracted field: empty strings become absent, not `""`
fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn line_error(line: &str, reason: &str) -> ErrorRecord {
    ErrorRecord::minor(
        Stage::Parse,
        format!("error parsing header line '{line}': {reason}"),
    )
}

/// Parse a full header section body into rows, skipping comment, title and
/// blank lines
pub fn parse_header_section(text: &str, version: Version) -> Vec<HeaderField> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && !trimmed.starts_with(COMMENT_MARKER)
                && !trimmed.starts_with(TITLE_MARKER)
        })
        .map(|line| parse_header_line(line, version))
        .collect()
}

/// Parse one non-comment, non-title, non-blank header line
pub fn parse_header_line(line: &str, version: Version) -> HeaderField {
    let line = line.trim();
    let mut field = HeaderField::default();

    // Mnemonic: everything before the first period
    let Some(first_period) = line.find('.') else {
        field.error = Some(line_error(line, "missing '.' delimiter"));
        return field;
    };
    field.mnemonic = non_empty(&line[..first_period]);
    let after_period = &line[first_period + 1..];

    // Unit: everything up to the first space after the period
    let Some(first_space) = after_period.find(' ') else {
        field.error = Some(line_error(line, "no space terminating the unit field"));
        return field;
    };
    field.unit = non_empty(&after_period[..first_space]);

    // Value-or-description region up to the last colon on the line
    let Some(last_colon) = after_period.rfind(':') else {
        field.error = Some(line_error(line, "missing ':' delimiter"));
        return field;
    };
    // Leading colons in the middle region are separator noise, not content
    let mid = after_period[first_space..last_colon.max(first_space)]
        .trim()
        .trim_start_matches(':');
    let tail = &after_period[last_colon + 1..];

    let swapped = version == Version::V1_2
        && field
            .mnemonic
            .as_deref()
            .is_some_and(|m| V12_SWAPPED_MNEMONICS.contains(&m));

    if swapped {
        // Known 1.2 quirk: value follows the last colon, description
        // precedes it
        field.description = non_empty(mid);
        field.value = non_empty(tail);
    } else if version == Version::V3_0 {
        field.value = non_empty(mid);
        parse_v3_tail(&mut field, tail);
    } else {
        field.value = non_empty(mid);
        field.description = non_empty(tail);
    }

    trace!(mnemonic = ?field.mnemonic, "parsed header line");
    field
}

/// 3.0 trailing region: optional brace-delimited format descriptor and optional
/// pipe-delimited association list after the last colon
fn parse_v3_tail(field: &mut HeaderField, tail: &str) {
    if let (Some(open), Some(_)) = (tail.find('{'), tail.find('}')) {
        field.description = non_empty(&tail[..open]);
        let after_open = &tail[open + 1..];
        match after_open.rfind('}') {
            Some(close) => {
                field.format = non_empty(&after_open[..close]);
                let after_close = &after_open[close + 1..];
                if let Some(bar) = after_close.find('|') {
                    field.associations = non_empty(&after_close[bar + 1..]);
                }
            }
            None => field.format = non_empty(after_open),
        }
    } else if let Some(bar) = tail.find('|') {
        field.associations = non_empty(&tail[bar + 1..]);
    } else {
        field.description = non_empty(tail);
    }
}
