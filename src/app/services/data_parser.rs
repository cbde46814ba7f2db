//! Data-section parser
//!
//! Reassembles wrapped records, resolves the declared delimiter, and
//! tokenizes the numeric block into a row-major [`DataMatrix`]. Cell
//! failures are carried as NaN sentinels and row failures as `read_errors`
//! entries; nothing in here aborts the matrix.
//!
//! Ragged-row policy: the matrix width is the most common row width (ties
//! broken toward the wider). Narrow rows are padded with the sentinel,
//! wide rows are truncated, and every ragged row contributes one
//! `read_errors` entry.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::app::models::{DataMatrix, DelimiterKind};
use crate::constants::{COMMENT_MARKER, TITLE_MARKER};

/// A lone numeric token on its own line starts a new wrapped record
static LONE_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-?\d+(\.\d+)?([eE][+-]?\d+)?\s*$").expect("valid regex"));

/// Outcome of resolving a raw delimiter tag
#[derive(Debug, Clone, PartialEq)]
pub enum DelimiterResolution {
    /// Recognized tag, literal character, or absent (whitespace splitting)
    Resolved(Option<DelimiterKind>),
    /// Unrecognized tag replaced by the configured default; the carried
    /// string is the non-fatal fallback condition to record
    Fallback(DelimiterKind, String),
    /// Unrecognized tag and fallback not permitted
    Invalid(String),
}

/// Resolve a raw delimiter tag per the dialect rules
pub fn resolve_delimiter(
    tag: Option<&str>,
    default_delimiter: DelimiterKind,
    allow_fallback: bool,
) -> DelimiterResolution {
    let Some(tag) = tag else {
        return DelimiterResolution::Resolved(None);
    };
    match DelimiterKind::from_tag(tag) {
        Ok(resolved) => DelimiterResolution::Resolved(resolved),
        Err(raw) if allow_fallback => DelimiterResolution::Fallback(
            default_delimiter,
            format!(
                "unrecognized delimiter '{raw}', falling back to {}",
                default_delimiter.as_tag()
            ),
        ),
        Err(raw) => DelimiterResolution::Invalid(format!(
            "unrecognized delimiter '{raw}' and no fallback permitted"
        )),
    }
}

/// Parser for one raw data-section block
#[derive(Debug, Clone)]
pub struct DataSectionParser {
    wrap: bool,
    delimiter: Option<DelimiterKind>,
}

impl DataSectionParser {
    pub fn new(wrap: bool, delimiter: Option<DelimiterKind>) -> Self {
        Self { wrap, delimiter }
    }

    /// Parse a raw data block (title and comment lines are stripped here)
    /// into a matrix
    pub fn parse(&self, raw_text: &str) -> DataMatrix {
        let lines: Vec<&str> = raw_text
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty()
                    && !trimmed.starts_with(TITLE_MARKER)
                    && !trimmed.starts_with(COMMENT_MARKER)
            })
            .collect();

        let records: Vec<String> = if self.wrap {
            self.reassemble_wrapped(&lines)
        } else {
            lines.iter().map(|line| line.to_string()).collect()
        };

        let mut read_errors = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            rows.push(self.tokenize(record, row_index, &mut read_errors));
        }

        let column_count = dominant_width(&rows);
        normalize_widths(&mut rows, column_count, &mut read_errors);

        debug!(
            rows = rows.len(),
            columns = column_count,
            read_errors = read_errors.len(),
            "parsed data section"
        );

        DataMatrix {
            rows,
            column_labels: None,
            column_count,
            read_errors,
        }
    }

    /// Regroup physical lines into logical records: a lone-numeric line is
    /// a new record's leading depth value, subsequent lines belong to the
    /// same record until the next lone-numeric line. Regrouped lines are
    /// joined with the active delimiter before tokenization.
    fn reassemble_wrapped(&self, lines: &[&str]) -> Vec<String> {
        let joiner = self.delimiter.map(|d| d.as_char()).unwrap_or(' ');
        let mut records: Vec<String> = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if LONE_NUMERIC.is_match(trimmed) || records.is_empty() {
                records.push(trimmed.to_string());
            } else {
                let current = records.last_mut().expect("record started");
                current.push(joiner);
                current.push_str(trimmed);
            }
        }
        records
    }

    fn tokenize(&self, record: &str, row_index: usize, read_errors: &mut Vec<String>) -> Vec<f64> {
        let tokens: Vec<&str> = match self.delimiter {
            // Absent delimiter and SPACE both split on whitespace runs
            None | Some(DelimiterKind::Space) => record.split_whitespace().collect(),
            Some(delimiter) => record.split(delimiter.as_char()).collect(),
        };
        tokens
            .iter()
            .map(|token| {
                let trimmed = token.trim();
                if trimmed.is_empty() {
                    // Missing cell, sentinel without a read error
                    f64::NAN
                } else {
                    trimmed.parse::<f64>().unwrap_or_else(|_| {
                        read_errors.push(format!(
                            "row {row_index}: non-numeric value '{trimmed}'"
                        ));
                        f64::NAN
                    })
                }
            })
            .collect()
    }
}

/// Most common row width; ties broken toward the wider row
fn dominant_width(rows: &[Vec<f64>]) -> usize {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|(width, _)| *width == row.len()) {
            Some((_, count)) => *count += 1,
            None => counts.push((row.len(), 1)),
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(width, _)| width)
        .unwrap_or(0)
}

/// Pad narrow rows with the sentinel and truncate wide ones, recording
/// every ragged row
fn normalize_widths(rows: &mut [Vec<f64>], column_count: usize, read_errors: &mut Vec<String>) {
    for (row_index, row) in rows.iter_mut().enumerate() {
        if row.len() == column_count {
            continue;
        }
        warn!(row = row_index, width = row.len(), expected = column_count, "ragged data row");
        read_errors.push(format!(
            "row {row_index}: expected {column_count} columns, found {}",
            row.len()
        ));
        if row.len() < column_count {
            row.resize(column_count, f64::NAN);
        } else {
            row.truncate(column_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrapped_whitespace_matrix() {
        let parser = DataSectionParser::new(false, None);
        let matrix = parser.parse("~A\n100.0 1.1 2.2\n100.5 3.3 4.4\n");
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.column_count, 3);
        assert!(matrix.read_errors.is_empty());
        assert_eq!(matrix.rows[1], vec![100.5, 3.3, 4.4]);
    }

    #[test]
    fn test_wrapped_reassembly() {
        let parser = DataSectionParser::new(true, None);
        let matrix = parser.parse("100.0\n1.1 2.2 3.3\n100.5\n4.4 5.5 6.6\n");
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.column_count, 4);
        assert_eq!(matrix.rows[0], vec![100.0, 1.1, 2.2, 3.3]);
        assert_eq!(matrix.rows[1], vec![100.5, 4.4, 5.5, 6.6]);
        assert!(matrix.read_errors.is_empty());
    }

    #[test]
    fn test_comma_delimited_with_missing_cell() {
        let parser = DataSectionParser::new(false, Some(DelimiterKind::Comma));
        let matrix = parser.parse("100.0,1.1,2.2\n100.5,,3.3\n");
        assert_eq!(matrix.column_count, 3);
        assert!(matrix.rows[1][1].is_nan());
        // Missing cell is a sentinel, not a read error
        assert!(matrix.read_errors.is_empty());
    }

    #[test]
    fn test_non_numeric_cell_records_read_error() {
        let parser = DataSectionParser::new(false, None);
        let matrix = parser.parse("100.0 1.1\n100.5 bogus\n");
        assert!(matrix.rows[1][1].is_nan());
        assert_eq!(matrix.read_errors.len(), 1);
        assert!(matrix.read_errors[0].contains("bogus"));
    }

    #[test]
    fn test_ragged_rows_padded_and_truncated() {
        let parser = DataSectionParser::new(false, None);
        let matrix = parser.parse("1.0 2.0 3.0\n4.0 5.0\n6.0 7.0 8.0 9.0\n10.0 11.0 12.0\n");
        assert_eq!(matrix.column_count, 3);
        assert_eq!(matrix.rows[1].len(), 3);
        assert!(matrix.rows[1][2].is_nan());
        assert_eq!(matrix.rows[2], vec![6.0, 7.0, 8.0]);
        // One entry per ragged row
        assert_eq!(matrix.read_errors.len(), 2);
    }

    #[test]
    fn test_dominant_width_tie_prefers_wider() {
        let rows = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
        assert_eq!(dominant_width(&rows), 3);
    }

    #[test]
    fn test_tab_delimiter() {
        let parser = DataSectionParser::new(false, Some(DelimiterKind::Tab));
        let matrix = parser.parse("1.0\t2.0\n3.0\t4.0\n");
        assert_eq!(matrix.rows[0], vec![1.0, 2.0]);
    }

    #[test]
    fn test_negative_and_exponent_depth_lines_wrap() {
        let parser = DataSectionParser::new(true, None);
        let matrix = parser.parse("-100.0\n1.0 2.0\n-100.5\n3.0 4.0\n");
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.rows[0], vec![-100.0, 1.0, 2.0]);
    }

    #[test]
    fn test_resolve_delimiter_tags() {
        assert_eq!(
            resolve_delimiter(Some("COMMA"), DelimiterKind::Space, true),
            DelimiterResolution::Resolved(Some(DelimiterKind::Comma))
        );
        assert_eq!(
            resolve_delimiter(None, DelimiterKind::Space, true),
            DelimiterResolution::Resolved(None)
        );
        assert_eq!(
            resolve_delimiter(Some(""), DelimiterKind::Space, true),
            DelimiterResolution::Resolved(None)
        );
    }

    #[test]
    fn test_resolve_delimiter_fallback_records_condition() {
        match resolve_delimiter(Some("SEMICOLON"), DelimiterKind::Space, true) {
            DelimiterResolution::Fallback(delimiter, note) => {
                assert_eq!(delimiter, DelimiterKind::Space);
                assert!(note.contains("SEMICOLON"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_delimiter_invalid_without_fallback() {
        assert!(matches!(
            resolve_delimiter(Some("SEMICOLON"), DelimiterKind::Space, false),
            DelimiterResolution::Invalid(_)
        ));
    }

    #[test]
    fn test_empty_block_yields_empty_matrix() {
        let parser = DataSectionParser::new(false, None);
        let matrix = parser.parse("~A\n# only comments\n");
        assert_eq!(matrix.row_count(), 0);
        assert_eq!(matrix.column_count, 0);
    }
}
