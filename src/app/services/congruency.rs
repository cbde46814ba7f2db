//! Curve/data congruency resolution
//!
//! Runs once after all sections are parsed. For every definition/data pair
//! (`curves`+`data` and each `X_definition`+`X_data` family) it reconciles
//! the declared curve rows with the actual matrix columns: equal counts
//! assign column labels in declared order with duplicate mnemonics
//! disambiguated; unequal counts attach a critical error to both halves
//! and leave labels untouched.
//!
//! The rename is an explicit indexed step over parallel arrays: the labels
//! vector is built first, with duplicate disambiguation, then assigned to
//! both the definition rows and the matrix.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::app::models::{ErrorRecord, LasDocument, Section, Stage};

/// Resolve congruency for every definition/data pair in the document
pub fn resolve(document: &mut LasDocument) {
    let pairs: Vec<(String, String)> = document
        .sections()
        .filter(|section| section.is_definition())
        .filter_map(|section| {
            section
                .paired_data_name()
                .map(|data| (section.name.clone(), data))
        })
        .collect();

    for (definition_name, data_name) in pairs {
        let Some((definition, data)) = document.section_pair_mut(&definition_name, &data_name)
        else {
            debug!(
                definition = %definition_name,
                data = %data_name,
                "congruency skipped, pair incomplete"
            );
            continue;
        };
        resolve_pair(definition, data);
    }
}

fn resolve_pair(definition: &mut Section, data: &mut Section) {
    let Some(matrix) = data.matrix.as_mut() else {
        debug!(section = %data.name, "congruency skipped, no matrix");
        return;
    };
    if definition.rows.is_empty() {
        debug!(section = %definition.name, "congruency skipped, no curve rows");
        return;
    }

    let definition_rows = definition.rows.len();
    let data_columns = matrix.column_count;
    if definition_rows != data_columns {
        warn!(
            definition = %definition.name,
            rows = definition_rows,
            columns = data_columns,
            "definition and data sections are not congruent"
        );
        let message = format!(
            "'{}' and '{}' sections are not congruent: {definition_rows} curve \
             definitions vs {data_columns} data columns",
            definition.name, data.name
        );
        definition.validate_errors.push(
            ErrorRecord::critical(Stage::Validate, message.clone()).for_section(&definition.name),
        );
        definition.validated = false;
        data.validate_errors
            .push(ErrorRecord::critical(Stage::Validate, message).for_section(&data.name));
        data.validated = false;
        return;
    }

    let labels = disambiguated_labels(definition);
    // Write the resolved labels back through both parallel structures
    for (row, label) in definition.rows.iter_mut().zip(&labels) {
        row.mnemonic = Some(label.clone());
    }
    matrix.column_labels = Some(labels);
}

/// Labels in declared order: the first occurrence of a mnemonic keeps its
/// bare name, each subsequent occurrence is relabeled `mnemonic_<n>` where
/// `n` is its 0-based occurrence index
fn disambiguated_labels(definition: &Section) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    definition
        .rows
        .iter()
        .map(|row| {
            let mnemonic = row.mnemonic.clone().unwrap_or_default();
            let occurrence = seen.entry(mnemonic.clone()).or_insert(0);
            let label = if *occurrence == 0 {
                mnemonic
            } else {
                format!("{mnemonic}_{occurrence}")
            };
            *occurrence += 1;
            label
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DataMatrix, HeaderField, SectionKind};

    fn definition_section(mnemonics: &[&str]) -> Section {
        let mut section = Section::new("curves", SectionKind::Header, "");
        section.rows = mnemonics
            .iter()
            .map(|m| HeaderField {
                mnemonic: Some((*m).to_string()),
                ..HeaderField::default()
            })
            .collect();
        section.validated = true;
        section
    }

    fn data_section(columns: usize) -> Section {
        let mut section = Section::new("data", SectionKind::Data, "");
        section.matrix = Some(DataMatrix {
            rows: vec![vec![0.0; columns]],
            column_labels: None,
            column_count: columns,
            read_errors: Vec::new(),
        });
        section.validated = true;
        section
    }

    fn document_with(definition: Section, data: Section) -> LasDocument {
        let mut doc = LasDocument::new(None);
        doc.push_section(definition);
        doc.push_section(data);
        doc
    }

    #[test]
    fn test_unique_mnemonics_assigned_in_order() {
        let mut doc = document_with(definition_section(&["DEPT", "GR", "RHOB"]), data_section(3));
        resolve(&mut doc);
        let matrix = doc.section("data").unwrap().matrix.as_ref().unwrap();
        assert_eq!(
            matrix.column_labels.as_deref().unwrap(),
            ["DEPT", "GR", "RHOB"]
        );
        assert!(doc.error_free(false));
    }

    #[test]
    fn test_duplicate_mnemonics_disambiguated() {
        let mut doc = document_with(definition_section(&["DEPT", "RHOB", "RHOB"]), data_section(3));
        resolve(&mut doc);
        let matrix = doc.section("data").unwrap().matrix.as_ref().unwrap();
        assert_eq!(
            matrix.column_labels.as_deref().unwrap(),
            ["DEPT", "RHOB", "RHOB_1"]
        );
        // Definition rows renamed through the same labels
        let curves = doc.section("curves").unwrap();
        assert_eq!(curves.rows[2].mnemonic.as_deref(), Some("RHOB_1"));
        assert!(doc.error_free(false), "no error raised for renaming");
    }

    #[test]
    fn test_triple_duplicate_occurrence_indices() {
        let mut doc = document_with(
            definition_section(&["GR", "GR", "GR", "DEPT"]),
            data_section(4),
        );
        resolve(&mut doc);
        let matrix = doc.section("data").unwrap().matrix.as_ref().unwrap();
        assert_eq!(
            matrix.column_labels.as_deref().unwrap(),
            ["GR", "GR_1", "GR_2", "DEPT"]
        );
    }

    #[test]
    fn test_incongruent_counts_flag_both_sections() {
        let mut doc = document_with(
            definition_section(&["DEPT", "GR", "RHOB", "NPHI"]),
            data_section(3),
        );
        resolve(&mut doc);
        let curves = doc.section("curves").unwrap();
        let data = doc.section("data").unwrap();
        assert!(curves.validate_errors.iter().any(|e| e.is_critical()));
        assert!(data.validate_errors.iter().any(|e| e.is_critical()));
        assert!(!curves.validated);
        assert!(!data.validated);
        assert_eq!(data.matrix.as_ref().unwrap().column_labels, None);
    }

    #[test]
    fn test_definition_family_pairs_resolved() {
        let mut definition = definition_section(&["CORT", "CORD"]);
        definition.name = "core_definition".to_string();
        let mut data = data_section(2);
        data.name = "core_data".to_string();
        let mut doc = document_with(definition, data);
        resolve(&mut doc);
        let matrix = doc.section("core_data").unwrap().matrix.as_ref().unwrap();
        assert_eq!(matrix.column_labels.as_deref().unwrap(), ["CORT", "CORD"]);
    }

    #[test]
    fn test_missing_data_half_is_skipped() {
        let mut doc = LasDocument::new(None);
        doc.push_section(definition_section(&["DEPT"]));
        resolve(&mut doc);
        assert!(doc.error_free(false));
    }
}
