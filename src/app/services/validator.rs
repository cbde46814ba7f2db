//! Per-section validation
//!
//! Applies rule sets dispatched by `(name, kind)` and classifies findings
//! into critical and minor error records. Validation never mutates parsed
//! artifacts beyond the version section's mnemonic case repair; it only
//! attaches errors and derives the section's `validated` flag.

use tracing::debug;

use crate::app::models::{
    ErrorRecord, HeaderField, Section, SectionKind, Severity, Stage, Version,
};
use crate::app::services::version_resolver::validate_version_fields;
use crate::constants::{
    CA_WELL_REQUIRED, DATA_SUFFIX, DEFINITION_SUFFIX, US_WELL_REQUIRED, V2_REGION_ALTERNATIVE,
    V2_WELL_REQUIRED, V3_LOCATION_GEODETIC, V3_LOCATION_GRID, V3_WELL_REQUIRED,
};

/// Validate one parsed section in place: appends to `validate_errors` and
/// settles the `validated` flag
pub fn validate_section(section: &mut Section, version: Version) {
    let errors = match (section.name.as_str(), section.kind) {
        ("version", SectionKind::Header) => {
            validate_version_fields(&mut section.rows, version)
        }
        ("well", SectionKind::Header) => validate_well(&section.rows, version),
        ("curves", SectionKind::Header) => validate_curves(&section.rows),
        (name, SectionKind::Header) if name.ends_with(DEFINITION_SUFFIX) => {
            validate_curves(&section.rows)
        }
        ("data", SectionKind::Data) => validate_data(section),
        (name, SectionKind::Data) if name.ends_with(DATA_SUFFIX) => validate_data(section),
        _ => Vec::new(),
    };

    let named: Vec<ErrorRecord> = errors
        .into_iter()
        .map(|e| e.for_section(&section.name))
        .collect();
    section.validate_errors.extend(named);
    section.validated =
        section.validate_errors.is_empty() && !section.has_critical_parse_errors();
    debug!(
        section = %section.name,
        validated = section.validated,
        errors = section.validate_errors.len(),
        "validated section"
    );
}

fn has(rows: &[HeaderField], mnemonic: &str) -> bool {
    rows.iter().any(|row| row.has_mnemonic(mnemonic))
}

fn missing_from<'m>(rows: &[HeaderField], mnemonics: &[&'m str]) -> Vec<&'m str> {
    mnemonics
        .iter()
        .copied()
        .filter(|m| !has(rows, m))
        .collect()
}

/// Well-section rules. Missing mnemonics are minor; a required mnemonic
/// whose row itself failed to parse escalates to critical.
fn validate_well(rows: &[HeaderField], version: Version) -> Vec<ErrorRecord> {
    match version {
        Version::V1_2 | Version::V2_0 => validate_v2_well(rows),
        Version::V3_0 => validate_v3_well(rows),
    }
}

fn validate_v2_well(rows: &[HeaderField]) -> Vec<ErrorRecord> {
    let mut missing = missing_from(rows, V2_WELL_REQUIRED);

    // PROV, or the county/state/country triple
    if !has(rows, "PROV") {
        missing.extend(missing_from(rows, V2_REGION_ALTERNATIVE));
    }
    // At least one identifier
    if !has(rows, "API") && !has(rows, "UWI") {
        missing.push("API");
        missing.push("UWI");
    }

    let mut errors = missing_errors(missing);
    errors.extend(row_parse_findings(rows, V2_WELL_REQUIRED));
    errors
}

fn validate_v3_well(rows: &[HeaderField]) -> Vec<ErrorRecord> {
    let mut missing = missing_from(rows, V3_WELL_REQUIRED);

    // Either geodetic or grid location mnemonics must be complete; report
    // the gaps of whichever group the document started
    let geodetic_missing = missing_from(rows, V3_LOCATION_GEODETIC);
    let grid_missing = missing_from(rows, V3_LOCATION_GRID);
    if !geodetic_missing.is_empty() && !grid_missing.is_empty() {
        let grid_started = grid_missing.len() < V3_LOCATION_GRID.len();
        let geodetic_started = geodetic_missing.len() < V3_LOCATION_GEODETIC.len();
        if grid_started && !geodetic_started {
            missing.extend(grid_missing);
        } else {
            missing.extend(geodetic_missing);
        }
    }

    let mut errors = Vec::new();
    if let Some(country) = country_code(rows) {
        let code = country.to_uppercase();
        match code.as_str() {
            "US" => missing.extend(missing_from(rows, US_WELL_REQUIRED)),
            "CA" => missing.extend(missing_from(rows, CA_WELL_REQUIRED)),
            "" => {}
            other => {
                errors.push(ErrorRecord::minor(
                    Stage::Validate,
                    format!(
                        "value for country code mnemonic is invalid: {other}, \
                         must be a valid internet country code"
                    ),
                ));
            }
        }
    }

    errors.extend(missing_errors(missing));
    errors.extend(row_parse_findings(rows, V3_WELL_REQUIRED));
    errors
}

fn country_code(rows: &[HeaderField]) -> Option<&str> {
    rows.iter()
        .find(|row| row.has_mnemonic("CTRY"))
        .and_then(|row| row.value.as_deref())
}

fn missing_errors(missing: Vec<&str>) -> Vec<ErrorRecord> {
    if missing.is_empty() {
        Vec::new()
    } else {
        vec![ErrorRecord::minor(
            Stage::Validate,
            format!("missing required mnemonics: {missing:?}"),
        )]
    }
}

/// Per-row parse failures surfaced at validation time: required mnemonics
/// escalate to critical, everything else stays minor
fn row_parse_findings(rows: &[HeaderField], required: &[&str]) -> Vec<ErrorRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let error = row.error.as_ref()?;
            let required_row = row
                .mnemonic
                .as_deref()
                .is_some_and(|m| required.iter().any(|r| r.eq_ignore_ascii_case(m)));
            let severity = if required_row {
                Severity::Critical
            } else {
                Severity::Minor
            };
            Some(ErrorRecord {
                severity,
                stage: Stage::Validate,
                section: None,
                message: format!("error parsing header line {index}: {}", error.message),
            })
        })
        .collect()
}

/// Curve definitions are load-bearing for congruency: every row carrying a
/// parse error is critical
fn validate_curves(rows: &[HeaderField]) -> Vec<ErrorRecord> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            row.error.as_ref().map(|error| {
                ErrorRecord::critical(
                    Stage::Validate,
                    format!("error parsing curve line {index}: {}", error.message),
                )
            })
        })
        .collect()
}

/// Accumulated matrix read errors become minor validation errors
fn validate_data(section: &Section) -> Vec<ErrorRecord> {
    let Some(matrix) = &section.matrix else {
        return Vec::new();
    };
    matrix
        .read_errors
        .iter()
        .map(|message| ErrorRecord::minor(Stage::Validate, message.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DataMatrix;
    use crate::app::services::header_parser::parse_header_section;

    const V2_WELL_OK: &str = "\
 STRT.M 100.0 : start
 STOP.M 200.0 : stop
 STEP.M 0.5 : step
 NULL.  -999.25 : null
 COMP.  ACME : company
 WELL.  ACME-1 : well
 FLD .  BIG : field
 LOC .  HERE : location
 SRVC.  LOGCO : service
 DATE.  2024-01-05 : date
 PROV.  AB : province
 UWI .  100123456789 : uwi
";

    fn well_section(body: &str, version: Version) -> Section {
        let mut section = Section::new("well", SectionKind::Header, body);
        section.rows = parse_header_section(body, version);
        section
    }

    #[test]
    fn test_v2_well_complete_validates() {
        let mut section = well_section(V2_WELL_OK, Version::V2_0);
        validate_section(&mut section, Version::V2_0);
        assert!(section.validate_errors.is_empty(), "{:?}", section.validate_errors);
        assert!(section.validated);
    }

    #[test]
    fn test_v2_well_missing_mnemonics_is_minor() {
        let body = " STRT.M 100.0 : start\n STOP.M 200.0 : stop\n";
        let mut section = well_section(body, Version::V2_0);
        validate_section(&mut section, Version::V2_0);
        assert_eq!(section.validate_errors.len(), 1);
        let error = &section.validate_errors[0];
        assert_eq!(error.severity, Severity::Minor);
        assert!(error.message.contains("STEP"));
        assert!(error.message.contains("API"));
        assert!(!section.validated);
    }

    #[test]
    fn test_v2_well_region_alternative_satisfied_by_triple() {
        let body = V2_WELL_OK.replace(" PROV.  AB : province\n",
            " CNTY.  KENT : county\n STAT.  TX : state\n CTRY.  US : country\n");
        let mut section = well_section(&body, Version::V2_0);
        validate_section(&mut section, Version::V2_0);
        assert!(section.validate_errors.is_empty());
    }

    #[test]
    fn test_required_mnemonic_parse_error_escalates() {
        let body = " STRT.M 100.0 : start\n WELL no delimiters here\n";
        let mut rows = parse_header_section(body, Version::V2_0);
        // Simulate a parse failure on a required mnemonic row
        rows[1].mnemonic = Some("WELL".to_string());
        let mut section = Section::new("well", SectionKind::Header, body);
        section.rows = rows;
        validate_section(&mut section, Version::V2_0);
        assert!(
            section
                .validate_errors
                .iter()
                .any(|e| e.severity == Severity::Critical)
        );
    }

    #[test]
    fn test_v3_well_us_country_requirements() {
        let body = "\
 STRT.M 100.0 : start
 STOP.M 200.0 : stop
 STEP.M 0.5 : step
 NULL.  -999.25 : null
 COMP.  ACME : company
 WELL.  ACME-1 : well
 FLD .  BIG : field
 LOC .  HERE : location
 SRVC.  LOGCO : service
 CTRY.  US : country
 DATE.  2024-01-05 : date
 LATI.DEG 34.2 : latitude
 LONG.DEG -101.7 : longitude
 GDAT.  NAD27 : datum
";
        let mut section = well_section(body, Version::V3_0);
        validate_section(&mut section, Version::V3_0);
        // US without STAT/CNTY/API
        assert_eq!(section.validate_errors.len(), 1);
        let message = &section.validate_errors[0].message;
        assert!(message.contains("STAT") && message.contains("CNTY") && message.contains("API"));
    }

    #[test]
    fn test_v3_well_invalid_country_code_is_minor() {
        let body = " CTRY.  ZZ : country\n LATI.DEG 1.0 : lat\n LONG.DEG 2.0 : lon\n GDAT. WGS84 : datum\n";
        let mut section = well_section(body, Version::V3_0);
        validate_section(&mut section, Version::V3_0);
        assert!(section.validate_errors.iter().any(|e| {
            e.severity == Severity::Minor && e.message.contains("country code")
        }));
    }

    #[test]
    fn test_v3_location_group_gaps_reported() {
        let body = " CTRY.  CA : country\n X   .M 1000.0 : easting\n Y   .M 2000.0 : northing\n PROV. AB : prov\n UWI . 100 : uwi\n LIC . 55 : licence\n";
        let mut section = well_section(body, Version::V3_0);
        validate_section(&mut section, Version::V3_0);
        let missing = section
            .validate_errors
            .iter()
            .find(|e| e.message.contains("missing required mnemonics"))
            .expect("missing mnemonics reported");
        // Grid group was started, so its gaps are the ones reported
        assert!(missing.message.contains("GDAT"));
        assert!(missing.message.contains("HZCS"));
        assert!(!missing.message.contains("LATI"));
    }

    #[test]
    fn test_curve_parse_errors_are_critical() {
        let body = " DEPT.M : depth\n BROKEN LINE\n";
        let mut section = Section::new("curves", SectionKind::Header, body);
        section.rows = parse_header_section(body, Version::V2_0);
        validate_section(&mut section, Version::V2_0);
        assert_eq!(section.validate_errors.len(), 1);
        assert!(section.validate_errors[0].is_critical());
        assert!(!section.validated);
    }

    #[test]
    fn test_definition_family_uses_curve_rules() {
        let body = " CORT. : core type\n ALSO BROKEN\n";
        let mut section = Section::new("core_definition", SectionKind::Header, body);
        section.rows = parse_header_section(body, Version::V3_0);
        validate_section(&mut section, Version::V3_0);
        assert!(section.validate_errors[0].is_critical());
    }

    #[test]
    fn test_data_read_errors_surface_as_minor() {
        let mut section = Section::new("data", SectionKind::Data, "");
        section.matrix = Some(DataMatrix {
            rows: vec![vec![1.0, f64::NAN]],
            column_labels: None,
            column_count: 2,
            read_errors: vec!["row 0: non-numeric value 'x'".to_string()],
        });
        validate_section(&mut section, Version::V2_0);
        assert_eq!(section.validate_errors.len(), 1);
        assert_eq!(section.validate_errors[0].severity, Severity::Minor);
        assert!(!section.validated);
    }

    #[test]
    fn test_unrecognized_section_has_no_rules() {
        let mut section = Section::new("other", SectionKind::Header, "free text");
        validate_section(&mut section, Version::V2_0);
        assert!(section.validate_errors.is_empty());
        assert!(section.validated);
    }
}
