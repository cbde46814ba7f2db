//! Application constants for the LAS processor
//!
//! Mnemonic sets, delimiter literals, and default values used throughout
//! the parsing and validation pipeline.

// =============================================================================
// Versions
// =============================================================================

/// Version numbers this processor knows how to parse
pub const KNOWN_VERSIONS: &[&str] = &["1.2", "2.0", "3.0"];

// =============================================================================
// Header grammar
// =============================================================================

/// v1.2 mnemonics whose value and description fields are swapped relative to
/// the default header-line layout (the value follows the last colon)
pub const V12_SWAPPED_MNEMONICS: &[&str] = &[
    "COMP", "WELL", "FLD", "LOC", "PROV", "SRVC", "DATE", "UWI", "API",
];

/// Line prefix marking a section title line
pub const TITLE_MARKER: char = '~';

/// Line prefix marking a comment line
pub const COMMENT_MARKER: char = '#';

// =============================================================================
// Version section mnemonics
// =============================================================================

/// Required version-section mnemonics for versions 1.2 and 2.0
pub const V2_VERSION_REQUIRED: &[&str] = &["VERS", "WRAP"];

/// Required version-section mnemonics for version 3.0
pub const V3_VERSION_REQUIRED: &[&str] = &["VERS", "WRAP", "DLM"];

/// Valid DLM values for version 3.0 (the empty string is also accepted)
pub const V3_VALID_DELIMITERS: &[&str] = &["SPACE", "COMMA", "TAB"];

// =============================================================================
// Well section mnemonics
// =============================================================================

/// Required well-section mnemonics for versions 1.2 and 2.0
pub const V2_WELL_REQUIRED: &[&str] = &[
    "STRT", "STOP", "STEP", "NULL", "COMP", "WELL", "FLD", "LOC", "SRVC", "DATE",
];

/// Required well-section mnemonics for version 3.0
pub const V3_WELL_REQUIRED: &[&str] = &[
    "STRT", "STOP", "STEP", "NULL", "COMP", "WELL", "FLD", "LOC", "SRVC", "CTRY", "DATE",
];

/// v2 alternative to PROV: county, state and country
pub const V2_REGION_ALTERNATIVE: &[&str] = &["CNTY", "STAT", "CTRY"];

/// v3 geodetic location mnemonic group
pub const V3_LOCATION_GEODETIC: &[&str] = &["LATI", "LONG", "GDAT"];

/// v3 grid location mnemonic group
pub const V3_LOCATION_GRID: &[&str] = &["X", "Y", "GDAT", "HZCS"];

/// Country codes with additional mnemonic requirements
pub const VALID_COUNTRY_CODES: &[&str] = &["US", "CA"];

/// Additional well mnemonics required when CTRY resolves to US
pub const US_WELL_REQUIRED: &[&str] = &["STAT", "CNTY", "API"];

/// Additional well mnemonics required when CTRY resolves to CA
pub const CA_WELL_REQUIRED: &[&str] = &["PROV", "UWI", "LIC"];

/// Well mnemonics carrying a candidate well identifier
pub const IDENTIFIER_MNEMONICS: &[&str] = &["UWI", "API"];

// =============================================================================
// Section families
// =============================================================================

/// Suffix marking a 3.0 curve-definition section
pub const DEFINITION_SUFFIX: &str = "_definition";

/// Suffix marking a 3.0 parameter section
pub const PARAMETERS_SUFFIX: &str = "_parameters";

/// Suffix marking a 3.0 data section
pub const DATA_SUFFIX: &str = "_data";

// =============================================================================
// Defaults
// =============================================================================

/// Default file extension scanned in batch mode
pub const LAS_FILE_EXTENSION: &str = "las";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_mnemonics_contains_well() {
        assert!(V12_SWAPPED_MNEMONICS.contains(&"WELL"));
        assert!(!V12_SWAPPED_MNEMONICS.contains(&"STRT"));
    }

    #[test]
    fn test_required_sets_are_disjoint_from_alternatives() {
        for m in V2_REGION_ALTERNATIVE {
            assert!(!V2_WELL_REQUIRED.contains(m));
        }
    }
}
