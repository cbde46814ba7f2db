//! Well-identifier selection
//!
//! A well section can carry several identifier values (`UWI`, `API`) which
//! frequently disagree in formatting but not in identity. Normalization is
//! delegated through [`IdentifierNormalizer`] so the selection policy stays
//! independent of any particular identifier scheme.

use tracing::debug;

/// A raw identifier value resolved into its canonical forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedId {
    /// Fully normalized identifier as the normalizer renders it
    pub canonical: String,
    /// The 10-digit unformatted key used to compare identities
    pub unformatted_10_digit: String,
}

/// Seam for the external identifier normalization scheme
pub trait IdentifierNormalizer {
    /// Normalize a raw identifier value, or `None` when it is not a valid
    /// identifier under this scheme
    fn normalize(&self, raw: &str) -> Option<NormalizedId>;
}

/// Select the best identifier from the raw candidates
///
/// Invalid candidates are discarded. When every valid candidate agrees on
/// the 10-digit key the first one wins; on disagreement the candidate with
/// the longest canonical form wins, since longer forms carry more location
/// detail.
pub fn select_identifier(
    candidates: &[&str],
    normalizer: &impl IdentifierNormalizer,
) -> Option<NormalizedId> {
    let valid: Vec<NormalizedId> = candidates
        .iter()
        .filter_map(|raw| normalizer.normalize(raw))
        .collect();
    let first = valid.first()?;

    if valid
        .iter()
        .all(|id| id.unformatted_10_digit == first.unformatted_10_digit)
    {
        return Some(first.clone());
    }

    debug!(
        candidates = valid.len(),
        "identifier candidates disagree, selecting longest"
    );
    valid
        .iter()
        .max_by_key(|id| id.canonical.len())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Digits-only scheme: valid when at least ten digits survive
    struct DigitsOnly;

    impl IdentifierNormalizer for DigitsOnly {
        fn normalize(&self, raw: &str) -> Option<NormalizedId> {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            if digits.len() < 10 {
                return None;
            }
            Some(NormalizedId {
                unformatted_10_digit: digits[..10].to_string(),
                canonical: digits,
            })
        }
    }

    #[test]
    fn test_agreeing_candidates_select_first() {
        let selected =
            select_identifier(&["42-123-12345", "4212312345"], &DigitsOnly).unwrap();
        assert_eq!(selected.canonical, "4212312345");
        assert_eq!(selected.unformatted_10_digit, "4212312345");
    }

    #[test]
    fn test_disagreeing_candidates_select_longest() {
        let selected =
            select_identifier(&["4212312345", "100123403411W400"], &DigitsOnly).unwrap();
        assert_eq!(selected.canonical, "100123403411400");
    }

    #[test]
    fn test_invalid_candidates_discarded() {
        let selected = select_identifier(&["N/A", "4212312345"], &DigitsOnly).unwrap();
        assert_eq!(selected.canonical, "4212312345");
    }

    #[test]
    fn test_no_valid_candidates() {
        assert!(select_identifier(&["", "unknown"], &DigitsOnly).is_none());
    }
}
