#![deny(missing_docs)]

//! # Naming Policy
//!
//! Deterministic derivation of synthetic type names. The extractor and the
//! mapper call this identically, so a schema promoted during extraction and
//! the reference emitted during mapping always agree on the same name. The
//! function is pure: no counters, no process-wide state.

use heck::ToUpperCamelCase;

/// Derives a type name from an optional parent name and a field name.
///
/// The field is converted to UpperCamelCase and a single trailing
/// pluralizing `s` is stripped (double-`s` endings such as `Address` are
/// kept). The parent, when present, is prefixed verbatim with no separator.
pub fn derive_name(parent: Option<&str>, field: &str) -> String {
    let mut name = field.to_upper_camel_case();
    if name.len() > 1 && name.ends_with('s') && !name.ends_with("ss") {
        name.truncate(name.len() - 1);
    }
    match parent {
        Some(parent) => format!("{}{}", parent, name),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_field_name() {
        assert_eq!(derive_name(None, "location"), "Location");
    }

    #[test]
    fn test_parent_prefix() {
        assert_eq!(derive_name(Some("Station"), "location"), "StationLocation");
    }

    #[test]
    fn test_plural_stripped() {
        assert_eq!(derive_name(None, "stations"), "Station");
        assert_eq!(derive_name(Some("Line"), "stops"), "LineStop");
    }

    #[test]
    fn test_double_s_kept() {
        assert_eq!(derive_name(None, "address"), "Address");
    }

    #[test]
    fn test_snake_case_field() {
        assert_eq!(derive_name(Some("User"), "home_towns"), "UserHomeTown");
    }

    #[test]
    fn test_deterministic() {
        let first = derive_name(Some("Station"), "location");
        let second = derive_name(Some("Station"), "location");
        assert_eq!(first, second);
    }
}
