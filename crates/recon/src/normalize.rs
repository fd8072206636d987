//! Join-key and name comparison rules.
//!
//! Serials join case-insensitively after trimming. Desired names collide
//! case-insensitively for duplicate detection, but compare exactly (after
//! trim) against the remote name, since a name is an exact target value.

/// Normalize a hardware serial for joining: trimmed, upper-cased.
pub fn normalize_serial(serial: &str) -> String {
    serial.trim().to_uppercase()
}

/// Case-insensitive key for a desired name. `None` for blank names, which
/// never take part in duplicate detection.
pub fn name_key(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// True when the remote name already equals the desired name.
pub fn names_match(current: &str, desired: &str) -> bool {
    current.trim() == desired.trim()
}

/// True when the remote record carries no usable name.
pub fn is_unnamed(current: &str) -> bool {
    current.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_trims_and_uppercases() {
        assert_eq!(normalize_serial("  abc-123 "), "ABC-123");
        assert_eq!(normalize_serial("ABC"), "ABC");
        assert_eq!(normalize_serial("   "), "");
    }

    #[test]
    fn name_key_is_case_insensitive() {
        assert_eq!(name_key(" Laptop-01 "), Some("laptop-01".into()));
        assert_eq!(name_key("LAPTOP-01"), name_key("laptop-01"));
    }

    #[test]
    fn blank_names_have_no_key() {
        assert_eq!(name_key(""), None);
        assert_eq!(name_key(" \t "), None);
    }

    #[test]
    fn names_match_is_case_sensitive() {
        assert!(names_match("LAPTOP-01", "LAPTOP-01"));
        assert!(names_match("  LAPTOP-01 ", "LAPTOP-01"));
        assert!(!names_match("laptop-01", "LAPTOP-01"));
    }

    #[test]
    fn unnamed_detection() {
        assert!(is_unnamed(""));
        assert!(is_unnamed("   "));
        assert!(!is_unnamed("X"));
    }
}
