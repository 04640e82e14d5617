//! SOQL literal escaping and identifier checks.
//!
//! Every user-supplied value spliced into a SOQL string literal must pass
//! through [`escape_string`] (or [`escape_like`] inside a `LIKE` pattern).
//!
//! ```rust
//! use sfdc_soql::escape;
//!
//! let name = escape::escape_string("O'Brien");
//! assert_eq!(
//!     format!("SELECT Id FROM Contact WHERE LastName = '{name}'"),
//!     "SELECT Id FROM Contact WHERE LastName = 'O\\'Brien'"
//! );
//! ```

/// Escape a value for use inside a single-quoted SOQL literal.
#[must_use]
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Like [`escape_string`], but also neutralises the `%` and `_` wildcards.
#[must_use]
pub fn escape_like(value: &str) -> String {
    escape_string(value)
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// True for names made of ASCII letters, digits and underscores that start
/// with a letter. Covers custom `__c`/`__r` names.
///
/// Relationship paths are checked segment by segment, so `Owner.Name` passes.
#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_safe_segment)
}

fn is_safe_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("O'Brien"), "O\\'Brien");
        assert_eq!(escape_string("back\\slash"), "back\\\\slash");
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_string("plain"), "plain");
    }

    #[test]
    fn test_escape_string_blocks_injection() {
        let escaped = escape_string("' OR Name LIKE '%");
        assert_eq!(escaped, "\\' OR Name LIKE \\'%");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("it's"), "it\\'s");
    }

    #[test]
    fn test_is_safe_identifier() {
        assert!(is_safe_identifier("Account"));
        assert!(is_safe_identifier("Custom_Field__c"));
        assert!(is_safe_identifier("Owner.Name"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("1Field"));
        assert!(!is_safe_identifier("Owner..Name"));
        assert!(!is_safe_identifier("Name'; DELETE"));
    }
}
