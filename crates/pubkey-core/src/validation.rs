//! Identifier validation
//!
//! Identifiers appear verbatim in URL paths (`/api/keys/{id}`) and as
//! storage keys, so only a conservative charset is accepted.

use crate::error::{KeyError, Result};

/// Maximum identifier length in bytes
pub const MAX_ID_LEN: usize = 256;

/// Validate a caller-supplied identifier
///
/// Accepts 1..=256 characters from `[A-Za-z0-9._-]`. An identifier made only
/// of dots (`.`, `..`) is rejected since it is a path segment.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(KeyError::InvalidId("identifier cannot be empty".into()));
    }

    if id.len() > MAX_ID_LEN {
        return Err(KeyError::InvalidId(format!(
            "identifier too long ({} bytes, max {})",
            id.len(),
            MAX_ID_LEN
        )));
    }

    if let Some(c) = id.chars().find(|c| !is_id_char(*c)) {
        return Err(KeyError::InvalidId(format!(
            "identifier contains disallowed character {:?}",
            c
        )));
    }

    if id.chars().all(|c| c == '.') {
        return Err(KeyError::InvalidId(
            "identifier cannot consist only of dots".into(),
        ));
    }

    Ok(())
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["device-1", "x", "A.b_c-9", "node.eu-west.01", "..hidden"] {
            assert!(validate_id(id).is_ok(), "{id} should be accepted");
        }
    }

    #[test]
    fn test_empty_id() {
        assert!(matches!(validate_id(""), Err(KeyError::InvalidId(_))));
    }

    #[test]
    fn test_unsafe_characters() {
        for id in ["a/b", "a b", "a?b", "a#b", "a%2F", "a\\b", "ключ", "a\nb", "a:b"] {
            assert!(
                matches!(validate_id(id), Err(KeyError::InvalidId(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dot_segments() {
        assert!(validate_id(".").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("...").is_err());
    }

    #[test]
    fn test_length_limit() {
        let max = "a".repeat(MAX_ID_LEN);
        assert!(validate_id(&max).is_ok());

        let too_long = "a".repeat(MAX_ID_LEN + 1);
        assert!(validate_id(&too_long).is_err());
    }
}
