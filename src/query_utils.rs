use std::sync::LazyLock;

use regex::Regex;

use crate::error::StmtMiddlewareError;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern compiles")
});

static PRAGMA_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?[0-9]+|[A-Za-z_][A-Za-z0-9_]*)$")
        .expect("pragma value pattern compiles")
});

/// Check that `name` is a plain (optionally schema-qualified) SQL identifier.
///
/// # Errors
/// Returns `StmtMiddlewareError::ConfigError` naming `what` when it is not.
pub(crate) fn ensure_identifier(what: &str, name: &str) -> Result<(), StmtMiddlewareError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StmtMiddlewareError::ConfigError(format!(
            "{what} must be a plain identifier, got {name:?}"
        )))
    }
}

pub(crate) fn is_pragma_value(value: &str) -> bool {
    PRAGMA_VALUE.is_match(value)
}

/// `?,?,?` for `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        for ok in ["sessions", "_t1", "main.sessions"] {
            assert!(ensure_identifier("table", ok).is_ok(), "{ok}");
        }
        for bad in ["", "1abc", "t; DROP TABLE x", "a.b.c", "na-me", "`t`"] {
            assert!(ensure_identifier("table", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn pragma_values() {
        assert!(is_pragma_value("WAL"));
        assert!(is_pragma_value("-2000"));
        assert!(!is_pragma_value("1; DROP"));
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(3), "?,?,?");
        assert_eq!(placeholders(1), "?");
    }
}
