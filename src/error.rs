/// Malformed records rejected at the boundary, before any scoring runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{kind} '{id}': missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("{kind} '{id}': field '{field}' out of range: {reason}")]
    OutOfRange {
        kind: &'static str,
        id: String,
        field: &'static str,
        reason: String,
    },

    #[error("{kind} '{id}' belongs to site '{actual}', expected '{expected}'")]
    SiteMismatch {
        kind: &'static str,
        id: String,
        expected: String,
        actual: String,
    },

    #[error("{source_name}: malformed {kind} record: {reason}")]
    Malformed {
        kind: &'static str,
        source_name: String,
        reason: String,
    },
}

/// Reject blank required string fields.
pub(crate) fn require(
    kind: &'static str,
    id: &str,
    field: &'static str,
    value: &str,
) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::MissingField {
            kind,
            id: if id.trim().is_empty() {
                "<unnamed>".to_string()
            } else {
                id.to_string()
            },
            field,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        let err = require("signal", "sig_1", "site_id", "  ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "signal 'sig_1': missing required field 'site_id'"
        );
    }

    #[test]
    fn test_require_names_unnamed_records() {
        let err = require("site", "", "site_id", "").unwrap_err();
        assert_eq!(err.to_string(), "site '<unnamed>': missing required field 'site_id'");
    }

    #[test]
    fn test_malformed_message() {
        let err = InputError::Malformed {
            kind: "site",
            source_name: "site.json".to_string(),
            reason: "missing field `name`".to_string(),
        };
        assert_eq!(err.to_string(), "site.json: malformed site record: missing field `name`");
    }

    #[test]
    fn test_require_accepts_value() {
        assert!(require("site", "site_1", "name", "Downtown").is_ok());
    }
}
