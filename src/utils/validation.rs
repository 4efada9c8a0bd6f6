use crate::error::AppError;

/// Checks that every named field is present and non-blank, and reports
/// all of the missing ones in a single validation error so the caller can
/// fix the whole request at once.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.map(str::trim).is_none_or(str::is_empty))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_present() {
        let result = require_fields(&[("name", Some("Trip")), ("email", Some("a@b.c"))]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_and_blank_fields_are_named() {
        let result = require_fields(&[
            ("name", None),
            ("email", Some("a@b.c")),
            ("description", Some("   ")),
        ]);

        match result {
            Err(AppError::Validation(message)) => {
                assert!(message.contains("name"));
                assert!(message.contains("description"));
                assert!(!message.contains("email"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }
}
