//! Validation utilities for Web API DTOs.

/// Validate that a string does not contain control characters or NULL bytes.
///
/// Filenames and descriptions end up in response headers and logs; CR/LF in
/// particular must never get that far.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}
