// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Request validation module.

use mdwiki_common::AccessLevel;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TITLE_LENGTH: usize = 200;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email regex")
});

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid access level: {0}")]
    InvalidAccessLevel(String),

    #[error("Password is different from its confirmation")]
    PasswordMismatch,

    #[error("Invalid title: {0}")]
    InvalidTitle(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an email-like account id
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a page title
pub fn validate_title(title: &str) -> ValidationResult<&str> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidTitle(
            "Title must not be empty".to_string(),
        ));
    }

    if title.len() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidTitle(format!(
            "Title must be between 1 and {MAX_TITLE_LENGTH} characters"
        )));
    }

    Ok(title)
}

/// Check a password against its confirmation field
pub fn confirm_password<'a>(password: &'a str, confirm: &str) -> ValidationResult<&'a str> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(password)
}

/// Parse an access level from its wire form
pub fn parse_access_level(level: &str) -> ValidationResult<AccessLevel> {
    AccessLevel::parse(level)
        .ok_or_else(|| ValidationError::InvalidAccessLevel(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        assert!(matches!(
            validate_email(""),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Meeting Notes").is_ok());

        assert!(matches!(
            validate_title("   "),
            Err(ValidationError::InvalidTitle(_))
        ));
        let long = "a".repeat(201);
        assert!(matches!(
            validate_title(&long),
            Err(ValidationError::InvalidTitle(_))
        ));
    }

    #[test]
    fn test_confirm_password() {
        assert!(confirm_password("secret", "secret").is_ok());
        assert!(matches!(
            confirm_password("secret", "secrets"),
            Err(ValidationError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_parse_access_level() {
        assert_eq!(parse_access_level("viewer").unwrap(), AccessLevel::Viewer);
        assert_eq!(parse_access_level("writer").unwrap(), AccessLevel::Writer);
        assert!(matches!(
            parse_access_level("admin"),
            Err(ValidationError::InvalidAccessLevel(_))
        ));
    }
}
