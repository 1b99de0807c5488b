use serde_json::{json, Map, Value};
use shared_error::ApiError;

/// Minimum password length
pub const MIN_LENGTH: usize = 12;

/// Passwords rejected outright, compared lowercase
const BLOCKLIST: &[&str] = &[
    "password",
    "password1",
    "passw0rd",
    "password123",
    "123456789012",
    "qwertyuiop12",
    "letmein",
    "welcome1",
    "iloveyou",
    "changeme",
    "administrator",
    "correcthorsebatterystaple",
];

/// Validate a password against the policy
///
/// Every failing rule lands under its own key in the validation details so
/// clients can render them per rule.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let mut details = Map::new();

    if password.chars().count() < MIN_LENGTH {
        details.insert(
            "password".to_string(),
            json!(format!("at least {} characters", MIN_LENGTH)),
        );
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        details.insert(
            "password_uppercase".to_string(),
            json!("must contain an uppercase letter"),
        );
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        details.insert(
            "password_lowercase".to_string(),
            json!("must contain a lowercase letter"),
        );
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        details.insert("password_digit".to_string(), json!("must contain a digit"));
    }
    if !password
        .chars()
        .any(|c| c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()))
    {
        details.insert(
            "password_symbol".to_string(),
            json!("must contain a symbol"),
        );
    }
    if BLOCKLIST.contains(&password.to_lowercase().as_str()) {
        details.insert(
            "password_blocklist".to_string(),
            json!("password is too common"),
        );
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(
            "Password does not meet requirements",
            Value::Object(details),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details_of(err: ApiError) -> Value {
        match err {
            ApiError::Validation { details, .. } => details,
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_strong_password_passes() {
        assert!(validate_password("LovelaceBytes#9").is_ok());
        assert!(validate_password("Tr0ub4dor&3xKcd!").is_ok());
    }

    #[test]
    fn test_short_password_reports_length() {
        let details = details_of(validate_password("short").unwrap_err());
        assert_eq!(details["password"], json!("at least 12 characters"));
    }

    #[test]
    fn test_every_failing_rule_is_listed() {
        let details = details_of(validate_password("short").unwrap_err());
        // "short" also misses uppercase, digit, and symbol
        assert!(details.get("password").is_some());
        assert!(details.get("password_uppercase").is_some());
        assert!(details.get("password_digit").is_some());
        assert!(details.get("password_symbol").is_some());
        assert!(details.get("password_lowercase").is_none());
    }

    #[test]
    fn test_missing_symbol_only() {
        let details = details_of(validate_password("Abcdefghij12").unwrap_err());
        assert_eq!(details.as_object().unwrap().len(), 1);
        assert!(details.get("password_symbol").is_some());
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let details = details_of(validate_password("CorrectHorseBatteryStaple").unwrap_err());
        assert!(details.get("password_blocklist").is_some());
    }

    #[test]
    fn test_unicode_symbols_count() {
        assert!(validate_password("Sehrlang3sPaßwort€").is_ok());
    }
}
