//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Longest access code accepted
pub const MAX_ACCESS_CODE_LEN: usize = 128;

/// Validate and normalize an access code
pub fn normalize_access_code(raw: &str) -> Result<String, String> {
    let code = raw.trim();

    if code.is_empty() {
        return Err("Access code is required".to_string());
    }

    if code.chars().count() > MAX_ACCESS_CODE_LEN {
        return Err(format!(
            "Access code must be at most {} characters long",
            MAX_ACCESS_CODE_LEN
        ));
    }

    if code.chars().any(char::is_control) {
        return Err("Access code contains invalid characters".to_string());
    }

    Ok(code.to_string())
}

/// Whether `token` has the shape of a backend record id (`rec` + 14 alphanumerics)
pub fn looks_like_record_id(token: &str) -> bool {
    static RECORD_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = RECORD_ID_REGEX.get_or_init(|| {
        Regex::new(r"^rec[A-Za-z0-9]{14}$").expect("Failed to compile record id regex")
    });

    regex.is_match(token)
}

/// Validate the base identifier of an operator override
pub fn validate_base_id(base_id: &str) -> Result<(), String> {
    if base_id.trim().is_empty() {
        return Err("Base id is required".to_string());
    }

    static BASE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = BASE_ID_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile base id regex"));

    if !regex.is_match(base_id) {
        return Err("Base id can only contain letters, numbers, dashes and underscores".to_string());
    }

    Ok(())
}

/// Validate the API key of an operator override
pub fn validate_api_key(api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key is required".to_string());
    }

    if api_key.chars().any(char::is_whitespace) {
        return Err("API key must not contain whitespace".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_access_code() {
        assert_eq!(normalize_access_code("  access123 "), Ok("access123".to_string()));
        assert!(normalize_access_code("").is_err());
        assert!(normalize_access_code("   ").is_err());
        assert!(normalize_access_code(&"x".repeat(129)).is_err());
        assert!(normalize_access_code("abc\u{0}def").is_err());
        assert!(normalize_access_code("Code d'accès").is_ok());
    }

    #[test]
    fn test_looks_like_record_id() {
        assert!(looks_like_record_id("rech0KgjCrK24UrBH"));
        assert!(!looks_like_record_id("access123"));
        assert!(!looks_like_record_id("rech0KgjCrK24UrB"));
        assert!(!looks_like_record_id("rech0KgjCrK24UrBHx"));
        assert!(!looks_like_record_id("recH0KgjCrK24Ur-H"));
    }

    #[test]
    fn test_validate_override() {
        assert!(validate_base_id("app4LDBPHMVKbzSHj").is_ok());
        assert!(validate_base_id("").is_err());
        assert!(validate_base_id("app/../x").is_err());
        assert!(validate_api_key("patXYZ.123").is_ok());
        assert!(validate_api_key("pat XYZ").is_err());
        assert!(validate_api_key(" ").is_err());
    }
}
