// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request-body field validation.
//!
//! Purely syntactic: presence of required fields and the email format
//! check. Semantic validation (duplicate emails, weak passwords) is the
//! identity provider's job.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::AppError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w-]+(\.[\w-]+)*@([\w-]+\.)+[a-zA-Z]{2,7}$").expect("email regex is valid")
});

/// Whether a body value counts as present.
///
/// Mirrors the frontend contract: `null`, the empty string, `false` and
/// numeric zero are all treated as missing.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

/// Collect the required field names missing from `body`, preserving the
/// order of `required`.
pub fn missing_fields(body: &Map<String, Value>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !is_present(body.get(**name)))
        .map(|name| name.to_string())
        .collect()
}

/// Check that all `required` fields are present in `body`.
///
/// Fails with `Missing fields: a, b, c` listing exactly the absent names.
pub fn require_fields(body: &Map<String, Value>, required: &[&str]) -> Result<(), AppError> {
    let missing = missing_fields(body, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )))
    }
}

/// Syntactic email check: word/dot/hyphen local part, dotted domain,
/// 2-7 letter TLD.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_missing_fields_preserves_order() {
        let body = body(json!({"lastName": "B"}));
        let missing = missing_fields(&body, &["email", "firstName", "lastName", "signInMethod"]);
        assert_eq!(missing, vec!["email", "firstName", "signInMethod"]);
    }

    #[test]
    fn test_falsy_values_count_as_missing() {
        let body = body(json!({
            "a": null,
            "b": "",
            "c": false,
            "d": 0,
            "e": "ok",
            "f": 1,
            "g": true,
        }));

        assert!(!is_present(body.get("a")));
        assert!(!is_present(body.get("b")));
        assert!(!is_present(body.get("c")));
        assert!(!is_present(body.get("d")));
        assert!(is_present(body.get("e")));
        assert!(is_present(body.get("f")));
        assert!(is_present(body.get("g")));
    }

    #[test]
    fn test_require_fields_message() {
        let body = body(json!({"email": "a@b.com"}));
        let err = require_fields(&body, &["email", "firstName", "lastName"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing fields: firstName, lastName");
    }

    #[test]
    fn test_require_fields_ok() {
        let body = body(json!({"email": "a@b.com", "firstName": "A"}));
        assert!(require_fields(&body, &["email", "firstName"]).is_ok());
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@example.com"));
        assert!(is_valid_email("user-name@sub.domain.museum"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@example.c"));
        assert!(!is_valid_email("user@example.toolongtld"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email(""));
    }
}
