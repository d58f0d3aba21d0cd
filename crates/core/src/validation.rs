//! Typed field validation.
//!
//! Each rule is a plain function returning `Err(message)` on violation.
//! Record validators compose rules per field and collect the messages into a
//! [`FieldErrors`] map, which is the `errors` object clients render inline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Field name → messages. Fields are kept sorted; messages keep check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Record the outcome of a rule.
    pub fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add(field, message);
        }
    }

    /// Apply the `required` rule; returns the value only when present so
    /// dependent rules can run on it.
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match rules::required(field, value) {
            Ok(v) => Some(v),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// First message plus a count of the rest, e.g.
    /// `The email field is required. (and 2 more errors)`.
    pub fn summary(&self) -> String {
        let Some(first) = self.0.values().flat_map(|m| m.iter()).next() else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }

    /// `Ok(())` when no rule failed, otherwise a validation error.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

/// Field rules. Messages use the field name with underscores replaced by spaces.
pub mod rules {
    use validator::ValidateEmail;

    fn label(field: &str) -> String {
        field.replace('_', " ")
    }

    pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, String> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(format!("The {} field is required.", label(field))),
        }
    }

    pub fn max_chars(field: &str, value: &str, max: usize) -> Result<(), String> {
        if value.chars().count() > max {
            return Err(format!(
                "The {} field must not be greater than {max} characters.",
                label(field)
            ));
        }
        Ok(())
    }

    pub fn min_chars(field: &str, value: &str, min: usize) -> Result<(), String> {
        if value.chars().count() < min {
            return Err(format!(
                "The {} field must be at least {min} characters.",
                label(field)
            ));
        }
        Ok(())
    }

    pub fn letters_and_spaces(field: &str, value: &str) -> Result<(), String> {
        if !value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
            return Err(format!(
                "The {} field may only contain letters and spaces.",
                label(field)
            ));
        }
        Ok(())
    }

    pub fn email(field: &str, value: &str) -> Result<(), String> {
        if !value.validate_email() {
            return Err(format!(
                "The {} field must be a valid email address.",
                label(field)
            ));
        }
        Ok(())
    }

    pub fn forbidden_chars(field: &str, value: &str, forbidden: &[char]) -> Result<(), String> {
        if value.chars().any(|c| forbidden.contains(&c)) {
            let listed = forbidden.iter().map(char::to_string).collect::<Vec<_>>().join(" ");
            return Err(format!(
                "The {} field must not contain any of the characters: {listed}",
                label(field)
            ));
        }
        Ok(())
    }

    pub fn confirmed(field: &str, value: &str, confirmation: Option<&str>) -> Result<(), String> {
        if confirmation != Some(value) {
            return Err(format!(
                "The {} field confirmation does not match.",
                label(field)
            ));
        }
        Ok(())
    }

    /// `expected` reads after "must be", e.g. `a string`.
    pub fn wrong_type(field: &str, expected: &str) -> String {
        format!("The {} field must be {expected}.", label(field))
    }

    pub fn unique_taken(field: &str) -> String {
        format!("The {} has already been taken.", label(field))
    }

    pub fn invalid_selection(field: &str) -> String {
        format!("The selected {} is invalid.", label(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn require_reports_missing_and_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.require("full_name", None), None);
        assert_eq!(errors.require("email", Some("   ")), None);
        assert_eq!(errors.require("name", Some("Admin")), Some("Admin"));

        assert_eq!(
            errors.get("full_name"),
            Some(&["The full name field is required.".to_string()][..])
        );
        assert!(errors.has("email"));
        assert!(!errors.has("name"));
    }

    #[test]
    fn summary_counts_remaining_messages() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email field is required.");
        assert_eq!(errors.summary(), "The email field is required.");

        errors.add("password", "a");
        errors.add("password", "b");
        assert_eq!(errors.summary(), "The email field is required. (and 2 more errors)");
    }

    #[test]
    fn into_result_is_ok_when_empty() {
        assert!(FieldErrors::new().into_result().is_ok());
        let mut errors = FieldErrors::new();
        errors.add("name", "x");
        assert!(matches!(errors.into_result(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email has already been taken.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": ["The email has already been taken."] })
        );
    }

    #[test]
    fn email_rule() {
        assert!(rules::email("email", "jane@x.com").is_ok());
        assert!(rules::email("email", "not-an-email").is_err());
        assert!(rules::email("email", "two@@x.com").is_err());
    }

    #[test]
    fn forbidden_chars_rule() {
        let set = ['<', '>', '|'];
        assert!(rules::forbidden_chars("description", "plain text", &set).is_ok());
        assert!(rules::forbidden_chars("description", "<script>", &set).is_err());
        assert!(rules::forbidden_chars("description", "a | b", &set).is_err());
    }

    #[test]
    fn wrong_type_message() {
        assert_eq!(
            rules::wrong_type("full_name", "a string"),
            "The full name field must be a string."
        );
    }

    #[test]
    fn confirmed_rule() {
        assert!(rules::confirmed("password", "P@ssw0rd1", Some("P@ssw0rd1")).is_ok());
        assert!(rules::confirmed("password", "P@ssw0rd1", Some("P@ssw0rd2")).is_err());
        assert!(rules::confirmed("password", "P@ssw0rd1", None).is_err());
    }

    proptest! {
        /// Property: any string of ASCII letters and spaces passes the
        /// letters-and-spaces rule.
        #[test]
        fn letters_and_spaces_accepts_alpha(name in "[a-zA-Z ]{1,64}") {
            prop_assert!(rules::letters_and_spaces("full_name", &name).is_ok());
        }

        /// Property: a digit anywhere fails the letters-and-spaces rule.
        #[test]
        fn letters_and_spaces_rejects_digits(prefix in "[a-zA-Z]{0,10}", digit in 0u8..10, suffix in "[a-zA-Z]{0,10}") {
            let name = format!("{prefix}{digit}{suffix}");
            prop_assert!(rules::letters_and_spaces("full_name", &name).is_err());
        }

        /// Property: max_chars counts characters, not bytes.
        #[test]
        fn max_chars_counts_chars(n in 0usize..300) {
            let value = "é".repeat(n);
            prop_assert_eq!(rules::max_chars("name", &value, 255).is_ok(), n <= 255);
        }
    }
}
