//! User records and their validators.
//!
//! Validation here covers everything decidable from the request alone.
//! Uniqueness and the role reference need the store and are checked by the
//! user service, which merges its findings into the same field map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::validation::rules;
use warden_core::{Entity, FieldErrors, RoleId, UserId};

use crate::password;
use crate::role::RoleSummary;

pub const FULL_NAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 255;

/// Public view of a user. The password hash is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// User with its role embedded (list endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<RoleSummary>,
}

/// Body of a user create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// Body of a partial user update. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
}

/// A validated user ready to insert. `password` is still plaintext; the
/// service hashes it before it reaches the store.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role_id: RoleId,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

/// A validated partial update.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<RoleId>,
}

impl core::fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserChanges")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role_id", &self.role_id)
            .finish()
    }
}

fn check_full_name(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let value = errors.require("full_name", value)?.trim();
    let before = errors.len();
    errors.check("full_name", rules::max_chars("full_name", value, FULL_NAME_MAX));
    errors.check("full_name", rules::letters_and_spaces("full_name", value));
    (errors.len() == before).then(|| value.to_string())
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn check_email(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let value = errors.require("email", value)?.trim();
    let before = errors.len();
    errors.check("email", rules::email("email", value));
    errors.check("email", rules::max_chars("email", value, EMAIL_MAX));
    (errors.len() == before).then(|| normalize_email(value))
}

fn check_password(
    errors: &mut FieldErrors,
    value: Option<&str>,
    confirmation: Option<&str>,
) -> Option<String> {
    let value = errors.require("password", value)?;
    let before = errors.len();
    for rule in password::violations(value) {
        errors.add("password", rule.message());
    }
    errors.check("password", rules::confirmed("password", value, confirmation));
    (errors.len() == before).then(|| value.to_string())
}

fn check_role(errors: &mut FieldErrors, value: Option<RoleId>) -> Option<RoleId> {
    if value.is_none() {
        errors.add("role_id", "The role id field is required.");
    }
    value
}

impl CreateUser {
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        let full_name = check_full_name(&mut errors, self.full_name.as_deref());
        let email = check_email(&mut errors, self.email.as_deref());
        let password = check_password(
            &mut errors,
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
        );
        let role_id = check_role(&mut errors, self.role_id);

        match (full_name, email, password, role_id) {
            (Some(full_name), Some(email), Some(password), Some(role_id)) if errors.is_empty() => {
                Ok(NewUser {
                    full_name,
                    email,
                    password,
                    role_id,
                })
            }
            _ => Err(errors),
        }
    }
}

impl UpdateUser {
    pub fn validate(&self) -> Result<UserChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = UserChanges::default();

        if let Some(full_name) = &self.full_name {
            changes.full_name = check_full_name(&mut errors, Some(full_name.as_str()));
        }
        if let Some(email) = &self.email {
            changes.email = check_email(&mut errors, Some(email.as_str()));
        }
        if let Some(password) = &self.password {
            changes.password = check_password(
                &mut errors,
                Some(password.as_str()),
                self.password_confirmation.as_deref(),
            );
        }
        changes.role_id = self.role_id;

        if errors.is_empty() { Ok(changes) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> CreateUser {
        CreateUser {
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@x.com".to_string()),
            password: Some("P@ssw0rd1".to_string()),
            password_confirmation: Some("P@ssw0rd1".to_string()),
            role_id: Some(RoleId::new(1)),
        }
    }

    #[test]
    fn create_user_success() {
        let user = jane().validate().unwrap();
        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.email, "jane@x.com");
        assert_eq!(user.role_id, RoleId::new(1));
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = CreateUser::default().validate().unwrap_err();
        for field in ["full_name", "email", "password", "role_id"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn short_password_names_unmet_rules() {
        let mut input = jane();
        input.password = Some("short".to_string());
        input.password_confirmation = Some("short".to_string());

        let errors = input.validate().unwrap_err();
        let messages = errors.get("password").unwrap();
        assert!(messages.iter().any(|m| m.contains("at least 8 characters")));
        assert!(messages.iter().any(|m| m.contains("uppercase")));
        assert!(!errors.has("email"));
    }

    #[test]
    fn confirmation_must_match() {
        let mut input = jane();
        input.password_confirmation = Some("P@ssw0rd2".to_string());
        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some(&["The password field confirmation does not match.".to_string()][..])
        );
    }

    #[test]
    fn full_name_letters_and_spaces_only() {
        let mut input = jane();
        input.full_name = Some("Jane D0e".to_string());
        assert!(input.validate().unwrap_err().has("full_name"));
    }

    #[test]
    fn email_is_normalized() {
        let mut input = jane();
        input.email = Some("  Jane@X.com ".to_string());
        assert_eq!(input.validate().unwrap().email, "jane@x.com");
    }

    #[test]
    fn invalid_email_rejected() {
        let mut input = jane();
        input.email = Some("jane-at-x.com".to_string());
        assert!(input.validate().unwrap_err().has("email"));
    }

    #[test]
    fn update_only_touches_supplied_fields() {
        let update = UpdateUser {
            email: Some("new@x.com".to_string()),
            ..Default::default()
        };
        let changes = update.validate().unwrap();
        assert_eq!(changes.email.as_deref(), Some("new@x.com"));
        assert!(changes.full_name.is_none());
        assert!(changes.password.is_none());
        assert!(changes.role_id.is_none());
    }

    #[test]
    fn update_password_requires_confirmation() {
        let update = UpdateUser {
            password: Some("N3w@Passw0rd".to_string()),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().has("password"));
    }

    #[test]
    fn user_json_has_no_password() {
        let user = User {
            id: UserId::new(1),
            full_name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            role_id: RoleId::new(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role_id"], 1);
    }

    #[test]
    fn debug_never_prints_plaintext_password() {
        let user = jane().validate().unwrap();
        assert!(!format!("{user:?}").contains("P@ssw0rd1"));
    }
}
