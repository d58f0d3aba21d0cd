//! Role records and their validators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use warden_core::validation::rules;
use warden_core::{Entity, FieldErrors, RoleId};

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const DESCRIPTION_FORBIDDEN: &[char] = &['<', '>', '|'];

/// Persisted role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> RoleId {
        self.id
    }
}

/// Compact role view embedded in user listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            description: role.description.clone(),
        }
    }
}

/// Body of a role create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRole {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a partial role update.
///
/// `description` distinguishes "absent" (`None`) from "explicitly null"
/// (`Some(None)`, which clears it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A validated role ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

/// A validated partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl RoleChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

fn check_name(errors: &mut FieldErrors, name: Option<&str>) -> Option<String> {
    let name = errors.require("name", name)?.trim();
    let before = errors.len();
    errors.check("name", rules::max_chars("name", name, NAME_MAX));
    errors.check("name", rules::letters_and_spaces("name", name));
    (errors.len() == before).then(|| name.to_string())
}

/// Blank descriptions are stored as absent.
fn check_description(errors: &mut FieldErrors, description: Option<&str>) -> Option<String> {
    let description = description.map(str::trim).filter(|d| !d.is_empty())?;
    errors.check(
        "description",
        rules::max_chars("description", description, DESCRIPTION_MAX),
    );
    errors.check(
        "description",
        rules::forbidden_chars("description", description, DESCRIPTION_FORBIDDEN),
    );
    Some(description.to_string())
}

impl CreateRole {
    pub fn validate(&self) -> Result<NewRole, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = check_name(&mut errors, self.name.as_deref());
        let description = check_description(&mut errors, self.description.as_deref());

        match name {
            Some(name) if errors.is_empty() => Ok(NewRole { name, description }),
            _ => Err(errors),
        }
    }
}

impl UpdateRole {
    pub fn validate(&self) -> Result<RoleChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = RoleChanges::default();

        if let Some(name) = &self.name {
            changes.name = check_name(&mut errors, Some(name.as_str()));
        }
        if let Some(description) = &self.description {
            changes.description = Some(check_description(&mut errors, description.as_deref()));
        }

        if errors.is_empty() { Ok(changes) } else { Err(errors) }
    }
}
