//! User accounts for role-based access.
//!
//! Credentials live outside this system; a user row only carries identity,
//! role and the active flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: create a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Employee
}

impl NewUser {
    /// Validate and materialize the account. `actor` is the role of the caller
    /// creating it.
    pub fn into_user(self, actor: Role, id: UserId, now: DateTime<Utc>) -> DomainResult<User> {
        ensure_can_assign(actor, self.role)?;
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        Ok(User {
            id,
            username,
            email,
            full_name: non_empty(self.full_name),
            role: self.role,
            is_active: true,
            created_at: now,
        })
    }
}

/// Command: partial user update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Normalized email the patch would assign, if it changes it.
    pub fn new_email(&self, current: &User) -> DomainResult<Option<String>> {
        match &self.email {
            Some(email) => {
                let email = normalize_email(email)?;
                Ok((email != current.email).then_some(email))
            }
            None => Ok(None),
        }
    }

    pub fn apply(self, actor: Role, user: &mut User) -> DomainResult<()> {
        // Touching an account of a higher role is escalation too.
        ensure_can_assign(actor, user.role)?;
        if let Some(role) = self.role {
            ensure_can_assign(actor, role)?;
        }
        let email = self.email.as_deref().map(normalize_email).transpose()?;

        if let Some(email) = email {
            user.email = email;
        }
        if self.full_name.is_some() {
            user.full_name = non_empty(self.full_name);
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        Ok(())
    }
}

/// Refuse to grant (or manage) a role above the actor's own.
pub fn ensure_can_assign(actor: Role, target: Role) -> DomainResult<()> {
    if actor.can_assign(target) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "a {actor} cannot manage {target} accounts"
        )))
    }
}

fn normalize_username(raw: &str) -> DomainResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(DomainError::validation(format!(
            "username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(DomainError::validation(
            "username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(username.to_string())
}

fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("email must be a valid address")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
