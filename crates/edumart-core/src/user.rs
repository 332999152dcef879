//! User records and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};
use crate::UserId;

/// Maximum accepted length for a display name.
pub const MAX_NAME_LEN: usize = 120;

/// A marketplace user: student, instructor or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID (assigned by the identity gateway).
    pub id: UserId,

    /// Display name.
    pub name: String,

    /// Email address, unique case-insensitively.
    pub email: String,

    /// Role within the marketplace.
    pub role: Role,

    /// Optional profile text (shown on instructor pages).
    pub bio: Option<String>,

    /// Soft-delete flag.
    pub is_active: bool,

    /// When the user registered.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create an active user after validating name and email.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` if the name is blank or too long, or the
    /// email is malformed.
    pub fn new(id: UserId, name: &str, email: &str, role: Role) -> Result<Self> {
        let name = validate_name(name)?;
        let email = normalize_email(email)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name,
            email,
            role,
            bio: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the user is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the user may publish courses and books.
    #[must_use]
    pub fn can_teach(&self) -> bool {
        matches!(self.role, Role::Instructor | Role::Admin)
    }
}

/// Marketplace roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys and takes courses.
    Student,
    /// Publishes courses, books and learning paths.
    Instructor,
    /// Platform operator.
    Admin,
}

/// Trim and validate a display name.
///
/// # Errors
///
/// Returns `EduError::Invalid` for blank or overlong names.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EduError::invalid("name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EduError::invalid(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Lower-case and sanity check an email address.
///
/// # Errors
///
/// Returns `EduError::Invalid` unless the address has a non-empty local part
/// and a domain containing a dot.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if !valid || email.contains(char::is_whitespace) {
        return Err(EduError::invalid("email", "malformed address"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new(UserId::generate(), "  Ada ", "Ada@Example.COM", Role::Student).unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
        assert!(!user.can_teach());
    }

    #[test]
    fn rejects_bad_email() {
        for email in ["", "no-at-sign", "@example.com", "a@nodot", "a b@example.com"] {
            assert!(normalize_email(email).is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn rejects_blank_name() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn roles() {
        let admin = User::new(UserId::generate(), "Root", "root@example.com", Role::Admin).unwrap();
        assert!(admin.is_admin());
        assert!(admin.can_teach());
    }
}
