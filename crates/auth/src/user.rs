//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use registrar_core::UserId;

use crate::Role;

/// Descriptive profile fields. None of these take part in any decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    /// University-issued student number (students only).
    pub student_id: Option<String>,
    pub department: Option<String>,
}

/// A user account as stored.
///
/// `password_hash` never leaves the process: it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "isActive")]
    pub active: bool,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provisioning request for a new account (seeding, admin tooling).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub profile: UserProfile,
}

impl User {
    pub fn provision(id: UserId, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
            active: new.active,
            profile: new.profile,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
