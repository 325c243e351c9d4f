//! Server-held sessions and the request-scoped guard built on top of them.

pub mod context;
pub mod store;

pub use context::RequestContext;
pub use store::{MokaSessionStore, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => models::user::ROLE_USER,
            Role::Admin => models::user::ROLE_ADMIN,
        }
    }

    /// Exact, case-insensitive match on `USER` / `ADMIN`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(models::user::ROLE_USER) {
            Some(Role::User)
        } else if raw.eq_ignore_ascii_case(models::user::ROLE_ADMIN) {
            Some(Role::Admin)
        } else {
            None
        }
    }
}

/// Identity captured into a session at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub user: SessionUser,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> Uuid { self.user.id }

    pub fn is_admin(&self) -> bool { self.user.role == Role::Admin }
}
