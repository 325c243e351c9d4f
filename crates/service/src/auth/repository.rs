use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use crate::errors::ServiceError;
use crate::session::Role;

/// Repository abstraction for auth-related persistence.
///
/// Emails are passed already normalized (trimmed, lowercased).
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, ServiceError>;
    /// Creates the user and its password atomically. Fails with `Conflict` when the email is taken.
    async fn create_user_with_password(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, ServiceError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError>;
}
