use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use common::metrics::{LOGINS_TOTAL, LOGIN_FAILURES_TOTAL};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{RegisterInput, LoginInput, AuthUser};
use super::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::session::{RequestContext, Role, Session, SessionStore};

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub password_algorithm: String,
    pub min_password_len: usize,
    /// Registrations with these emails receive the admin role.
    pub admin_emails: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { password_algorithm: "argon2".into(), min_password_len: 8, admin_emails: Vec::new() }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    sessions: Arc<dyn SessionStore>,
    cfg: AuthConfig,
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, sessions: Arc<dyn SessionStore>, cfg: AuthConfig) -> Self { Self { repo, sessions, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig};
    /// use service::auth::domain::RegisterInput;
    /// use service::session::MokaSessionStore;
    /// use service::storage::memory::InMemoryStore;
    /// use std::{sync::Arc, time::Duration};
    /// let sessions = Arc::new(MokaSessionStore::new(Duration::from_secs(60), 100));
    /// let svc = AuthService::new(Arc::new(InMemoryStore::new()), sessions, AuthConfig::default());
    /// let input = RegisterInput { email: "User@Example.com".into(), name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, ServiceError> {
        let email = normalize_email(&input.email);
        models::user::validate_email(&email)?;
        models::user::validate_name(&input.name)?;
        if input.password.chars().count() < self.cfg.min_password_len {
            return Err(ServiceError::Validation(format!("password too short (>={})", self.cfg.min_password_len)));
        }
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(ServiceError::Conflict("email already registered".into()));
        }

        let role = if self.cfg.admin_emails.iter().any(|a| normalize_email(a) == email) { Role::Admin } else { Role::User };
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hash(e.to_string()))?
            .to_string();

        let user = self
            .repo
            .create_user_with_password(&email, input.name.trim(), role, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, email = %user.email, role = role.as_str(), "user_registered");
        Ok(user)
    }

    /// Verify the password and open a server-held session.
    ///
    /// Unknown email and wrong password fail the same way.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use service::session::MokaSessionStore;
    /// use service::storage::memory::InMemoryStore;
    /// use std::{sync::Arc, time::Duration};
    /// let sessions = Arc::new(MokaSessionStore::new(Duration::from_secs(60), 100));
    /// let svc = AuthService::new(Arc::new(InMemoryStore::new()), sessions, AuthConfig::default());
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<Session, ServiceError> {
        let email = normalize_email(&input.email);
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            return Err(Self::rejected());
        };
        let Some(cred) = self.repo.get_credentials(user.id).await? else {
            return Err(Self::rejected());
        };

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(Self::rejected());
        }

        let session = self.sessions.create(user.session_user()).await;
        LOGINS_TOTAL.inc();
        info!(user_id = %user.id, "user_logged_in");
        Ok(session)
    }

    /// Drop the caller's session; `false` when there was none.
    pub async fn logout(&self, ctx: &RequestContext) -> bool {
        match ctx.current_session() {
            Some(s) => {
                info!(user_id = %s.user.id, "user_logged_out");
                self.sessions.remove(&s.token).await
            }
            None => false,
        }
    }

    /// Fresh user record for the current session.
    pub async fn me(&self, ctx: &RequestContext) -> Result<AuthUser, ServiceError> {
        let session = ctx.require_session()?;
        self.repo.find_user(session.user_id()).await?.ok_or(ServiceError::Unauthenticated)
    }

    /// Look up a live session by its token.
    pub async fn resolve_session(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).await
    }

    fn rejected() -> ServiceError {
        LOGIN_FAILURES_TOTAL.inc();
        ServiceError::InvalidCredentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::session::MokaSessionStore;
    use crate::storage::memory::InMemoryStore;
    use common::i18n::Locale;
    use std::time::Duration;

    fn svc(cfg: AuthConfig) -> AuthService<InMemoryStore> {
        let sessions = Arc::new(MokaSessionStore::new(Duration::from_secs(60), 100));
        AuthService::new(Arc::new(InMemoryStore::new()), sessions, cfg)
    }

    fn reg(email: &str, password: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Name".into(), password: password.into() }
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let svc = svc(AuthConfig::default());
        assert_eq!(svc.register(reg("no-at-sign", "Passw0rd!")).await.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(svc.register(reg("a@b.c", "short")).await.unwrap_err().kind(), ErrorKind::Validation);
        svc.register(reg("a@b.c", "Passw0rd!")).await.unwrap();
        assert_eq!(svc.register(reg(" A@B.C ", "Passw0rd!")).await.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn registered_user_always_has_a_password() {
        let svc = svc(AuthConfig::default());
        let user = svc.register(reg("a@b.c", "Passw0rd!")).await.unwrap();
        let cred = svc.repo.get_credentials(user.id).await.unwrap().expect("credentials");
        assert_eq!(cred.password_algorithm, AuthConfig::default().password_algorithm);
        assert!(cred.password_hash.starts_with("$argon2"));

        let err = svc.repo.create_user_with_password("c@d.e", "Name", Role::User, "".into(), "argon2".into()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(svc.repo.find_user_by_email("c@d.e").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_emails_get_admin_role() {
        let svc = svc(AuthConfig { admin_emails: vec!["Boss@Example.com".into()], ..AuthConfig::default() });
        assert_eq!(svc.register(reg("boss@example.com", "Passw0rd!")).await.unwrap().role, Role::Admin);
        assert_eq!(svc.register(reg("staff@example.com", "Passw0rd!")).await.unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let svc = svc(AuthConfig::default());
        svc.register(reg("a@b.c", "Passw0rd!")).await.unwrap();
        let wrong_pw = svc.login(LoginInput { email: "a@b.c".into(), password: "nope-nope".into() }).await.unwrap_err();
        let no_user = svc.login(LoginInput { email: "x@b.c".into(), password: "Passw0rd!".into() }).await.unwrap_err();
        assert!(matches!(wrong_pw, ServiceError::InvalidCredentials));
        assert!(matches!(no_user, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_me_logout_cycle() {
        let svc = svc(AuthConfig::default());
        let user = svc.register(reg("a@b.c", "Passw0rd!")).await.unwrap();
        let session = svc.login(LoginInput { email: "A@B.C".into(), password: "Passw0rd!".into() }).await.unwrap();
        assert_eq!(session.user.id, user.id);

        let resolved = svc.resolve_session(&session.token).await.expect("live session");
        let ctx = RequestContext::new(Some(resolved), Locale::En);
        assert_eq!(svc.me(&ctx).await.unwrap().id, user.id);

        assert!(svc.logout(&ctx).await);
        assert!(svc.resolve_session(&session.token).await.is_none());
        assert!(!svc.logout(&RequestContext::anonymous()).await);
        assert_eq!(svc.me(&RequestContext::anonymous()).await.unwrap_err().kind(), ErrorKind::Unauthenticated);
    }
}
