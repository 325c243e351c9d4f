use common::i18n::Locale;
use common::metrics::GUARD_REJECTIONS_TOTAL;
use tracing::debug;

use super::Session;
use crate::errors::ServiceError;

/// Per-request view of who is calling and in which language to answer.
///
/// Built once at the HTTP boundary and passed explicitly to every service
/// call that needs a guard.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
    pub locale: Locale,
}

impl RequestContext {
    pub fn new(session: Option<Session>, locale: Locale) -> Self { Self { session, locale } }

    pub fn anonymous() -> Self { Self::default() }

    pub fn current_session(&self) -> Option<&Session> { self.session.as_ref() }

    pub fn require_session(&self) -> Result<&Session, ServiceError> {
        match &self.session {
            Some(s) => Ok(s),
            None => {
                GUARD_REJECTIONS_TOTAL.with_label_values(&["unauthenticated"]).inc();
                debug!("guard_rejected_unauthenticated");
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    pub fn require_admin(&self) -> Result<&Session, ServiceError> {
        let session = self.require_session()?;
        if !session.is_admin() {
            GUARD_REJECTIONS_TOTAL.with_label_values(&["forbidden"]).inc();
            debug!(user_id = %session.user.id, "guard_rejected_forbidden");
            return Err(ServiceError::Forbidden);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::session::{Role, SessionUser};
    use chrono::Utc;
    use uuid::Uuid;

    fn ctx_with(role: Role) -> RequestContext {
        let now = Utc::now();
        let session = Session {
            token: "t".into(),
            user: SessionUser { id: Uuid::new_v4(), email: "x@example.com".into(), name: "X".into(), role },
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        RequestContext::new(Some(session), Locale::Ru)
    }

    #[test]
    fn anonymous_is_unauthenticated_everywhere() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.current_session().is_none());
        assert_eq!(ctx.require_session().unwrap_err().kind(), ErrorKind::Unauthenticated);
        assert_eq!(ctx.require_admin().unwrap_err().kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn user_is_forbidden_from_admin() {
        let ctx = ctx_with(Role::User);
        assert!(ctx.require_session().is_ok());
        assert_eq!(ctx.require_admin().unwrap_err().kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn admin_passes_both_guards() {
        let ctx = ctx_with(Role::Admin);
        assert!(ctx.require_session().is_ok());
        assert!(ctx.require_admin().is_ok());
    }
}
