use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use common::i18n::Locale;
use service::session::RequestContext;

use crate::state::AppState;

pub const LOCALE_COOKIE: &str = "locale";

/// Extracts the caller's [`RequestContext`]: the live session (cookie first,
/// then `Authorization: Bearer`) and the negotiated locale.
///
/// Never rejects; a missing or stale token just yields an anonymous context.
pub struct Context(pub RequestContext);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Context {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.settings.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(&parts.headers));

        let session = match token {
            Some(t) => state.auth.resolve_session(&t).await,
            None => None,
        };

        let locale = Locale::negotiate(
            jar.get(LOCALE_COOKIE).map(|c| c.value()),
            parts.headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()),
            &state.settings.locales,
            state.settings.default_locale,
        );
        Ok(Context(RequestContext::new(session, locale)))
    }
}
