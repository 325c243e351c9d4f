use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use common::types::Success;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::session::SessionUser;

use crate::context::Context;
use crate::errors::{ApiError, Localized};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOutput {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: SessionUser,
    /// Same value as the cookie, for clients that send `Authorization: Bearer`.
    pub token: String,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub user: AuthUser,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<AppState>,
    Context(ctx): Context,
    input: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Json<Success<RegisterOutput>>, ApiError> {
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let user = state.auth.register(input).await.localized(&ctx)?;
    Ok(Json(Success::new(RegisterOutput { user_id: user.id })))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in, session cookie set"), (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<AppState>,
    Context(ctx): Context,
    jar: CookieJar,
    input: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<Success<LoginOutput>>), ApiError> {
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let session = state.auth.login(input).await.localized(&ctx)?;

    let cookie = Cookie::build((state.settings.cookie_name.clone(), session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.settings.secure_cookie);
    let out = LoginOutput { user: session.user, token: session.token };
    Ok((jar.add(cookie), Json(Success::new(out))))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 200, description = "Session removed, cookie cleared")))]
pub async fn logout(State(state): State<AppState>, Context(ctx): Context, jar: CookieJar) -> (CookieJar, Json<Value>) {
    state.auth.logout(&ctx).await;
    let jar = jar.remove(Cookie::build(state.settings.cookie_name.clone()).path("/"));
    (jar, Json(json!({ "success": true })))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "No session")))]
pub async fn me(State(state): State<AppState>, Context(ctx): Context) -> Result<Json<Success<MeOutput>>, ApiError> {
    let user = state.auth.me(&ctx).await.localized(&ctx)?;
    Ok(Json(Success::new(MeOutput { user })))
}
