use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use common::types::Success;
use service::admin::domain::{AdminAnketa, AdminCategory, AdminCity, AdminUser, NewCategory, NewCity};
use service::admin::filters::{AdminAnketaParams, AdminUserParams, NameParams};
use service::listing::domain::{Category, City};

use crate::context::Context;
use crate::errors::{ApiError, Localized};
use crate::extract::FirstValueQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CategoryOutput {
    pub category: Category,
}

#[derive(Serialize)]
pub struct CityOutput {
    pub city: City,
}

#[utoipa::path(
    get, path = "/admin/users", tag = "admin",
    params(("search" = Option<String>, Query, description = "Email or name, case-insensitive"), ("role" = Option<String>, Query, description = "USER | ADMIN")),
    responses((status = 200, description = "Users with _count"), (status = 401, description = "No session"), (status = 403, description = "Not an admin"))
)]
pub async fn users(
    State(state): State<AppState>,
    Context(ctx): Context,
    FirstValueQuery(params): FirstValueQuery<AdminUserParams>,
) -> Result<Json<Vec<AdminUser>>, ApiError> {
    Ok(Json(state.admin.users(&ctx, &params).await.localized(&ctx)?))
}

#[utoipa::path(
    get, path = "/admin/anketas", tag = "admin",
    params(
        ("search" = Option<String>, Query, description = "Title or description, case-insensitive"),
        ("cityId" = Option<String>, Query, description = "City id"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("status" = Option<String>, Query, description = "active | inactive"),
        ("page" = Option<String>, Query, description = "1-based page number"),
        ("limit" = Option<String>, Query, description = "Page size, capped by the server"),
    ),
    responses((status = 200, description = "Listings of any status with _count"), (status = 403, description = "Not an admin"))
)]
pub async fn anketas(
    State(state): State<AppState>,
    Context(ctx): Context,
    FirstValueQuery(params): FirstValueQuery<AdminAnketaParams>,
) -> Result<Json<Vec<AdminAnketa>>, ApiError> {
    Ok(Json(state.admin.anketas(&ctx, &params).await.localized(&ctx)?))
}

#[utoipa::path(
    delete, path = "/admin/anketas/{id}", tag = "admin",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_anketa(
    State(state): State<AppState>,
    Context(ctx): Context,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_admin().localized(&ctx)?;
    let Path(id) = id.map_err(|e| ApiError::bad_path(e, ctx.locale))?;
    state.listings.delete(&ctx, id).await.localized(&ctx)?;
    Ok(Json(json!({ "success": true })))
}

#[utoipa::path(get, path = "/admin/categories", tag = "admin", params(("search" = Option<String>, Query, description = "Name, case-insensitive")), responses((status = 200, description = "Categories with _count")))]
pub async fn categories(
    State(state): State<AppState>,
    Context(ctx): Context,
    FirstValueQuery(params): FirstValueQuery<NameParams>,
) -> Result<Json<Vec<AdminCategory>>, ApiError> {
    Ok(Json(state.admin.categories(&ctx, &params).await.localized(&ctx)?))
}

#[utoipa::path(post, path = "/admin/categories", tag = "admin", request_body = crate::openapi::NewCategoryDoc, responses((status = 200, description = "Created"), (status = 409, description = "Slug taken")))]
pub async fn create_category(
    State(state): State<AppState>,
    Context(ctx): Context,
    input: Result<Json<NewCategory>, JsonRejection>,
) -> Result<Json<Success<CategoryOutput>>, ApiError> {
    ctx.require_admin().localized(&ctx)?;
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let category = state.admin.create_category(&ctx, input).await.localized(&ctx)?;
    Ok(Json(Success::new(CategoryOutput { category })))
}

#[utoipa::path(get, path = "/admin/cities", tag = "admin", params(("search" = Option<String>, Query, description = "Name, case-insensitive")), responses((status = 200, description = "Cities with _count")))]
pub async fn cities(
    State(state): State<AppState>,
    Context(ctx): Context,
    FirstValueQuery(params): FirstValueQuery<NameParams>,
) -> Result<Json<Vec<AdminCity>>, ApiError> {
    Ok(Json(state.admin.cities(&ctx, &params).await.localized(&ctx)?))
}

#[utoipa::path(post, path = "/admin/cities", tag = "admin", request_body = crate::openapi::NewCityDoc, responses((status = 200, description = "Created"), (status = 409, description = "Name taken")))]
pub async fn create_city(
    State(state): State<AppState>,
    Context(ctx): Context,
    input: Result<Json<NewCity>, JsonRejection>,
) -> Result<Json<Success<CityOutput>>, ApiError> {
    ctx.require_admin().localized(&ctx)?;
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let city = state.admin.create_city(&ctx, input).await.localized(&ctx)?;
    Ok(Json(Success::new(CityOutput { city })))
}
