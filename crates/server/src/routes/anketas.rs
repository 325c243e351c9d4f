use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::types::Success;
use service::listing::domain::{Anketa, AnketaDetail, ListingPage, NewAnketa, NewReview, Review};
use service::listing::AnketaQueryParams;

use crate::context::Context;
use crate::errors::{ApiError, Localized};
use crate::extract::FirstValueQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AnketaOutput {
    pub anketa: Anketa,
}

#[derive(Serialize)]
pub struct ReviewOutput {
    pub review: Review,
}

#[derive(Debug, Deserialize)]
pub struct ActiveInput {
    pub active: bool,
}

/// Public listing search. Malformed query values are ignored, never rejected.
#[utoipa::path(
    get, path = "/api/anketas", tag = "anketas",
    params(
        ("cityId" = Option<String>, Query, description = "City id"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("search" = Option<String>, Query, description = "Case-insensitive title/description match"),
        ("minRating" = Option<String>, Query, description = "Minimum rating"),
        ("onlyWithReviews" = Option<String>, Query, description = "\"true\" keeps only reviewed listings"),
        ("sortBy" = Option<String>, Query, description = "rating | newest | alphabetical"),
        ("page" = Option<String>, Query, description = "1-based page"),
        ("limit" = Option<String>, Query, description = "Page size, capped"),
    ),
    responses((status = 200, description = "One page of active listings", body = crate::openapi::ListingPageDoc))
)]
pub async fn list(
    State(state): State<AppState>,
    Context(ctx): Context,
    FirstValueQuery(params): FirstValueQuery<AnketaQueryParams>,
) -> Result<Json<ListingPage>, ApiError> {
    let page = state.listings.search(&params).await.localized(&ctx)?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/anketas/{id}", tag = "anketas",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses((status = 200, description = "Listing with contact links"), (status = 404, description = "Not found"))
)]
pub async fn get(
    State(state): State<AppState>,
    Context(ctx): Context,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AnketaDetail>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_path(e, ctx.locale))?;
    let detail = state.listings.get(id).await.localized(&ctx)?;
    Ok(Json(detail))
}

#[utoipa::path(
    post, path = "/api/anketas", tag = "anketas",
    request_body = crate::openapi::NewAnketaDoc,
    responses((status = 200, description = "Created"), (status = 400, description = "Invalid input"), (status = 401, description = "No session"))
)]
pub async fn create(
    State(state): State<AppState>,
    Context(ctx): Context,
    input: Result<Json<NewAnketa>, JsonRejection>,
) -> Result<Json<Success<AnketaOutput>>, ApiError> {
    ctx.require_session().localized(&ctx)?;
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let anketa = state.listings.create(&ctx, input).await.localized(&ctx)?;
    Ok(Json(Success::new(AnketaOutput { anketa })))
}

#[utoipa::path(
    post, path = "/api/anketas/{id}/active", tag = "anketas",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = crate::openapi::ActiveDoc,
    responses((status = 200, description = "Updated"), (status = 403, description = "Neither owner nor admin"))
)]
pub async fn set_active(
    State(state): State<AppState>,
    Context(ctx): Context,
    id: Result<Path<Uuid>, PathRejection>,
    input: Result<Json<ActiveInput>, JsonRejection>,
) -> Result<Json<Success<AnketaOutput>>, ApiError> {
    ctx.require_session().localized(&ctx)?;
    let Path(id) = id.map_err(|e| ApiError::bad_path(e, ctx.locale))?;
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let anketa = state.listings.set_active(&ctx, id, input.active).await.localized(&ctx)?;
    Ok(Json(Success::new(AnketaOutput { anketa })))
}

#[utoipa::path(
    post, path = "/api/anketas/{id}/reviews", tag = "anketas",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = crate::openapi::NewReviewDoc,
    responses((status = 200, description = "Review stored, rating refreshed"), (status = 403, description = "Own listing"))
)]
pub async fn add_review(
    State(state): State<AppState>,
    Context(ctx): Context,
    id: Result<Path<Uuid>, PathRejection>,
    input: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<Success<ReviewOutput>>, ApiError> {
    ctx.require_session().localized(&ctx)?;
    let Path(id) = id.map_err(|e| ApiError::bad_path(e, ctx.locale))?;
    let Json(input) = input.map_err(|e| ApiError::bad_body(e, ctx.locale))?;
    let review = state.listings.add_review(&ctx, id, input).await.localized(&ctx)?;
    Ok(Json(Success::new(ReviewOutput { review })))
}
