use axum::extract::State;
use axum::Json;

use service::listing::domain::{Category, City};

use crate::context::Context;
use crate::errors::{ApiError, Localized};
use crate::state::AppState;

#[utoipa::path(get, path = "/api/categories", tag = "catalog", responses((status = 200, description = "All categories by name")))]
pub async fn categories(State(state): State<AppState>, Context(ctx): Context) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.listings.categories().await.localized(&ctx)?))
}

#[utoipa::path(get, path = "/api/cities", tag = "catalog", responses((status = 200, description = "All cities by name")))]
pub async fn cities(State(state): State<AppState>, Context(ctx): Context) -> Result<Json<Vec<City>>, ApiError> {
    Ok(Json(state.listings.cities().await.localized(&ctx)?))
}
