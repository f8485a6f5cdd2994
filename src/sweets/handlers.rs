use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::{dto::CreateSweetRequest, repo_types::Sweet, services};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppResult,
    extract::{JsonBody, PathParam},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/sweets", get(list_sweets))
        .route("/sweets/:id/purchase", post(purchase_sweet))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/sweets", post(create_sweet))
        .route("/sweets/:id", delete(delete_sweet))
}

#[instrument(skip(state))]
pub async fn list_sweets(State(state): State<AppState>) -> AppResult<Json<Vec<Sweet>>> {
    Ok(Json(services::list(&state).await?))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn create_sweet(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<CreateSweetRequest>,
) -> AppResult<(StatusCode, Json<Sweet>)> {
    let sweet = services::create(&state, &user, body).await?;
    Ok((StatusCode::CREATED, Json(sweet)))
}

#[instrument(skip(state))]
pub async fn purchase_sweet(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<Sweet>> {
    Ok(Json(services::purchase(&state, id).await?))
}

#[instrument(skip(state, admin), fields(user_id = admin.id))]
pub async fn delete_sweet(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    services::delete(&state, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
