use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    error::AppError,
    locations::{
        dto::{NewLocationRequest, Pagination},
        repo_types::Location,
    },
    state::AppState,
};

pub fn location_routes() -> Router<AppState> {
    Router::new().route("/locations", post(create_location).get(list_locations))
}

#[instrument(skip(state, body))]
pub async fn create_location(
    State(state): State<AppState>,
    body: Result<Json<NewLocationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let Json(body) = body?;
    let new_location = body.into_new_location(OffsetDateTime::now_utc());
    let location = state.locations.insert(new_location).await?;
    info!(location_id = %location.id, "location recorded");
    Ok((StatusCode::CREATED, Json(location)))
}

#[instrument(skip(state))]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Location>>, AppError> {
    let (limit, offset) = p.clamped();
    let locations = state.locations.list_recent(limit, offset).await?;
    Ok(Json(locations))
}
