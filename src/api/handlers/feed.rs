//! Feed endpoint handler.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{FeedQueryParams, FeedResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, FeedError};

/// `GET /feed` — One page of the aggregated community feed.
///
/// # Errors
///
/// Returns [`FeedError`] only on an unexpected internal fault; malformed
/// cursors and individual source failures degrade the page instead.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    tag = "Feed",
    summary = "Fetch a feed page",
    description = "Returns one paginated, ranked, diversity-constrained page of threads, news, and shared matches. Pass `cursor` from a prior response to page forward; `page` applies only to the first page.",
    params(FeedQueryParams),
    responses(
        (status = 200, description = "Feed page", body = FeedResponse),
        (status = 500, description = "Internal failure", body = ErrorResponse),
    )
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQueryParams>,
) -> Result<impl IntoResponse, FeedError> {
    let page = state.feed_service.fetch_page(params.into()).await?;
    Ok(Json(FeedResponse::from(page)))
}

/// Feed routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/feed", get(get_feed))
}
