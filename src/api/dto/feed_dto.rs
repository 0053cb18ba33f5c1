//! Feed endpoint DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::feed_item::{FeedFilter, FeedItem};
use crate::service::{FeedPage, FeedRequest};

/// Query parameters for `GET /feed`.
///
/// All parameters are optional; unknown filter values fall back to
/// `all` and out-of-range limits are clamped server-side.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct FeedQueryParams {
    /// Page number (1-indexed). Only used for the first page; a cursor
    /// supersedes it.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Requested page size, clamped to `[10, 30]`.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Opaque continuation token from a prior response.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Content type filter: `all`, `threads`, `news`, `lol`, `status`.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl From<FeedQueryParams> for FeedRequest {
    fn from(params: FeedQueryParams) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            cursor: params.cursor,
            filter: params
                .filter
                .as_deref()
                .map(FeedFilter::parse)
                .unwrap_or_default(),
        }
    }
}

/// Response body for `GET /feed`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Echoed page number.
    pub page: u32,
    /// Effective (clamped) page size.
    pub limit: u32,
    /// Echoed filter.
    #[schema(value_type = String)]
    pub filter: FeedFilter,
    /// Whether a further page is likely available.
    pub has_more: bool,
    /// Continuation token for the next request.
    pub next_cursor: String,
    /// Page items in final order.
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<FeedItem>,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            success: true,
            page: page.page,
            limit: page.limit,
            filter: page.filter,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
            items: page.items,
        }
    }
}
