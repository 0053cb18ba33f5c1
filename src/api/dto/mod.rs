//! Request/response DTOs for the feed API.

pub mod feed_dto;

pub use feed_dto::{FeedQueryParams, FeedResponse};
