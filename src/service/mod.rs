//! Service layer: the feed orchestrator.

pub mod feed_service;

pub use feed_service::{FeedPage, FeedRequest, FeedService};
