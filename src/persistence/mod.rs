//! Persistence layer: read-only store contracts and their PostgreSQL
//! implementations.
//!
//! The feed core only reads. Each store is a small async trait so the
//! orchestrator can be exercised against in-memory doubles in tests;
//! [`postgres::PostgresStores`] implements all of them over one
//! `sqlx::PgPool`.

pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FeedError;
use models::{MatchRecordRow, MatchShareRow, NewsRow, ParticipantRow, ProfileRow, ThreadRow};

/// Pagination mode for a list query. The two modes are mutually
/// exclusive: offset ranges serve the first page, watermark queries
/// serve every page after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWindow {
    /// Row-offset range, ordered descending by the natural timestamp.
    Offset {
        /// Zero-based starting row.
        start: i64,
        /// Number of rows to fetch.
        count: i64,
    },
    /// Timestamp watermark: rows strictly older than `before`.
    Watermark {
        /// Exclusive upper bound on the natural timestamp.
        before: DateTime<Utc>,
        /// Number of rows to fetch.
        limit: i64,
    },
}

impl PageWindow {
    /// Builds the window for a source: watermark mode when the cursor
    /// carries one for this source, offset mode (from `page`) otherwise.
    #[must_use]
    pub fn select(page: u32, quota: i64, watermark: Option<DateTime<Utc>>) -> Self {
        match watermark {
            Some(before) => Self::Watermark {
                before,
                limit: quota,
            },
            None => Self::Offset {
                start: i64::from(page.saturating_sub(1)) * quota,
                count: quota,
            },
        }
    }
}

/// Thread source: a recency feed plus an engagement-reranked discovery
/// window.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Fetches non-deleted threads in descending creation order.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_recent(&self, window: PageWindow) -> Result<Vec<ThreadRow>, FeedError>;

    /// Fetches discovery candidates: non-deleted threads created after
    /// `since` (and before the watermark when present), capped at `cap`
    /// rows for downstream reranking.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_discover(
        &self,
        before: Option<DateTime<Utc>>,
        since: DateTime<Utc>,
        cap: i64,
    ) -> Result<Vec<ThreadRow>, FeedError>;
}

/// News source: published posts in descending publication order.
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Fetches published news posts.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_published(&self, window: PageWindow) -> Result<Vec<NewsRow>, FeedError>;
}

/// Shared-match source: visible share entries in descending share order.
#[async_trait]
pub trait MatchShareStore: Send + Sync {
    /// Fetches visible, non-deleted share entries.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_entries(&self, window: PageWindow) -> Result<Vec<MatchShareRow>, FeedError>;
}

/// Profile source: batch lookup only (N+1 avoidance is a requirement,
/// not an optimization).
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profiles for a distinct id list in one query.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ProfileRow>, FeedError>;
}

/// Match-data source: authoritative records and participant rows,
/// batch lookups only.
#[async_trait]
pub trait MatchDataStore: Send + Sync {
    /// Fetches full match records for a distinct match-id list.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_records(&self, match_ids: &[String])
    -> Result<Vec<MatchRecordRow>, FeedError>;

    /// Fetches participant rows for `(match_id, puuid)` key pairs.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Store`] on query failure.
    async fn fetch_participants(
        &self,
        keys: &[(String, String)],
    ) -> Result<Vec<ParticipantRow>, FeedError>;
}
