//! Feed item model: the tagged union of everything the feed can serve.
//!
//! A page of the feed is a list of [`FeedItem`]s in interleaver/filter
//! order — deliberately *not* strict `created_at` order. Each variant
//! carries its own payload; common fields are exposed through accessor
//! methods so the orchestrator and filters stay variant-agnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::match_stats::EnrichedMatchItem;

/// Content type filter accepted by the feed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    /// Mixed feed: all content types interleaved.
    #[default]
    All,
    /// Discussion threads only.
    Threads,
    /// News posts only.
    News,
    /// Shared League matches only.
    Lol,
    /// Status updates only.
    Status,
}

impl FeedFilter {
    /// Parses a filter from its query-string form. Unknown values fall
    /// back to [`FeedFilter::All`], matching the lenient request contract.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "threads" => Self::Threads,
            "news" => Self::News,
            "lol" => Self::Lol,
            "status" => Self::Status,
            _ => Self::All,
        }
    }

    /// Returns the query-string form of this filter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Threads => "threads",
            Self::News => "news",
            Self::Lol => "lol",
            Self::Status => "status",
        }
    }
}

/// Discriminant of a [`FeedItem`], used by the interleaver, the
/// anti-repetition filter, and cursor computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Discussion thread.
    Thread,
    /// News post.
    News,
    /// Shared League match.
    LolMatch,
    /// Status update.
    Status,
}

/// Author sub-object joined onto threads and status updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    /// Profile id.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Optional avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Category sub-object joined onto threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    /// Category id.
    pub id: String,
    /// Category name.
    pub name: String,
}

/// A discussion thread as served in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadItem {
    /// Thread id.
    pub id: String,
    /// Thread title.
    pub title: String,
    /// Leading excerpt of the body.
    pub excerpt: String,
    /// View count.
    pub views: i64,
    /// Aggregate vote count.
    pub vote_count: i64,
    /// Aggregate reply count.
    pub reply_count: i64,
    /// Thread author, when the join resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    /// Thread category, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    /// Optional reference to an attached weapon-stat block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon_stat_id: Option<String>,
    /// Creation timestamp; drives ordering and cursor watermarks.
    pub created_at: DateTime<Utc>,
}

/// A published news post as served in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// News post id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Short summary.
    pub summary: String,
    /// Optional cover image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Publication timestamp; drives ordering and cursor watermarks.
    pub created_at: DateTime<Utc>,
}

/// A status update as served in the feed.
///
/// The union carries this variant for API completeness; no status
/// fetcher exists in the current retrieval set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    /// Status id.
    pub id: String,
    /// Posting user id.
    pub user_id: String,
    /// Status body text.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One entry in a feed page.
///
/// Serialized with an external `type` tag so clients can dispatch on
/// `item.type` before touching the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    /// Discussion thread.
    Thread(ThreadItem),
    /// News post.
    News(NewsItem),
    /// Shared League match with enrichment.
    LolMatch(EnrichedMatchItem),
    /// Status update.
    Status(StatusItem),
}

impl FeedItem {
    /// Globally unique id within the feed.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Thread(t) => &t.id,
            Self::News(n) => &n.id,
            Self::LolMatch(m) => &m.id,
            Self::Status(s) => &s.id,
        }
    }

    /// Type discriminant.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Thread(_) => ItemType::Thread,
            Self::News(_) => ItemType::News,
            Self::LolMatch(_) => ItemType::LolMatch,
            Self::Status(_) => ItemType::Status,
        }
    }

    /// Creation timestamp used for cursor watermarking.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Thread(t) => t.created_at,
            Self::News(n) => n.created_at,
            Self::LolMatch(m) => m.created_at,
            Self::Status(s) => s.created_at,
        }
    }

    /// Author key for the anti-repetition per-author cap.
    ///
    /// Threads key on the author profile id, matches on the sharer's
    /// user id, status updates on the posting user. News posts have no
    /// author key and are exempt from the cap.
    #[must_use]
    pub fn author_key(&self) -> Option<&str> {
        match self {
            Self::Thread(t) => t.author.as_ref().map(|a| a.id.as_str()),
            Self::News(_) => None,
            Self::LolMatch(m) => Some(m.shared_by.as_str()),
            Self::Status(s) => Some(s.user_id.as_str()),
        }
    }
}
