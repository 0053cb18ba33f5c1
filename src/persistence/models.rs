//! Raw row types returned by the content stores.
//!
//! These mirror what the stores hand back before any feed-level
//! normalization: joined sub-objects arrive as loosely-shaped JSON
//! (array- or object-shaped depending on the join), and share-entry
//! metadata is an untyped bag.

use chrono::{DateTime, Utc};

/// A thread candidate row, shared by the recent and discovery pools.
#[derive(Debug, Clone)]
pub struct ThreadRow {
    /// Thread id.
    pub id: String,
    /// Thread title.
    pub title: String,
    /// Full body text; the feed serves only an excerpt.
    pub content: String,
    /// View count.
    pub views: i64,
    /// Aggregate vote count.
    pub vote_count: i64,
    /// Aggregate reply count.
    pub reply_count: i64,
    /// Joined author sub-object; array- or object-shaped.
    pub author: serde_json::Value,
    /// Joined category sub-object; array- or object-shaped.
    pub category: serde_json::Value,
    /// Optional reference to an attached weapon-stat block.
    pub weapon_stat_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A published news post row.
#[derive(Debug, Clone)]
pub struct NewsRow {
    /// News post id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Short summary.
    pub summary: String,
    /// Optional cover image URL.
    pub cover_image: Option<String>,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

/// A user's shared-match entry row.
#[derive(Debug, Clone)]
pub struct MatchShareRow {
    /// Share-entry id.
    pub id: String,
    /// Authoritative match id; entries with an empty id are dropped
    /// from the feed downstream.
    pub match_id: String,
    /// Sharer user id.
    pub user_id: String,
    /// Loosely-typed metadata persisted at share time.
    pub metadata: serde_json::Value,
    /// Share timestamp.
    pub created_at: DateTime<Utc>,
}

/// A profile row from the batch lookup.
#[derive(Debug, Clone)]
pub struct ProfileRow {
    /// Profile id.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Optional avatar URL.
    pub avatar_url: Option<String>,
}

/// An authoritative full match record.
#[derive(Debug, Clone)]
pub struct MatchRecordRow {
    /// Match id.
    pub match_id: String,
    /// Full match payload embedding the ten-entry roster.
    pub full_json: serde_json::Value,
}

/// An authoritative per-player statistics row, keyed `(match_id, puuid)`
/// and immutable once written.
#[derive(Debug, Clone)]
pub struct ParticipantRow {
    /// Match id.
    pub match_id: String,
    /// Stable player identifier.
    pub puuid: String,
    /// Champion id.
    pub champion_id: Option<i64>,
    /// Champion name.
    pub champion_name: Option<String>,
    /// Kills.
    pub kills: Option<i64>,
    /// Deaths.
    pub deaths: Option<i64>,
    /// Assists.
    pub assists: Option<i64>,
    /// Win flag.
    pub win: Option<bool>,
    /// Summoner name at record time; feeds the display-name fallback.
    pub summoner_name: Option<String>,
}

/// Normalizes a joined sub-object that may arrive array- or
/// object-shaped: an array contributes its first element, an object
/// passes through, anything else is `None`.
#[must_use]
pub fn normalize_join(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match value {
        serde_json::Value::Array(arr) => arr.first().filter(|v| v.is_object()),
        serde_json::Value::Object(_) => Some(value),
        _ => None,
    }
}
