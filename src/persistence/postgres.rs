//! PostgreSQL implementations of the content store contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{
    MatchRecordRow, MatchShareRow, NewsRow, ParticipantRow, ProfileRow, ThreadRow,
};
use super::{MatchDataStore, MatchShareStore, NewsStore, PageWindow, ProfileStore, ThreadStore};
use crate::error::FeedError;

/// All five store contracts implemented over one `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStores {
    pool: PgPool,
}

impl PostgresStores {
    /// Creates the store bundle with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Columns shared by both thread queries; author and category arrive as
/// JSONB sub-objects from the joins.
const THREAD_SELECT: &str = "SELECT t.id, t.title, t.content, t.views, \
     COALESCE(t.vote_count, 0) AS vote_count, \
     COALESCE(t.reply_count, 0) AS reply_count, \
     COALESCE(to_jsonb(p), 'null'::jsonb) AS author, \
     COALESCE(to_jsonb(c), 'null'::jsonb) AS category, \
     t.weapon_stat_id, t.created_at \
     FROM threads t \
     LEFT JOIN profiles p ON p.id = t.author_id \
     LEFT JOIN categories c ON c.id = t.category_id \
     WHERE t.deleted = FALSE";

type ThreadTuple = (
    String,
    String,
    String,
    i64,
    i64,
    i64,
    serde_json::Value,
    serde_json::Value,
    Option<String>,
    DateTime<Utc>,
);

fn thread_row(
    (id, title, content, views, vote_count, reply_count, author, category, weapon_stat_id, created_at): ThreadTuple,
) -> ThreadRow {
    ThreadRow {
        id,
        title,
        content,
        views,
        vote_count,
        reply_count,
        author,
        category,
        weapon_stat_id,
        created_at,
    }
}

#[async_trait]
impl ThreadStore for PostgresStores {
    async fn fetch_recent(&self, window: PageWindow) -> Result<Vec<ThreadRow>, FeedError> {
        let rows: Vec<ThreadTuple> = match window {
            PageWindow::Offset { start, count } => {
                sqlx::query_as(&format!(
                    "{THREAD_SELECT} ORDER BY t.created_at DESC OFFSET $1 LIMIT $2"
                ))
                .bind(start)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            PageWindow::Watermark { before, limit } => {
                sqlx::query_as(&format!(
                    "{THREAD_SELECT} AND t.created_at < $1 ORDER BY t.created_at DESC LIMIT $2"
                ))
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(thread_row).collect())
    }

    async fn fetch_discover(
        &self,
        before: Option<DateTime<Utc>>,
        since: DateTime<Utc>,
        cap: i64,
    ) -> Result<Vec<ThreadRow>, FeedError> {
        let rows: Vec<ThreadTuple> = match before {
            Some(before) => {
                sqlx::query_as(&format!(
                    "{THREAD_SELECT} AND t.created_at >= $1 AND t.created_at < $2 \
                     ORDER BY t.created_at DESC LIMIT $3"
                ))
                .bind(since)
                .bind(before)
                .bind(cap)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{THREAD_SELECT} AND t.created_at >= $1 ORDER BY t.created_at DESC LIMIT $2"
                ))
                .bind(since)
                .bind(cap)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(thread_row).collect())
    }
}

#[async_trait]
impl NewsStore for PostgresStores {
    async fn fetch_published(&self, window: PageWindow) -> Result<Vec<NewsRow>, FeedError> {
        const SELECT: &str = "SELECT id, title, summary, cover_image, published_at \
             FROM news_posts WHERE published = TRUE";
        let rows: Vec<(String, String, String, Option<String>, DateTime<Utc>)> = match window {
            PageWindow::Offset { start, count } => {
                sqlx::query_as(&format!(
                    "{SELECT} ORDER BY published_at DESC OFFSET $1 LIMIT $2"
                ))
                .bind(start)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            PageWindow::Watermark { before, limit } => {
                sqlx::query_as(&format!(
                    "{SELECT} AND published_at < $1 ORDER BY published_at DESC LIMIT $2"
                ))
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|(id, title, summary, cover_image, published_at)| NewsRow {
                id,
                title,
                summary,
                cover_image,
                published_at,
            })
            .collect())
    }
}

#[async_trait]
impl MatchShareStore for PostgresStores {
    async fn fetch_entries(&self, window: PageWindow) -> Result<Vec<MatchShareRow>, FeedError> {
        const SELECT: &str = "SELECT id, match_id, user_id, metadata, created_at \
             FROM shared_matches \
             WHERE deleted = FALSE AND visibility = 'public' AND share_type = 'lol_match'";
        let rows: Vec<(String, String, String, serde_json::Value, DateTime<Utc>)> = match window {
            PageWindow::Offset { start, count } => {
                sqlx::query_as(&format!(
                    "{SELECT} ORDER BY created_at DESC OFFSET $1 LIMIT $2"
                ))
                .bind(start)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            PageWindow::Watermark { before, limit } => {
                sqlx::query_as(&format!(
                    "{SELECT} AND created_at < $1 ORDER BY created_at DESC LIMIT $2"
                ))
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|(id, match_id, user_id, metadata, created_at)| MatchShareRow {
                id,
                match_id,
                user_id,
                metadata,
                created_at,
            })
            .collect())
    }
}

#[async_trait]
impl ProfileStore for PostgresStores {
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ProfileRow>, FeedError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, username, avatar_url FROM profiles WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, username, avatar_url)| ProfileRow {
                id,
                username,
                avatar_url,
            })
            .collect())
    }
}

#[async_trait]
impl MatchDataStore for PostgresStores {
    async fn fetch_records(
        &self,
        match_ids: &[String],
    ) -> Result<Vec<MatchRecordRow>, FeedError> {
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT match_id, full_json FROM lol_matches WHERE match_id = ANY($1)",
        )
        .bind(match_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(match_id, full_json)| MatchRecordRow {
                match_id,
                full_json,
            })
            .collect())
    }

    async fn fetch_participants(
        &self,
        keys: &[(String, String)],
    ) -> Result<Vec<ParticipantRow>, FeedError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        // Over-select by the two id lists, then keep exact pairs: one
        // round trip instead of one query per key.
        let match_ids: Vec<String> = keys.iter().map(|(m, _)| m.clone()).collect();
        let puuids: Vec<String> = keys.iter().map(|(_, p)| p.clone()).collect();

        let rows: Vec<(
            String,
            String,
            Option<i64>,
            Option<String>,
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<bool>,
            Option<String>,
        )> = sqlx::query_as(
            "SELECT match_id, puuid, champion_id, champion_name, kills, deaths, assists, win, \
             summoner_name FROM lol_match_participants \
             WHERE match_id = ANY($1) AND puuid = ANY($2)",
        )
        .bind(&match_ids)
        .bind(&puuids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter(|(match_id, puuid, ..)| {
                keys.iter().any(|(m, p)| m == match_id && p == puuid)
            })
            .map(
                |(
                    match_id,
                    puuid,
                    champion_id,
                    champion_name,
                    kills,
                    deaths,
                    assists,
                    win,
                    summoner_name,
                )| ParticipantRow {
                    match_id,
                    puuid,
                    champion_id,
                    champion_name,
                    kills,
                    deaths,
                    assists,
                    win,
                    summoner_name,
                },
            )
            .collect())
    }
}
