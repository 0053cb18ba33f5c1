//! Feed orchestrator: fans out the source fetches, merges and enriches
//! the candidates, and assembles the final page.
//!
//! Stateless coordinator over the injected store contracts. One call
//! serves one page; the only concurrency boundary is the fan-out over
//! the four source fetchers, joined before any downstream step. All
//! per-item lookups (profiles, match records, participant rows) are
//! batched by distinct-id lists — never per item.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::cursor::FeedCursor;
use crate::domain::feed_item::{
    AuthorRef, CategoryRef, FeedFilter, FeedItem, ItemType, NewsItem, ThreadItem,
};
use crate::domain::interleave::{FeedBuckets, enforce_diversity, interleave};
use crate::domain::match_stats::{
    self, EntryIdentity, SharerHints, build_enriched_item,
};
use crate::domain::merge::merge_pools;
use crate::domain::score::engagement_score;
use crate::error::FeedError;
use crate::persistence::models::{
    MatchShareRow, NewsRow, ParticipantRow, ThreadRow, normalize_join,
};
use crate::persistence::{
    MatchDataStore, MatchShareStore, NewsStore, PageWindow, ProfileStore, ThreadStore,
};

/// Smallest accepted page size.
const LIMIT_MIN: u32 = 10;
/// Largest accepted page size.
const LIMIT_MAX: u32 = 30;
/// Look-back window for the discovery pool, in days.
const DISCOVER_LOOKBACK_DAYS: i64 = 30;
/// Discovery over-fetch cap: rows pulled before reranking.
const DISCOVER_FETCH_CAP: i64 = 80;
/// Maximum characters of thread body served as the excerpt.
const EXCERPT_CHARS: usize = 220;

/// Parsed feed request parameters.
#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    /// Page number (1-indexed); used only for first-page offset mode.
    pub page: u32,
    /// Requested page size, clamped to `[10, 30]`.
    pub limit: u32,
    /// Opaque continuation token from a prior response.
    pub cursor: Option<String>,
    /// Content type filter.
    pub filter: FeedFilter,
}

/// One assembled feed page.
#[derive(Debug)]
pub struct FeedPage {
    /// Echoed page number.
    pub page: u32,
    /// Effective (clamped) page size.
    pub limit: u32,
    /// Echoed filter.
    pub filter: FeedFilter,
    /// Whether a further page is likely available.
    pub has_more: bool,
    /// Continuation token for the next request.
    pub next_cursor: String,
    /// Page items in interleaver/filter order.
    pub items: Vec<FeedItem>,
}

/// Per-source fetch quotas for one request.
#[derive(Debug, Clone, Copy)]
struct Quotas {
    recent: i64,
    discover: i64,
    news: i64,
    lol: i64,
}

impl Quotas {
    /// Mixed feeds split the page roughly 40/20/20/20 across recent
    /// threads, discovery threads, news, and matches, rounded up. A
    /// single-type filter hands that type the full page size and skips
    /// the other fetchers entirely.
    fn for_request(filter: FeedFilter, limit: u32) -> Self {
        // Ceiling division on the unsigned limit before widening.
        let fifth = i64::from(limit.div_ceil(5));
        let two_fifths = i64::from((limit * 2).div_ceil(5));
        let limit = i64::from(limit);
        match filter {
            FeedFilter::All => Self {
                recent: two_fifths,
                discover: fifth,
                news: fifth,
                lol: fifth,
            },
            FeedFilter::Threads => Self {
                recent: limit,
                discover: fifth,
                news: 0,
                lol: 0,
            },
            FeedFilter::News => Self {
                recent: 0,
                discover: 0,
                news: limit,
                lol: 0,
            },
            FeedFilter::Lol => Self {
                recent: 0,
                discover: 0,
                news: 0,
                lol: limit,
            },
            FeedFilter::Status => Self {
                recent: 0,
                discover: 0,
                news: 0,
                lol: 0,
            },
        }
    }
}

/// Orchestration layer for feed page assembly.
#[derive(Clone)]
pub struct FeedService {
    threads: Arc<dyn ThreadStore>,
    news: Arc<dyn NewsStore>,
    shares: Arc<dyn MatchShareStore>,
    profiles: Arc<dyn ProfileStore>,
    match_data: Arc<dyn MatchDataStore>,
}

impl std::fmt::Debug for FeedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedService").finish_non_exhaustive()
    }
}

impl FeedService {
    /// Creates a new `FeedService` over the given store contracts.
    #[must_use]
    pub fn new(
        threads: Arc<dyn ThreadStore>,
        news: Arc<dyn NewsStore>,
        shares: Arc<dyn MatchShareStore>,
        profiles: Arc<dyn ProfileStore>,
        match_data: Arc<dyn MatchDataStore>,
    ) -> Self {
        Self {
            threads,
            news,
            shares,
            profiles,
            match_data,
        }
    }

    /// Assembles one feed page.
    ///
    /// Individual source failures are absorbed (logged, empty result);
    /// the page degrades rather than fails.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] only on an unexpected internal fault.
    pub async fn fetch_page(&self, req: FeedRequest) -> Result<FeedPage, FeedError> {
        let page = req.page.max(1);
        let limit = req.limit.clamp(LIMIT_MIN, LIMIT_MAX);
        let filter = req.filter;
        // Malformed tokens degrade to first-page semantics.
        let cursor = FeedCursor::decode(req.cursor.as_deref()).unwrap_or_default();
        let quotas = Quotas::for_request(filter, limit);
        let now = Utc::now();

        // Fan-out: the four source fetchers run concurrently and are
        // joined before any merge or enrichment step.
        let discover_since = now - Duration::days(DISCOVER_LOOKBACK_DAYS);
        let (recent, discover, news_rows, share_rows) = tokio::join!(
            async {
                if quotas.recent == 0 {
                    return Ok(Vec::new());
                }
                self.threads
                    .fetch_recent(PageWindow::select(
                        page,
                        quotas.recent,
                        cursor.threads_created_at,
                    ))
                    .await
            },
            async {
                if quotas.discover == 0 {
                    return Ok(Vec::new());
                }
                self.threads
                    .fetch_discover(cursor.threads_created_at, discover_since, DISCOVER_FETCH_CAP)
                    .await
            },
            async {
                if quotas.news == 0 {
                    return Ok(Vec::new());
                }
                self.news
                    .fetch_published(PageWindow::select(
                        page,
                        quotas.news,
                        cursor.news_created_at,
                    ))
                    .await
            },
            async {
                if quotas.lol == 0 {
                    return Ok(Vec::new());
                }
                self.shares
                    .fetch_entries(PageWindow::select(page, quotas.lol, cursor.lol_created_at))
                    .await
            },
        );
        let recent = absorb("threads_recent", recent);
        let discover = absorb("threads_discover", discover);
        let news_rows = absorb("news", news_rows);
        let share_rows = absorb("lol_shares", share_rows);

        // Discovery is reranked by engagement, then truncated to its
        // quota; the recent pool keeps pure recency order.
        let mut discover = discover;
        discover.sort_by(|a, b| {
            let score_a = engagement_score(a.created_at, now, a.views, a.vote_count, a.reply_count);
            let score_b = engagement_score(b.created_at, now, b.views, b.vote_count, b.reply_count);
            score_b.total_cmp(&score_a)
        });
        discover.truncate(usize::try_from(quotas.discover).unwrap_or(0));

        let merged = merge_pools(recent, discover, |row| row.id.clone());

        let thread_items: Vec<FeedItem> = merged.into_iter().map(thread_item).collect();
        let news_items: Vec<FeedItem> = news_rows.into_iter().map(news_item).collect();
        let lol_items = self.enrich_matches(share_rows).await;

        let items = match filter {
            FeedFilter::All => {
                let buckets = FeedBuckets {
                    threads: thread_items,
                    news: news_items,
                    lol: lol_items,
                    status: Vec::new(),
                };
                let blended = interleave(&buckets, limit as usize);
                enforce_diversity(blended, limit as usize)
            }
            FeedFilter::Threads => truncated(thread_items, limit),
            FeedFilter::News => truncated(news_items, limit),
            FeedFilter::Lol => truncated(lol_items, limit),
            FeedFilter::Status => Vec::new(),
        };

        let has_more = items.len() == limit as usize;
        let next_cursor = compute_next_cursor(cursor, &items).encode();

        tracing::debug!(
            page,
            limit,
            filter = filter.as_str(),
            count = items.len(),
            has_more,
            "feed page assembled"
        );

        Ok(FeedPage {
            page,
            limit,
            filter,
            has_more,
            next_cursor,
            items,
        })
    }

    /// Runs the match enrichment pipeline over the fetched share rows.
    ///
    /// Three batched lookups (records by distinct match id, participant
    /// rows by key pairs, sharer profiles by distinct user id) feed the
    /// per-entry resolution; entries with an empty match id are dropped.
    async fn enrich_matches(&self, entries: Vec<MatchShareRow>) -> Vec<FeedItem> {
        if entries.is_empty() {
            return Vec::new();
        }

        let hints: Vec<SharerHints> = entries
            .iter()
            .map(|e| SharerHints::from_metadata(&e.metadata))
            .collect();

        let match_ids: Vec<String> = distinct(
            entries
                .iter()
                .filter(|e| !e.match_id.is_empty())
                .map(|e| e.match_id.clone()),
        );
        let participant_keys: Vec<(String, String)> = entries
            .iter()
            .zip(&hints)
            .filter(|(e, _)| !e.match_id.is_empty())
            .filter_map(|(e, h)| h.puuid.clone().map(|p| (e.match_id.clone(), p)))
            .collect();
        let user_ids: Vec<String> = distinct(entries.iter().map(|e| e.user_id.clone()));

        let records = absorb(
            "lol_match_records",
            self.match_data.fetch_records(&match_ids).await,
        );
        let participants = absorb(
            "lol_match_participants",
            self.match_data.fetch_participants(&participant_keys).await,
        );
        let profiles = absorb("profiles", self.profiles.fetch_by_ids(&user_ids).await);

        let records_by_id: HashMap<&str, &serde_json::Value> = records
            .iter()
            .map(|r| (r.match_id.as_str(), &r.full_json))
            .collect();
        let participants_by_key: HashMap<(&str, &str), &ParticipantRow> = participants
            .iter()
            .map(|p| ((p.match_id.as_str(), p.puuid.as_str()), p))
            .collect();
        let profiles_by_id: HashMap<&str, AuthorRef> = profiles
            .iter()
            .map(|p| {
                (
                    p.id.as_str(),
                    AuthorRef {
                        id: p.id.clone(),
                        username: p.username.clone(),
                        avatar_url: p.avatar_url.clone(),
                    },
                )
            })
            .collect();
        let name_fallback: HashMap<String, String> = participants
            .iter()
            .filter_map(|p| {
                p.summoner_name
                    .as_ref()
                    .map(|n| (p.puuid.clone(), n.clone()))
            })
            .collect();

        entries
            .into_iter()
            .zip(hints)
            .filter(|(entry, _)| !entry.match_id.is_empty())
            .map(|(entry, mut hints)| {
                if let Some(puuid) = hints.puuid.as_deref() {
                    if let Some(row) =
                        participants_by_key.get(&(entry.match_id.as_str(), puuid))
                    {
                        hints.fill_missing(&participant_hints(row));
                    }
                }

                let (roster, duration) = records_by_id
                    .get(entry.match_id.as_str())
                    .map_or((Vec::new(), 0), |full| {
                        (
                            match_stats::roster_from_full_json(full),
                            match_stats::game_duration_secs(full),
                        )
                    });

                let profile = profiles_by_id.get(entry.user_id.as_str()).cloned();
                let identity = EntryIdentity {
                    id: entry.id,
                    match_id: entry.match_id,
                    shared_by: entry.user_id,
                    created_at: entry.created_at,
                };
                FeedItem::LolMatch(build_enriched_item(
                    identity,
                    profile,
                    &hints,
                    &roster,
                    duration,
                    &name_fallback,
                ))
            })
            .collect()
    }
}

/// Logs a failed source fetch and substitutes an empty result. A single
/// source failing must never fail the whole feed request.
fn absorb<T>(source: &str, result: Result<Vec<T>, FeedError>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(source, error = %err, "source fetch failed; serving without it");
            Vec::new()
        }
    }
}

fn distinct<I: Iterator<Item = String>>(iter: I) -> Vec<String> {
    let mut seen = HashSet::new();
    iter.filter(|id| seen.insert(id.clone())).collect()
}

fn truncated(mut items: Vec<FeedItem>, limit: u32) -> Vec<FeedItem> {
    items.truncate(limit as usize);
    items
}

/// Computes the next-page cursor: the input cursor's watermarks carry
/// over untouched; a type missing from the input gains the `created_at`
/// of its last item on this page (reverse scan, first hit per type).
fn compute_next_cursor(input: FeedCursor, items: &[FeedItem]) -> FeedCursor {
    let mut next = input;
    for item in items.iter().rev() {
        match item.item_type() {
            ItemType::Thread => {
                if next.threads_created_at.is_none() {
                    next.threads_created_at = Some(item.created_at());
                }
            }
            ItemType::News => {
                if next.news_created_at.is_none() {
                    next.news_created_at = Some(item.created_at());
                }
            }
            ItemType::LolMatch => {
                if next.lol_created_at.is_none() {
                    next.lol_created_at = Some(item.created_at());
                }
            }
            ItemType::Status => {}
        }
    }
    next
}

fn participant_hints(row: &ParticipantRow) -> SharerHints {
    SharerHints {
        puuid: Some(row.puuid.clone()),
        champion_id: row.champion_id,
        kills: row.kills,
        deaths: row.deaths,
        assists: row.assists,
        display_name: row.summoner_name.clone(),
        win: row.win,
    }
}

fn thread_item(row: ThreadRow) -> FeedItem {
    FeedItem::Thread(ThreadItem {
        id: row.id,
        title: row.title,
        excerpt: excerpt(&row.content),
        views: row.views,
        vote_count: row.vote_count,
        reply_count: row.reply_count,
        author: author_ref(&row.author),
        category: category_ref(&row.category),
        weapon_stat_id: row.weapon_stat_id,
        created_at: row.created_at,
    })
}

fn news_item(row: NewsRow) -> FeedItem {
    FeedItem::News(NewsItem {
        id: row.id,
        title: row.title,
        summary: row.summary,
        cover_image: row.cover_image,
        created_at: row.published_at,
    })
}

fn excerpt(content: &str) -> String {
    let mut out: String = content.chars().take(EXCERPT_CHARS).collect();
    if content.chars().nth(EXCERPT_CHARS).is_some() {
        out.push('…');
    }
    out
}

/// Normalizes the joined author sub-object (array- or object-shaped).
fn author_ref(value: &serde_json::Value) -> Option<AuthorRef> {
    let obj = normalize_join(value)?;
    let id = obj.get("id").and_then(|v| v.as_str())?;
    let username = obj
        .get("username")
        .or_else(|| obj.get("displayName"))
        .and_then(|v| v.as_str())
        .unwrap_or(id);
    Some(AuthorRef {
        id: id.to_string(),
        username: username.to_string(),
        avatar_url: obj
            .get("avatar_url")
            .or_else(|| obj.get("avatarUrl"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

/// Normalizes the joined category sub-object (array- or object-shaped).
fn category_ref(value: &serde_json::Value) -> Option<CategoryRef> {
    let obj = normalize_join(value)?;
    let id = obj.get("id").and_then(|v| v.as_str())?;
    let name = obj.get("name").and_then(|v| v.as_str())?;
    Some(CategoryRef {
        id: id.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::models::{MatchRecordRow, ProfileRow};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    /// In-memory implementation of all five store contracts, with
    /// per-source failure switches.
    #[derive(Debug, Default)]
    struct MemStores {
        threads: Vec<ThreadRow>,
        news: Vec<NewsRow>,
        shares: Vec<MatchShareRow>,
        profiles: Vec<ProfileRow>,
        records: Vec<MatchRecordRow>,
        participants: Vec<ParticipantRow>,
        fail_news: bool,
        fail_records: bool,
    }

    fn windowed<T: Clone>(
        rows: &[T],
        window: PageWindow,
        ts: impl Fn(&T) -> DateTime<Utc>,
    ) -> Vec<T> {
        let mut sorted: Vec<T> = rows.to_vec();
        sorted.sort_by_key(|r| std::cmp::Reverse(ts(r)));
        match window {
            PageWindow::Offset { start, count } => sorted
                .into_iter()
                .skip(usize::try_from(start).unwrap_or(0))
                .take(usize::try_from(count).unwrap_or(0))
                .collect(),
            PageWindow::Watermark { before, limit } => sorted
                .into_iter()
                .filter(|r| ts(r) < before)
                .take(usize::try_from(limit).unwrap_or(0))
                .collect(),
        }
    }

    #[async_trait]
    impl ThreadStore for MemStores {
        async fn fetch_recent(&self, window: PageWindow) -> Result<Vec<ThreadRow>, FeedError> {
            Ok(windowed(&self.threads, window, |r| r.created_at))
        }

        async fn fetch_discover(
            &self,
            before: Option<DateTime<Utc>>,
            since: DateTime<Utc>,
            cap: i64,
        ) -> Result<Vec<ThreadRow>, FeedError> {
            let mut rows: Vec<ThreadRow> = self
                .threads
                .iter()
                .filter(|r| r.created_at >= since && before.is_none_or(|b| r.created_at < b))
                .cloned()
                .collect();
            rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
            rows.truncate(usize::try_from(cap).unwrap_or(0));
            Ok(rows)
        }
    }

    #[async_trait]
    impl NewsStore for MemStores {
        async fn fetch_published(&self, window: PageWindow) -> Result<Vec<NewsRow>, FeedError> {
            if self.fail_news {
                return Err(FeedError::Store("news store offline".to_string()));
            }
            Ok(windowed(&self.news, window, |r| r.published_at))
        }
    }

    #[async_trait]
    impl MatchShareStore for MemStores {
        async fn fetch_entries(&self, window: PageWindow) -> Result<Vec<MatchShareRow>, FeedError> {
            Ok(windowed(&self.shares, window, |r| r.created_at))
        }
    }

    #[async_trait]
    impl ProfileStore for MemStores {
        async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ProfileRow>, FeedError> {
            Ok(self
                .profiles
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl MatchDataStore for MemStores {
        async fn fetch_records(
            &self,
            match_ids: &[String],
        ) -> Result<Vec<MatchRecordRow>, FeedError> {
            if self.fail_records {
                return Err(FeedError::Store("match store offline".to_string()));
            }
            Ok(self
                .records
                .iter()
                .filter(|r| match_ids.contains(&r.match_id))
                .cloned()
                .collect())
        }

        async fn fetch_participants(
            &self,
            keys: &[(String, String)],
        ) -> Result<Vec<ParticipantRow>, FeedError> {
            Ok(self
                .participants
                .iter()
                .filter(|p| {
                    keys.iter()
                        .any(|(m, u)| *m == p.match_id && *u == p.puuid)
                })
                .cloned()
                .collect())
        }
    }

    fn service(stores: Arc<MemStores>) -> FeedService {
        FeedService::new(
            Arc::clone(&stores) as Arc<dyn ThreadStore>,
            Arc::clone(&stores) as Arc<dyn NewsStore>,
            Arc::clone(&stores) as Arc<dyn MatchShareStore>,
            Arc::clone(&stores) as Arc<dyn ProfileStore>,
            stores,
        )
    }

    fn thread_row_at(id: &str, author: &str, created_at: DateTime<Utc>) -> ThreadRow {
        ThreadRow {
            id: id.to_string(),
            title: format!("thread {id}"),
            content: "body".to_string(),
            views: 10,
            vote_count: 2,
            reply_count: 1,
            author: serde_json::json!({ "id": author, "username": author }),
            category: serde_json::Value::Null,
            weapon_stat_id: None,
            created_at,
        }
    }

    fn news_row_at(id: &str, published_at: DateTime<Utc>) -> NewsRow {
        NewsRow {
            id: id.to_string(),
            title: format!("news {id}"),
            summary: String::new(),
            cover_image: None,
            published_at,
        }
    }

    fn share_row_at(
        id: &str,
        match_id: &str,
        user: &str,
        metadata: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> MatchShareRow {
        MatchShareRow {
            id: id.to_string(),
            match_id: match_id.to_string(),
            user_id: user.to_string(),
            metadata,
            created_at,
        }
    }

    fn roster_json() -> serde_json::Value {
        let positions = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];
        let mut participants = Vec::new();
        for team in [100, 200] {
            for (i, pos) in positions.iter().enumerate() {
                let champ = if team == 100 && i == 2 { 157 } else { (team + i as i64) * 10 };
                let (kills, deaths, assists) = if champ == 157 { (10, 2, 8) } else { (3, 3, 3) };
                participants.push(serde_json::json!({
                    "puuid": format!("puuid-{team}-{i}"),
                    "championId": champ,
                    "championName": format!("Champ{champ}"),
                    "kills": kills,
                    "deaths": deaths,
                    "assists": assists,
                    "teamId": team,
                    "win": team == 100,
                    "totalDamageDealtToChampions": 15_000,
                    "goldEarned": 11_000,
                    "visionScore": 25,
                    "damageDealtToTurrets": 1_500,
                    "totalMinionsKilled": 160,
                    "neutralMinionsKilled": 20,
                    "riotIdGameName": format!("Player{team}{i}"),
                    "riotIdTagline": "EUW",
                    "teamPosition": pos,
                }));
            }
        }
        serde_json::json!({ "info": { "gameDuration": 1_800, "participants": participants } })
    }

    fn request(filter: FeedFilter, limit: u32, cursor: Option<String>) -> FeedRequest {
        FeedRequest {
            page: 1,
            limit,
            cursor,
            filter,
        }
    }

    #[test]
    fn quotas_split_the_page_with_ceiling_division() {
        let q = Quotas::for_request(FeedFilter::All, 20);
        assert_eq!((q.recent, q.discover, q.news, q.lol), (8, 4, 4, 4));
        // Non-multiples of five round every share up.
        let q = Quotas::for_request(FeedFilter::All, 21);
        assert_eq!((q.recent, q.discover, q.news, q.lol), (9, 5, 5, 5));
        let q = Quotas::for_request(FeedFilter::Threads, 10);
        assert_eq!((q.recent, q.discover, q.news, q.lol), (10, 2, 0, 0));
        let q = Quotas::for_request(FeedFilter::Status, 30);
        assert_eq!((q.recent, q.discover, q.news, q.lol), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn scenario_a_threads_only_page_is_recency_ordered() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        for i in 0..12 {
            stores.threads.push(thread_row_at(
                &format!("t{i}"),
                &format!("author-{i}"),
                now - Duration::minutes(i),
            ));
        }
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::Threads, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        assert!(page.items.len() <= 10);
        assert!(
            page.items
                .iter()
                .all(|i| i.item_type() == ItemType::Thread)
        );
        // Recent pool leads in pure recency order.
        let times: Vec<DateTime<Utc>> = page.items.iter().map(FeedItem::created_at).collect();
        let mut sorted = times.clone();
        sorted.sort_by_key(|t| std::cmp::Reverse(*t));
        assert_eq!(times, sorted);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn scenario_b_mixed_feed_respects_diversity() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        for i in 0..15 {
            stores.threads.push(thread_row_at(
                &format!("t{i}"),
                &format!("author-{}", i % 4),
                now - Duration::minutes(i),
            ));
        }
        for i in 0..6 {
            stores
                .news
                .push(news_row_at(&format!("n{i}"), now - Duration::minutes(i)));
        }
        stores.records.push(MatchRecordRow {
            match_id: "m1".to_string(),
            full_json: roster_json(),
        });
        for i in 0..4 {
            stores.shares.push(share_row_at(
                &format!("s{i}"),
                "m1",
                &format!("sharer-{i}"),
                serde_json::json!({ "puuid": format!("puuid-100-{i}") }),
                now - Duration::minutes(i),
            ));
        }
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::All, 20, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        assert!(page.items.len() <= 20);
        for window in page.items.windows(3) {
            let first = window.first().map(FeedItem::item_type);
            assert!(
                !window.iter().all(|i| Some(i.item_type()) == first),
                "three consecutive items share a type"
            );
        }
        let mut per_author: HashMap<&str, usize> = HashMap::new();
        for item in &page.items {
            if let Some(key) = item.author_key() {
                *per_author.entry(key).or_insert(0) += 1;
            }
        }
        assert!(per_author.values().all(|&n| n <= 2));
    }

    #[tokio::test]
    async fn scenario_c_stale_puuid_resolves_via_champion_kda() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        stores.records.push(MatchRecordRow {
            match_id: "m1".to_string(),
            full_json: roster_json(),
        });
        stores.shares.push(share_row_at(
            "s1",
            "m1",
            "sharer-1",
            serde_json::json!({
                "puuid": "no-longer-in-roster",
                "championId": 157,
                "kills": 10,
                "deaths": 2,
                "assists": 8,
            }),
            now,
        ));
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::Lol, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        let Some(FeedItem::LolMatch(item)) = page.items.first() else {
            panic!("expected a match item");
        };
        assert_eq!(item.champion_id, Some(157));
        assert_eq!(item.win, Some(true));
        let Some(stats) = &item.team_stats else {
            panic!("expected team aggregates");
        };
        assert!(stats.team_total_damage > 0);
        assert_eq!(
            item.all_players.as_ref().map(Vec::len),
            Some(10)
        );
    }

    #[tokio::test]
    async fn scenario_d_record_failure_yields_degraded_item() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        stores.fail_records = true;
        stores.shares.push(share_row_at(
            "s1",
            "m1",
            "sharer-1",
            serde_json::json!({ "championId": 42, "kills": 3, "deaths": 1, "assists": 4 }),
            now,
        ));
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::Lol, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        let Some(FeedItem::LolMatch(item)) = page.items.first() else {
            panic!("expected a match item");
        };
        assert_eq!(item.champion_id, Some(42));
        assert!(item.team_stats.is_none());
        assert!(item.all_players.is_none());
    }

    #[tokio::test]
    async fn scenario_e_second_page_excludes_first_page_items() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        for i in 0..25 {
            stores
                .news
                .push(news_row_at(&format!("n{i}"), now - Duration::minutes(i)));
        }
        let svc = service(Arc::new(stores));

        let first = svc
            .fetch_page(request(FeedFilter::News, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert_eq!(first.items.len(), 10);
        assert!(first.has_more);

        let second = svc
            .fetch_page(request(FeedFilter::News, 10, Some(first.next_cursor.clone())))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        let first_ids: HashSet<&str> = first.items.iter().map(FeedItem::id).collect();
        assert_eq!(second.items.len(), 10);
        assert!(second.items.iter().all(|i| !first_ids.contains(i.id())));
    }

    #[tokio::test]
    async fn failing_source_degrades_instead_of_failing() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        stores.fail_news = true;
        for i in 0..10 {
            stores.threads.push(thread_row_at(
                &format!("t{i}"),
                &format!("author-{i}"),
                now - Duration::minutes(i),
            ));
        }
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::All, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert!(!page.items.is_empty());
        assert!(
            page.items
                .iter()
                .all(|i| i.item_type() != ItemType::News)
        );
    }

    #[tokio::test]
    async fn malformed_cursor_falls_back_to_first_page() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        for i in 0..12 {
            stores
                .news
                .push(news_row_at(&format!("n{i}"), now - Duration::minutes(i)));
        }
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(
                FeedFilter::News,
                10,
                Some("!!definitely-not-a-cursor!!".to_string()),
            ))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert_eq!(page.items.first().map(FeedItem::id), Some("n0"));
    }

    #[tokio::test]
    async fn input_watermarks_are_preserved_in_next_cursor() {
        let watermark = DateTime::parse_from_rfc3339("2025-06-01T10:00:00.123456Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| panic!("bad test timestamp"));
        let mut stores = MemStores::default();
        for i in 0..12 {
            stores.news.push(news_row_at(
                &format!("n{i}"),
                watermark - Duration::minutes(i + 1),
            ));
        }
        let svc = service(Arc::new(stores));

        let cursor = FeedCursor {
            news_created_at: Some(watermark),
            ..FeedCursor::default()
        };
        let page = svc
            .fetch_page(request(FeedFilter::News, 10, Some(cursor.encode())))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));

        let next = FeedCursor::decode(Some(&page.next_cursor))
            .unwrap_or_else(|| panic!("next cursor must decode"));
        assert_eq!(next.news_created_at, Some(watermark));
    }

    #[tokio::test]
    async fn status_filter_returns_empty_page() {
        let svc = service(Arc::new(MemStores::default()));
        let page = svc
            .fetch_page(request(FeedFilter::Status, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_bounds() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        for i in 0..40 {
            stores
                .news
                .push(news_row_at(&format!("n{i}"), now - Duration::minutes(i)));
        }
        let svc = service(Arc::new(stores));

        let tiny = svc
            .fetch_page(request(FeedFilter::News, 1, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert_eq!(tiny.limit, 10);
        assert_eq!(tiny.items.len(), 10);

        let huge = svc
            .fetch_page(request(FeedFilter::News, 500, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        assert_eq!(huge.limit, 30);
        assert_eq!(huge.items.len(), 30);
    }

    #[tokio::test]
    async fn empty_match_id_entries_are_dropped() {
        let now = Utc::now();
        let mut stores = MemStores::default();
        stores.shares.push(share_row_at(
            "s1",
            "",
            "sharer-1",
            serde_json::json!({}),
            now,
        ));
        stores.shares.push(share_row_at(
            "s2",
            "m1",
            "sharer-2",
            serde_json::json!({}),
            now - Duration::minutes(1),
        ));
        let svc = service(Arc::new(stores));

        let page = svc
            .fetch_page(request(FeedFilter::Lol, 10, None))
            .await
            .unwrap_or_else(|e| panic!("feed failed: {e}"));
        let ids: Vec<&str> = page.items.iter().map(FeedItem::id).collect();
        assert_eq!(ids, vec!["s2"]);
    }
}
