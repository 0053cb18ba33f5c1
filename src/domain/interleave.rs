//! Interleaving and anti-repetition for mixed-type feed pages.
//!
//! The interleaver blends per-type buckets into one sequence under a
//! fixed cyclic pattern; the anti-repetition filter then enforces
//! type-adjacency and per-author caps in a single greedy pass. Both
//! apply only to `filter=all` requests — single-type pages use their
//! bucket directly.

use std::collections::HashMap;

use super::feed_item::{FeedItem, ItemType};

/// Fixed cyclic slot pattern: threads carry the most weight, then news
/// and matches in equal measure. Status never holds a steady slot.
const PATTERN: [ItemType; 8] = [
    ItemType::Thread,
    ItemType::News,
    ItemType::Thread,
    ItemType::LolMatch,
    ItemType::Thread,
    ItemType::News,
    ItemType::Thread,
    ItemType::LolMatch,
];

/// Deterministic fallback order when a slot's bucket is exhausted.
const FALLBACK: [ItemType; 4] = [
    ItemType::Thread,
    ItemType::News,
    ItemType::LolMatch,
    ItemType::Status,
];

/// Maximum accepted items per author key in one page.
const MAX_PER_AUTHOR: usize = 2;

/// Per-type item buckets feeding the interleaver, each already in its
/// final internal order.
#[derive(Debug, Default)]
pub struct FeedBuckets {
    /// Merged thread items (recent then discovery back-fill).
    pub threads: Vec<FeedItem>,
    /// News items.
    pub news: Vec<FeedItem>,
    /// Enriched match items.
    pub lol: Vec<FeedItem>,
    /// Status items.
    pub status: Vec<FeedItem>,
}

impl FeedBuckets {
    /// Total items available across all buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.threads.len() + self.news.len() + self.lol.len() + self.status.len()
    }

    fn bucket(&self, item_type: ItemType) -> &[FeedItem] {
        match item_type {
            ItemType::Thread => &self.threads,
            ItemType::News => &self.news,
            ItemType::LolMatch => &self.lol,
            ItemType::Status => &self.status,
        }
    }
}

/// Per-bucket consumption cursors. Buckets stay read-only; each cursor
/// tracks the next unconsumed index, so no item is emitted twice.
#[derive(Debug, Default)]
struct Cursors {
    thread: usize,
    news: usize,
    lol: usize,
    status: usize,
}

impl Cursors {
    fn slot(&mut self, item_type: ItemType) -> &mut usize {
        match item_type {
            ItemType::Thread => &mut self.thread,
            ItemType::News => &mut self.news,
            ItemType::LolMatch => &mut self.lol,
            ItemType::Status => &mut self.status,
        }
    }
}

/// Walks the slot pattern cyclically, taking the next item of the
/// indicated type at each step. An exhausted bucket falls back to the
/// first non-empty bucket in fixed order rather than skipping the slot.
/// Terminates at `page_size` items or total exhaustion.
#[must_use]
pub fn interleave(buckets: &FeedBuckets, page_size: usize) -> Vec<FeedItem> {
    let mut out = Vec::with_capacity(page_size.min(buckets.total()));
    let mut cursors = Cursors::default();
    let mut slot_idx = 0usize;

    while out.len() < page_size {
        let wanted = PATTERN
            .get(slot_idx % PATTERN.len())
            .copied()
            .unwrap_or(ItemType::Thread);
        slot_idx += 1;

        let picked = take_next(buckets, &mut cursors, wanted).or_else(|| {
            FALLBACK
                .iter()
                .find_map(|&t| take_next(buckets, &mut cursors, t))
        });

        match picked {
            Some(item) => out.push(item),
            None => break,
        }
    }
    out
}

fn take_next(
    buckets: &FeedBuckets,
    cursors: &mut Cursors,
    item_type: ItemType,
) -> Option<FeedItem> {
    let idx = cursors.slot(item_type);
    let item = buckets.bucket(item_type).get(*idx)?.clone();
    *idx += 1;
    Some(item)
}

/// Greedy single-pass diversity filter over an interleaved sequence.
///
/// A candidate is skipped when the two immediately preceding accepted
/// items share its type (no 3-in-a-row runs), or when its author key has
/// already been accepted [`MAX_PER_AUTHOR`] times. News items carry no
/// author key and are exempt from the cap. Stops at `limit`.
///
/// Non-backtracking: under tight constraints the page may come back
/// short of `limit`.
#[must_use]
pub fn enforce_diversity(items: Vec<FeedItem>, limit: usize) -> Vec<FeedItem> {
    let mut out: Vec<FeedItem> = Vec::with_capacity(limit.min(items.len()));
    let mut author_counts: HashMap<String, usize> = HashMap::new();

    for item in items {
        if out.len() >= limit {
            break;
        }

        if out.len() >= 2 {
            let tail_run = out
                .iter()
                .rev()
                .take(2)
                .all(|prev| prev.item_type() == item.item_type());
            if tail_run {
                continue;
            }
        }

        if let Some(author) = item.author_key() {
            let count = author_counts.entry(author.to_string()).or_insert(0);
            if *count >= MAX_PER_AUTHOR {
                continue;
            }
            *count += 1;
        }

        out.push(item);
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::feed_item::{AuthorRef, NewsItem, StatusItem, ThreadItem};
    use chrono::Utc;

    fn thread(id: &str, author: &str) -> FeedItem {
        FeedItem::Thread(ThreadItem {
            id: id.to_string(),
            title: id.to_string(),
            excerpt: String::new(),
            views: 0,
            vote_count: 0,
            reply_count: 0,
            author: Some(AuthorRef {
                id: author.to_string(),
                username: author.to_string(),
                avatar_url: None,
            }),
            category: None,
            weapon_stat_id: None,
            created_at: Utc::now(),
        })
    }

    fn news(id: &str) -> FeedItem {
        FeedItem::News(NewsItem {
            id: id.to_string(),
            title: id.to_string(),
            summary: String::new(),
            cover_image: None,
            created_at: Utc::now(),
        })
    }

    fn lol(id: &str, user: &str) -> FeedItem {
        FeedItem::LolMatch(crate::domain::match_stats::EnrichedMatchItem {
            id: id.to_string(),
            match_id: format!("m-{id}"),
            shared_by: user.to_string(),
            shared_by_profile: None,
            champion_id: None,
            champion_name: None,
            kills: None,
            deaths: None,
            assists: None,
            kda: None,
            win: None,
            game_duration_secs: None,
            team_stats: None,
            all_players: None,
            created_at: Utc::now(),
        })
    }

    fn status(id: &str, user: &str) -> FeedItem {
        FeedItem::Status(StatusItem {
            id: id.to_string(),
            user_id: user.to_string(),
            body: String::new(),
            created_at: Utc::now(),
        })
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(FeedItem::id).collect()
    }

    #[test]
    fn interleave_follows_pattern_while_supplied() {
        let buckets = FeedBuckets {
            threads: vec![thread("t1", "a"), thread("t2", "b"), thread("t3", "c")],
            news: vec![news("n1"), news("n2")],
            lol: vec![lol("m1", "x")],
            status: vec![],
        };
        // Pattern opens thread, news, thread, lol.
        let out = interleave(&buckets, 4);
        assert_eq!(ids(&out), vec!["t1", "n1", "t2", "m1"]);
    }

    #[test]
    fn interleave_falls_back_when_bucket_exhausted() {
        let buckets = FeedBuckets {
            threads: vec![thread("t1", "a")],
            news: vec![news("n1"), news("n2"), news("n3")],
            lol: vec![],
            status: vec![],
        };
        let out = interleave(&buckets, 10);
        // Slot 1 takes t1; every later slot falls back to news.
        assert_eq!(ids(&out), vec!["t1", "n1", "n2", "n3"]);
    }

    #[test]
    fn interleave_never_exceeds_supply_or_duplicates() {
        let buckets = FeedBuckets {
            threads: vec![thread("t1", "a"), thread("t2", "b")],
            news: vec![news("n1")],
            lol: vec![],
            status: vec![status("s1", "u")],
        };
        let out = interleave(&buckets, 50);
        assert_eq!(out.len(), buckets.total());
        let mut seen = ids(&out);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), out.len());
    }

    #[test]
    fn interleave_empty_buckets_yield_empty_page() {
        let out = interleave(&FeedBuckets::default(), 20);
        assert!(out.is_empty());
    }

    #[test]
    fn diversity_blocks_three_in_a_row() {
        let items = vec![
            thread("t1", "a"),
            thread("t2", "b"),
            thread("t3", "c"),
            news("n1"),
            thread("t4", "d"),
        ];
        let out = enforce_diversity(items, 10);
        // t3 is rejected after the t1/t2 run and never revisited.
        assert_eq!(ids(&out), vec!["t1", "t2", "n1", "t4"]);
        for window in out.windows(3) {
            let first = window.first().map(FeedItem::item_type);
            let same = window.iter().all(|i| Some(i.item_type()) == first);
            assert!(!same, "three consecutive items share a type");
        }
    }

    #[test]
    fn diversity_caps_author_at_two() {
        let items = vec![
            thread("t1", "a"),
            news("n1"),
            thread("t2", "a"),
            news("n2"),
            thread("t3", "a"),
            thread("t4", "b"),
        ];
        let out = enforce_diversity(items, 10);
        let from_a = out
            .iter()
            .filter(|i| i.author_key() == Some("a"))
            .count();
        assert_eq!(from_a, 2);
        assert!(ids(&out).contains(&"t4"));
    }

    #[test]
    fn diversity_exempts_news_from_author_cap() {
        let items = vec![news("n1"), thread("t1", "a"), news("n2"), thread("t2", "b"), news("n3")];
        let out = enforce_diversity(items, 10);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn diversity_stops_at_limit() {
        let items = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    thread(&format!("t{i}"), &format!("a{i}"))
                } else {
                    news(&format!("n{i}"))
                }
            })
            .collect();
        let out = enforce_diversity(items, 4);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn diversity_may_underfill_under_tight_constraints() {
        // Single author, single type: only the first two survive.
        let items = vec![thread("t1", "a"), thread("t2", "a"), thread("t3", "a")];
        let out = enforce_diversity(items, 10);
        assert_eq!(out.len(), 2);
    }
}
