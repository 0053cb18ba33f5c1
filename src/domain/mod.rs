//! Domain layer: feed model, cursor codec, scoring, merging,
//! interleaving, and match enrichment.
//!
//! Everything here is pure, per-request computation over data the
//! persistence layer has already fetched. No module in this layer holds
//! state across requests.

pub mod cursor;
pub mod feed_item;
pub mod interleave;
pub mod match_stats;
pub mod merge;
pub mod score;

pub use cursor::FeedCursor;
pub use feed_item::{FeedFilter, FeedItem, ItemType};
pub use interleave::FeedBuckets;
pub use match_stats::EnrichedMatchItem;
