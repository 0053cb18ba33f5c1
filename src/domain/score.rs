//! Engagement scoring for the discovery thread pool.
//!
//! The recency pool is deliberately pure recency; this score ranks only
//! the discovery candidates, surfacing older threads that are still
//! drawing engagement. Replies and votes weigh more than raw views, and
//! an exponential recency term (half-life around 50 hours) decays old
//! items out of discovery without erasing them immediately.

use chrono::{DateTime, Utc};

/// Scale of the recency term at age zero.
const RECENCY_WEIGHT: f64 = 8.0;
/// Decay constant in hours for the recency term.
const RECENCY_DECAY_HOURS: f64 = 72.0;
/// Weight of the view signal.
const VIEW_WEIGHT: f64 = 1.0;
/// Weight of the vote signal.
const VOTE_WEIGHT: f64 = 4.0;
/// Weight of the reply signal.
const REPLY_WEIGHT: f64 = 6.0;

/// Computes the engagement score of a thread-like item.
///
/// ```text
/// recency = 8 * exp(-age_hours / 72)
/// score   = recency + log10(1+views) + 4*log10(1+votes) + 6*log10(1+replies)
/// ```
///
/// Negative ages (clock skew, future-dated rows) clamp to zero.
#[must_use]
pub fn engagement_score(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    views: i64,
    votes: i64,
    replies: i64,
) -> f64 {
    let age_hours = ((now - created_at).num_seconds() as f64 / 3600.0).max(0.0);
    let recency_boost = RECENCY_WEIGHT * (-age_hours / RECENCY_DECAY_HOURS).exp();

    recency_boost
        + log_signal(views) * VIEW_WEIGHT
        + log_signal(votes) * VOTE_WEIGHT
        + log_signal(replies) * REPLY_WEIGHT
}

/// `log10(1 + n)` with negative counts clamped to zero.
fn log_signal(n: i64) -> f64 {
    (1.0 + (n.max(0) as f64)).log10()
}
