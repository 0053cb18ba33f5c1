//! Opaque pagination cursor: per-source timestamp watermarks.
//!
//! The cursor is a base64-encoded JSON object carrying up to three
//! independent watermarks, one per content source. A present watermark
//! means "exclude items created at or after this instant from that
//! source on the next fetch"; an absent one means the source has not
//! been paged yet. Clients treat the token as opaque and echo it back
//! verbatim.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

/// Per-source pagination watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedCursor {
    /// Watermark for the thread source.
    pub threads_created_at: Option<DateTime<Utc>>,
    /// Watermark for the news source.
    pub news_created_at: Option<DateTime<Utc>>,
    /// Watermark for the shared-match source.
    pub lol_created_at: Option<DateTime<Utc>>,
}

/// Wire keys, kept stable across releases: clients hold encoded tokens.
const KEY_THREADS: &str = "threadsCreatedAt";
const KEY_NEWS: &str = "newsCreatedAt";
const KEY_LOL: &str = "lolCreatedAt";

impl FeedCursor {
    /// Decodes an opaque cursor token.
    ///
    /// Total: any failure (malformed base64, invalid JSON, non-object
    /// payload) yields `None`, which callers must treat identically to
    /// "no cursor supplied". Within a well-formed object, only string
    /// values that parse as RFC 3339 timestamps populate a watermark;
    /// unknown and non-string fields are silently dropped.
    #[must_use]
    pub fn decode(token: Option<&str>) -> Option<Self> {
        let token = token?;
        let bytes = STANDARD.decode(token).ok()?;
        let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let obj = value.as_object()?;
        Some(Self {
            threads_created_at: parse_watermark(obj.get(KEY_THREADS)),
            news_created_at: parse_watermark(obj.get(KEY_NEWS)),
            lol_created_at: parse_watermark(obj.get(KEY_LOL)),
        })
    }

    /// Encodes this cursor into an opaque token.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut obj = serde_json::Map::new();
        if let Some(ts) = self.threads_created_at {
            obj.insert(KEY_THREADS.to_string(), rfc3339(ts));
        }
        if let Some(ts) = self.news_created_at {
            obj.insert(KEY_NEWS.to_string(), rfc3339(ts));
        }
        if let Some(ts) = self.lol_created_at {
            obj.insert(KEY_LOL.to_string(), rfc3339(ts));
        }
        STANDARD.encode(serde_json::Value::Object(obj).to_string())
    }
}

fn rfc3339(ts: DateTime<Utc>) -> serde_json::Value {
    // Full sub-second precision: store timestamps carry microseconds,
    // and a truncated watermark would re-serve or skip same-instant rows.
    serde_json::Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
}

fn parse_watermark(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
