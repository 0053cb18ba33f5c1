//! # rift-feed
//!
//! Ranked, diversity-constrained community feed service.
//!
//! Aggregates discussion threads, news posts, and shared League matches
//! into one paginated feed. Page one is served by offset pagination;
//! every later page pages forward through per-source timestamp
//! watermarks carried in an opaque cursor token.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── FeedService (service/)
//!     │       fan-out fetch → merge/rerank → enrich → interleave → filter
//!     │
//!     ├── Domain (domain/)
//!     │       cursor codec · score engine · merge · interleaver · match stats
//!     │
//!     └── Content stores (persistence/, PostgreSQL)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
