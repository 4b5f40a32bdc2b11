//! # Pagewright
//!
//! Idempotent batch maintenance for static content marketing sites.
//!
//! Pagewright replaces the usual pile of one-off "insert this snippet into
//! every article" scripts with a single transformation core: named HTML
//! fragments with idempotency markers and structural anchor rules, applied
//! one document at a time with atomic writes.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ DocumentStore │──▶│ MetadataExtract│──▶│ RelatedRanker │
//! └──────┬───────┘   └───────┬───────┘   └───────┬───────┘
//!        │                   └────────┬──────────┘
//!        │                            ▼
//!        │                   ┌────────────────┐
//!        │                   │ FragmentRegistry│
//!        │                   └───────┬────────┘
//!        ▼                           ▼
//! ┌──────────────┐           ┌───────────────┐
//! │ atomic save  │◀──────────│ TransformRunner│
//! └──────────────┘           └───────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`store`] | Document load/save/list with atomic writes |
//! | [`scan`] | Lightweight structural HTML scan |
//! | [`meta`] | Metadata extraction with lenient fallbacks |
//! | [`anchor`] | Structural anchor rules |
//! | [`fragment`] | Named fragments and rendering |
//! | [`transform`] | Transform application and outcomes |
//! | [`related`] | Topic-bucket similarity ranking |
//! | [`batch`] | Batch orchestration and reporting |
//! | [`export`] | JSON index, sitemap, and RSS generation |
//! | [`validate`] | Required-element audit |

pub mod anchor;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod fragment;
pub mod meta;
pub mod related;
pub mod scan;
pub mod store;
pub mod transform;
pub mod validate;
