//! # Cellforge Net
//!
//! Remote rule loading: fetching `@TABLE`/`@TREE` definitions by name,
//! scanning fetched text for sections, and caching decoded rules for the
//! process lifetime with request coalescing.

/// Process-wide rule cache
pub mod cache;
/// Repository location and timeouts
pub mod config;
/// The fetcher capability and its HTTP implementation
pub mod fetch;
/// Section scanning for fetched text
pub mod scan;

pub use cache::{decode_embedded, RuleCache, RuleCacheEntry, RuleData};
pub use config::RuleRepositoryConfig;
pub use fetch::{HttpRuleFetcher, RuleFetcher};
pub use scan::{scan_sections, RuleSections};
