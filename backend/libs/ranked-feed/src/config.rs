//! Configuration for the ranked-feed core.
//!
//! All tunables are explicit constructor inputs. There is no module-level
//! state; every component receives its configuration at construction and
//! treats it as immutable afterwards, so a single instance can be shared
//! across any number of concurrent requests without locking.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard limits enforced by the query cost analyzer.
///
/// Set once at construction, shared read-only across all evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Maximum rows a single query may declare in its LIMIT
    pub max_result_size: i64,
    /// Maximum OFFSET a query may declare
    pub max_offset: i64,
    /// Maximum number of joins a query may perform
    pub max_join_depth: u32,
    /// Advisory statement timeout passed to the store boundary
    pub max_query_time: Duration,
    /// Advisory lock wait timeout passed to the store boundary
    pub max_lock_wait_time: Duration,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_result_size: 1000,
            max_offset: 10_000,
            max_join_depth: 4,
            max_query_time: Duration::from_secs(5),
            max_lock_wait_time: Duration::from_secs(2),
        }
    }
}

/// Soft bounds applied by the pagination limit enforcer at the request edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size substituted for non-positive caller limits
    pub default_page_size: i64,
    /// Ceiling for caller-supplied page sizes
    pub max_page_size: i64,
    /// Ceiling for caller-supplied offsets
    pub max_offset: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_offset: 10_000,
        }
    }
}

/// Describes the relation the ranked scan runs against.
///
/// The feed source is usually a materialized view maintained by an
/// out-of-band refresh job; which derived score columns it carries varies
/// by deployment, so the planner has to be told rather than assume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSourceConfig {
    /// Table or materialized view name the scan selects from
    pub relation: String,
    /// Whether the relation carries a precomputed trending_score column
    pub has_trending_score: bool,
    /// Whether the relation carries a precomputed popularity_index column
    pub has_popularity_index: bool,
    /// Whether the relation carries a precomputed hot_score column
    pub has_hot_score: bool,
    /// Whether the relation carries a denormalized engagement_count column
    pub has_engagement_count: bool,
    /// Age window for the `rising` strategy
    pub rising_window_hours: i64,
    /// Comment floor for the `discussed` strategy
    pub min_discussed_comments: i64,
}

impl Default for FeedSourceConfig {
    fn default() -> Self {
        Self {
            relation: "ranked_clips".to_string(),
            has_trending_score: true,
            has_popularity_index: true,
            has_hot_score: true,
            has_engagement_count: true,
            rising_window_hours: 48,
            min_discussed_comments: 1,
        }
    }
}

impl QueryLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_result_size: env_i64("QUERY_MAX_RESULT_SIZE", defaults.max_result_size),
            max_offset: env_i64("QUERY_MAX_OFFSET", defaults.max_offset),
            max_join_depth: env_i64("QUERY_MAX_JOIN_DEPTH", defaults.max_join_depth as i64) as u32,
            max_query_time: Duration::from_millis(env_i64(
                "QUERY_MAX_TIME_MS",
                defaults.max_query_time.as_millis() as i64,
            ) as u64),
            max_lock_wait_time: Duration::from_millis(env_i64(
                "QUERY_MAX_LOCK_WAIT_MS",
                defaults.max_lock_wait_time.as_millis() as i64,
            ) as u64),
        }
    }
}

impl PaginationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_page_size: env_i64("FEED_DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_i64("FEED_MAX_PAGE_SIZE", defaults.max_page_size),
            max_offset: env_i64("FEED_MAX_OFFSET", defaults.max_offset),
        }
    }
}

impl FeedSourceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            relation: std::env::var("FEED_SOURCE_RELATION").unwrap_or(defaults.relation),
            has_trending_score: env_bool("FEED_HAS_TRENDING_SCORE", defaults.has_trending_score),
            has_popularity_index: env_bool(
                "FEED_HAS_POPULARITY_INDEX",
                defaults.has_popularity_index,
            ),
            has_hot_score: env_bool("FEED_HAS_HOT_SCORE", defaults.has_hot_score),
            has_engagement_count: env_bool(
                "FEED_HAS_ENGAGEMENT_COUNT",
                defaults.has_engagement_count,
            ),
            rising_window_hours: env_i64("FEED_RISING_WINDOW_HOURS", defaults.rising_window_hours),
            min_discussed_comments: env_i64(
                "FEED_MIN_DISCUSSED_COMMENTS",
                defaults.min_discussed_comments,
            ),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let limits = QueryLimits::default();
        assert!(limits.max_result_size > 0);
        assert!(limits.max_offset >= limits.max_result_size);

        let pagination = PaginationConfig::default();
        assert!(pagination.default_page_size <= pagination.max_page_size);
    }
}
