//! Value objects shared across the ranked-feed core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A content item as seen by the ranking layer.
///
/// Counters are mutated by external collaborators (vote/view/comment
/// handlers); derived scores are maintained by an out-of-band refresh job.
/// This crate only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RankableItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub vote_score: i64,
    pub view_count: i64,
    pub comment_count: i64,
    pub favorite_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_count: Option<i64>,
}

impl RankableItem {
    /// Item age in fractional hours at `now`. Clock skew can make a
    /// freshly inserted item appear to be from the future; floor at zero
    /// so decay functions stay well-defined.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let secs = (now - self.created_at).num_milliseconds() as f64 / 1000.0;
        (secs / 3600.0).max(0.0)
    }
}

/// Closed set of feed ranking strategies. Chosen per request, immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    Hot,
    New,
    Top,
    Trending,
    Popular,
    Rising,
    Discussed,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::Hot => "hot",
            SortStrategy::New => "new",
            SortStrategy::Top => "top",
            SortStrategy::Trending => "trending",
            SortStrategy::Popular => "popular",
            SortStrategy::Rising => "rising",
            SortStrategy::Discussed => "discussed",
        }
    }

    pub const ALL: [SortStrategy; 7] = [
        SortStrategy::Hot,
        SortStrategy::New,
        SortStrategy::Top,
        SortStrategy::Trending,
        SortStrategy::Popular,
        SortStrategy::Rising,
        SortStrategy::Discussed,
    ];
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(SortStrategy::Hot),
            "new" => Ok(SortStrategy::New),
            "top" => Ok(SortStrategy::Top),
            "trending" => Ok(SortStrategy::Trending),
            "popular" => Ok(SortStrategy::Popular),
            "rising" => Ok(SortStrategy::Rising),
            "discussed" => Ok(SortStrategy::Discussed),
            _ => Err(()),
        }
    }
}

/// Decoded sort position. Produced only by the cursor codec; callers
/// treat the encoded token as opaque and never build one of these by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub sort_key: SortStrategy,
    pub sort_value: f64,
    pub item_id: Uuid,
    pub created_at_unix: i64,
}

/// One page of a ranked listing.
///
/// `next_cursor` is present iff the page came back full-sized; its absence
/// is the only end-of-data signal at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<RankableItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
