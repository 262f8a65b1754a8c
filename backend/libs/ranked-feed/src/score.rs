//! Score model: maps an item's counters to the sortable scalar each
//! strategy orders by.
//!
//! Every strategy sorts on a three-level key: primary score descending,
//! then creation time descending, then id descending. Primary scores
//! collide constantly (two clips with zero votes, say), so the comparator
//! and the pagination cursor always operate on the full tuple, never the
//! primary score alone.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{RankableItem, SortStrategy};

/// Store-side `hot` ranking treats the decay formula as opaque, so the
/// in-process equivalent is injected rather than hardcoded. Any
/// implementation must be monotonically increasing in vote score and
/// monotonically non-increasing in age.
pub trait HotScorer: Send + Sync {
    fn score(&self, vote_score: i64, age_hours: f64) -> f64;
}

/// Logarithmic vote weight with linear age decay.
#[derive(Debug, Default)]
pub struct DefaultHotScorer;

impl HotScorer for DefaultHotScorer {
    fn score(&self, vote_score: i64, age_hours: f64) -> f64 {
        let magnitude = (vote_score.unsigned_abs().max(1) as f64).log10();
        let sign = match vote_score.cmp(&0) {
            Ordering::Greater => 1.0,
            Ordering::Equal => 0.0,
            Ordering::Less => -1.0,
        };
        sign * magnitude - age_hours / 12.0
    }
}

/// Full sort position of an item under some strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub primary: f64,
    pub created_at_unix: i64,
    pub id: Uuid,
}

impl SortKey {
    /// Feed ordering: primary descending, creation time descending, id
    /// descending. NaN primaries compare as ties and fall through to the
    /// deterministic secondary keys.
    pub fn cmp_feed(&self, other: &SortKey) -> Ordering {
        other
            .primary
            .partial_cmp(&self.primary)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.created_at_unix.cmp(&self.created_at_unix))
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Computes primary scores and sort keys. Pure and stateless apart from
/// the injected hot scorer; safe to share across threads.
#[derive(Clone)]
pub struct ScoreModel {
    hot: Arc<dyn HotScorer>,
}

impl ScoreModel {
    pub fn new(hot: Arc<dyn HotScorer>) -> Self {
        Self { hot }
    }

    pub fn with_defaults() -> Self {
        Self::new(Arc::new(DefaultHotScorer))
    }

    /// Primary score of `item` under `strategy` as of `now`.
    pub fn primary_score(
        &self,
        item: &RankableItem,
        strategy: SortStrategy,
        now: DateTime<Utc>,
    ) -> f64 {
        match strategy {
            SortStrategy::New => item.created_at.timestamp() as f64,
            SortStrategy::Top => item.vote_score as f64,
            SortStrategy::Discussed => item.comment_count as f64,
            SortStrategy::Popular => effective_popularity(item),
            SortStrategy::Trending => effective_trending(item, now),
            SortStrategy::Rising => rising_velocity(item, now),
            SortStrategy::Hot => item
                .hot_score
                .unwrap_or_else(|| self.hot.score(item.vote_score, item.age_hours(now))),
        }
    }

    /// Full three-level sort key for `item` under `strategy`.
    pub fn sort_key(
        &self,
        item: &RankableItem,
        strategy: SortStrategy,
        now: DateTime<Utc>,
    ) -> SortKey {
        SortKey {
            primary: self.primary_score(item, strategy, now),
            created_at_unix: item.created_at.timestamp(),
            id: item.id,
        }
    }

}

/// Weighted linear combination used when no precomputed popularity index
/// is available. Comments weigh heaviest: they are the strongest signal
/// that a clip held attention.
pub fn engagement_proxy(item: &RankableItem) -> f64 {
    item.view_count as f64
        + 2.0 * item.vote_score as f64
        + 3.0 * item.comment_count as f64
        + 2.0 * item.favorite_count as f64
}

/// Popularity with the per-item fallback applied: the precomputed index
/// when present, the engagement proxy otherwise. The SQL rendering of
/// the popularity column applies the same COALESCE.
pub fn effective_popularity(item: &RankableItem) -> f64 {
    item.popularity_index
        .unwrap_or_else(|| engagement_proxy(item))
}

/// Trending with the per-item fallback applied: the precomputed score
/// when present, otherwise the engagement proxy decayed by age. For
/// fixed engagement the fallback is monotonically non-increasing in age.
pub fn effective_trending(item: &RankableItem, now: DateTime<Utc>) -> f64 {
    item.trending_score
        .unwrap_or_else(|| engagement_proxy(item) / (item.age_hours(now) + 2.0).powf(1.5))
}

/// Velocity score for `rising`: early votes and views count for more,
/// with smooth decay as the item ages.
fn rising_velocity(item: &RankableItem, now: DateTime<Utc>) -> f64 {
    let base = item.vote_score as f64 + item.view_count as f64 / 100.0;
    base * (1.0 + 1.0 / (item.age_hours(now) + 2.0))
}
