//! In-memory feed store fixture.
//!
//! Executes a `PagePlan` against a vector of items the way Postgres
//! would: apply the predicate, sort by the plan's ORDER BY columns
//! descending, truncate to the limit.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ranked_feed::score::{effective_popularity, effective_trending};
use ranked_feed::{FeedColumn, PagePlan, RankableItem, RankedItemStore, Result};

pub struct MemoryFeedStore {
    items: Vec<RankableItem>,
}

impl MemoryFeedStore {
    pub fn new(items: Vec<RankableItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl RankedItemStore for MemoryFeedStore {
    async fn scan(&self, plan: &PagePlan) -> Result<Vec<RankableItem>> {
        let now = Utc::now();
        let mut rows: Vec<RankableItem> = self
            .items
            .iter()
            .filter(|item| {
                plan.predicate
                    .as_ref()
                    .map(|p| p.matches(item, now))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| order_by_cmp(a, b, &plan.order_by, now));
        rows.truncate(plan.limit as usize);
        Ok(rows)
    }
}

fn order_by_cmp(
    a: &RankableItem,
    b: &RankableItem,
    columns: &[FeedColumn],
    now: DateTime<Utc>,
) -> Ordering {
    for column in columns {
        let ordering = match column {
            FeedColumn::Id => b.id.cmp(&a.id),
            FeedColumn::CreatedAt => b.created_at.cmp(&a.created_at),
            FeedColumn::VoteScore => b.vote_score.cmp(&a.vote_score),
            FeedColumn::ViewCount => b.view_count.cmp(&a.view_count),
            FeedColumn::CommentCount => b.comment_count.cmp(&a.comment_count),
            FeedColumn::FavoriteCount => b.favorite_count.cmp(&a.favorite_count),
            // Derived scores order through the same per-item fallback the
            // SQL rendering coalesces to.
            FeedColumn::TrendingScore => effective_trending(b, now)
                .partial_cmp(&effective_trending(a, now))
                .unwrap_or(Ordering::Equal),
            FeedColumn::PopularityIndex => effective_popularity(b)
                .partial_cmp(&effective_popularity(a))
                .unwrap_or(Ordering::Equal),
            // NULLs sort last, matching the DESC NULLS LAST ordering the
            // Postgres adapter renders.
            FeedColumn::EngagementCount => match (a.engagement_count, b.engagement_count) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
