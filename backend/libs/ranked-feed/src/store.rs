//! Store boundary: the one blocking call in the paging flow.
//!
//! The planner hands over a `PagePlan`; implementations run the bounded
//! range scan and return rows in plan order. `PgFeedStore` is the
//! production Postgres implementation; tests use an in-memory store.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;

use crate::config::FeedSourceConfig;
use crate::error::Result;
use crate::models::RankableItem;
use crate::planner::PagePlan;
use crate::predicate::BindValue;

#[async_trait]
pub trait RankedItemStore: Send + Sync {
    /// Execute the bounded scan described by `plan`, returning items in
    /// plan order.
    async fn scan(&self, plan: &PagePlan) -> Result<Vec<RankableItem>>;
}

/// Postgres-backed feed scan over the configured source relation.
pub struct PgFeedStore {
    pool: PgPool,
    source: FeedSourceConfig,
    statement_timeout: Duration,
    lock_timeout: Duration,
}

impl PgFeedStore {
    pub fn new(
        pool: PgPool,
        source: FeedSourceConfig,
        statement_timeout: Duration,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            source,
            statement_timeout,
            lock_timeout,
        }
    }

    /// Render the plan to a single parameterized SELECT. Only fixed
    /// column names and `$n` placeholders reach the query text; every
    /// dynamic value goes through a bind slot.
    fn render(&self, plan: &PagePlan) -> (String, Vec<BindValue>) {
        let mut params = Vec::new();

        let trending = if self.source.has_trending_score {
            "trending_score"
        } else {
            "NULL::float8 AS trending_score"
        };
        let popularity = if self.source.has_popularity_index {
            "popularity_index"
        } else {
            "NULL::float8 AS popularity_index"
        };
        let hot = if self.source.has_hot_score {
            "hot_score"
        } else {
            "NULL::float8 AS hot_score"
        };
        let engagement = if self.source.has_engagement_count {
            "engagement_count"
        } else {
            "NULL::bigint AS engagement_count"
        };

        let mut sql = format!(
            "SELECT id, created_at, vote_score, view_count, comment_count, favorite_count, \
             {trending}, {popularity}, {hot}, {engagement} FROM {}",
            plan.relation
        );

        if let Some(ref predicate) = plan.predicate {
            let clause = predicate.to_sql(&mut params);
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        // Postgres defaults DESC to NULLS FIRST; a NULL score must sort
        // after every real score, so the direction is spelled out.
        let order: Vec<String> = plan
            .order_by
            .iter()
            .map(|c| format!("{} DESC NULLS LAST", c.sql_expr()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        sql.push_str(&format!(" LIMIT ${}", params.len() + 1));
        params.push(BindValue::Int(plan.limit));

        (sql, params)
    }
}

#[async_trait]
impl RankedItemStore for PgFeedStore {
    async fn scan(&self, plan: &PagePlan) -> Result<Vec<RankableItem>> {
        let (sql, params) = self.render(plan);
        debug!(relation = %plan.relation, binds = params.len(), "executing feed scan");

        let mut tx = self.pool.begin().await?;

        // Advisory bounds from QueryLimits; SET LOCAL scopes them to
        // this transaction. The values are process configuration, never
        // caller input.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = {}",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let mut query = sqlx::query_as::<_, RankableItem>(&sql);
        for param in params {
            query = match param {
                BindValue::Int(v) => query.bind(v),
                BindValue::Float(v) => query.bind(v),
                BindValue::Uuid(v) => query.bind(v),
                BindValue::Timestamp(v) => query.bind(v),
                BindValue::Text(v) => query.bind(v),
                BindValue::Bool(v) => query.bind(v),
            };
        }

        let items = query.fetch_all(&mut *tx).await?;
        tx.commit().await?;

        Ok(items)
    }
}
