//! Ranked page planner.
//!
//! Translates `(strategy, optional cursor, page size)` into the ordering
//! and boundary predicate for a single keyset range scan, and mints the
//! next cursor from the returned page.
//!
//! Strategies whose primary score exists as a column in the feed source
//! (`top`, `discussed`, and `popular`/`trending` when the materialized
//! column is present) paginate on the full three-level key. Strategies
//! whose score cannot be re-expressed as a column predicate (`hot`,
//! `rising`, and the materialized ones when the column is absent) degrade:
//! the scan walks the creation-time keyset, and each fetched page is
//! re-ranked in memory by the strategy's score before it is returned. No
//! item is skipped or repeated, but ranking only holds within a page; a
//! high-velocity item created before the page boundary lands on a later
//! page. Known limitation; the real fix (persisting a snapshot score per
//! item) is out of scope here.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::{FeedSourceConfig, PaginationConfig};
use crate::cursor;
use crate::error::{FeedQueryError, Result};
use crate::limits::PageLimitEnforcer;
use crate::models::{Cursor, FeedPage, RankableItem, SortStrategy};
use crate::predicate::{BindValue, CompareOp, FeedColumn, Filter};
use crate::score::ScoreModel;
use crate::store::RankedItemStore;

/// A ranked listing request as received from a handler.
#[derive(Debug, Clone)]
pub struct RankedFeedRequest {
    pub strategy: SortStrategy,
    /// Opaque filter context (visibility, blocks, channel scoping);
    /// applied before the keyset predicate.
    pub filter: Option<Filter>,
    pub cursor: Option<String>,
    pub page_size: i64,
}

/// Everything the store needs to execute one bounded range scan.
/// All ordering is descending.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub strategy: SortStrategy,
    pub relation: String,
    pub order_by: Vec<FeedColumn>,
    pub predicate: Option<Filter>,
    pub limit: i64,
    /// True when pagination fell back to the creation-time keyset
    /// because the primary score has no symbolic column form.
    pub degraded: bool,
}

pub struct RankedPagePlanner {
    source: FeedSourceConfig,
    score_model: ScoreModel,
    enforcer: PageLimitEnforcer,
}

impl RankedPagePlanner {
    pub fn new(
        source: FeedSourceConfig,
        score_model: ScoreModel,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            source,
            score_model,
            enforcer: PageLimitEnforcer::new(pagination),
        }
    }

    /// Build the scan plan for one page.
    pub fn plan(
        &self,
        strategy: SortStrategy,
        cursor_token: Option<&str>,
        page_size: i64,
        filter: Option<Filter>,
        now: DateTime<Utc>,
    ) -> Result<PagePlan> {
        let cursor = cursor::decode(cursor_token.unwrap_or(""))?;
        if let Some(ref cursor) = cursor {
            if cursor.sort_key != strategy {
                return Err(FeedQueryError::CursorStrategyMismatch {
                    cursor: cursor.sort_key.to_string(),
                    requested: strategy.to_string(),
                });
            }
        }

        let score_column = self.score_column(strategy);

        let mut order_by = Vec::with_capacity(3);
        if let Some((column, _)) = score_column {
            order_by.push(column);
        }
        order_by.push(FeedColumn::CreatedAt);
        order_by.push(FeedColumn::Id);

        let mut conjuncts = Vec::new();
        if let Some(filter) = filter {
            conjuncts.push(filter);
        }
        if let Some(precondition) = self.precondition(strategy, now) {
            conjuncts.push(precondition);
        }
        if let Some(ref cursor) = cursor {
            conjuncts.push(self.boundary_predicate(cursor, score_column)?);
        }

        let predicate = match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(Filter::and(conjuncts)),
        };

        let limit = self.enforcer.clamp_limit(page_size);
        let degraded = score_column.is_none() && strategy != SortStrategy::New;

        debug!(
            strategy = %strategy,
            has_cursor = cursor.is_some(),
            limit,
            degraded,
            "planned ranked feed page"
        );

        Ok(PagePlan {
            strategy,
            relation: self.source.relation.clone(),
            order_by,
            predicate,
            limit,
            degraded,
        })
    }

    /// Run the full paginate flow: plan, scan, emit the next cursor.
    pub async fn paginate<S: RankedItemStore + ?Sized>(
        &self,
        store: &S,
        request: RankedFeedRequest,
    ) -> Result<FeedPage> {
        let now = Utc::now();
        let plan = self.plan(
            request.strategy,
            request.cursor.as_deref(),
            request.page_size,
            request.filter,
            now,
        )?;
        let items = store.scan(&plan).await?;
        if plan.degraded {
            Ok(self.degraded_page(request.strategy, items, plan.limit, now))
        } else {
            Ok(self.page_from(request.strategy, items, plan.limit, now))
        }
    }

    /// Assemble the response page. A full page mints a cursor from its
    /// last item; a short page is the end of the listing.
    pub fn page_from(
        &self,
        strategy: SortStrategy,
        items: Vec<RankableItem>,
        requested: i64,
        now: DateTime<Utc>,
    ) -> FeedPage {
        let next_cursor = match items.last() {
            Some(last) if items.len() as i64 == requested => Some(cursor::encode(
                strategy,
                self.score_model.primary_score(last, strategy, now),
                last.id,
                last.created_at.timestamp(),
            )),
            _ => None,
        };

        FeedPage { items, next_cursor }
    }

    /// Assemble a page for a degraded scan. The cursor continues from the
    /// scan-order last row (the creation-time keyset position) so later
    /// pages stay gap-free, while the returned items are re-ranked by the
    /// strategy's score.
    pub fn degraded_page(
        &self,
        strategy: SortStrategy,
        mut items: Vec<RankableItem>,
        requested: i64,
        now: DateTime<Utc>,
    ) -> FeedPage {
        let next_cursor = match items.last() {
            Some(last) if items.len() as i64 == requested => Some(cursor::encode(
                strategy,
                self.score_model.primary_score(last, strategy, now),
                last.id,
                last.created_at.timestamp(),
            )),
            _ => None,
        };

        items.sort_by(|a, b| {
            self.score_model
                .sort_key(a, strategy, now)
                .cmp_feed(&self.score_model.sort_key(b, strategy, now))
        });

        FeedPage { items, next_cursor }
    }

    pub fn enforcer(&self) -> &PageLimitEnforcer {
        &self.enforcer
    }

    pub fn score_model(&self) -> &ScoreModel {
        &self.score_model
    }

    /// The column (and bind type) carrying the strategy's primary score,
    /// when it has a symbolic form in the feed source. `new` returns
    /// `None` because its score *is* the creation-time key.
    fn score_column(&self, strategy: SortStrategy) -> Option<(FeedColumn, ScoreBind)> {
        match strategy {
            SortStrategy::Top => Some((FeedColumn::VoteScore, ScoreBind::Int)),
            SortStrategy::Discussed => Some((FeedColumn::CommentCount, ScoreBind::Int)),
            SortStrategy::Popular if self.source.has_popularity_index => {
                Some((FeedColumn::PopularityIndex, ScoreBind::Float))
            }
            SortStrategy::Trending if self.source.has_trending_score => {
                Some((FeedColumn::TrendingScore, ScoreBind::Float))
            }
            _ => None,
        }
    }

    /// Strategy preconditions applied ahead of the keyset predicate.
    fn precondition(&self, strategy: SortStrategy, now: DateTime<Utc>) -> Option<Filter> {
        match strategy {
            SortStrategy::Rising => {
                let oldest = now - Duration::hours(self.source.rising_window_hours);
                Some(Filter::cmp(
                    FeedColumn::CreatedAt,
                    CompareOp::Gt,
                    BindValue::Timestamp(oldest),
                ))
            }
            SortStrategy::Discussed => Some(Filter::cmp(
                FeedColumn::CommentCount,
                CompareOp::Ge,
                BindValue::Int(self.source.min_discussed_comments),
            )),
            _ => None,
        }
    }

    /// Strict lexicographic "continue after" predicate. With a score
    /// column:
    ///
    /// ```sql
    /// score < $v OR (score = $v AND
    ///   (created_at < $t OR (created_at = $t AND id < $id)))
    /// ```
    ///
    /// Without one, the creation-time tail alone.
    fn boundary_predicate(
        &self,
        cursor: &Cursor,
        score_column: Option<(FeedColumn, ScoreBind)>,
    ) -> Result<Filter> {
        let created_at = DateTime::<Utc>::from_timestamp(cursor.created_at_unix, 0)
            .ok_or_else(|| FeedQueryError::InvalidCursor("timestamp out of range".into()))?;

        let created_keyset = Filter::or(vec![
            Filter::cmp(
                FeedColumn::CreatedAt,
                CompareOp::Lt,
                BindValue::Timestamp(created_at),
            ),
            Filter::and(vec![
                Filter::cmp(
                    FeedColumn::CreatedAt,
                    CompareOp::Eq,
                    BindValue::Timestamp(created_at),
                ),
                Filter::cmp(FeedColumn::Id, CompareOp::Lt, BindValue::Uuid(cursor.item_id)),
            ]),
        ]);

        match score_column {
            None => Ok(created_keyset),
            Some((column, bind)) => {
                let value = bind.bind_value(cursor.sort_value);
                Ok(Filter::or(vec![
                    Filter::cmp(column, CompareOp::Lt, value.clone()),
                    Filter::and(vec![
                        Filter::cmp(column, CompareOp::Eq, value),
                        created_keyset,
                    ]),
                ]))
            }
        }
    }
}

/// How a cursor's f64 sort value binds against its score column.
#[derive(Debug, Clone, Copy)]
enum ScoreBind {
    Int,
    Float,
}

impl ScoreBind {
    fn bind_value(self, sort_value: f64) -> BindValue {
        match self {
            ScoreBind::Int => BindValue::Int(sort_value as i64),
            ScoreBind::Float => BindValue::Float(sort_value),
        }
    }
}
