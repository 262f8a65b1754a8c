//! Typed predicate builder for feed scans.
//!
//! Dynamic filters are assembled as a small tagged AST and rendered to
//! parameterized SQL, with every value going through a bind slot. Caller
//! input never reaches the query text itself.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::RankableItem;
use crate::score::{effective_popularity, effective_trending};

/// Columns of the feed source relation that predicates may reference.
/// Closed set: rendering only ever emits these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedColumn {
    Id,
    CreatedAt,
    VoteScore,
    ViewCount,
    CommentCount,
    FavoriteCount,
    TrendingScore,
    PopularityIndex,
    EngagementCount,
}

impl FeedColumn {
    pub fn sql_name(&self) -> &'static str {
        match self {
            FeedColumn::Id => "id",
            FeedColumn::CreatedAt => "created_at",
            FeedColumn::VoteScore => "vote_score",
            FeedColumn::ViewCount => "view_count",
            FeedColumn::CommentCount => "comment_count",
            FeedColumn::FavoriteCount => "favorite_count",
            FeedColumn::TrendingScore => "trending_score",
            FeedColumn::PopularityIndex => "popularity_index",
            FeedColumn::EngagementCount => "engagement_count",
        }
    }

    /// Expression used wherever the column is compared or ordered.
    ///
    /// The derived-score columns coalesce NULL per item to the same
    /// fallback the score model computes (identical weights), so a row
    /// the refresh job has not reached yet still has a well-defined
    /// position and keyset boundary.
    pub fn sql_expr(&self) -> &'static str {
        match self {
            FeedColumn::PopularityIndex => {
                "COALESCE(popularity_index, \
                 view_count + 2 * vote_score + 3 * comment_count + 2 * favorite_count)"
            }
            FeedColumn::TrendingScore => {
                "COALESCE(trending_score, \
                 (view_count + 2 * vote_score + 3 * comment_count + 2 * favorite_count) \
                 / POWER(GREATEST(EXTRACT(EPOCH FROM (NOW() - created_at)) / 3600.0, 0.0) + 2.0, 1.5))"
            }
            _ => self.sql_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A value destined for a bind slot.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Text(String),
    Bool(bool),
}

/// Filter AST. Built by the planner (keyset boundaries, strategy
/// preconditions) and by callers (opaque authorization/filter context).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: FeedColumn,
        op: CompareOp,
        value: BindValue,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn cmp(column: FeedColumn, op: CompareOp, value: BindValue) -> Self {
        Filter::Compare { column, op, value }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Render to a SQL fragment, pushing bind values in placeholder
    /// order. Placeholder numbering continues from whatever is already
    /// in `params`, so fragments compose into one statement.
    pub fn to_sql(&self, params: &mut Vec<BindValue>) -> String {
        match self {
            Filter::Compare { column, op, value } => {
                params.push(value.clone());
                format!(
                    "{} {} ${}",
                    column.sql_expr(),
                    op.sql_symbol(),
                    params.len()
                )
            }
            // Empty conjunction is vacuously true, empty disjunction
            // vacuously false; both keep composition total.
            Filter::And(filters) => {
                if filters.is_empty() {
                    return "TRUE".to_string();
                }
                let parts: Vec<String> = filters.iter().map(|f| f.to_sql(params)).collect();
                format!("({})", parts.join(" AND "))
            }
            Filter::Or(filters) => {
                if filters.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<String> = filters.iter().map(|f| f.to_sql(params)).collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }
}

impl Filter {
    /// Evaluate this filter against an in-memory item, with the same
    /// semantics the rendered SQL has: the derived-score columns
    /// coalesce to their per-item fallback (`now` stands in for the
    /// statement's NOW()), while a comparison against a genuinely
    /// absent (NULL) column is false, as is a type-mismatched one.
    pub fn matches(&self, item: &RankableItem, now: DateTime<Utc>) -> bool {
        match self {
            Filter::Compare { column, op, value } => match column_value(item, *column, now) {
                Some(actual) => compare(&actual, value)
                    .map(|ordering| op_holds(*op, ordering))
                    .unwrap_or(false),
                None => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(item, now)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(item, now)),
        }
    }
}

fn column_value(item: &RankableItem, column: FeedColumn, now: DateTime<Utc>) -> Option<BindValue> {
    match column {
        FeedColumn::Id => Some(BindValue::Uuid(item.id)),
        FeedColumn::CreatedAt => Some(BindValue::Timestamp(item.created_at)),
        FeedColumn::VoteScore => Some(BindValue::Int(item.vote_score)),
        FeedColumn::ViewCount => Some(BindValue::Int(item.view_count)),
        FeedColumn::CommentCount => Some(BindValue::Int(item.comment_count)),
        FeedColumn::FavoriteCount => Some(BindValue::Int(item.favorite_count)),
        FeedColumn::TrendingScore => Some(BindValue::Float(effective_trending(item, now))),
        FeedColumn::PopularityIndex => Some(BindValue::Float(effective_popularity(item))),
        FeedColumn::EngagementCount => item.engagement_count.map(BindValue::Int),
    }
}

fn compare(actual: &BindValue, expected: &BindValue) -> Option<Ordering> {
    match (actual, expected) {
        (BindValue::Int(a), BindValue::Int(b)) => Some(a.cmp(b)),
        (BindValue::Float(a), BindValue::Float(b)) => a.partial_cmp(b),
        (BindValue::Int(a), BindValue::Float(b)) => (*a as f64).partial_cmp(b),
        (BindValue::Float(a), BindValue::Int(b)) => a.partial_cmp(&(*b as f64)),
        (BindValue::Uuid(a), BindValue::Uuid(b)) => Some(a.cmp(b)),
        (BindValue::Timestamp(a), BindValue::Timestamp(b)) => Some(a.cmp(b)),
        (BindValue::Text(a), BindValue::Text(b)) => Some(a.cmp(b)),
        (BindValue::Bool(a), BindValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn op_holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}
