//! Ranked feed keyset pagination and query cost governance.
//!
//! This crate is the repository-layer core behind the Clipstream ranked
//! listings: it orders a constantly-mutating set of clips under a fixed
//! menu of ranking strategies, hands out opaque keyset cursors that stay
//! correct under concurrent writes, and bounds the cost of data-access
//! queries before they reach Postgres.
//!
//! Everything here is a pure, request-scoped computation except the
//! store scan itself, which sits behind [`store::RankedItemStore`]. A
//! single planner/analyzer instance can be shared across all request
//! handlers; the only shared state is immutable configuration.

pub mod config;
pub mod cost;
pub mod cursor;
pub mod error;
pub mod limits;
pub mod models;
pub mod planner;
pub mod predicate;
pub mod score;
pub mod store;

pub use config::{FeedSourceConfig, PaginationConfig, QueryLimits};
pub use cost::{QueryCost, QueryCostAnalyzer, QueryShape};
pub use error::{FeedQueryError, Result};
pub use limits::PageLimitEnforcer;
pub use models::{Cursor, FeedPage, RankableItem, SortStrategy};
pub use planner::{PagePlan, RankedFeedRequest, RankedPagePlanner};
pub use predicate::{BindValue, CompareOp, FeedColumn, Filter};
pub use score::{DefaultHotScorer, HotScorer, ScoreModel, SortKey};
pub use store::{PgFeedStore, RankedItemStore};
