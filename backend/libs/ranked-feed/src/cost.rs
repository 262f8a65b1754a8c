//! Query cost analyzer.
//!
//! Before a data-access query runs, its structural shape (joins, limit,
//! offset, scan estimate) is scored against a fixed-weight cost model and
//! checked against hard limits. The weights are deliberately simple so a
//! rejection is always explainable from the query shape alone.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::QueryLimits;
use crate::error::{FeedQueryError, Result};

/// Complexity ceiling above which a query is rejected outright.
const COMPLEXITY_CEILING: f64 = 100.0;

const BASE_COST: f64 = 1.0;
const JOIN_WEIGHT: f64 = 10.0;
const SCAN_SIZE_THRESHOLD: i64 = 1_000;
const SCAN_SIZE_DIVISOR: f64 = 100.0;
const OFFSET_DIVISOR: f64 = 100.0;
const LIMIT_THRESHOLD: i64 = 100;
const LIMIT_DIVISOR: f64 = 50.0;

/// Milliseconds of estimated execution per complexity point.
const MILLIS_PER_POINT: f64 = 10.0;

/// Structural description of a query, declared by the call site that is
/// about to execute it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryShape {
    pub join_count: u32,
    pub scan_size_estimate: i64,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Computed per-query cost. Ephemeral: computed fresh for every query,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCost {
    pub join_count: u32,
    pub scan_size_estimate: i64,
    pub complexity_score: f64,
    pub estimated_duration: Duration,
    pub has_offset: bool,
    pub offset_value: i64,
    pub limit_value: i64,
}

/// Shares nothing mutable; one instance serves unlimited concurrent
/// callers.
#[derive(Debug, Clone)]
pub struct QueryCostAnalyzer {
    limits: QueryLimits,
}

impl QueryCostAnalyzer {
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Score a query shape without judging it.
    pub fn analyze(&self, shape: &QueryShape) -> QueryCost {
        let mut complexity = BASE_COST;

        complexity += shape.join_count as f64 * JOIN_WEIGHT;

        if shape.scan_size_estimate > SCAN_SIZE_THRESHOLD {
            complexity += shape.scan_size_estimate as f64 / SCAN_SIZE_DIVISOR;
        }

        let offset_value = shape.offset.unwrap_or(0);
        if shape.offset.is_some() {
            // Deep offsets force the store to produce and discard rows;
            // they cost far more than their face value suggests. A
            // negative offset is treated as zero, never as a discount.
            complexity += offset_value.max(0) as f64 / OFFSET_DIVISOR;
        }

        let limit_value = shape.limit.unwrap_or(0);
        if limit_value > LIMIT_THRESHOLD {
            complexity += limit_value as f64 / LIMIT_DIVISOR;
        }

        let estimated_millis = (complexity * MILLIS_PER_POINT)
            .min(self.limits.max_query_time.as_millis() as f64);

        QueryCost {
            join_count: shape.join_count,
            scan_size_estimate: shape.scan_size_estimate,
            complexity_score: complexity,
            estimated_duration: Duration::from_millis(estimated_millis as u64),
            has_offset: shape.offset.is_some(),
            offset_value,
            limit_value,
        }
    }

    /// Score and validate a query shape. The first violated check wins.
    pub fn validate(&self, shape: &QueryShape) -> Result<QueryCost> {
        if shape.join_count > self.limits.max_join_depth {
            return Err(FeedQueryError::TooManyJoins {
                joins: shape.join_count,
                max: self.limits.max_join_depth,
            });
        }

        if let Some(offset) = shape.offset {
            if offset > self.limits.max_offset {
                return Err(FeedQueryError::OffsetTooLarge {
                    offset,
                    max: self.limits.max_offset,
                });
            }
        }

        if let Some(limit) = shape.limit {
            if limit > self.limits.max_result_size {
                return Err(FeedQueryError::LimitTooLarge {
                    limit,
                    max: self.limits.max_result_size,
                });
            }
        }

        let cost = self.analyze(shape);
        if cost.complexity_score > COMPLEXITY_CEILING {
            return Err(FeedQueryError::TooComplex {
                score: cost.complexity_score,
                ceiling: COMPLEXITY_CEILING,
            });
        }

        Ok(cost)
    }

    /// Lightweight entry point for call sites that only have pagination
    /// parameters, not a full query description.
    pub fn validate_pagination(&self, limit: i64, offset: i64) -> Result<()> {
        self.validate(&QueryShape {
            join_count: 0,
            scan_size_estimate: 0,
            limit: Some(limit),
            offset: Some(offset),
        })
        .map(|_| ())
    }

    /// Advisory statement timeout the store boundary must honor.
    pub fn max_query_time(&self) -> Duration {
        self.limits.max_query_time
    }

    /// Advisory lock wait bound the store boundary must honor.
    pub fn max_lock_wait_time(&self) -> Duration {
        self.limits.max_lock_wait_time
    }
}
