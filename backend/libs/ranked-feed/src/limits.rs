//! Pagination limit enforcer: the clamping counterpart to the cost
//! analyzer's hard rejections.
//!
//! Public-facing pagination parameters degrade gracefully (a bad limit
//! becomes the default, an oversized one is capped), while internal
//! query paths go through `QueryCostAnalyzer` and fail loudly. Both
//! policies are intentional; they guard different edges.

use crate::config::PaginationConfig;

#[derive(Debug, Clone)]
pub struct PageLimitEnforcer {
    config: PaginationConfig,
}

impl PageLimitEnforcer {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Clamp a caller-supplied limit into `[1, max_page_size]`.
    /// Non-positive values mean "whatever the default is".
    pub fn clamp_limit(&self, limit: i64) -> i64 {
        if limit <= 0 {
            self.config.default_page_size
        } else {
            limit.min(self.config.max_page_size)
        }
    }

    /// Clamp a caller-supplied offset into `[0, max_offset]`.
    pub fn clamp_offset(&self, offset: i64) -> i64 {
        offset.clamp(0, self.config.max_offset)
    }

    /// Clamp a `(limit, offset)` pair in one go.
    pub fn clamp(&self, limit: i64, offset: i64) -> (i64, i64) {
        (self.clamp_limit(limit), self.clamp_offset(offset))
    }

    pub fn default_page_size(&self) -> i64 {
        self.config.default_page_size
    }
}
