//! Aggregation engine for work item analytics.
//!
//! Takes plain work item collections plus optional filters and produces a
//! fixed-shape [`AnalyticsSnapshot`](models::analytics::AnalyticsSnapshot):
//! category totals, per-facet breakdowns with percentages, ranked top-N
//! lists and a cache key primitive for external memoization. The engine holds
//! no state between calls and performs no I/O.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::analytics::{AnalyticsFilters, AnalyticsSnapshot};
use crate::services::analytics_service::AnalyticsService;

/// Computes a snapshot with default settings.
pub fn compute_snapshot(
    raw: &JsonValue,
    filters: &AnalyticsFilters,
) -> AppResult<AnalyticsSnapshot> {
    AnalyticsService::default().compute_snapshot(raw, filters)
}
