use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::analytics::{
    AnalyticsFilters, AnalyticsSnapshot, CategorySnapshot, Facet, FacetSnapshot, GroupBreakdown,
    GroupStats, SnapshotMeta, SnapshotSummary, TimeDistribution, TopNEntry,
};
use crate::models::settings::AnalyticsSettings;
use crate::models::work_item::WorkItemRecord;
use crate::services::cache_key::CacheKeyBuilder;
use crate::services::dimension_aggregator::{
    aggregate, aggregate_facet, category_percentages, category_totals, facet_keys,
    hours_percentages, percentages, round_hours, sanitize_hours, share, AggregateOptions,
};
use crate::services::record_normalizer::normalize_batch;
use crate::services::top_n::{format_hours, market_footprint, select_top_n, TopNOptions};

const UNFILTERED: &str = "all";

const HIGHLIGHT_FACETS: [Facet; 6] = [
    Facet::Category,
    Facet::Market,
    Facet::AiTool,
    Facet::Deliverable,
    Facet::Contributor,
    Facet::Reporter,
];

/// Stateless facade assembling [`AnalyticsSnapshot`]s from work items.
///
/// Holds only immutable settings, so one instance can serve concurrent
/// callers; every call allocates its own output.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    settings: AnalyticsSettings,
    cache_keys: CacheKeyBuilder,
}

#[derive(Debug, Clone, Copy)]
struct BatchCounts {
    input_records: u64,
    skipped_records: u64,
}

impl AnalyticsService {
    pub fn new(settings: AnalyticsSettings) -> AppResult<Self> {
        settings.validate()?;
        let cache_keys = CacheKeyBuilder::with_prefix_len(settings.cache_id_prefix_len)?;
        Ok(Self {
            settings,
            cache_keys,
        })
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Snapshot for a raw JSON record array. A payload that is not an array
    /// produces the zero-filled snapshot rather than an error.
    pub fn compute_snapshot(
        &self,
        raw: &JsonValue,
        filters: &AnalyticsFilters,
    ) -> AppResult<AnalyticsSnapshot> {
        let limit = self.resolve_limit(filters)?;
        let batch = match normalize_batch(raw) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(target: "analytics::snapshot", error = %err, "unusable record payload, returning empty snapshot");
                return Ok(self.build_snapshot(
                    &[],
                    filters,
                    limit,
                    BatchCounts {
                        input_records: 0,
                        skipped_records: 0,
                    },
                ));
            }
        };

        Ok(self.build_snapshot(
            &batch.records,
            filters,
            limit,
            BatchCounts {
                input_records: batch.input_records,
                skipped_records: batch.skipped_records,
            },
        ))
    }

    pub fn compute_snapshot_from_records(
        &self,
        records: &[WorkItemRecord],
        filters: &AnalyticsFilters,
    ) -> AppResult<AnalyticsSnapshot> {
        let limit = self.resolve_limit(filters)?;
        Ok(self.build_snapshot(
            records,
            filters,
            limit,
            BatchCounts {
                input_records: records.len() as u64,
                skipped_records: 0,
            },
        ))
    }

    pub fn empty_snapshot(&self, filters: &AnalyticsFilters) -> AppResult<AnalyticsSnapshot> {
        self.compute_snapshot_from_records(&[], filters)
    }

    /// Memoization key for the records a snapshot with `filters` would read.
    pub fn cache_key(
        &self,
        records: &[WorkItemRecord],
        filters: &AnalyticsFilters,
    ) -> AppResult<String> {
        let period = non_blank(&filters.period_id).unwrap_or(UNFILTERED);
        self.cache_keys
            .build(records, period, non_blank(&filters.contributor_id))
    }

    pub fn matches_filters(&self, record: &WorkItemRecord, filters: &AnalyticsFilters) -> bool {
        if let Some(period) = non_blank(&filters.period_id) {
            if record
                .period_key(self.settings.fallback_period_from_date)
                .as_deref()
                != Some(period)
            {
                return false;
            }
        }
        if let Some(contributor) = non_blank(&filters.contributor_id) {
            if record.contributor_id() != Some(contributor) {
                return false;
            }
        }
        if let Some(source) = non_blank(&filters.source_id) {
            if record.reporter() != Some(source) {
                return false;
            }
        }
        if let Some(department) = non_blank(&filters.department) {
            if !record.in_department(department) {
                return false;
            }
        }
        true
    }

    fn resolve_limit(&self, filters: &AnalyticsFilters) -> AppResult<usize> {
        match filters.limit {
            Some(0) => Err(AppError::validation_with_details(
                "limit must be at least 1",
                serde_json::json!({ "limit": 0 }),
            )),
            Some(limit) => Ok(limit),
            None => Ok(self.settings.default_limit),
        }
    }

    fn build_snapshot(
        &self,
        records: &[WorkItemRecord],
        filters: &AnalyticsFilters,
        limit: usize,
        counts: BatchCounts,
    ) -> AnalyticsSnapshot {
        let matched: Vec<WorkItemRecord> = records
            .iter()
            .filter(|record| self.matches_filters(record, filters))
            .cloned()
            .collect();
        debug!(
            target: "analytics::snapshot",
            input = counts.input_records,
            matched = matched.len(),
            "filters applied"
        );

        let categories = self.category_snapshot(&matched, limit);
        let time_distribution = time_distribution(&matched);
        let products = self.facet_snapshot(&matched, Facet::Product, limit);
        let markets = self.facet_snapshot(&matched, Facet::Market, limit);
        let departments = self.facet_snapshot(&matched, Facet::Department, limit);
        let ai_tools = self.facet_snapshot(&matched, Facet::AiTool, limit);
        let deliverables = self.facet_snapshot(&matched, Facet::Deliverable, limit);
        let contributors = self.facet_snapshot(&matched, Facet::Contributor, limit);
        let reporters = self.facet_snapshot(&matched, Facet::Reporter, limit);

        let summary = summarize(&matched, &contributors, &reporters, &markets);

        let highlights: Vec<TopNEntry> = HIGHLIGHT_FACETS
            .iter()
            .flat_map(|facet| {
                let top = match facet {
                    Facet::Category => &categories.top,
                    Facet::Market => &markets.top,
                    Facet::AiTool => &ai_tools.top,
                    Facet::Deliverable => &deliverables.top,
                    Facet::Contributor => &contributors.top,
                    Facet::Reporter => &reporters.top,
                    Facet::Product => &products.top,
                    Facet::Department => &departments.top,
                };
                std::iter::once(TopNEntry::header(facet.title())).chain(top.iter().cloned())
            })
            .collect();

        let meta = SnapshotMeta {
            period_id: echo(&filters.period_id),
            contributor_id: echo(&filters.contributor_id),
            source_id: echo(&filters.source_id),
            department: echo(&filters.department),
            limit,
            input_records: counts.input_records,
            skipped_records: counts.skipped_records,
            matched_records: matched.len() as u64,
        };

        info!(
            target: "analytics::snapshot",
            period = %meta.period_id,
            matched = meta.matched_records,
            skipped = meta.skipped_records,
            "analytics snapshot computed"
        );

        AnalyticsSnapshot {
            summary,
            categories,
            time_distribution,
            products,
            markets,
            departments,
            ai_tools,
            deliverables,
            contributors,
            reporters,
            highlights,
            meta,
        }
    }

    fn category_snapshot(&self, records: &[WorkItemRecord], limit: usize) -> CategorySnapshot {
        let totals = category_totals(records);
        let percentages = category_percentages(&totals);
        let breakdown = aggregate_facet(records, Facet::Category);
        let top = self.top_entries(&breakdown, Facet::Category, limit, |label, _| {
            percentages
                .get(label)
                .map(|value| format!("{value:.1}%"))
                .unwrap_or_default()
        });

        CategorySnapshot {
            totals,
            percentages,
            top,
        }
    }

    fn facet_snapshot(
        &self,
        records: &[WorkItemRecord],
        facet: Facet,
        limit: usize,
    ) -> FacetSnapshot {
        let breakdown = aggregate_facet(records, facet);
        let top = match facet {
            Facet::Contributor | Facet::Reporter => {
                self.top_entries(&breakdown, facet, limit, |label, _| {
                    let owned: Vec<WorkItemRecord> = records
                        .iter()
                        .filter(|record| {
                            facet_keys(facet, record)
                                .iter()
                                .any(|key| key.trim() == label)
                        })
                        .cloned()
                        .collect();
                    market_footprint(&aggregate_facet(&owned, Facet::Market))
                })
            }
            _ => self.top_entries(&breakdown, facet, limit, |_, stats| format_hours(stats.hours)),
        };

        FacetSnapshot {
            percentages: percentages(&breakdown),
            total: breakdown.total_count(),
            breakdown,
            top,
        }
    }

    fn top_entries<F>(
        &self,
        breakdown: &GroupBreakdown,
        facet: Facet,
        limit: usize,
        sub_value: F,
    ) -> Vec<TopNEntry>
    where
        F: Fn(&str, &GroupStats) -> String,
    {
        let options = TopNOptions {
            limit,
            no_data_label: &self.settings.no_data_label,
            icon: facet.icon(),
        };
        // `limit` is validated before any facet runs.
        select_top_n(breakdown, &options, sub_value)
            .unwrap_or_else(|_| vec![TopNEntry::no_data(&self.settings.no_data_label)])
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        let settings = AnalyticsSettings::default();
        Self {
            cache_keys: CacheKeyBuilder::default(),
            settings,
        }
    }
}

fn time_distribution(records: &[WorkItemRecord]) -> TimeDistribution {
    let by_category = aggregate_facet(records, Facet::Category);
    let by_day = aggregate(
        records,
        |record| {
            record
                .created_at
                .map(|timestamp| timestamp.date_naive().format("%Y-%m-%d").to_string())
                .into_iter()
                .collect()
        },
        AggregateOptions::default(),
    );
    let undated = records
        .iter()
        .filter(|record| record.created_at.is_none())
        .count() as u64;

    TimeDistribution {
        total_hours: round_hours(records.iter().map(|record| sanitize_hours(record.hours)).sum()),
        category_hour_percentages: hours_percentages(&by_category),
        by_category,
        by_day,
        undated,
    }
}

fn summarize(
    records: &[WorkItemRecord],
    contributors: &FacetSnapshot,
    reporters: &FacetSnapshot,
    markets: &FacetSnapshot,
) -> SnapshotSummary {
    let total_tasks = records.len() as u64;
    let priority_tasks = records.iter().filter(|record| record.is_priority).count() as u64;
    let reworked_tasks = records.iter().filter(|record| record.is_reworked).count() as u64;

    SnapshotSummary {
        total_tasks,
        total_hours: round_hours(records.iter().map(|record| sanitize_hours(record.hours)).sum()),
        ai_hours: round_hours(records.iter().map(WorkItemRecord::ai_hours).sum()),
        priority_tasks,
        priority_percentage: share(priority_tasks as f64, total_tasks as f64),
        reworked_tasks,
        reworked_percentage: share(reworked_tasks as f64, total_tasks as f64),
        contributors: contributors.breakdown.len() as u64,
        reporters: reporters.breakdown.len() as u64,
        markets: markets.breakdown.len() as u64,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn echo(value: &Option<String>) -> String {
    non_blank(value).unwrap_or(UNFILTERED).to_string()
}
