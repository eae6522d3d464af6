//! Generic grouping engine behind every facet of a snapshot.
//!
//! Aggregation runs in two passes over the records: discovery builds the
//! ordered set of groups (first-seen order), counting folds each record into
//! the groups it belongs to. A group therefore only exists when at least one
//! record carries a non-empty key for it, and its position is stable for a
//! given input order.

use tracing::trace;

use crate::models::analytics::{
    CategoryTag, CategoryTotals, Facet, GroupBreakdown, GroupStats, LabeledMap, PercentageMap,
};
use crate::models::work_item::WorkItemRecord;
use crate::services::category_classifier::classify;

/// Supplies the value summed per group for a record and the group key it is
/// being counted under.
pub type HoursExtractor<'a> = &'a (dyn Fn(&WorkItemRecord, &str) -> f64 + Sync);

#[derive(Clone, Copy)]
pub struct AggregateOptions<'a> {
    pub hours_extractor: HoursExtractor<'a>,
}

impl Default for AggregateOptions<'_> {
    fn default() -> Self {
        Self {
            hours_extractor: &record_hours,
        }
    }
}

pub fn record_hours(record: &WorkItemRecord, _key: &str) -> f64 {
    record.hours
}

pub fn aggregate<K>(
    records: &[WorkItemRecord],
    key_extractor: K,
    options: AggregateOptions<'_>,
) -> GroupBreakdown
where
    K: Fn(&WorkItemRecord) -> Vec<String>,
{
    let keyed: Vec<(&WorkItemRecord, Vec<String>)> = records
        .iter()
        .map(|record| (record, distinct_keys(key_extractor(record))))
        .collect();

    let discovered = keyed
        .iter()
        .flat_map(|(_, keys)| keys.iter())
        .fold(GroupBreakdown::new(), |mut groups, key| {
            if !groups.contains(key) {
                groups.insert(key.clone(), GroupStats::default());
            }
            groups
        });
    trace!(target: "analytics::aggregate", groups = discovered.len(), records = records.len(), "discovered groups");

    let counted = keyed.iter().fold(discovered, |groups, (record, keys)| {
        keys.iter().fold(groups, |groups, key| {
            let hours = sanitize_hours((options.hours_extractor)(*record, key.as_str()));
            groups.with_updated(key, |stats| GroupStats {
                count: stats.count + 1,
                hours: stats.hours + hours,
            })
        })
    });

    counted.map_values(|_, stats| GroupStats {
        count: stats.count,
        hours: round_hours(stats.hours),
    })
}

pub fn aggregate_facet(records: &[WorkItemRecord], facet: Facet) -> GroupBreakdown {
    let options = match facet {
        Facet::AiTool => AggregateOptions {
            hours_extractor: &ai_tool_hours,
        },
        _ => AggregateOptions::default(),
    };
    aggregate(records, |record| facet_keys(facet, record), options)
}

/// Group keys a record contributes to for one facet. Empty when the record
/// carries no value for it; the category facet always yields one key since
/// it has a catch-all.
pub fn facet_keys(facet: Facet, record: &WorkItemRecord) -> Vec<String> {
    match facet {
        Facet::Category => vec![classify(record.product.as_deref()).category.as_str().to_string()],
        Facet::Product => classify(record.product.as_deref())
            .subtype
            .map(|subtype| vec![subtype.as_str().to_string()])
            .unwrap_or_default(),
        Facet::Market => record.markets.clone(),
        Facet::Department => record.departments.clone(),
        Facet::AiTool => record
            .ai_usage
            .iter()
            .flat_map(|usage| usage.models.iter().cloned())
            .collect(),
        Facet::Deliverable => record
            .deliverables
            .iter()
            .map(|deliverable| deliverable.name.clone())
            .collect(),
        Facet::Contributor => record.contributor_id().map(str::to_string).into_iter().collect(),
        Facet::Reporter => record.reporter().map(str::to_string).into_iter().collect(),
    }
}

/// AI hours logged against a specific model within a record.
pub fn ai_tool_hours(record: &WorkItemRecord, model: &str) -> f64 {
    record
        .ai_usage
        .iter()
        .filter(|usage| usage.models.iter().any(|name| name.trim() == model))
        .map(|usage| sanitize_hours(usage.ai_hours))
        .sum()
}

pub fn category_totals(records: &[WorkItemRecord]) -> CategoryTotals {
    records.iter().fold(CategoryTotals::default(), |totals, record| {
        totals.incremented(classify(record.product.as_deref()).category)
    })
}

const TENTHS_OF_WHOLE: f64 = 1000.0;
const REMAINDER_EPSILON: f64 = 1e-9;

/// Count share per group; the base is the sum of counts in this breakdown.
pub fn percentages(breakdown: &GroupBreakdown) -> PercentageMap {
    let counts: Vec<f64> = breakdown.iter().map(|(_, stats)| stats.count as f64).collect();
    zip_labels(breakdown.labels(), apportion(&counts))
}

/// Hour share per group; the base is the sum of hours in this breakdown.
pub fn hours_percentages(breakdown: &GroupBreakdown) -> PercentageMap {
    let hours: Vec<f64> = breakdown.iter().map(|(_, stats)| stats.hours).collect();
    zip_labels(breakdown.labels(), apportion(&hours))
}

/// Percentages for all four categories against the category sum.
pub fn category_percentages(totals: &CategoryTotals) -> PercentageMap {
    let counts: Vec<f64> = CategoryTag::ALL
        .iter()
        .map(|tag| totals.get(*tag) as f64)
        .collect();
    zip_labels(CategoryTag::ALL.iter().map(CategoryTag::as_str), apportion(&counts))
}

/// Splits 100 into one-decimal shares proportional to `weights`.
///
/// Every share is first floored to a tenth; the tenths still missing from
/// 100 go to the largest remainders, earlier positions first on ties. The
/// result sums to exactly 100 (in tenths) whenever the base is positive and
/// each share is within 0.1 of its exact value. When plain half-away
/// rounding already sums to 100 both methods agree. Non-finite or negative
/// weights count as zero; a zero base yields all zeros.
pub fn apportion(weights: &[f64]) -> Vec<f64> {
    let weights: Vec<f64> = weights.iter().map(|weight| sanitize_hours(*weight)).collect();
    let base: f64 = weights.iter().sum();
    if !base.is_finite() || base <= 0.0 {
        return vec![0.0; weights.len()];
    }

    let exact: Vec<f64> = weights
        .iter()
        .map(|weight| weight * TENTHS_OF_WHOLE / base)
        .collect();
    let mut tenths: Vec<u64> = exact
        .iter()
        .map(|value| (value + REMAINDER_EPSILON).floor() as u64)
        .collect();
    let remainders: Vec<f64> = exact
        .iter()
        .zip(&tenths)
        .map(|(value, floored)| value - *floored as f64)
        .collect();

    let assigned: u64 = tenths.iter().sum();
    let missing = (TENTHS_OF_WHOLE as u64).saturating_sub(assigned) as usize;
    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&left, &right| remainders[right].total_cmp(&remainders[left]));
    for position in by_remainder.into_iter().take(missing) {
        tenths[position] += 1;
    }

    tenths.into_iter().map(|tenth| tenth as f64 / 10.0).collect()
}

fn zip_labels<'a>(labels: impl Iterator<Item = &'a str>, shares: Vec<f64>) -> PercentageMap {
    labels
        .zip(shares)
        .map(|(label, share)| (label.to_string(), share))
        .collect::<LabeledMap<f64>>()
}

/// Single ratio against an unrelated base, such as priority tasks out of all
/// tasks. Rounded on its own.
pub fn share(value: f64, base: f64) -> f64 {
    if !base.is_finite() || base <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    round_percentage((100.0 * value / base).clamp(0.0, 100.0))
}

/// One decimal place, halves rounded away from zero.
pub fn round_percentage(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Negative, NaN and infinite hours count as zero.
pub fn sanitize_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

fn distinct_keys(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .fold(Vec::new(), |mut distinct, key| {
            if !distinct.contains(&key) {
                distinct.push(key);
            }
            distinct
        })
}
