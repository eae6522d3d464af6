//! Canonicalizes raw JSON work items into [`WorkItemRecord`]s.
//!
//! Callers may put the same attribute at the root of a record or inside a
//! nested `details` object. Each attribute has an ordered list of candidate
//! paths and the first one holding a usable value wins, so the flat location
//! always takes precedence over the nested one.

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{json_kind, AppError, AppResult};
use crate::models::work_item::{AiUsage, Deliverable, WorkItemRecord};
use crate::services::date_resolver::resolve_timestamp;

pub type FieldPath = &'static [&'static str];

const ID_PATHS: &[FieldPath] = &[&["id"], &["details", "id"]];
const PERIOD_PATHS: &[FieldPath] = &[&["reportingPeriodId"], &["details", "reportingPeriodId"]];
const OWNER_PATHS: &[FieldPath] = &[&["ownerId"], &["details", "ownerId"]];
const CREATED_BY_PATHS: &[FieldPath] = &[&["createdById"], &["details", "createdById"]];
const REPORTER_PATHS: &[FieldPath] = &[&["reporterId"], &["details", "reporterId"]];
const DEPARTMENT_PATHS: &[FieldPath] = &[
    &["departments"],
    &["department"],
    &["details", "departments"],
    &["details", "department"],
];
const PRODUCT_PATHS: &[FieldPath] = &[&["product"], &["details", "product"]];
const MARKET_PATHS: &[FieldPath] = &[&["markets"], &["details", "markets"]];
const HOURS_PATHS: &[FieldPath] = &[&["hours"], &["details", "hours"]];
const AI_USAGE_PATHS: &[FieldPath] = &[&["aiUsage"], &["details", "aiUsage"]];
const DELIVERABLE_PATHS: &[FieldPath] = &[&["deliverables"], &["details", "deliverables"]];
const CREATED_AT_PATHS: &[FieldPath] = &[&["createdAt"], &["details", "createdAt"]];
const UPDATED_AT_PATHS: &[FieldPath] = &[&["updatedAt"], &["details", "updatedAt"]];
const PRIORITY_PATHS: &[FieldPath] = &[&["isPriority"], &["details", "isPriority"]];
const REWORKED_PATHS: &[FieldPath] = &[&["isReworked"], &["details", "isReworked"]];

const AI_MODEL_PATHS: &[FieldPath] = &[&["models"], &["model"]];
const AI_HOURS_PATHS: &[FieldPath] = &[&["aiHours"], &["hours"]];

/// Result of normalizing a whole input array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<WorkItemRecord>,
    pub input_records: u64,
    pub skipped_records: u64,
}

/// Returns the value at the first path that holds something usable.
///
/// `null`, blank strings and empty arrays count as absent, so an empty flat
/// placeholder does not hide a populated nested value.
pub fn resolve_field<'a>(raw: &'a JsonValue, paths: &[FieldPath]) -> Option<&'a JsonValue> {
    paths
        .iter()
        .filter_map(|path| lookup(raw, path))
        .find(|value| is_present(value))
}

fn lookup<'a>(raw: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    path.iter()
        .try_fold(raw, |current, segment| current.as_object()?.get(*segment))
}

fn is_present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(text) => !text.trim().is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        _ => true,
    }
}

pub fn normalize(raw: &JsonValue) -> AppResult<WorkItemRecord> {
    if !raw.is_object() {
        return Err(AppError::invalid_input("object", json_kind(raw)));
    }

    let id = resolve_field(raw, ID_PATHS)
        .and_then(as_text)
        .ok_or_else(|| AppError::validation("work item is missing an id"))?;

    let hours = match resolve_field(raw, HOURS_PATHS) {
        Some(value) => as_hours(value).unwrap_or_else(|| {
            debug!(target: "analytics::normalize", %id, value = %value, "unusable hours value");
            0.0
        }),
        None => 0.0,
    };

    Ok(WorkItemRecord {
        reporting_period_id: text_field(raw, PERIOD_PATHS),
        owner_id: text_field(raw, OWNER_PATHS),
        created_by_id: text_field(raw, CREATED_BY_PATHS),
        reporter_id: text_field(raw, REPORTER_PATHS),
        departments: resolve_field(raw, DEPARTMENT_PATHS)
            .map(as_text_list)
            .unwrap_or_default(),
        product: text_field(raw, PRODUCT_PATHS),
        markets: resolve_field(raw, MARKET_PATHS)
            .map(as_text_list)
            .unwrap_or_default(),
        hours,
        ai_usage: resolve_field(raw, AI_USAGE_PATHS)
            .map(as_ai_usage)
            .unwrap_or_default(),
        deliverables: resolve_field(raw, DELIVERABLE_PATHS)
            .map(as_deliverables)
            .unwrap_or_default(),
        created_at: resolve_field(raw, CREATED_AT_PATHS).and_then(resolve_timestamp),
        updated_at: resolve_field(raw, UPDATED_AT_PATHS).and_then(resolve_timestamp),
        is_priority: flag_field(raw, PRIORITY_PATHS),
        is_reworked: flag_field(raw, REWORKED_PATHS),
        id,
    })
}

/// Normalizes every entry of a JSON array. Entries that cannot become a
/// record (non-objects, missing id) are skipped and counted.
pub fn normalize_batch(raw: &JsonValue) -> AppResult<NormalizedBatch> {
    let items = raw
        .as_array()
        .ok_or_else(|| AppError::invalid_input("array", json_kind(raw)))?;

    let mut records = Vec::with_capacity(items.len());
    let mut skipped_records = 0u64;
    for (position, item) in items.iter().enumerate() {
        match normalize(item) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped_records += 1;
                warn!(target: "analytics::normalize", position, error = %err, "skipping malformed work item");
            }
        }
    }

    Ok(NormalizedBatch {
        records,
        input_records: items.len() as u64,
        skipped_records,
    })
}

fn text_field(raw: &JsonValue, paths: &[FieldPath]) -> Option<String> {
    resolve_field(raw, paths).and_then(as_text)
}

fn flag_field(raw: &JsonValue, paths: &[FieldPath]) -> bool {
    resolve_field(raw, paths).map(as_flag).unwrap_or(false)
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_text_list(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(other).into_iter().collect(),
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn as_hours(value: &JsonValue) -> Option<f64> {
    as_number(value).filter(|hours| *hours >= 0.0)
}

fn as_flag(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(flag) => *flag,
        JsonValue::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        JsonValue::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn as_ai_usage(value: &JsonValue) -> Vec<AiUsage> {
    object_entries(value)
        .map(|entry| {
            let entry = JsonValue::Object(entry.clone());
            AiUsage {
                models: resolve_field(&entry, AI_MODEL_PATHS)
                    .map(as_text_list)
                    .unwrap_or_default(),
                ai_hours: resolve_field(&entry, AI_HOURS_PATHS)
                    .and_then(as_hours)
                    .unwrap_or(0.0),
            }
        })
        .collect()
}

fn as_deliverables(value: &JsonValue) -> Vec<Deliverable> {
    object_entries(value)
        .filter_map(|entry| {
            let name = entry.get("name").and_then(as_text)?;
            let count = entry
                .get("count")
                .and_then(as_number)
                .filter(|count| *count >= 0.0)
                .unwrap_or(0.0);
            Some(Deliverable { name, count })
        })
        .collect()
}

fn object_entries(value: &JsonValue) -> impl Iterator<Item = &Map<String, JsonValue>> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(JsonValue::as_object)
}
