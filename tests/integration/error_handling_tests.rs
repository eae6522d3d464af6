// Error handling and edge case tests

use serde_json::json;
use worklog_analytics::error::AppError;
use worklog_analytics::models::analytics::{AnalyticsFilters, TopNEntryKind};
use worklog_analytics::models::settings::AnalyticsSettings;
use worklog_analytics::services::analytics_service::AnalyticsService;
use worklog_analytics::services::cache_key::{build_key, CacheKeyBuilder};
use worklog_analytics::services::record_normalizer::{normalize, normalize_batch};
use worklog_analytics::services::top_n::top_n;

#[test]
fn test_non_array_payload_returns_zero_filled_snapshot() {
    let service = AnalyticsService::default();
    for payload in [json!(null), json!({"id": "t1"}), json!("records"), json!(42)] {
        let snapshot = service
            .compute_snapshot(&payload, &AnalyticsFilters::default())
            .expect("non-array payload should not fail");
        assert_eq!(snapshot.categories.totals.total, 0);
        assert_eq!(snapshot.meta.input_records, 0);
        assert_eq!(snapshot.meta.matched_records, 0);
        assert_eq!(snapshot.markets.top[0].kind, TopNEntryKind::NoData);
    }
}

#[test]
fn test_malformed_records_are_skipped_and_counted() {
    let raw = json!([
        {"id": "ok-1", "product": "prod casino", "hours": 1},
        "not a record",
        {"product": "acq sport"},
        {"id": "   "},
        {"id": "ok-2", "hours": "not a number", "markets": {"ro": true}}
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    assert_eq!(snapshot.meta.input_records, 5);
    assert_eq!(snapshot.meta.skipped_records, 3);
    assert_eq!(snapshot.meta.matched_records, 2);
    assert_eq!(snapshot.summary.total_hours, 1.0);
    assert!(snapshot.markets.breakdown.is_empty());
    assert_eq!(snapshot.categories.totals.prod, 1);
    assert_eq!(snapshot.categories.totals.misc, 1);
}

#[test]
fn test_unparseable_dates_count_as_undated() {
    let raw = json!([
        {"id": "a", "createdAt": "31/12/2024"},
        {"id": "b", "createdAt": {"seconds": "soon"}},
        {"id": "c", "createdAt": true},
        {"id": "d", "createdAt": "2024-02-29"}
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    assert_eq!(snapshot.time_distribution.undated, 3);
    assert_eq!(snapshot.time_distribution.by_day.len(), 1);
    assert!(snapshot.time_distribution.by_day.contains("2024-02-29"));
}

#[test]
fn test_zero_limit_is_a_validation_error() {
    let filters = AnalyticsFilters {
        limit: Some(0),
        ..AnalyticsFilters::default()
    };
    let err = AnalyticsService::default()
        .compute_snapshot(&json!([{"id": "a"}]), &filters)
        .unwrap_err();

    match &err {
        AppError::Validation { message, .. } => assert!(message.contains("limit")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.details(), Some(&json!({"limit": 0})));

    let breakdown = Default::default();
    assert!(top_n(&breakdown, 0, "No data").is_err());
}

#[test]
fn test_invalid_settings_are_rejected_by_service() {
    let result = AnalyticsService::new(AnalyticsSettings {
        default_limit: 0,
        ..AnalyticsSettings::default()
    });
    assert!(matches!(result, Err(AppError::Config { .. })));

    let result = AnalyticsService::new(AnalyticsSettings {
        no_data_label: "  ".into(),
        ..AnalyticsSettings::default()
    });
    assert!(matches!(result, Err(AppError::Config { .. })));
}

#[test]
fn test_cache_key_contract_violations() {
    assert!(matches!(
        build_key(&[], "", Some("user")),
        Err(AppError::Validation { .. })
    ));
    assert!(CacheKeyBuilder::with_prefix_len(0).is_err());
}

#[test]
fn test_normalizer_reports_shape_errors() {
    let err = normalize(&json!(["id", "a"])).unwrap_err();
    match err {
        AppError::InvalidInput { expected, found } => {
            assert_eq!(expected, "object");
            assert_eq!(found, "array");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(matches!(
        normalize(&json!({"hours": 3})),
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        normalize_batch(&json!({"records": []})),
        Err(AppError::InvalidInput { .. })
    ));
}

#[test]
fn test_non_finite_and_negative_hours_never_leak_into_totals() {
    let raw = json!([
        {"id": "a", "hours": -3, "markets": ["ro"]},
        {"id": "b", "hours": "1e400", "markets": ["ro"]},
        {"id": "c", "hours": 2.25, "markets": ["ro"]}
    ]);
    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    let ro = snapshot.markets.breakdown.get("ro").expect("ro group");
    assert_eq!(ro.count, 3);
    assert_eq!(ro.hours, 2.25);
    assert!(snapshot.summary.total_hours.is_finite());
}
