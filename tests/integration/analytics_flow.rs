use serde_json::json;
use worklog_analytics::models::analytics::{AnalyticsFilters, GroupStats, TopNEntryKind};
use worklog_analytics::services::analytics_service::AnalyticsService;
use worklog_analytics::services::dimension_aggregator::percentages;

#[test]
fn category_totals_and_percentages_from_product_labels() {
    let raw = json!([
        {"id": "t1", "product": "prod casino", "hours": 1},
        {"id": "t2", "product": "acq sport", "hours": 2},
        {"id": "t3", "product": "prod casino", "hours": 3}
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    let totals = snapshot.categories.totals;
    assert_eq!(totals.prod, 2);
    assert_eq!(totals.acq, 1);
    assert_eq!(totals.mkt, 0);
    assert_eq!(totals.misc, 0);
    assert_eq!(totals.total, 3);

    let pct = &snapshot.categories.percentages;
    assert_eq!(pct.get("PROD"), Some(&66.7));
    assert_eq!(pct.get("ACQ"), Some(&33.3));
    assert_eq!(pct.get("MKT"), Some(&0.0));
    assert_eq!(pct.get("MISC"), Some(&0.0));

    assert_eq!(snapshot.categories.top[0].label, "PROD");
    assert_eq!(snapshot.categories.top[0].sub_value, "66.7%");
    // Only categories that occur are ranked.
    assert_eq!(snapshot.categories.top.len(), 2);

    let products = &snapshot.products.breakdown;
    assert_eq!(products.get("casino"), Some(&GroupStats { count: 2, hours: 4.0 }));
    assert_eq!(products.get("sport"), Some(&GroupStats { count: 1, hours: 2.0 }));
}

#[test]
fn market_breakdown_counts_each_record_once_per_market() {
    let raw = json!([
        {"id": "t1", "markets": ["ro", "de"], "hours": 2},
        {"id": "t2", "markets": ["ro"], "hours": 3}
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    let markets = &snapshot.markets;
    assert_eq!(markets.breakdown.get("ro"), Some(&GroupStats { count: 2, hours: 5.0 }));
    assert_eq!(markets.breakdown.get("de"), Some(&GroupStats { count: 1, hours: 2.0 }));
    assert_eq!(markets.total, 3);
    assert_eq!(markets.percentages, percentages(&markets.breakdown));

    let top_one = AnalyticsService::default()
        .compute_snapshot(
            &raw,
            &AnalyticsFilters {
                limit: Some(1),
                ..AnalyticsFilters::default()
            },
        )
        .expect("snapshot");
    assert_eq!(top_one.markets.top.len(), 1);
    assert_eq!(top_one.markets.top[0].label, "ro");
    assert_eq!(top_one.markets.top[0].value, "2 tasks");
    assert_eq!(top_one.markets.top[0].sub_value, "5.0h");
}

#[test]
fn empty_input_yields_zero_filled_snapshot() {
    let snapshot = AnalyticsService::default()
        .compute_snapshot(&json!([]), &AnalyticsFilters::default())
        .expect("snapshot");

    assert_eq!(snapshot.categories.totals.total, 0);
    assert!(snapshot
        .categories
        .percentages
        .iter()
        .all(|(_, value)| *value == 0.0));
    for facet in [
        &snapshot.products,
        &snapshot.markets,
        &snapshot.departments,
        &snapshot.ai_tools,
        &snapshot.deliverables,
        &snapshot.contributors,
        &snapshot.reporters,
    ] {
        assert!(facet.breakdown.is_empty());
        assert!(facet.percentages.is_empty());
        assert_eq!(facet.total, 0);
        assert_eq!(facet.top.len(), 1);
        assert_eq!(facet.top[0].kind, TopNEntryKind::NoData);
        assert_eq!(facet.top[0].label, "No data");
    }
    assert_eq!(snapshot.categories.top[0].kind, TopNEntryKind::NoData);
    assert_eq!(snapshot.time_distribution.total_hours, 0.0);
    assert!(snapshot.time_distribution.by_day.is_empty());
    assert_eq!(snapshot.summary.total_tasks, 0);
    assert_eq!(snapshot.summary.priority_percentage, 0.0);
}

#[test]
fn ai_tools_tie_in_first_seen_order() {
    let raw = json!([
        {"id": "t1", "aiUsage": []},
        {"id": "t2", "aiUsage": [{"models": ["Tool-A", "Tool-B"], "aiHours": 1.5}]}
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(&raw, &AnalyticsFilters::default())
        .expect("snapshot");

    let tools = &snapshot.ai_tools;
    assert_eq!(tools.breakdown.len(), 2);
    assert_eq!(tools.breakdown.get("Tool-A").map(|s| s.count), Some(1));
    assert_eq!(tools.breakdown.get("Tool-B").map(|s| s.count), Some(1));
    let labels: Vec<&str> = tools.top.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["Tool-A", "Tool-B"]);
    assert_eq!(tools.top[0].value, tools.top[1].value);
    assert_eq!(snapshot.summary.ai_hours, 1.5);
}

#[test]
fn full_snapshot_for_a_reporting_period() {
    let raw = json!([
        {
            "id": "w-1",
            "reportingPeriodId": "2024-05",
            "ownerId": "ana",
            "reporterId": "lead-1",
            "departments": ["Creative"],
            "product": "mkt poker",
            "markets": ["ro"],
            "hours": 4,
            "aiUsage": [{"models": ["Tool-A"], "aiHours": 1}],
            "deliverables": [{"name": "banner", "count": 3}],
            "createdAt": {"seconds": 1_714_557_600i64, "nanoseconds": 0},
            "isPriority": true
        },
        {
            "id": "w-2",
            "reportingPeriodId": "2024-05",
            "details": {
                "createdById": "bo",
                "reporterId": "lead-1",
                "department": "Creative",
                "product": "prod lotto",
                "markets": ["ro", "de"],
                "hours": 2.5,
                "deliverables": [{"name": "banner", "count": 1}, {"name": "video", "count": 1}]
            },
            "createdAt": 1_714_644_000_000i64,
            "isReworked": true
        },
        {
            "id": "w-3",
            "reportingPeriodId": "2024-06",
            "ownerId": "ana",
            "product": "acq casino",
            "hours": 9
        }
    ]);

    let snapshot = AnalyticsService::default()
        .compute_snapshot(
            &raw,
            &AnalyticsFilters {
                period_id: Some("2024-05".into()),
                ..AnalyticsFilters::default()
            },
        )
        .expect("snapshot");

    assert_eq!(snapshot.meta.input_records, 3);
    assert_eq!(snapshot.meta.matched_records, 2);
    assert_eq!(snapshot.summary.total_tasks, 2);
    assert_eq!(snapshot.summary.total_hours, 6.5);
    assert_eq!(snapshot.summary.priority_tasks, 1);
    assert_eq!(snapshot.summary.priority_percentage, 50.0);
    assert_eq!(snapshot.summary.reworked_tasks, 1);
    assert_eq!(snapshot.summary.contributors, 2);
    assert_eq!(snapshot.summary.reporters, 1);
    assert_eq!(snapshot.summary.markets, 2);

    assert_eq!(snapshot.categories.totals.mkt, 1);
    assert_eq!(snapshot.categories.totals.prod, 1);
    assert_eq!(snapshot.categories.totals.acq, 0);

    assert_eq!(
        snapshot.departments.breakdown.get("Creative"),
        Some(&GroupStats { count: 2, hours: 6.5 })
    );
    assert_eq!(
        snapshot.deliverables.breakdown.get("banner"),
        Some(&GroupStats { count: 2, hours: 6.5 })
    );
    assert_eq!(snapshot.deliverables.top[0].label, "banner");

    assert_eq!(snapshot.reporters.top[0].label, "lead-1");
    assert_eq!(snapshot.reporters.top[0].value, "2 tasks");
    assert_eq!(snapshot.reporters.top[0].sub_value, "2xro de");

    let by_day = &snapshot.time_distribution.by_day;
    assert_eq!(by_day.len(), 2);
    assert!(by_day.contains("2024-05-01"));
    assert!(by_day.contains("2024-05-02"));
    assert_eq!(snapshot.time_distribution.undated, 0);

    let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
    for key in [
        "summary",
        "categories",
        "timeDistribution",
        "products",
        "markets",
        "departments",
        "aiTools",
        "deliverables",
        "contributors",
        "reporters",
        "highlights",
        "meta",
    ] {
        assert!(json.get(key).is_some(), "missing snapshot key {key}");
    }
    assert_eq!(json["categories"]["totals"]["MKT"], json!(1));
    assert_eq!(json["markets"]["breakdown"]["ro"]["count"], json!(2));
}

#[test]
fn crate_entry_point_matches_default_service() {
    let raw = json!([
        {"id": "a", "product": "mkt sport", "markets": ["es"], "hours": 1.5},
        {"id": "b", "product": "misc", "hours": 0.5}
    ]);
    let filters = AnalyticsFilters::default();

    let via_crate = worklog_analytics::compute_snapshot(&raw, &filters).expect("crate snapshot");
    let via_service = AnalyticsService::default()
        .compute_snapshot(&raw, &filters)
        .expect("service snapshot");
    assert_eq!(via_crate, via_service);
    assert_eq!(via_crate.meta.limit, 3);
}
