use crate::error::{AppError, AppResult};
use crate::models::analytics::{EntryIcon, GroupBreakdown, GroupStats, TopNEntry};

#[derive(Debug, Clone, Copy)]
pub struct TopNOptions<'a> {
    pub limit: usize,
    pub no_data_label: &'a str,
    pub icon: EntryIcon,
}

/// Ranked top-`n` entries of a breakdown with hours as the sub value.
pub fn top_n(
    breakdown: &GroupBreakdown,
    n: usize,
    no_data_label: &str,
) -> AppResult<Vec<TopNEntry>> {
    select_top_n(
        breakdown,
        &TopNOptions {
            limit: n,
            no_data_label,
            icon: EntryIcon::Group,
        },
        |_, stats| format_hours(stats.hours),
    )
}

/// Sorts groups by count, highest first. Ties keep breakdown order, which is
/// first-seen order in the source records. Never returns an empty list: an
/// empty breakdown yields a single no-data sentinel.
pub fn select_top_n<F>(
    breakdown: &GroupBreakdown,
    options: &TopNOptions<'_>,
    sub_value: F,
) -> AppResult<Vec<TopNEntry>>
where
    F: Fn(&str, &GroupStats) -> String,
{
    if options.limit == 0 {
        return Err(AppError::validation("top-n limit must be at least 1"));
    }

    let entries: Vec<TopNEntry> = ranked(breakdown)
        .into_iter()
        .take(options.limit)
        .map(|(label, stats)| {
            TopNEntry::item(
                options.icon,
                label,
                pluralize_tasks(stats.count),
                sub_value(label, stats),
            )
        })
        .collect();

    if entries.is_empty() {
        return Ok(vec![TopNEntry::no_data(options.no_data_label)]);
    }
    Ok(entries)
}

pub fn ranked(breakdown: &GroupBreakdown) -> Vec<(&str, &GroupStats)> {
    let mut groups: Vec<(&str, &GroupStats)> = breakdown.iter().collect();
    groups.sort_by(|left, right| right.1.count.cmp(&left.1.count));
    groups
}

/// Compact market footprint such as `"3xro de"`: markets by count, highest
/// first, with a `<count>x` prefix only when a market occurs more than once.
pub fn market_footprint(markets: &GroupBreakdown) -> String {
    ranked(markets)
        .into_iter()
        .map(|(market, stats)| match stats.count {
            1 => market.to_string(),
            count => format!("{count}x{market}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn pluralize_tasks(count: u64) -> String {
    if count == 1 {
        "1 task".to_string()
    } else {
        format!("{count} tasks")
    }
}

pub fn format_hours(hours: f64) -> String {
    format!("{hours:.1}h")
}
