use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical shape of one tracked work item after normalization.
///
/// Callers holding typed data can build this directly; raw JSON goes through
/// `services::record_normalizer::normalize` first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRecord {
    pub id: String,
    #[serde(default)]
    pub reporting_period_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub reporter_id: Option<String>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub markets: Vec<String>,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub ai_usage: Vec<AiUsage>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub is_reworked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub ai_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    pub name: String,
    #[serde(default)]
    pub count: f64,
}

impl WorkItemRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Owner first, then creator. Blank ids do not count.
    pub fn contributor_id(&self) -> Option<&str> {
        [self.owner_id.as_deref(), self.created_by_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    pub fn reporter(&self) -> Option<&str> {
        self.reporter_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn ai_hours(&self) -> f64 {
        self.ai_usage
            .iter()
            .map(|usage| usage.ai_hours)
            .filter(|hours| hours.is_finite() && *hours > 0.0)
            .sum()
    }

    /// Epoch milliseconds of the latest known modification, if any.
    pub fn modification_marker(&self) -> Option<i64> {
        self.updated_at
            .or(self.created_at)
            .map(|timestamp| timestamp.timestamp_millis())
    }

    /// Reporting period of the record; optionally derived from `created_at`
    /// as `YYYY-MM` when no explicit period id was supplied.
    pub fn period_key(&self, fallback_from_date: bool) -> Option<String> {
        match self
            .reporting_period_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(period) => Some(period.to_string()),
            None if fallback_from_date => self
                .created_at
                .map(|timestamp| timestamp.format("%Y-%m").to_string()),
            None => None,
        }
    }

    pub fn in_department(&self, department: &str) -> bool {
        let wanted = department.trim();
        self.departments
            .iter()
            .any(|value| value.trim().eq_ignore_ascii_case(wanted))
    }
}
