use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_TOP_LIMIT: usize = 3;
pub const DEFAULT_NO_DATA_LABEL: &str = "No data";
pub const DEFAULT_CACHE_ID_PREFIX_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSettings {
    pub default_limit: usize,
    pub no_data_label: String,
    /// Characters of the joined, sorted id list kept in cache keys.
    pub cache_id_prefix_len: usize,
    /// Assign `YYYY-MM` of `createdAt` to records without a period id.
    pub fallback_period_from_date: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_TOP_LIMIT,
            no_data_label: DEFAULT_NO_DATA_LABEL.to_string(),
            cache_id_prefix_len: DEFAULT_CACHE_ID_PREFIX_LEN,
            fallback_period_from_date: true,
        }
    }
}

impl AnalyticsSettings {
    pub fn validate(&self) -> AppResult<()> {
        if self.default_limit == 0 {
            return Err(AppError::config("defaultLimit must be at least 1"));
        }
        if self.cache_id_prefix_len == 0 {
            return Err(AppError::config("cacheIdPrefixLen must be at least 1"));
        }
        if self.no_data_label.trim().is_empty() {
            return Err(AppError::config("noDataLabel must not be empty"));
        }
        Ok(())
    }
}
