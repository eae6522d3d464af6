use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::settings::DEFAULT_CACHE_ID_PREFIX_LEN;
use crate::models::work_item::WorkItemRecord;

const ALL_USERS: &str = "all";

/// Derives memoization keys for snapshot results.
///
/// Key layout: `<period>_<user|all>_<count>_<maxModified>_<sortedIds>`, where
/// the id list is sorted before joining and then cut to `id_prefix_len`
/// characters, so record order never changes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    id_prefix_len: usize,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self {
            id_prefix_len: DEFAULT_CACHE_ID_PREFIX_LEN,
        }
    }
}

impl CacheKeyBuilder {
    pub fn with_prefix_len(id_prefix_len: usize) -> AppResult<Self> {
        if id_prefix_len == 0 {
            return Err(AppError::validation("cache key id prefix length must be at least 1"));
        }
        Ok(Self { id_prefix_len })
    }

    pub fn build(
        &self,
        records: &[WorkItemRecord],
        period_id: &str,
        user_id: Option<&str>,
    ) -> AppResult<String> {
        let period_id = period_id.trim();
        if period_id.is_empty() {
            return Err(AppError::validation("cache key requires a period id"));
        }

        let user = user_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(ALL_USERS);
        let max_marker = records
            .iter()
            .filter_map(WorkItemRecord::modification_marker)
            .max()
            .unwrap_or(0);

        let mut ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        ids.sort_unstable();
        let joined = ids.join(",");
        let truncated: String = joined.chars().take(self.id_prefix_len).collect();

        let key = format!(
            "{period_id}_{user}_{count}_{max_marker}_{truncated}",
            count = records.len()
        );
        debug!(target: "analytics::cache_key", %key, "built snapshot cache key");
        Ok(key)
    }
}

pub fn build_key(
    records: &[WorkItemRecord],
    period_id: &str,
    user_id: Option<&str>,
) -> AppResult<String> {
    CacheKeyBuilder::default().build(records, period_id, user_id)
}

/// Fixed-length digest of a cache key (base64 SHA-256, no padding) for stores
/// with key length limits.
pub fn fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}
