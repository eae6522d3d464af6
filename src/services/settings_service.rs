use std::path::Path;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::settings::AnalyticsSettings;

/// Loads [`AnalyticsSettings`] from YAML. Missing keys take their defaults.
pub struct SettingsService;

impl SettingsService {
    pub fn from_yaml_str(content: &str) -> AppResult<AnalyticsSettings> {
        let settings = if content.trim().is_empty() {
            AnalyticsSettings::default()
        } else {
            serde_yaml::from_str::<AnalyticsSettings>(content)?
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> AppResult<AnalyticsSettings> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            AppError::config(format!("cannot read settings file {}: {err}", path.display()))
        })?;
        let settings = Self::from_yaml_str(&content)?;
        info!(target: "analytics::settings", path = %path.display(), "analytics settings loaded");
        Ok(settings)
    }

    pub fn load_or_default(path: &Path) -> AppResult<AnalyticsSettings> {
        if !path.exists() {
            debug!(target: "analytics::settings", path = %path.display(), "settings file absent, using defaults");
            return Ok(AnalyticsSettings::default());
        }
        Self::load(path)
    }
}
