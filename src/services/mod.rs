pub mod analytics_service;
pub mod cache_key;
pub mod category_classifier;
pub mod date_resolver;
pub mod dimension_aggregator;
pub mod record_normalizer;
pub mod settings_service;
pub mod top_n;
