pub mod analytics;
pub mod settings;
pub mod work_item;
