pub mod campaign_templates;
pub mod models;
pub mod services;
pub mod views;
