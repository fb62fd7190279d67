//! HTTP API handlers for dvt-admin

pub mod auth;
pub mod export;
pub mod health;
pub mod ui;

pub use auth::{auth_middleware, check_key};
pub use export::{export_onboarding, export_surveys};
pub use health::health_routes;
pub use ui::{serve_app_js, serve_index};
