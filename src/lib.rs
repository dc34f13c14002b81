pub mod auth;
pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Note: avoid glob re-exports to prevent ambiguous symbol re-exports.
// Consumers reference items through their module paths, e.g.
// `pronet_api::models::Post` or `pronet_api::services::JobService`.
