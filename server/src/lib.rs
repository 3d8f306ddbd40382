//! CY-RH web server: configuration, the axum router, sessions and views.

pub mod config;
pub mod http;
pub mod routes;
pub mod session;
pub mod views;

pub use config::AppConfig;
pub use http::{AppState, ServeConfig, build_router, serve};
