//! Liber Library Management and Task Tracking Server
//!
//! A Rust REST JSON API for managing a library catalog, borrowings,
//! users and tasks over a PostgreSQL store.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
