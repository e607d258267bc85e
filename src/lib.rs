pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod schema;
pub mod store;

pub use app::{build_app, Service};
pub use config::{AppConfig, ServiceDefinition};
pub use error::{ApiError, ConfigError};
