//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs surfaces the event
//!     → lifecycle controller re-runs loader + validation
//!     → builds a new route table and swaps it in
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    HealthCheckConfig, ObservabilityConfig, ProxyConfig, ReplicaConfig, ServiceConfig,
    TimeoutConfig, DEFAULT_PORT,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ConfigWatcher, WatchEvent};
