//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     Load config → Build route table → Start health checkers
//!     → Start config watcher → Start listeners
//!
//! Hot reload (controller.rs):
//!     File change → debounce → load + validate
//!     → build new table → stop old checkers → atomic swap
//!     → start new checkers
//!
//! Shutdown (shutdown.rs + controller.rs):
//!     Signal → stop checkers → drain listeners (bounded grace)
//!     → collect acknowledgements
//! ```
//!
//! # Design Decisions
//! - Ordered startup: table first, checkers next, listeners last
//! - Reloads never drop in-flight requests; snapshots of the old table
//!   stay valid until their requests complete
//! - Shutdown has a deadline: listeners acknowledge, drained or not

pub mod controller;
pub mod shutdown;
pub mod signals;

pub use controller::Proxy;
pub use shutdown::Shutdown;
