//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-port listener, timeouts)
//!     → request.rs (request id)
//!     → admission.rs (in-flight cap)
//!     → [routing + balancing pick a replica]
//!     → forward.rs (rewrite target, strip hop-by-hop, stream through)
//!     → Send to client
//! ```

pub mod admission;
pub mod forward;
pub mod request;
pub mod server;

pub use admission::{ConnectionGate, ConnectionGuard};
pub use forward::{build_client, forward, ForwardError, HttpClient};
pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
