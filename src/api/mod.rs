//! API layer
//!
//! HTTP handlers for:
//! - Session info
//! - Measurements
//! - Provider relay
//! - Metrics (Prometheus)

mod dto;
mod measurements;
pub mod metrics;
mod proxy;
mod session;

pub use dto::*;

pub use measurements::measurements_router;
pub use metrics::metrics_router;
pub use proxy::proxy_router;
pub use session::session_router;
