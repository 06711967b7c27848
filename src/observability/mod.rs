//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool, admission and health monitor produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via `metrics`)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Rejections are logged at debug level; they are routine backpressure
//! - Status transitions and permit reconciliation are logged at info
//! - Monitor corruption is logged at error and counted

pub mod logging;
pub mod metrics;
