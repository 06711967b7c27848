//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (monitor.rs):
//!     Periodic timer
//!     → Probe each provider (outside the pool lock)
//!     → Apply transitions under the pool lock (state.rs)
//!     → Grant/revoke permits to match online capacity
//!
//! State machine (state.rs):
//!     Offline → Recovering → Online, any → Offline on failure
//! ```
//!
//! # Design Decisions
//! - One failed probe is enough to demote; recovery needs two passing cycles
//! - Exactly one monitor task per balancer, cycles never overlap
//! - A revocation that cannot finish makes the balancer defunct

pub mod monitor;
pub mod state;

pub use monitor::HealthMonitor;
pub use state::SlotStatus;
