//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! LoadBalancer::start:
//!     Shutdown::new → subscribe → spawn health monitor task
//!
//! LoadBalancer::stop:
//!     Shutdown::trigger → monitor finishes or abandons its cycle → task joined
//! ```
//!
//! # Design Decisions
//! - One coordinator per monitor run; a restarted monitor gets a fresh channel
//! - Triggering with no subscribers left is not an error

pub mod shutdown;

pub use shutdown::Shutdown;
