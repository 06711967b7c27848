//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! get()
//!     → admission.rs (take a permit, never wait)
//!     → pool.rs (snapshot of online slots, no lock held afterwards)
//!     → strategy.rs picks one:
//!         - random.rs (uniform pick)
//!         - round_robin.rs (rotating cursor)
//!     → permit released → provider invoked
//!
//! register() → pool.rs (dedup, ceiling check) → admission.rs (grant)
//! exclude()/include() → slot.rs (status override, permits untouched)
//! ```
//!
//! # Design Decisions
//! - Pool snapshots are copy-on-write; readers never see a half-built pool
//! - Providers are looked up by id, never by reference
//! - Permits track online capacity; the health monitor reconciles them

pub mod admission;
pub mod balancer;
pub mod error;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod slot;
pub mod strategy;

pub use balancer::{Dispatch, LoadBalancer, Rejection, COULD_NOT_GET};
pub use error::{BalancerError, BalancerResult, RegisterError, RevokeError};
pub use pool::{CycleReport, SlotInfo, MAX_PROVIDERS};
pub use strategy::StrategyKind;
