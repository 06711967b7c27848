//! Process-local provider load balancer.
//!
//! Holds a bounded pool of interchangeable providers, hands each request to
//! one of them under a global concurrency ceiling, and probes them in the
//! background to take failing providers out of rotation and bring them back
//! gradually.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod provider;

pub use config::schema::BalancerConfig;
pub use health::SlotStatus;
pub use lifecycle::Shutdown;
pub use load_balancer::{
    BalancerError, Dispatch, LoadBalancer, Rejection, RegisterError, StrategyKind, COULD_NOT_GET,
};
pub use provider::{Provider, ProviderError, ProviderId, StaticProvider};
