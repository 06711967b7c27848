//! Load balancer error types.

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Why a registration was refused. The pool is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Every given provider is already in the pool (or none were given).
    #[error("all providers are already registered")]
    AlreadyRegistered,

    /// Adding the new providers would exceed the slot ceiling.
    #[error("cannot add {adding} providers to a pool of {current}: at most {max} allowed")]
    CapacityExceeded {
        current: usize,
        adding: usize,
        max: usize,
    },
}

/// Why revoking permits could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevokeError {
    /// The monitor was stopped while waiting for permits to free up.
    #[error("revocation cancelled while waiting for permits")]
    Cancelled,

    /// The permit pool was closed while waiting.
    #[error("permit pool closed")]
    Closed,

    /// More permits than a single revocation can wait for.
    #[error("cannot revoke {0} permits at once")]
    TooMany(usize),
}

/// Errors surfaced by the load balancer.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// Construction config failed validation.
    #[error("invalid configuration: {}", format_validation(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// A health cycle could not finish reconciling permits. Pool state is
    /// untrustworthy until providers are registered again.
    #[error("monitor corrupted pool state ({0}); register providers again")]
    MonitorCorruption(#[from] RevokeError),

    /// The balancer is defunct; no health cycle runs until providers are
    /// registered again.
    #[error("load balancer is defunct; register providers again")]
    Defunct,

    /// The monitor task panicked or was aborted.
    #[error("health monitor task failed: {0}")]
    MonitorAborted(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for load balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;
