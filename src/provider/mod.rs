//! Provider abstraction.
//!
//! # Responsibilities
//! - Give every backend handle a stable identity
//! - Describe the two capabilities the balancer relies on: `invoke` and `probe`
//! - Ship a trivial provider that answers with its own id
//!
//! # Design Decisions
//! - Identity is an explicit `ProviderId`, never pointer equality
//! - Ids are drawn from a process-wide counter, so they are unique per process
//! - Providers are shared as `Arc<P>`; `P` may be a trait object

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

/// First id handed out by [`ProviderId::next`].
const FIRST_PROVIDER_ID: u64 = 1001;

static ID_GENERATOR: AtomicU64 = AtomicU64::new(FIRST_PROVIDER_ID);

/// Unique identity of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct ProviderId(u64);

impl ProviderId {
    /// Allocate the next id from the global counter.
    pub fn next() -> Self {
        Self(ID_GENERATOR.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<ProviderId> for u64 {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned by a provider while serving a request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected or failed the request.
    #[error("provider failed: {0}")]
    Failed(String),

    /// Any other error raised by the provider implementation.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A backend handle the balancer can hand work to.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Value produced by a successful invocation.
    type Output: Send;

    /// Stable identity, used for de-duplication and exclude/include.
    fn id(&self) -> ProviderId;

    /// Serve one request.
    async fn invoke(&self) -> Result<Self::Output, ProviderError>;

    /// Report whether the provider is currently healthy.
    async fn probe(&self) -> bool;
}

/// Provider that always reports healthy and answers with its own id.
#[derive(Debug)]
pub struct StaticProvider {
    id: ProviderId,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self {
            id: ProviderId::next(),
        }
    }
}

impl Default for StaticProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for StaticProvider {
    type Output = String;

    fn id(&self) -> ProviderId {
        self.id
    }

    async fn invoke(&self) -> Result<String, ProviderError> {
        Ok(self.id.to_string())
    }

    async fn probe(&self) -> bool {
        true
    }
}
