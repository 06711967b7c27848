//! Load balancer façade.
//!
//! # Responsibilities
//! - Compose pool, admission control, strategy and health monitor
//! - Expose register/get/exclude/include/start/stop
//! - Turn transient unavailability into values, not errors
//!
//! # Concurrency
//! - `get` never waits: permit acquisition is non-blocking and the pool lock
//!   is released before the provider is invoked
//! - The permit is returned right after selection, so it bounds how many
//!   callers may be *choosing* a provider at once, not how many invocations
//!   are in flight
//! - Health cycles are serialized by `cycle_lock`, whether they come from the
//!   periodic task or from `check_health`

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::validation::validate_config;
use crate::config::BalancerConfig;
use crate::health::monitor::HealthMonitor;
use crate::lifecycle::Shutdown;
use crate::load_balancer::admission::AdmissionController;
use crate::load_balancer::error::{BalancerError, BalancerResult, RegisterError, RevokeError};
use crate::load_balancer::pool::{CycleReport, Pool, SlotInfo};
use crate::load_balancer::strategy::{self, Strategy, StrategyKind};
use crate::observability::metrics;
use crate::provider::{Provider, ProviderError, ProviderId};

/// Text returned in place of a result when no provider could be used.
pub const COULD_NOT_GET: &str = "<COULD NOT GET>";

/// Why `get` did not reach a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Every permit is taken (or no capacity is online).
    #[error("{} no capacity available", COULD_NOT_GET)]
    NoCapacity,

    /// A permit was free but no slot is online.
    #[error("{} no provider online", COULD_NOT_GET)]
    NoProvider,

    /// A health cycle corrupted the permit state; register providers again.
    #[error("{} load balancer is defunct", COULD_NOT_GET)]
    Defunct,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::NoCapacity => "no_capacity",
            Rejection::NoProvider => "no_provider",
            Rejection::Defunct => "defunct",
        }
    }
}

/// Result of a `get` call.
#[derive(Debug)]
pub enum Dispatch<T> {
    /// A provider was selected and invoked.
    Served {
        provider: ProviderId,
        outcome: Result<T, ProviderError>,
    },
    /// No provider was invoked.
    Rejected(Rejection),
}

impl<T> Dispatch<T> {
    pub fn is_served(&self) -> bool {
        matches!(self, Dispatch::Served { .. })
    }

    /// Id of the provider that served the call, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Dispatch::Served { provider, .. } => Some(*provider),
            Dispatch::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Dispatch::Served { .. } => None,
            Dispatch::Rejected(r) => Some(*r),
        }
    }

    /// The provider's result, if one was invoked.
    pub fn into_outcome(self) -> Option<Result<T, ProviderError>> {
        match self {
            Dispatch::Served { outcome, .. } => Some(outcome),
            Dispatch::Rejected(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Dispatch<T> {
    /// The provider's value, or [`COULD_NOT_GET`] for anything else.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Served { outcome: Ok(value), .. } => write!(f, "{}", value),
            _ => f.write_str(COULD_NOT_GET),
        }
    }
}

/// State shared between the façade and the health monitor.
pub(crate) struct Shared<P: ?Sized> {
    pub(crate) pool: Pool<P>,
    pub(crate) admission: AdmissionController,
    pub(crate) cycle_lock: tokio::sync::Mutex<()>,
    defunct: AtomicBool,
}

impl<P: Provider + ?Sized> Shared<P> {
    pub(crate) fn new(permits_per_unit: usize) -> Self {
        Self {
            pool: Pool::new(),
            admission: AdmissionController::new(permits_per_unit),
            cycle_lock: tokio::sync::Mutex::new(()),
            defunct: AtomicBool::new(false),
        }
    }
}

impl<P: ?Sized> Shared<P> {
    pub(crate) fn is_defunct(&self) -> bool {
        self.defunct.load(Ordering::Acquire)
    }

    pub(crate) fn mark_defunct(&self, cause: &RevokeError) {
        self.defunct.store(true, Ordering::Release);
        metrics::record_corruption();
        tracing::error!(
            cause = %cause,
            "Permit reconciliation failed; load balancer is defunct until providers are registered again"
        );
    }
}

struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<BalancerResult<()>>,
}

/// Process-local load balancer over a bounded pool of providers.
pub struct LoadBalancer<P: ?Sized> {
    shared: Arc<Shared<P>>,
    strategy: ArcSwap<Box<dyn Strategy>>,
    config: BalancerConfig,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl<P: Provider + ?Sized> LoadBalancer<P> {
    /// Create a balancer with an empty pool and no permits.
    pub fn new(config: BalancerConfig) -> BalancerResult<Self> {
        validate_config(&config).map_err(BalancerError::InvalidConfig)?;

        tracing::debug!(
            strategy = %config.strategy,
            max_parallel_requests = config.max_parallel_requests,
            interval_secs = config.health_check.interval_secs,
            "Load balancer created"
        );

        Ok(Self {
            shared: Arc::new(Shared::new(config.max_parallel_requests)),
            strategy: ArcSwap::from_pointee(config.strategy.build()),
            config,
            monitor: Mutex::new(None),
        })
    }

    /// Add providers to the pool, each starting online.
    ///
    /// Providers already in the pool are skipped. Fails without touching the
    /// pool if nothing new is given or the pool would exceed its ceiling.
    /// On a defunct balancer this rebuilds pool and permits from scratch.
    pub fn register(
        &self,
        providers: impl IntoIterator<Item = Arc<P>>,
    ) -> Result<usize, RegisterError> {
        let providers: Vec<Arc<P>> = providers.into_iter().collect();

        if self.shared.is_defunct() {
            let added = self.shared.pool.rebuild(providers)?;
            self.shared.admission.reset(added);
            self.shared.defunct.store(false, Ordering::Release);
            tracing::warn!(providers = added, "Pool rebuilt after monitor corruption");
            self.record_capacity();
            return Ok(added);
        }

        let added = match self.shared.pool.register(providers) {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!(error = %e, "Provider registration rejected");
                return Err(e);
            }
        };
        self.shared.admission.grant(added);

        tracing::info!(
            added,
            total = self.shared.pool.len(),
            available_permits = self.shared.admission.available_permits(),
            "Providers registered"
        );
        self.record_capacity();
        Ok(added)
    }

    /// Pick an online provider and invoke it.
    pub async fn get(&self) -> Dispatch<P::Output> {
        let provider = match self.admit() {
            Ok(provider) => provider,
            Err(rejection) => {
                tracing::debug!(reason = rejection.as_str(), "Could not get a provider");
                metrics::record_request(rejection.as_str());
                return Dispatch::Rejected(rejection);
            }
        };

        metrics::record_request("served");
        let id = provider.id();
        Dispatch::Served {
            provider: id,
            outcome: provider.invoke().await,
        }
    }

    fn admit(&self) -> Result<Arc<P>, Rejection> {
        if self.shared.is_defunct() {
            return Err(Rejection::Defunct);
        }
        let permit = self
            .shared
            .admission
            .try_acquire()
            .ok_or(Rejection::NoCapacity)?;
        let selected = self.select_provider();
        drop(permit);
        selected.ok_or(Rejection::NoProvider)
    }

    /// Choose among the providers online right now, without invoking.
    pub fn select_provider(&self) -> Option<Arc<P>> {
        let online = self.shared.pool.online();
        let current = self.strategy.load();
        strategy::select(&***current, &online).cloned()
    }

    /// Take a provider out of rotation. Returns `false` if it is unknown.
    ///
    /// Permits are left alone; the next health cycle reconciles them. A
    /// healthy excluded provider comes back through the normal recovery path.
    pub fn exclude(&self, id: ProviderId) -> bool {
        self.shared.pool.exclude(id)
    }

    /// Put a provider straight back online. Returns `false` if it is unknown.
    pub fn include(&self, id: ProviderId) -> bool {
        self.shared.pool.include(id)
    }

    /// Start the periodic health monitor. Must be called inside a Tokio runtime.
    ///
    /// Does nothing if a monitor is already running.
    pub fn start(&self) {
        let mut slot = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.as_ref() {
            if !handle.task.is_finished() {
                tracing::warn!("Health monitor already running");
                return;
            }
        }

        let shutdown = Shutdown::new();
        let monitor = HealthMonitor::new(self.shared.clone(), self.config.health_check.clone());
        let task = tokio::spawn(monitor.run(shutdown.subscribe()));
        *slot = Some(MonitorHandle { shutdown, task });
    }

    /// Stop the health monitor and wait for it to exit.
    ///
    /// An in-flight cycle is either finished or abandoned. If the monitor
    /// ended because it corrupted the pool state, that error is returned here.
    pub async fn stop(&self) -> BalancerResult<()> {
        let handle = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(MonitorHandle { shutdown, task }) = handle else {
            return Ok(());
        };

        shutdown.trigger();
        match task.await {
            Ok(result) => {
                tracing::info!("Health monitor stopped");
                result
            }
            Err(e) => {
                tracing::error!(error = %e, "Health monitor task failed");
                Err(BalancerError::MonitorAborted(e.to_string()))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    /// Run one health cycle now and wait for it to finish.
    pub async fn check_health(&self) -> BalancerResult<CycleReport> {
        HealthMonitor::new(self.shared.clone(), self.config.health_check.clone())
            .check_once()
            .await
    }

    /// Swap the selection strategy. Round-robin starts a fresh cursor.
    pub fn set_strategy(&self, kind: StrategyKind) {
        self.strategy.store(Arc::new(kind.build()));
        tracing::info!(strategy = %kind, "Selection strategy changed");
    }

    fn record_capacity(&self) {
        metrics::record_capacity(
            self.shared.pool.online_count(),
            self.shared.pool.granted_units() * self.shared.admission.permits_per_unit(),
        );
    }
}

impl<P: ?Sized> LoadBalancer<P> {
    /// Debug enumeration of every slot and its status.
    pub fn snapshot(&self) -> Vec<SlotInfo> {
        self.shared.pool.slot_infos()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.shared.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.pool.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.shared.pool.online_count()
    }

    /// Permits free right now.
    pub fn available_permits(&self) -> usize {
        self.shared.admission.available_permits()
    }

    /// Whether a health cycle corrupted the permit state.
    pub fn is_defunct(&self) -> bool {
        self.shared.is_defunct()
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }
}

impl<P: ?Sized> fmt::Debug for LoadBalancer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadBalancer")
            .field("strategy", &self.strategy.load().name())
            .field("slots", &self.snapshot())
            .field("available_permits", &self.available_permits())
            .field("defunct", &self.is_defunct())
            .finish()
    }
}
