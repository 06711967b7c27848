//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Barrier, Notify};
use provider_balancer::{BalancerConfig, LoadBalancer, Provider, ProviderError, ProviderId, StrategyKind};

/// Provider whose probe result, latency and invoke outcome can be flipped at runtime.
#[derive(Debug)]
pub struct FlakyProvider {
    id: ProviderId,
    healthy: AtomicBool,
    failing: AtomicBool,
    probe_delay_ms: AtomicUsize,
    invocations: AtomicUsize,
    /// Every `invoke` waits here before answering.
    invoke_gate: Option<Arc<Barrier>>,
    /// Notified at the end of every probe, right before it returns.
    probed: Option<Arc<Notify>>,
}

impl FlakyProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::healthy())
    }

    /// Provider whose `invoke` only returns once `gate` is full.
    pub fn gated(gate: Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self {
            invoke_gate: Some(gate),
            ..Self::healthy()
        })
    }

    /// Provider that signals `probed`, then blocks its thread briefly, so the
    /// probe completes in the same poll that signalled.
    pub fn signalling(probed: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            probed: Some(probed),
            ..Self::healthy()
        })
    }

    fn healthy() -> Self {
        Self {
            id: ProviderId::next(),
            healthy: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            probe_delay_ms: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
            invoke_gate: None,
            probed: None,
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Make `invoke` return an error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every probe sleep this long before answering.
    pub fn set_probe_delay(&self, delay: Duration) {
        self.probe_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FlakyProvider {
    type Output = String;

    fn id(&self) -> ProviderId {
        self.id
    }

    async fn invoke(&self) -> Result<String, ProviderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.invoke_gate {
            gate.wait().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upstream reset");
            return Err(ProviderError::Other(Box::new(cause)));
        }
        Ok(self.id.to_string())
    }

    async fn probe(&self) -> bool {
        let delay = self.probe_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if let Some(probed) = &self.probed {
            probed.notify_one();
            std::thread::sleep(Duration::from_millis(20));
        }
        self.healthy.load(Ordering::SeqCst)
    }
}

pub fn providers(n: usize) -> Vec<Arc<FlakyProvider>> {
    (0..n).map(|_| FlakyProvider::new()).collect()
}

/// Balancer with a short probe timeout so slow-probe tests stay quick.
pub fn balancer(
    strategy: StrategyKind,
    max_parallel: usize,
    interval_secs: u64,
) -> LoadBalancer<FlakyProvider> {
    let mut config = BalancerConfig::new(strategy, max_parallel, interval_secs);
    config.health_check.probe_timeout_ms = 200;
    LoadBalancer::new(config).unwrap()
}

/// Permits the pool should hold once a health cycle has settled.
pub fn expected_permits(lb: &LoadBalancer<FlakyProvider>) -> usize {
    lb.online_count() * lb.config().max_parallel_requests
}
