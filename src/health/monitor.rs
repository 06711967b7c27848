//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every provider
//! - Demote failures at once, promote recoveries one step per cycle
//! - Bring the permit count back in line with online capacity

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::admission::Adjustment;
use crate::load_balancer::balancer::Shared;
use crate::load_balancer::error::{BalancerError, BalancerResult, RevokeError};
use crate::load_balancer::pool::CycleReport;
use crate::observability::metrics;
use crate::provider::{Provider, ProviderId};

pub struct HealthMonitor<P: ?Sized> {
    shared: Arc<Shared<P>>,
    config: HealthCheckConfig,
}

impl<P: Provider + ?Sized> HealthMonitor<P> {
    pub(crate) fn new(shared: Arc<Shared<P>>, config: HealthCheckConfig) -> Self {
        Self { shared, config }
    }

    /// Run cycles on a fixed interval until `shutdown` fires.
    ///
    /// The first cycle starts immediately. Returns an error only when a cycle
    /// could not finish reconciling permits; the balancer is defunct by then.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> BalancerResult<()> {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            probe_timeout_ms = self.config.probe_timeout_ms,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            let _cycle = self.shared.cycle_lock.lock().await;

            // Nothing has been mutated yet, so stopping here abandons the cycle cleanly.
            let probes = tokio::select! {
                probes = self.probe_all() => probes,
                _ = shutdown.recv() => break,
            };

            let stopped = async {
                let _ = shutdown.recv().await;
            };
            if let Err(e) = self.settle(&probes, stopped).await {
                tracing::error!(error = %e, "Health monitor stopping: pool state is no longer trustworthy");
                return Err(e);
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
        Ok(())
    }

    /// Run a single cycle now, outside the periodic schedule.
    pub async fn check_once(&self) -> BalancerResult<CycleReport> {
        let _cycle = self.shared.cycle_lock.lock().await;
        let probes = self.probe_all().await;
        self.settle(&probes, std::future::pending::<()>()).await
    }

    async fn probe_all(&self) -> Vec<(ProviderId, bool)> {
        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        let snapshot = self.shared.pool.snapshot();
        let mut results = Vec::with_capacity(snapshot.len());

        for slot in snapshot.iter() {
            let id = slot.id();
            let healthy = match time::timeout(timeout, slot.provider().probe()).await {
                Ok(healthy) => {
                    if !healthy {
                        tracing::warn!(provider = %id, "Health check failed");
                    }
                    healthy
                }
                Err(_) => {
                    tracing::warn!(provider = %id, timeout_ms = self.config.probe_timeout_ms, "Health check failed: timeout");
                    false
                }
            };
            results.push((id, healthy));
        }
        results
    }

    /// Apply probe results, then grant or revoke permits.
    ///
    /// If `cancel` completes while a revocation is still waiting for permits,
    /// the revocation is abandoned and the balancer is marked defunct. A
    /// revocation that can finish right away always wins over `cancel`.
    async fn settle(
        &self,
        probes: &[(ProviderId, bool)],
        cancel: impl Future<Output = ()>,
    ) -> BalancerResult<CycleReport> {
        if self.shared.is_defunct() {
            return Err(BalancerError::Defunct);
        }

        let report = self.shared.pool.apply_probes(probes);

        // Only a waiting revocation can be cancelled; grants finish at once.
        let reconciled = match report.adjustment {
            Adjustment::Revoke(_) => tokio::select! {
                biased;
                res = self.shared.admission.apply(report.adjustment) => res,
                _ = cancel => Err(RevokeError::Cancelled),
            },
            adjustment => self.shared.admission.apply(adjustment).await,
        };
        if let Err(cause) = reconciled {
            self.shared.mark_defunct(&cause);
            return Err(BalancerError::MonitorCorruption(cause));
        }

        match report.adjustment {
            Adjustment::None => {}
            Adjustment::Grant(units) => {
                tracing::info!(units, online = report.online, "Granted permits for recovered providers")
            }
            Adjustment::Revoke(units) => {
                tracing::info!(units, online = report.online, "Revoked permits for offline providers")
            }
        }
        tracing::debug!(
            lost = report.lost,
            gained = report.gained,
            recovering = report.recovering,
            online = report.online,
            "Health cycle complete"
        );
        metrics::record_capacity(
            report.online,
            report.online * self.shared.admission.permits_per_unit(),
        );

        Ok(report)
    }
}
