//! Admission control.
//!
//! # Responsibilities
//! - Hold the global permit count (online slots × parallel requests per slot)
//! - Hand out permits without ever waiting
//! - Grant and revoke capacity in whole slot units
//!
//! # Design Decisions
//! - Backed by a Tokio semaphore; a permit returns to it on drop
//! - Revocation waits until enough permits are free, then forgets them, so the
//!   count can never go below what is actually in use
//! - The semaphore sits behind an `ArcSwap` so a defunct balancer can start
//!   over with a fresh one

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::load_balancer::error::RevokeError;

/// Change to apply to the permit count, in slot units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjustment {
    #[default]
    None,
    Grant(usize),
    Revoke(usize),
}

impl Adjustment {
    /// Adjustment that moves `granted` units to `target` units.
    pub fn between(granted: usize, target: usize) -> Self {
        match target.cmp(&granted) {
            std::cmp::Ordering::Greater => Adjustment::Grant(target - granted),
            std::cmp::Ordering::Less => Adjustment::Revoke(granted - target),
            std::cmp::Ordering::Equal => Adjustment::None,
        }
    }
}

/// A permit to pick a provider. Released when dropped.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

/// Counting permit pool sized by online capacity.
#[derive(Debug)]
pub struct AdmissionController {
    semaphore: ArcSwap<Semaphore>,
    permits_per_unit: usize,
}

impl AdmissionController {
    /// Create a controller with no permits. `permits_per_unit` is the number
    /// of parallel requests a single provider may take.
    pub fn new(permits_per_unit: usize) -> Self {
        Self {
            semaphore: ArcSwap::from_pointee(Semaphore::new(0)),
            permits_per_unit,
        }
    }

    pub fn permits_per_unit(&self) -> usize {
        self.permits_per_unit
    }

    /// Take a permit if one is free. Never waits.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        self.semaphore
            .load_full()
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }

    /// Add `units` slots' worth of permits.
    pub fn grant(&self, units: usize) {
        if units == 0 {
            return;
        }
        self.semaphore.load().add_permits(units * self.permits_per_unit);
    }

    /// Remove `units` slots' worth of permits.
    ///
    /// Waits until that many permits are free. Dropping the returned future
    /// before it completes leaves the count untouched.
    pub async fn revoke(&self, units: usize) -> Result<(), RevokeError> {
        if units == 0 {
            return Ok(());
        }
        let permits = units * self.permits_per_unit;
        let wanted = u32::try_from(permits).map_err(|_| RevokeError::TooMany(permits))?;

        let semaphore = self.semaphore.load_full();
        let held = semaphore
            .acquire_many_owned(wanted)
            .await
            .map_err(|_| RevokeError::Closed)?;
        held.forget();
        Ok(())
    }

    /// Apply an adjustment produced by a health cycle.
    pub async fn apply(&self, adjustment: Adjustment) -> Result<(), RevokeError> {
        match adjustment {
            Adjustment::None => Ok(()),
            Adjustment::Grant(units) => {
                self.grant(units);
                Ok(())
            }
            Adjustment::Revoke(units) => self.revoke(units).await,
        }
    }

    /// Replace the permit pool with a fresh one holding `units` slots' worth.
    ///
    /// The old semaphore is closed so nothing keeps waiting on it.
    pub fn reset(&self, units: usize) {
        let fresh = Arc::new(Semaphore::new(units * self.permits_per_unit));
        let old = self.semaphore.swap(fresh);
        old.close();
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.load().available_permits()
    }

    /// Close the pool; pending and future revocations fail.
    pub fn close(&self) {
        self.semaphore.load().close();
    }
}
