//! Provider pool management.
//!
//! # Responsibilities
//! - Hold the ordered slot list and the id index, behind one mutex
//! - Reject duplicate registrations and enforce the slot ceiling
//! - Apply health-cycle transitions atomically
//! - Keep the capacity ledger (how many slots' worth of permits are granted)
//!
//! The slot list is copy-on-write: registration builds a new list and swaps it
//! in, so a snapshot taken by a reader never changes under it. The lock is
//! never held across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::health::state::{CapacityChange, SlotStatus};
use crate::load_balancer::admission::Adjustment;
use crate::load_balancer::error::RegisterError;
use crate::load_balancer::slot::ProviderSlot;
use crate::provider::{Provider, ProviderId};

/// Hard ceiling on the number of slots a pool may hold.
pub const MAX_PROVIDERS: usize = 10;

/// Immutable view of the slot list at some point in time.
pub type Snapshot<P> = Arc<[Arc<ProviderSlot<P>>]>;

/// Debug view of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub id: ProviderId,
    pub status: SlotStatus,
}

/// Summary of one applied health cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Slots that left `Online`.
    pub lost: usize,
    /// Slots that reached `Online`.
    pub gained: usize,
    /// Slots that moved `Offline → Recovering`.
    pub recovering: usize,
    /// Online slots after the cycle.
    pub online: usize,
    /// Permit units to grant or revoke so the ledger matches `online`.
    pub adjustment: Adjustment,
}

struct PoolState<P: ?Sized> {
    slots: Snapshot<P>,
    index: HashMap<ProviderId, usize>,
    /// Slots' worth of permits currently granted to the admission controller.
    granted_units: usize,
}

impl<P: ?Sized> PoolState<P> {
    fn empty() -> Self {
        Self {
            slots: Arc::from(Vec::new()),
            index: HashMap::new(),
            granted_units: 0,
        }
    }
}

/// The balancer's provider pool.
pub struct Pool<P: ?Sized> {
    state: Mutex<PoolState<P>>,
}

impl<P: Provider + ?Sized> Pool<P> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PoolState::empty()),
        }
    }

    /// Add providers that are not yet members.
    ///
    /// Returns the number of slots added; that many units are also added to
    /// the capacity ledger. Nothing changes on error.
    pub fn register(&self, providers: Vec<Arc<P>>) -> Result<usize, RegisterError> {
        let mut state = self.lock_state();
        Self::register_locked(&mut state, providers)
    }

    /// Drop every slot and the ledger, then register `providers` from scratch.
    pub fn rebuild(&self, providers: Vec<Arc<P>>) -> Result<usize, RegisterError> {
        let mut fresh = PoolState::empty();
        let added = Self::register_locked(&mut fresh, providers)?;
        *self.lock_state() = fresh;
        Ok(added)
    }

    fn register_locked(
        state: &mut PoolState<P>,
        providers: Vec<Arc<P>>,
    ) -> Result<usize, RegisterError> {
        let mut seen = HashSet::new();
        let fresh: Vec<Arc<P>> = providers
            .into_iter()
            .filter(|p| {
                let id = p.id();
                !state.index.contains_key(&id) && seen.insert(id)
            })
            .collect();

        if fresh.is_empty() {
            return Err(RegisterError::AlreadyRegistered);
        }

        let current = state.slots.len();
        if current + fresh.len() > MAX_PROVIDERS {
            return Err(RegisterError::CapacityExceeded {
                current,
                adding: fresh.len(),
                max: MAX_PROVIDERS,
            });
        }

        let added = fresh.len();
        let mut slots: Vec<Arc<ProviderSlot<P>>> = state.slots.iter().cloned().collect();
        for provider in fresh {
            state.index.insert(provider.id(), slots.len());
            slots.push(Arc::new(ProviderSlot::new(provider)));
        }
        state.slots = Arc::from(slots);
        state.granted_units += added;

        Ok(added)
    }
}

impl<P: ?Sized> Pool<P> {
    fn lock_state(&self) -> MutexGuard<'_, PoolState<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current slot list. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Snapshot<P> {
        self.lock_state().slots.clone()
    }

    /// Providers whose slot is online, copied out under the lock.
    pub fn online(&self) -> Vec<Arc<P>> {
        let state = self.lock_state();
        state
            .slots
            .iter()
            .filter(|slot| slot.is_online())
            .map(|slot| slot.provider().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock_state().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn online_count(&self) -> usize {
        self.lock_state().slots.iter().filter(|s| s.is_online()).count()
    }

    /// Slots' worth of permits the ledger says are granted.
    pub fn granted_units(&self) -> usize {
        self.lock_state().granted_units
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.lock_state().index.contains_key(&id)
    }

    /// Force a slot offline. Returns `false` if `id` is not a member.
    pub fn exclude(&self, id: ProviderId) -> bool {
        self.with_slot(id, |slot| {
            let before = slot.exclude();
            tracing::info!(provider = %id, from = before.as_str(), "Provider excluded");
        })
    }

    /// Force a slot online. Returns `false` if `id` is not a member.
    pub fn include(&self, id: ProviderId) -> bool {
        self.with_slot(id, |slot| {
            let before = slot.include();
            tracing::info!(provider = %id, from = before.as_str(), "Provider included");
        })
    }

    fn with_slot(&self, id: ProviderId, f: impl FnOnce(&ProviderSlot<P>)) -> bool {
        let state = self.lock_state();
        match state.index.get(&id).and_then(|&i| state.slots.get(i)) {
            Some(slot) => {
                f(slot);
                true
            }
            None => {
                tracing::debug!(provider = %id, "Provider not found in pool");
                false
            }
        }
    }

    /// Apply one cycle's probe results and settle the capacity ledger.
    ///
    /// Results for ids that are not members are ignored. Slots registered after
    /// the probes were taken keep their status until the next cycle.
    pub fn apply_probes(&self, results: &[(ProviderId, bool)]) -> CycleReport {
        let mut state = self.lock_state();
        let mut report = CycleReport::default();

        for &(id, healthy) in results {
            let Some(slot) = state.index.get(&id).and_then(|&i| state.slots.get(i)) else {
                continue;
            };
            let transition = slot.apply_probe(healthy);
            if !transition.is_change() {
                continue;
            }
            match transition.capacity {
                CapacityChange::Lost => report.lost += 1,
                CapacityChange::Gained => report.gained += 1,
                CapacityChange::Unchanged => {
                    if transition.to == SlotStatus::Recovering {
                        report.recovering += 1;
                    }
                }
            }
            tracing::info!(
                provider = %id,
                from = transition.from.as_str(),
                to = transition.to.as_str(),
                "Provider status changed"
            );
            crate::observability::metrics::record_transition(transition.to);
        }

        report.online = state.slots.iter().filter(|s| s.is_online()).count();
        report.adjustment = Adjustment::between(state.granted_units, report.online);
        state.granted_units = report.online;
        report
    }

    /// Debug enumeration of every slot and its status.
    pub fn slot_infos(&self) -> Vec<SlotInfo> {
        self.lock_state()
            .slots
            .iter()
            .map(|slot| SlotInfo {
                id: slot.id(),
                status: slot.status(),
            })
            .collect()
    }
}

impl<P: Provider + ?Sized> Default for Pool<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;

    fn providers(n: usize) -> Vec<Arc<StaticProvider>> {
        (0..n).map(|_| Arc::new(StaticProvider::new())).collect()
    }

    #[test]
    fn test_register_dedups() {
        let pool = Pool::new();
        let ps = providers(3);

        let mut input = ps.clone();
        input.push(ps[0].clone());
        assert_eq!(pool.register(input).unwrap(), 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.granted_units(), 3);

        assert!(matches!(
            pool.register(ps.clone()),
            Err(RegisterError::AlreadyRegistered)
        ));

        // Partial overlap only adds the new one.
        let mut mixed = ps.clone();
        mixed.extend(providers(1));
        assert_eq!(pool.register(mixed).unwrap(), 1);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_register_respects_ceiling() {
        let pool = Pool::new();
        pool.register(providers(8)).unwrap();

        let err = pool.register(providers(3)).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::CapacityExceeded { current: 8, adding: 3, max: MAX_PROVIDERS }
        ));
        assert_eq!(pool.len(), 8);
        assert_eq!(pool.granted_units(), 8);

        pool.register(providers(2)).unwrap();
        assert_eq!(pool.len(), MAX_PROVIDERS);
    }

    #[test]
    fn test_snapshot_is_copy_on_write() {
        let pool = Pool::new();
        pool.register(providers(2)).unwrap();
        let before = pool.snapshot();
        pool.register(providers(1)).unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(pool.snapshot().len(), 3);
    }

    #[test]
    fn test_exclude_include_by_id() {
        let pool = Pool::new();
        let ps = providers(2);
        pool.register(ps.clone()).unwrap();

        assert!(pool.exclude(ps[0].id()));
        assert_eq!(pool.online_count(), 1);
        assert_eq!(pool.online()[0].id(), ps[1].id());

        assert!(pool.include(ps[0].id()));
        assert_eq!(pool.online_count(), 2);

        let stranger = StaticProvider::new();
        assert!(!pool.exclude(stranger.id()));
        assert!(!pool.include(stranger.id()));
    }

    #[test]
    fn test_apply_probes_settles_ledger() {
        let pool = Pool::new();
        let ps = providers(3);
        pool.register(ps.clone()).unwrap();

        let report = pool.apply_probes(&[(ps[0].id(), false), (ps[1].id(), true), (ps[2].id(), true)]);
        assert_eq!(report.lost, 1);
        assert_eq!(report.online, 2);
        assert_eq!(report.adjustment, Adjustment::Revoke(1));
        assert_eq!(pool.granted_units(), 2);

        let report = pool.apply_probes(&[(ps[0].id(), true)]);
        assert_eq!(report.recovering, 1);
        assert_eq!(report.adjustment, Adjustment::None);

        let report = pool.apply_probes(&[(ps[0].id(), true)]);
        assert_eq!(report.gained, 1);
        assert_eq!(report.adjustment, Adjustment::Grant(1));
        assert_eq!(pool.granted_units(), 3);
    }

    #[test]
    fn test_manual_exclude_is_absorbed_by_next_cycle() {
        let pool = Pool::new();
        let ps = providers(2);
        pool.register(ps.clone()).unwrap();

        pool.exclude(ps[0].id());
        assert_eq!(pool.granted_units(), 2);

        let all_healthy: Vec<_> = ps.iter().map(|p| (p.id(), true)).collect();
        let report = pool.apply_probes(&all_healthy);
        assert_eq!(report.recovering, 1);
        assert_eq!(report.adjustment, Adjustment::Revoke(1));
        assert_eq!(pool.granted_units(), 1);
    }

    #[test]
    fn test_rebuild_starts_from_scratch() {
        let pool = Pool::new();
        let ps = providers(4);
        pool.register(ps.clone()).unwrap();
        pool.exclude(ps[0].id());

        assert_eq!(pool.rebuild(ps[..2].to_vec()).unwrap(), 2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.online_count(), 2);
        assert_eq!(pool.granted_units(), 2);
        assert!(!pool.contains(ps[3].id()));
    }
}
