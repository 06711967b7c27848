//! Provider slot.
//!
//! # Responsibilities
//! - Pair one provider with its health status
//! - Apply exclude/include overrides and probe-driven transitions
//!
//! Status writes happen while the pool lock is held; the atomic only lets
//! readers of a snapshot see a consistent value without taking the lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::health::state::{SlotStatus, Transition};
use crate::provider::{Provider, ProviderId};

/// A provider together with its health status.
pub struct ProviderSlot<P: ?Sized> {
    id: ProviderId,
    provider: Arc<P>,
    status: AtomicU8,
}

impl<P: Provider + ?Sized> ProviderSlot<P> {
    /// Wrap a freshly registered provider. New slots start online.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            id: provider.id(),
            provider,
            status: AtomicU8::new(SlotStatus::Online as u8),
        }
    }
}

impl<P: ?Sized> ProviderSlot<P> {
    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn status(&self) -> SlotStatus {
        SlotStatus::from(self.status.load(Ordering::Acquire))
    }

    pub fn is_online(&self) -> bool {
        self.status().is_online()
    }

    /// Force the slot offline.
    pub(crate) fn exclude(&self) -> SlotStatus {
        self.swap(SlotStatus::Offline)
    }

    /// Force the slot online, skipping the recovering step.
    pub(crate) fn include(&self) -> SlotStatus {
        self.swap(SlotStatus::Online)
    }

    /// Apply one probe result and return what happened.
    pub(crate) fn apply_probe(&self, healthy: bool) -> Transition {
        let transition = self.status().on_probe(healthy);
        if transition.is_change() {
            self.status.store(transition.to as u8, Ordering::Release);
        }
        transition
    }

    fn swap(&self, status: SlotStatus) -> SlotStatus {
        SlotStatus::from(self.status.swap(status as u8, Ordering::AcqRel))
    }
}

impl<P: ?Sized> fmt::Debug for ProviderSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
