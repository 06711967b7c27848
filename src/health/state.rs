//! Provider slot health state machine.
//!
//! # States
//! - Offline: slot excluded from selection
//! - Recovering: probe passed once since going offline, still excluded
//! - Online: slot receives traffic
//!
//! # State Transitions
//! ```text
//! any        → Offline:    probe failed (or manual exclude)
//! Offline    → Recovering: probe succeeded
//! Recovering → Online:     probe succeeded
//! any        → Online:     manual include
//! ```
//!
//! # Design Decisions
//! - One successful probe moves a slot at most one step; steps are never skipped
//! - One failed probe is enough to go offline
//! - Capacity only changes when a slot leaves or enters `Online`

use serde::Serialize;

/// Health status of a provider slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Offline = 0,
    Recovering = 1,
    Online = 2,
}

impl From<u8> for SlotStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => SlotStatus::Recovering,
            2 => SlotStatus::Online,
            _ => SlotStatus::Offline,
        }
    }
}

/// Effect of a probe result on capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityChange {
    /// Slot stayed on the same side of `Online`.
    Unchanged,
    /// Slot left `Online`.
    Lost,
    /// Slot reached `Online`.
    Gained,
}

/// Outcome of applying one probe result to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SlotStatus,
    pub to: SlotStatus,
    pub capacity: CapacityChange,
}

impl Transition {
    /// Whether the status actually changed.
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

impl SlotStatus {
    /// Next status one step closer to `Online`.
    pub fn promote(self) -> Self {
        match self {
            SlotStatus::Offline => SlotStatus::Recovering,
            SlotStatus::Recovering | SlotStatus::Online => SlotStatus::Online,
        }
    }

    /// Apply a probe result.
    pub fn on_probe(self, healthy: bool) -> Transition {
        let to = if healthy { self.promote() } else { SlotStatus::Offline };
        let capacity = match (self, to) {
            (SlotStatus::Online, SlotStatus::Online) => CapacityChange::Unchanged,
            (SlotStatus::Online, _) => CapacityChange::Lost,
            (_, SlotStatus::Online) => CapacityChange::Gained,
            _ => CapacityChange::Unchanged,
        };
        Transition { from: self, to, capacity }
    }

    pub fn is_online(self) -> bool {
        self == SlotStatus::Online
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Offline => "offline",
            SlotStatus::Recovering => "recovering",
            SlotStatus::Online => "online",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_always_goes_offline() {
        for status in [SlotStatus::Offline, SlotStatus::Recovering, SlotStatus::Online] {
            assert_eq!(status.on_probe(false).to, SlotStatus::Offline);
        }
        assert_eq!(SlotStatus::Online.on_probe(false).capacity, CapacityChange::Lost);
        assert_eq!(SlotStatus::Recovering.on_probe(false).capacity, CapacityChange::Unchanged);
    }

    #[test]
    fn test_recovery_takes_two_steps() {
        let t1 = SlotStatus::Offline.on_probe(true);
        assert_eq!(t1.to, SlotStatus::Recovering);
        assert_eq!(t1.capacity, CapacityChange::Unchanged);

        let t2 = t1.to.on_probe(true);
        assert_eq!(t2.to, SlotStatus::Online);
        assert_eq!(t2.capacity, CapacityChange::Gained);

        let t3 = t2.to.on_probe(true);
        assert!(!t3.is_change());
        assert_eq!(t3.capacity, CapacityChange::Unchanged);
    }

    #[test]
    fn test_u8_roundtrip() {
        for status in [SlotStatus::Offline, SlotStatus::Recovering, SlotStatus::Online] {
            assert_eq!(SlotStatus::from(status as u8), status);
        }
        assert_eq!(SlotStatus::from(42), SlotStatus::Offline);
    }

    #[test]
    fn test_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&SlotStatus::Recovering).unwrap();
        assert_eq!(json, "\"RECOVERING\"");
    }
}
