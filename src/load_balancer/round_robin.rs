//! Round-robin selection.

use std::sync::{Mutex, PoisonError};

use crate::load_balancer::strategy::Strategy;

/// Round-robin selector.
///
/// The cursor is shared by all callers and guarded by its own lock. It is
/// reduced modulo the candidate count on every call, so when the online set
/// changes size the rotation restarts from wherever the cursor lands.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<Option<usize>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let next = cursor.map_or(0, |c| (c + 1) % len);
        *cursor = Some(next);
        Some(next)
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let picks: Vec<_> = (0..6).map(|_| lb.pick(3).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_cursor_reinterpreted_when_size_changes() {
        let lb = RoundRobin::new();
        assert_eq!(lb.pick(4), Some(0));
        assert_eq!(lb.pick(4), Some(1));
        assert_eq!(lb.pick(4), Some(2));
        // Online set shrank to 2: cursor 2 → (2 + 1) % 2.
        assert_eq!(lb.pick(2), Some(1));
        assert_eq!(lb.pick(2), Some(0));
    }
}
