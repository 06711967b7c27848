//! Uniform random selection.

use rand::Rng;

use crate::load_balancer::strategy::Strategy;

/// Picks each candidate with equal probability, independently per call.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for RandomSelector {
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..len))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
