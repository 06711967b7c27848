//! Selection strategies.
//!
//! A strategy only sees how many candidates there are and answers with an
//! index. The caller owns the candidate list (the online subset at call time).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::load_balancer::random::RandomSelector;
use crate::load_balancer::round_robin::RoundRobin;

/// Policy for choosing among online providers.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Index into a candidate list of `len` entries, or `None` if it is empty.
    fn pick(&self, len: usize) -> Option<usize>;

    /// Strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Configurable strategy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Random,
    RoundRobin,
}

impl StrategyKind {
    /// Build a fresh strategy instance (round-robin starts a new cursor).
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Random => Box::new(RandomSelector::new()),
            StrategyKind::RoundRobin => Box::new(RoundRobin::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Random => f.write_str("random"),
            StrategyKind::RoundRobin => f.write_str("round_robin"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "random" => Ok(StrategyKind::Random),
            "round_robin" => Ok(StrategyKind::RoundRobin),
            other => Err(format!("unknown selection strategy '{}'", other)),
        }
    }
}

/// Pick one candidate. A single candidate is returned without consulting
/// the strategy, so it does not move a round-robin cursor.
pub fn select<'a, T>(strategy: &dyn Strategy, candidates: &'a [T]) -> Option<&'a T> {
    match candidates.len() {
        0 => None,
        1 => candidates.first(),
        len => strategy.pick(len).and_then(|i| candidates.get(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_candidate_bypasses_strategy() {
        let rr = RoundRobin::new();
        assert_eq!(select(&rr, &["only"]), Some(&"only"));
        // Cursor untouched: the first real pick still starts at 0.
        assert_eq!(rr.pick(3), Some(0));
    }

    #[test]
    fn test_empty_candidates() {
        let strategy = StrategyKind::Random.build();
        let empty: [u8; 0] = [];
        assert_eq!(select(strategy.as_ref(), &empty), None);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("random".parse::<StrategyKind>().unwrap(), StrategyKind::Random);
        assert_eq!("ROUND-ROBIN".parse::<StrategyKind>().unwrap(), StrategyKind::RoundRobin);
        assert!("least_conn".parse::<StrategyKind>().is_err());
        for kind in [StrategyKind::Random, StrategyKind::RoundRobin] {
            assert_eq!(kind.build().name(), kind.to_string());
        }
        assert_eq!(StrategyKind::RoundRobin.build().name(), "round_robin");
    }
}
