//! Balance-tier roll strategies.
//!
//! The higher the stake in play, the more likely a finished draw is thrown
//! away and drawn again. This suppresses the expected payout as the session
//! balance grows.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the low tier.
pub const LOW_TIER_MAX: u64 = 40;
/// Upper bound (inclusive) of the medium tier.
pub const MEDIUM_TIER_MAX: u64 = 60;

/// Payout-bias policy picked from the current session balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Low,
    Medium,
    High,
}

impl Strategy {
    /// Re-roll chance in percent.
    pub fn reroll_chance(self) -> f64 {
        match self {
            Strategy::Low => 0.0,
            Strategy::Medium => 30.0,
            Strategy::High => 60.0,
        }
    }
}

/// Picks the strategy for a session balance.
///
/// `<= 40` is Low, `41..=60` is Medium, anything above is High.
pub fn select_strategy(session_balance: u64) -> Strategy {
    if session_balance > MEDIUM_TIER_MAX {
        Strategy::High
    } else if session_balance > LOW_TIER_MAX {
        Strategy::Medium
    } else {
        Strategy::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(select_strategy(0), Strategy::Low);
        assert_eq!(select_strategy(40), Strategy::Low);
        assert_eq!(select_strategy(41), Strategy::Medium);
        assert_eq!(select_strategy(60), Strategy::Medium);
        assert_eq!(select_strategy(61), Strategy::High);
        assert_eq!(select_strategy(u64::MAX), Strategy::High);
    }

    #[test]
    fn test_reroll_chances() {
        assert_eq!(Strategy::Low.reroll_chance(), 0.0);
        assert_eq!(Strategy::Medium.reroll_chance(), 30.0);
        assert_eq!(Strategy::High.reroll_chance(), 60.0);
    }
}
