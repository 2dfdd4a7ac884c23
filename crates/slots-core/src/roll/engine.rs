//! One spin of the reels, including the strategy's conditional re-roll.

use super::source::RollSource;
use super::strategy::{LOW_TIER_MAX, Strategy, select_strategy};
use super::symbol::{Reels, compute_win};
use serde::{Deserialize, Serialize};

/// When a finished draw is eligible for the strategy's re-roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerollPolicy {
    /// Every draw is eligible; the chance check alone decides.
    #[default]
    Always,
    /// Only winning draws with a balance above the low tier are eligible.
    WinsAboveLowTier,
}

/// Outcome of one spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spin {
    pub symbols: Reels,
    pub win_amount: u64,
    pub strategy: Strategy,
    /// Whether the first draw was thrown away and replaced.
    pub rerolled: bool,
}

/// Runs spins against a [`RollSource`].
///
/// The engine is stateless apart from its policy; the caller owns the
/// randomness so one source can be shared behind a lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollEngine {
    policy: RerollPolicy,
}

impl RollEngine {
    pub fn new(policy: RerollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RerollPolicy {
        self.policy
    }

    /// Spins once for a session holding `session_balance`.
    ///
    /// The balance only selects the strategy tier. A re-roll replaces both
    /// the symbols and the win of the first draw, whichever way that goes.
    pub fn spin(&self, session_balance: u64, source: &mut dyn RollSource) -> Spin {
        let strategy = select_strategy(session_balance);

        let mut symbols = draw(source);
        let mut win_amount = compute_win(&symbols);
        let mut rerolled = false;

        if self.is_eligible(strategy, session_balance, win_amount)
            && source.draw_chance() <= strategy.reroll_chance()
        {
            symbols = draw(source);
            win_amount = compute_win(&symbols);
            rerolled = true;
        }

        Spin {
            symbols,
            win_amount,
            strategy,
            rerolled,
        }
    }

    fn is_eligible(&self, strategy: Strategy, session_balance: u64, win_amount: u64) -> bool {
        if strategy == Strategy::Low {
            return false;
        }
        match self.policy {
            RerollPolicy::Always => true,
            RerollPolicy::WinsAboveLowTier => win_amount > 0 && session_balance > LOW_TIER_MAX,
        }
    }
}

fn draw(source: &mut dyn RollSource) -> Reels {
    [source.draw_symbol(), source.draw_symbol(), source.draw_symbol()]
}
