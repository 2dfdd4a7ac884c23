//! Reel symbols and the payout table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A fruit shown on one reel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Symbol {
    Cherry,
    Lemon,
    Orange,
    Watermelon,
}

impl Symbol {
    /// Every symbol on a reel, in payout order.
    pub const ALL: [Symbol; 4] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Watermelon,
    ];

    /// Payout for three of this symbol in a row.
    pub fn payout(self) -> u64 {
        match self {
            Symbol::Cherry => 10,
            Symbol::Lemon => 20,
            Symbol::Orange => 30,
            Symbol::Watermelon => 40,
        }
    }
}

/// Three symbols, one per reel.
pub type Reels = [Symbol; 3];

/// Win for a finished draw: the tabled payout when all reels match, `0` otherwise.
pub fn compute_win(reels: &Reels) -> u64 {
    let [first, second, third] = *reels;
    if first == second && second == third {
        first.payout()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_payout_table() {
        assert_eq!(Symbol::Cherry.payout(), 10);
        assert_eq!(Symbol::Lemon.payout(), 20);
        assert_eq!(Symbol::Orange.payout(), 30);
        assert_eq!(Symbol::Watermelon.payout(), 40);
    }

    #[test]
    fn test_compute_win_every_combination() {
        for a in Symbol::iter() {
            for b in Symbol::iter() {
                for c in Symbol::iter() {
                    let win = compute_win(&[a, b, c]);
                    if a == b && b == c {
                        assert_eq!(win, a.payout(), "{a} {b} {c}");
                    } else {
                        assert_eq!(win, 0, "{a} {b} {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_matches_declaration_order() {
        let iterated: Vec<_> = Symbol::iter().collect();
        assert_eq!(iterated, Symbol::ALL.to_vec());
    }

    #[test]
    fn test_names_are_lowercase() {
        assert_eq!(Symbol::Watermelon.to_string(), "watermelon");
        assert_eq!(Symbol::from_str("lemon").unwrap(), Symbol::Lemon);
        assert_eq!(
            serde_json::to_string(&Symbol::Cherry).unwrap(),
            "\"cherry\""
        );
    }
}
