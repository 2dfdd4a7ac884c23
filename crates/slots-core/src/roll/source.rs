//! Randomness behind a spin.

use super::symbol::Symbol;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the random draws a spin consumes.
///
/// Implementations must return independent, uniformly distributed values.
/// Cryptographic strength is not required.
pub trait RollSource: Send {
    /// One reel symbol, uniform over [`Symbol::ALL`].
    fn draw_symbol(&mut self) -> Symbol;

    /// A uniform value in `[0, 100)`, compared against a re-roll chance.
    fn draw_chance(&mut self) -> f64;
}

/// [`RollSource`] backed by a `rand` generator.
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl RngSource<StdRng> {
    /// Generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Generator with a fixed seed, for reproducible play.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> RollSource for RngSource<R> {
    fn draw_symbol(&mut self) -> Symbol {
        Symbol::ALL[self.rng.gen_range(0..Symbol::ALL.len())]
    }

    fn draw_chance(&mut self) -> f64 {
        self.rng.gen_range(0.0..100.0)
    }
}

/// [`RollSource`] that replays fixed sequences, looping when exhausted.
///
/// Useful for replaying a recorded game and for deterministic tests.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    symbols: Vec<Symbol>,
    chances: Vec<f64>,
    symbol_cursor: usize,
    chance_cursor: usize,
}

impl ScriptedSource {
    /// An empty `symbols` script falls back to cherries; an empty `chances`
    /// script falls back to `99.99`, which never triggers a re-roll.
    pub fn new(symbols: Vec<Symbol>, chances: Vec<f64>) -> Self {
        let symbols = if symbols.is_empty() {
            vec![Symbol::Cherry]
        } else {
            symbols
        };
        let chances = if chances.is_empty() {
            vec![99.99]
        } else {
            chances
        };
        Self {
            symbols,
            chances,
            symbol_cursor: 0,
            chance_cursor: 0,
        }
    }

    /// Number of symbols handed out so far.
    pub fn symbols_drawn(&self) -> usize {
        self.symbol_cursor
    }

    /// Number of chance values handed out so far.
    pub fn chances_drawn(&self) -> usize {
        self.chance_cursor
    }
}

impl RollSource for ScriptedSource {
    fn draw_symbol(&mut self) -> Symbol {
        let symbol = self.symbols[self.symbol_cursor % self.symbols.len()];
        self.symbol_cursor += 1;
        symbol
    }

    fn draw_chance(&mut self) -> f64 {
        let chance = self.chances[self.chance_cursor % self.chances.len()];
        self.chance_cursor += 1;
        chance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_symbol_draws_are_uniform() {
        const DRAWS: usize = 100_000;
        let mut source = RngSource::from_entropy();
        let mut counts: HashMap<Symbol, usize> = HashMap::new();
        for _ in 0..DRAWS {
            *counts.entry(source.draw_symbol()).or_default() += 1;
        }

        let expected = DRAWS as f64 / Symbol::ALL.len() as f64;
        for symbol in Symbol::ALL {
            let count = counts.get(&symbol).copied().unwrap_or(0) as f64;
            let deviation = (count - expected).abs() / expected;
            assert!(
                deviation < 0.05,
                "{symbol} drawn {count} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn test_chance_range() {
        let mut source = RngSource::seeded(7);
        for _ in 0..10_000 {
            let chance = source.draw_chance();
            assert!((0.0..100.0).contains(&chance));
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.draw_symbol(), b.draw_symbol());
        }
    }

    #[test]
    fn test_scripted_source_loops() {
        let mut source = ScriptedSource::new(vec![Symbol::Lemon, Symbol::Orange], vec![]);
        assert_eq!(source.draw_symbol(), Symbol::Lemon);
        assert_eq!(source.draw_symbol(), Symbol::Orange);
        assert_eq!(source.draw_symbol(), Symbol::Lemon);
        assert_eq!(source.draw_chance(), 99.99);
        assert_eq!(source.symbols_drawn(), 3);
        assert_eq!(source.chances_drawn(), 1);
    }
}
