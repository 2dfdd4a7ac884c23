//! Roll domain module.
//!
//! # Module Structure
//!
//! - `symbol`: reel symbols, payout table and win computation
//! - `strategy`: balance-tier re-roll strategies
//! - `source`: randomness behind a spin (`RollSource`)
//! - `engine`: one spin, including the conditional re-roll (`RollEngine`)

mod engine;
mod source;
mod strategy;
mod symbol;

pub use engine::{RerollPolicy, RollEngine, Spin};
pub use source::{RngSource, RollSource, ScriptedSource};
pub use strategy::{LOW_TIER_MAX, MEDIUM_TIER_MAX, Strategy, select_strategy};
pub use symbol::{Reels, Symbol, compute_win};
