//! Application layer: the use-cases transports call.

pub mod slot_service;

pub use slot_service::{AccountView, ROLL_COST, RollResult, SessionCreation, SlotService};
