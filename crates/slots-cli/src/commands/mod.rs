//! One module per command group. Each handler resolves ids to entities,
//! calls the service and returns the JSON to print.

pub mod account;
pub mod play;
pub mod session;
