//! Timer engine
//!
//! The countdown state machine and the cross-instance reconciliation rules.
//! Everything here is pure; scheduling and persistence live in `tasks` and
//! `store`.

pub mod machine;

pub use machine::Outcome;
