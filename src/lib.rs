//! Orca Delegate - knowledge-aware task delegation for ClawCrew agents.

pub mod config;
pub mod delegate;
pub mod display;
pub mod knowledge;
pub mod tags;
