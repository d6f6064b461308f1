//! Persistence adapter: one-way command queue plus the worker draining it.
//!
//! The engine only ever enqueues. Whether a command reached the store is
//! visible in logs and worker stats, never in engine state.

pub mod command;
pub mod worker;
