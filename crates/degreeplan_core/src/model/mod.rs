//! Degree plan domain model.
//!
//! # Responsibility
//! - Define the catalog, semester and plan structures the engine mutates.
//! - Provide the derived membership index and plan aggregates.
//!
//! # Invariants
//! - A course id appears in at most one semester.
//! - Unassigned pool and semester members partition the catalog.

pub mod catalog;
pub mod course;
pub mod membership;
pub mod plan;
pub mod semester;
