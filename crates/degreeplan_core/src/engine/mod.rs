//! Reconciliation engine for drag-and-drop plan editing.
//!
//! # Responsibility
//! - Track one gesture at a time (`Idle -> Dragging -> Idle`).
//! - Keep plan, pool and membership index consistent across gestures.
//! - Emit persistence commands for the final state of each drop.

pub mod gesture;
pub mod reconcile;
