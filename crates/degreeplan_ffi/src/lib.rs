//! Flutter bridge crate for the degree planner.

pub mod api;
