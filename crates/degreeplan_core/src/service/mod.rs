//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into session-level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod session_service;
