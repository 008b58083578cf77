//! Finch domain logic.
//!
//! This crate has zero internal dependencies and performs no I/O, so the
//! db and api crates (and any future worker or CLI tooling) can share the
//! same preference and eligibility semantics.

pub mod error;
pub mod notifications;
pub mod types;
