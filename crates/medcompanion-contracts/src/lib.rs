//! # medcompanion-contracts
//!
//! Shared types, wire formats, and contracts for the MedCompanion AI
//! integration layer.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, error types, and call options.

pub mod call;
pub mod chat;
pub mod error;
pub mod model;
pub mod verify;
