//! # medcompanion-core
//!
//! The structured-output runtime for the MedCompanion integration layer.
//!
//! This crate provides:
//! - The seam traits (`ChatTransport`, `Verifier`, `ImagePicker`)
//! - The `StructuredExecutor` that runs request → verify → decode
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medcompanion_core::{StructuredExecutor, traits::{ChatTransport, Verifier}};
//! ```

pub mod executor;
pub mod traits;

pub use executor::StructuredExecutor;
