//! # medcompanion-verify
//!
//! Output verification for the MedCompanion integration layer.
//!
//! This crate provides [`engine::SchemaVerifier`], which implements the
//! [`medcompanion_core::traits::Verifier`] trait. It validates provider JSON
//! in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate.
//! 2. **Semantic**: rules (`NonEmptyString`, `NonEmptyArray`, `Custom`)
//!    evaluated against the payload.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medcompanion_verify::engine::SchemaVerifier;
//!
//! let verifier = SchemaVerifier::new().with_rule("card-names", Box::new(|payload| {
//!     payload["conditionCards"].as_array()?;
//!     None
//! }));
//! ```

pub mod engine;

pub use engine::SchemaVerifier;
