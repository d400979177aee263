//! Claim Circumstances Domain Layer
//!
//! Core model for the claim circumstances service: the stored record, the
//! request payload it is built from, content hashing, and the trait
//! interface the persistence layer implements.
//!
//! ## Key Concepts
//!
//! - **Circumstances record**: one JSON document per claimant, plus metadata
//! - **Canonical JSON**: sorted-key serialization used as hash input
//! - **Source**: the actor type that submitted the record
//! - **Locale**: optional language tag carried by the payload
//!
//! ## Architecture
//!
//! - Pure domain logic, no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod circumstances;
pub mod locale;
pub mod request;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use canonical::{canonical_json, content_hash, HashError};
pub use circumstances::{ClaimCircumstances, CircumstancesId, CircumstancesSummary};
pub use locale::Locale;
pub use request::{CircumstancesRequest, CircumstancesResponse, ValidationError};
pub use source::Source;
