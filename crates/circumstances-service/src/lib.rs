//! Claim Circumstances Service Layer
//!
//! Orchestrates validation, hashing, record construction and duplicate
//! detection on top of any `CircumstancesStore`.
//!
//! The service:
//! - Rejects payloads missing the required claim dates before touching the store
//! - Hashes the canonical payload on every create and update
//! - Translates claimant uniqueness violations into [`ServiceError::DuplicateRecord`]
//!
//! # Examples
//!
//! ```no_run
//! use circumstances_service::CircumstancesService;
//! use circumstances_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! let service = CircumstancesService::new(Arc::new(Mutex::new(store)));
//!
//! // let id = service.create(payload)?;
//! ```

#![warn(missing_docs)]

mod error;
mod service;

pub use error::ServiceError;
pub use service::CircumstancesService;
