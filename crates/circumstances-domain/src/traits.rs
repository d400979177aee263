//! Trait definitions for external interactions
//!
//! These traits define the boundary between domain logic and persistence.
//! Implementations live in other crates.

use crate::{ClaimCircumstances, CircumstancesId, CircumstancesSummary};

/// Failure classification the service layer needs from a store
pub trait StoreFailure: std::error::Error {
    /// True when the write was rejected by the claimant uniqueness constraint
    fn is_unique_violation(&self) -> bool;
}

/// Trait for storing and retrieving circumstances records
///
/// Implemented by the infrastructure layer (circumstances-store)
pub trait CircumstancesStore {
    /// Error type for store operations
    type Error: StoreFailure;

    /// Get a record by id
    fn find_by_id(&self, id: CircumstancesId) -> Result<Option<ClaimCircumstances>, Self::Error>;

    /// Get the record belonging to a claimant
    fn find_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<ClaimCircumstances>, Self::Error>;

    /// Get a record's metadata by id without loading its document
    fn find_summary_by_id(
        &self,
        id: CircumstancesId,
    ) -> Result<Option<CircumstancesSummary>, Self::Error>;

    /// Get a claimant's record metadata without loading its document
    fn find_summary_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<CircumstancesSummary>, Self::Error>;

    /// Claimant ids of up to `limit` records not yet encrypted at rest
    fn find_unencrypted_claimant_ids(&self, limit: usize) -> Result<Vec<String>, Self::Error>;

    /// Up to `limit` records not yet encrypted at rest, oldest first
    fn find_unencrypted(&self, limit: usize) -> Result<Vec<ClaimCircumstances>, Self::Error>;

    /// Insert or update a record by id
    ///
    /// The store owns `created_at`/`updated_at` and returns the record as
    /// persisted. Fails with a unique violation when another record already
    /// holds the claimant id.
    fn save(&mut self, record: ClaimCircumstances) -> Result<ClaimCircumstances, Self::Error>;

    /// Delete a record by id; deleting an absent id is not an error
    fn delete_by_id(&mut self, id: CircumstancesId) -> Result<(), Self::Error>;
}
