//! Circumstances service implementation

use std::sync::{Arc, Mutex, MutexGuard};

use circumstances_domain::request::CLAIMANT_ID;
use circumstances_domain::traits::{CircumstancesStore, StoreFailure};
use circumstances_domain::{
    ClaimCircumstances, CircumstancesId, CircumstancesRequest, CircumstancesResponse,
    CircumstancesSummary, Source, ValidationError,
};
use tracing::{debug, error};

use crate::ServiceError;

/// Stores and retrieves circumstances records
///
/// The store sits behind a mutex; every method holds the lock for the
/// duration of one store round trip.
pub struct CircumstancesService<S: CircumstancesStore> {
    store: Arc<Mutex<S>>,
}

impl<S: CircumstancesStore> Clone for CircumstancesService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CircumstancesStore> CircumstancesService<S> {
    /// Create a new service over a shared store
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, ServiceError> {
        self.store
            .lock()
            .map_err(|_| ServiceError::Store("Store lock poisoned".to_string()))
    }

    fn store_error(e: S::Error) -> ServiceError {
        ServiceError::Store(e.to_string())
    }

    /// Look up a record by id
    pub fn get_by_id(
        &self,
        id: CircumstancesId,
    ) -> Result<Option<CircumstancesResponse>, ServiceError> {
        let store = self.lock()?;
        let record = store.find_by_id(id).map_err(Self::store_error)?;
        Ok(record.as_ref().map(CircumstancesResponse::from_record))
    }

    /// Look up the record belonging to a claimant
    pub fn get_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<CircumstancesResponse>, ServiceError> {
        let store = self.lock()?;
        let record = store
            .find_by_claimant_id(claimant_id)
            .map_err(Self::store_error)?;
        Ok(record.as_ref().map(CircumstancesResponse::from_record))
    }

    /// Record metadata by id, without the document
    pub fn get_summary_by_id(
        &self,
        id: CircumstancesId,
    ) -> Result<Option<CircumstancesSummary>, ServiceError> {
        self.lock()?.find_summary_by_id(id).map_err(Self::store_error)
    }

    /// Record metadata by claimant, without the document
    pub fn get_summary_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<CircumstancesSummary>, ServiceError> {
        self.lock()?
            .find_summary_by_claimant_id(claimant_id)
            .map_err(Self::store_error)
    }

    /// Create a record from a payload carrying its `claimantId`
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] when required fields are missing or
    ///   `claimantId` is not a UUID
    /// - [`ServiceError::DuplicateRecord`] when the claimant already has a record
    pub fn create(&self, mut payload: CircumstancesRequest) -> Result<CircumstancesId, ServiceError> {
        payload.validate()?;
        let claimant_id = payload
            .normalize_claimant_id()?
            .ok_or(ValidationError::MissingField(CLAIMANT_ID))?;

        let record = ClaimCircumstances::new(payload, claimant_id.clone(), Source::Citizen)
            .map_err(|e| {
                error!(claimant_id = %claimant_id, error = %e, "Error creating JSON for circumstances");
                ServiceError::from(e)
            })?;

        let mut store = self.lock()?;
        match store.save(record) {
            Ok(saved) => {
                debug!(id = %saved.id, claimant_id = %claimant_id, "Created circumstances");
                Ok(saved.id)
            }
            Err(e) if e.is_unique_violation() => {
                error!(claimant_id = %claimant_id, error = %e, "Error saving circumstances");
                Err(ServiceError::DuplicateRecord)
            }
            Err(e) => Err(Self::store_error(e)),
        }
    }

    /// Replace the document of an existing record
    ///
    /// The claimant id comes from the payload when present, otherwise the
    /// stored one is kept. The record is marked encrypted.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] when required fields are missing or
    ///   `claimantId` is not a UUID
    /// - [`ServiceError::DuplicateRecord`] when no record has this id, or
    ///   the new claimant id is held by another record
    pub fn update(
        &self,
        id: CircumstancesId,
        mut payload: CircumstancesRequest,
    ) -> Result<CircumstancesId, ServiceError> {
        payload.validate()?;
        let requested_claimant = payload.normalize_claimant_id()?;

        let mut store = self.lock()?;
        let mut record = store
            .find_by_id(id)
            .map_err(Self::store_error)?
            .ok_or_else(|| {
                error!(id = %id, "Update requested for missing circumstances");
                ServiceError::DuplicateRecord
            })?;

        let claimant_id = match requested_claimant {
            Some(claimant_id) => claimant_id,
            None => {
                payload.set_claimant_id(&record.claimant_id);
                record.claimant_id.clone()
            }
        };

        record
            .update(payload, claimant_id.clone(), Source::Citizen)
            .map_err(|e| {
                error!(claimant_id = %claimant_id, error = %e, "Error creating JSON for circumstances");
                ServiceError::from(e)
            })?;

        match store.save(record) {
            Ok(saved) => {
                debug!(id = %saved.id, "Updated circumstances");
                Ok(saved.id)
            }
            Err(e) if e.is_unique_violation() => {
                error!(claimant_id = %claimant_id, error = %e, "Error updating circumstances");
                Err(ServiceError::DuplicateRecord)
            }
            Err(e) => Err(Self::store_error(e)),
        }
    }

    /// Delete a record by id; absent ids are not an error
    pub fn delete(&self, id: CircumstancesId) -> Result<(), ServiceError> {
        self.lock()?.delete_by_id(id).map_err(Self::store_error)?;
        debug!(id = %id, "Deleted circumstances");
        Ok(())
    }

    /// Claimant ids of up to `limit` records still awaiting encryption
    pub fn unencrypted_claimant_ids(&self, limit: usize) -> Result<Vec<String>, ServiceError> {
        self.lock()?
            .find_unencrypted_claimant_ids(limit)
            .map_err(Self::store_error)
    }

    /// Up to `limit` records still awaiting encryption, oldest first
    pub fn unencrypted_records(
        &self,
        limit: usize,
    ) -> Result<Vec<ClaimCircumstances>, ServiceError> {
        self.lock()?.find_unencrypted(limit).map_err(Self::store_error)
    }
}
