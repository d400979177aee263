//! Circumstances record - the unit of storage for the service

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::{content_hash, HashError};
use crate::locale::Locale;
use crate::request::CircumstancesRequest;
use crate::source::Source;

/// Unique identifier for a circumstances record based on UUIDv7
///
/// Generated once at creation and never reassigned. UUIDv7 keeps ids
/// roughly ordered by creation time without any coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircumstancesId(uuid::Uuid);

impl CircumstancesId {
    /// Generate a new UUIDv7-based id
    ///
    /// # Examples
    ///
    /// ```
    /// use circumstances_domain::CircumstancesId;
    ///
    /// let a = CircumstancesId::new();
    /// let b = CircumstancesId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Wrap an existing UUID (storage and path parsing)
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an id from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use circumstances_domain::CircumstancesId;
    ///
    /// let id = CircumstancesId::new();
    /// let parsed = CircumstancesId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid circumstances id: {}", e))
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for CircumstancesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CircumstancesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored claim circumstances record
///
/// `created_at` and `updated_at` are owned by the store: values set here are
/// placeholders until the record has been saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCircumstances {
    /// Unique identifier
    pub id: CircumstancesId,

    /// Claimant the record belongs to (unique across records)
    pub claimant_id: String,

    /// The circumstances document as submitted
    pub payload: CircumstancesRequest,

    /// Hex SHA-256 of the canonical payload
    pub hash: String,

    /// Actor type that submitted the record
    pub source: Source,

    /// Version of the submitting service, stored verbatim
    pub service_version: Option<String>,

    /// Language of the submission
    pub locale: Option<Locale>,

    /// Insert time
    pub created_at: DateTime<Utc>,

    /// Last write time
    pub updated_at: DateTime<Utc>,

    /// Whether the payload has been migrated to encrypted-at-rest storage
    pub encrypted_json: bool,
}

impl ClaimCircumstances {
    /// Build a new record for `claimant_id` from a payload
    ///
    /// Generates the id, hashes the payload and copies `serviceVersion` and
    /// `locale` out of it. The record starts unencrypted.
    pub fn new(
        payload: CircumstancesRequest,
        claimant_id: String,
        source: Source,
    ) -> Result<Self, HashError> {
        let hash = content_hash(&payload)?;
        let now = Utc::now();

        Ok(Self {
            id: CircumstancesId::new(),
            claimant_id,
            service_version: payload.service_version().map(str::to_string),
            locale: payload.locale().and_then(Locale::parse),
            payload,
            hash,
            source,
            created_at: now,
            updated_at: now,
            encrypted_json: false,
        })
    }

    /// Replace every mutable field from a new payload
    ///
    /// The id and `created_at` are kept. Marks the record as encrypted.
    pub fn update(
        &mut self,
        payload: CircumstancesRequest,
        claimant_id: String,
        source: Source,
    ) -> Result<(), HashError> {
        self.hash = content_hash(&payload)?;
        self.claimant_id = claimant_id;
        self.source = source;
        self.service_version = payload.service_version().map(str::to_string);
        self.locale = payload.locale().and_then(Locale::parse);
        self.payload = payload;
        self.encrypted_json = true;
        Ok(())
    }

    /// Metadata view of this record, without the payload
    pub fn summary(&self) -> CircumstancesSummary {
        CircumstancesSummary {
            id: self.id,
            claimant_id: self.claimant_id.clone(),
            hash: self.hash.clone(),
            source: self.source,
            service_version: self.service_version.clone(),
            locale: self.locale.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            encrypted_json: self.encrypted_json,
        }
    }
}

/// A record's metadata without its JSON document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircumstancesSummary {
    /// Unique identifier
    pub id: CircumstancesId,
    /// Claimant the record belongs to
    pub claimant_id: String,
    /// Hex SHA-256 of the canonical payload
    pub hash: String,
    /// Actor type that submitted the record
    pub source: Source,
    /// Version of the submitting service
    pub service_version: Option<String>,
    /// Language of the submission
    pub locale: Option<Locale>,
    /// Insert time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
    /// Whether the payload has been migrated to encrypted-at-rest storage
    pub encrypted_json: bool,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: string form round-trips for any UUID value
        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = CircumstancesId::from_uuid(uuid::Uuid::from_u128(value));
            let parsed = CircumstancesId::from_string(&id.to_string());
            prop_assert_eq!(parsed, Ok(id));
        }

        /// Property: generated ids never repeat
        #[test]
        fn test_generated_ids_unique(n in 2usize..64) {
            let ids: std::collections::HashSet<_> = (0..n).map(|_| CircumstancesId::new()).collect();
            prop_assert_eq!(ids.len(), n);
        }
    }
}
