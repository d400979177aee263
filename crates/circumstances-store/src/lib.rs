//! Claim Circumstances Storage Layer
//!
//! Implements the `CircumstancesStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One row per record in `claim_circumstances`
//! - The JSON document is stored as canonical text
//! - `claimant_id` carries a UNIQUE constraint; violations surface as
//!   [`StoreError::Duplicate`]
//! - Timestamps are stored as Unix milliseconds and owned by the store
//!
//! # Examples
//!
//! ```no_run
//! use circumstances_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record operations
//! ```

#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use circumstances_domain::traits::{CircumstancesStore, StoreFailure};
use circumstances_domain::{
    ClaimCircumstances, CircumstancesId, CircumstancesRequest, CircumstancesSummary, Locale,
    Source,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Another record already holds the claimant id
    #[error("Duplicate claimant record")]
    Duplicate,
}

impl StoreFailure for StoreError {
    fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::Duplicate)
    }
}

const RECORD_COLUMNS: &str = "id, claimant_id, claim_circumstances_json, hash, source, \
     service_version, locale, encrypted_json, created_timestamp, updated_timestamp";

const SUMMARY_COLUMNS: &str = "id, claimant_id, hash, source, \
     service_version, locale, encrypted_json, created_timestamp, updated_timestamp";

/// SQLite-based implementation of CircumstancesStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks
/// behind a `Mutex`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use circumstances_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("circumstances.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Convert id to bytes for storage
    fn id_to_bytes(id: CircumstancesId) -> Vec<u8> {
        id.as_uuid().as_bytes().to_vec()
    }

    /// Convert bytes to id
    fn bytes_to_id(bytes: &[u8]) -> Result<CircumstancesId, StoreError> {
        uuid::Uuid::from_slice(bytes)
            .map(CircumstancesId::from_uuid)
            .map_err(|_| {
                StoreError::InvalidData(format!(
                    "Expected 16 bytes for CircumstancesId, got {}",
                    bytes.len()
                ))
            })
    }

    fn millis_to_timestamp(millis: i64) -> Result<DateTime<Utc>, StoreError> {
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| StoreError::InvalidData(format!("Timestamp out of range: {}", millis)))
    }

    fn str_to_source(s: &str) -> Result<Source, StoreError> {
        Source::parse(s).ok_or_else(|| StoreError::InvalidData(format!("Unknown source: {}", s)))
    }

    /// Wrap a conversion failure so it can flow out of a rusqlite row closure
    fn conversion_failure(
        column: usize,
        ty: rusqlite::types::Type,
        e: StoreError,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(e))
    }

    /// Map a row selected with `RECORD_COLUMNS`
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ClaimCircumstances> {
        use rusqlite::types::Type;

        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map_err(|e| Self::conversion_failure(0, Type::Blob, e))?;

        let json: String = row.get(2)?;
        let payload: CircumstancesRequest = serde_json::from_str(&json).map_err(|e| {
            Self::conversion_failure(2, Type::Text, StoreError::InvalidData(e.to_string()))
        })?;

        let source: String = row.get(4)?;
        let locale: Option<String> = row.get(6)?;

        Ok(ClaimCircumstances {
            id,
            claimant_id: row.get(1)?,
            payload,
            hash: row.get(3)?,
            source: Self::str_to_source(&source)
                .map_err(|e| Self::conversion_failure(4, Type::Text, e))?,
            service_version: row.get(5)?,
            locale: locale.as_deref().and_then(Locale::parse),
            encrypted_json: row.get(7)?,
            created_at: Self::millis_to_timestamp(row.get(8)?)
                .map_err(|e| Self::conversion_failure(8, Type::Integer, e))?,
            updated_at: Self::millis_to_timestamp(row.get(9)?)
                .map_err(|e| Self::conversion_failure(9, Type::Integer, e))?,
        })
    }

    /// Map a row selected with `SUMMARY_COLUMNS`
    fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<CircumstancesSummary> {
        use rusqlite::types::Type;

        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map_err(|e| Self::conversion_failure(0, Type::Blob, e))?;
        let source: String = row.get(3)?;
        let locale: Option<String> = row.get(5)?;

        Ok(CircumstancesSummary {
            id,
            claimant_id: row.get(1)?,
            hash: row.get(2)?,
            source: Self::str_to_source(&source)
                .map_err(|e| Self::conversion_failure(3, Type::Text, e))?,
            service_version: row.get(4)?,
            locale: locale.as_deref().and_then(Locale::parse),
            encrypted_json: row.get(6)?,
            created_at: Self::millis_to_timestamp(row.get(7)?)
                .map_err(|e| Self::conversion_failure(7, Type::Integer, e))?,
            updated_at: Self::millis_to_timestamp(row.get(8)?)
                .map_err(|e| Self::conversion_failure(8, Type::Integer, e))?,
        })
    }

    /// Classify a failed write, pulling out claimant uniqueness violations
    fn map_write_error(e: rusqlite::Error) -> StoreError {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::Duplicate
            }
            other => StoreError::Database(other),
        }
    }
}

impl CircumstancesStore for SqliteStore {
    type Error = StoreError;

    fn find_by_id(&self, id: CircumstancesId) -> Result<Option<ClaimCircumstances>, Self::Error> {
        let sql = format!("SELECT {} FROM claim_circumstances WHERE id = ?1", RECORD_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id)], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn find_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<ClaimCircumstances>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM claim_circumstances WHERE claimant_id = ?1",
            RECORD_COLUMNS
        );
        let record = self
            .conn
            .query_row(&sql, params![claimant_id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn find_summary_by_id(
        &self,
        id: CircumstancesId,
    ) -> Result<Option<CircumstancesSummary>, Self::Error> {
        let sql = format!("SELECT {} FROM claim_circumstances WHERE id = ?1", SUMMARY_COLUMNS);
        let summary = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id)], Self::row_to_summary)
            .optional()?;
        Ok(summary)
    }

    fn find_summary_by_claimant_id(
        &self,
        claimant_id: &str,
    ) -> Result<Option<CircumstancesSummary>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM claim_circumstances WHERE claimant_id = ?1",
            SUMMARY_COLUMNS
        );
        let summary = self
            .conn
            .query_row(&sql, params![claimant_id], Self::row_to_summary)
            .optional()?;
        Ok(summary)
    }

    fn find_unencrypted_claimant_ids(&self, limit: usize) -> Result<Vec<String>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT claimant_id FROM claim_circumstances
             WHERE encrypted_json = 0 LIMIT ?1",
        )?;
        let ids = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn find_unencrypted(&self, limit: usize) -> Result<Vec<ClaimCircumstances>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM claim_circumstances
             WHERE encrypted_json = 0
             ORDER BY created_timestamp ASC, id ASC LIMIT ?1",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn save(&mut self, mut record: ClaimCircumstances) -> Result<ClaimCircumstances, Self::Error> {
        let id_bytes = Self::id_to_bytes(record.id);
        let json = serde_json::to_string(&record.payload)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let now = Utc::now();

        let tx = self.conn.transaction()?;

        let existing_created: Option<i64> = tx
            .query_row(
                "SELECT created_timestamp FROM claim_circumstances WHERE id = ?1",
                params![&id_bytes],
                |row| row.get(0),
            )
            .optional()?;

        let created_millis = match existing_created {
            Some(created) => {
                tx.execute(
                    "UPDATE claim_circumstances SET
                     claimant_id = ?2, claim_circumstances_json = ?3, hash = ?4, source = ?5,
                     service_version = ?6, locale = ?7, encrypted_json = ?8, updated_timestamp = ?9
                     WHERE id = ?1",
                    params![
                        &id_bytes,
                        &record.claimant_id,
                        &json,
                        &record.hash,
                        record.source.as_str(),
                        &record.service_version,
                        record.locale.as_ref().map(Locale::as_str),
                        record.encrypted_json,
                        now.timestamp_millis(),
                    ],
                )
                .map_err(Self::map_write_error)?;
                debug!(id = %record.id, "Updated circumstances record");
                created
            }
            None => {
                tx.execute(
                    "INSERT INTO claim_circumstances (id, claimant_id, claim_circumstances_json, hash,
                     source, service_version, locale, encrypted_json, created_timestamp, updated_timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                    params![
                        &id_bytes,
                        &record.claimant_id,
                        &json,
                        &record.hash,
                        record.source.as_str(),
                        &record.service_version,
                        record.locale.as_ref().map(Locale::as_str),
                        record.encrypted_json,
                        now.timestamp_millis(),
                    ],
                )
                .map_err(Self::map_write_error)?;
                debug!(id = %record.id, "Inserted circumstances record");
                now.timestamp_millis()
            }
        };

        tx.commit()?;

        record.created_at = Self::millis_to_timestamp(created_millis)?;
        record.updated_at = Self::millis_to_timestamp(now.timestamp_millis())?;
        Ok(record)
    }

    fn delete_by_id(&mut self, id: CircumstancesId) -> Result<(), Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM claim_circumstances WHERE id = ?1",
            params![Self::id_to_bytes(id)],
        )?;
        if deleted == 0 {
            warn!(id = %id, "Delete requested for absent circumstances record");
        }
        Ok(())
    }
}
