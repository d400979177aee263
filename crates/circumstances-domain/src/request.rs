//! Request and response payloads
//!
//! The circumstances document is an open JSON object. Only a handful of
//! top-level fields carry meaning for the service; everything else is
//! stored and returned untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::circumstances::ClaimCircumstances;

/// Field holding the date the claim starts from (required)
pub const CLAIM_START_DATE: &str = "claimStartDate";

/// Field holding the date the claim was made (required)
pub const DATE_OF_CLAIM: &str = "dateOfClaim";

/// Field holding the claimant identifier
pub const CLAIMANT_ID: &str = "claimantId";

/// Field holding the submitting service version
pub const SERVICE_VERSION: &str = "serviceVersion";

/// Field holding the language tag of the submission
pub const LOCALE: &str = "locale";

/// Field the record id is exposed under in responses
pub const ID: &str = "id";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reasons a payload is rejected before it reaches the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body is valid JSON but not an object
    #[error("Circumstances payload must be a JSON object")]
    NotAnObject,

    /// A required field is absent or null
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A required date field is not a `YYYY-MM-DD` string
    #[error("Invalid date for {field}: {value}")]
    InvalidDate {
        /// Name of the offending field
        field: &'static str,
        /// The value as received
        value: String,
    },

    /// `claimantId` is present but not a UUID
    #[error("Invalid claimantId: {0}")]
    InvalidClaimantId(String),
}

/// An incoming circumstances document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircumstancesRequest(Map<String, Value>);

impl CircumstancesRequest {
    /// Wrap a JSON value, rejecting anything but an object
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    /// Check the required date fields
    ///
    /// # Examples
    ///
    /// ```
    /// use circumstances_domain::CircumstancesRequest;
    /// use serde_json::json;
    ///
    /// let ok = CircumstancesRequest::from_value(json!({
    ///     "claimStartDate": "2024-01-01",
    ///     "dateOfClaim": "2024-01-01"
    /// })).unwrap();
    /// assert!(ok.validate().is_ok());
    ///
    /// let missing = CircumstancesRequest::from_value(json!({"dateOfClaim": "2024-01-01"})).unwrap();
    /// assert!(missing.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.required_date(CLAIM_START_DATE)?;
        self.required_date(DATE_OF_CLAIM)?;
        Ok(())
    }

    fn required_date(&self, field: &'static str) -> Result<NaiveDate, ValidationError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
            Some(Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
                ValidationError::InvalidDate {
                    field,
                    value: s.clone(),
                }
            }),
            Some(other) => Err(ValidationError::InvalidDate {
                field,
                value: other.to_string(),
            }),
        }
    }

    /// Claimant id carried in the document
    pub fn claimant_id(&self) -> Option<&str> {
        self.string_field(CLAIMANT_ID)
    }

    /// Parse the carried claimant id as a UUID and rewrite it in canonical
    /// lowercase hyphenated form
    ///
    /// Returns the normalized id, or `None` when the document has none.
    /// Two spellings of one UUID must never reach the store as different keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use circumstances_domain::CircumstancesRequest;
    /// use serde_json::json;
    ///
    /// let mut req = CircumstancesRequest::from_value(json!({
    ///     "claimantId": "0190A1B2-C3D4-7E5F-8A9B-0C1D2E3F4A5B"
    /// })).unwrap();
    /// let id = req.normalize_claimant_id().unwrap();
    /// assert_eq!(id.as_deref(), Some("0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b"));
    /// assert_eq!(req.claimant_id(), id.as_deref());
    /// ```
    pub fn normalize_claimant_id(&mut self) -> Result<Option<String>, ValidationError> {
        let claimant_id = match self.0.get(CLAIMANT_ID) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => Uuid::parse_str(s)
                .map_err(|_| ValidationError::InvalidClaimantId(s.clone()))?
                .to_string(),
            Some(other) => return Err(ValidationError::InvalidClaimantId(other.to_string())),
        };
        self.set_claimant_id(&claimant_id);
        Ok(Some(claimant_id))
    }

    /// Overwrite the claimant id carried in the document
    pub fn set_claimant_id(&mut self, claimant_id: &str) {
        self.0
            .insert(CLAIMANT_ID.to_string(), Value::String(claimant_id.to_string()));
    }

    /// Version of the submitting service
    pub fn service_version(&self) -> Option<&str> {
        self.string_field(SERVICE_VERSION)
    }

    /// Raw locale string
    pub fn locale(&self) -> Option<&str> {
        self.string_field(LOCALE)
    }

    fn string_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A stored document as returned to callers: the payload plus its `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircumstancesResponse(Map<String, Value>);

impl CircumstancesResponse {
    /// Build the response view of a record
    pub fn from_record(record: &ClaimCircumstances) -> Self {
        let mut map = record.payload.as_map().clone();
        map.insert(ID.to_string(), Value::String(record.id.to_string()));
        Self(map)
    }

    /// Record id as exposed in the body
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID).and_then(Value::as_str)
    }

    /// Look up a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The document with the `id` field removed
    pub fn payload(&self) -> CircumstancesRequest {
        let mut map = self.0.clone();
        map.remove(ID);
        CircumstancesRequest(map)
    }
}

impl From<&ClaimCircumstances> for CircumstancesResponse {
    fn from(record: &ClaimCircumstances) -> Self {
        Self::from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use serde_json::json;

    fn request(value: Value) -> CircumstancesRequest {
        CircumstancesRequest::from_value(value).unwrap()
    }

    #[test]
    fn test_rejects_non_object() {
        assert_eq!(
            CircumstancesRequest::from_value(json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
        assert_eq!(
            CircumstancesRequest::from_value(json!("text")),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_missing_claim_start_date() {
        let req = request(json!({"dateOfClaim": "2024-01-01"}));
        assert_eq!(
            req.validate(),
            Err(ValidationError::MissingField(CLAIM_START_DATE))
        );
    }

    #[test]
    fn test_null_date_of_claim_is_missing() {
        let req = request(json!({"claimStartDate": "2024-01-01", "dateOfClaim": null}));
        assert_eq!(req.validate(), Err(ValidationError::MissingField(DATE_OF_CLAIM)));
    }

    #[test]
    fn test_malformed_date() {
        let req = request(json!({"claimStartDate": "01/01/2024", "dateOfClaim": "2024-01-01"}));
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidDate { field: CLAIM_START_DATE, .. })
        ));

        let req = request(json!({"claimStartDate": "2024-01-01", "dateOfClaim": 20240101}));
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidDate { field: DATE_OF_CLAIM, .. })
        ));
    }

    #[test]
    fn test_accessors() {
        let mut req = request(json!({
            "claimStartDate": "2024-03-04",
            "dateOfClaim": "2024-03-05",
            "serviceVersion": "1.2",
            "locale": "en",
            "hasSavings": true
        }));

        assert_eq!(req.service_version(), Some("1.2"));
        assert_eq!(req.locale(), Some("en"));
        assert_eq!(req.claimant_id(), None);

        req.set_claimant_id("abc");
        assert_eq!(req.claimant_id(), Some("abc"));
        assert_eq!(req.as_map().get("hasSavings"), Some(&json!(true)));
    }

    #[test]
    fn test_normalize_claimant_id_lowercases() {
        let mut req = request(json!({"claimantId": "0190A1B2-C3D4-7E5F-8A9B-0C1D2E3F4A5B"}));
        assert_eq!(
            req.normalize_claimant_id().unwrap().as_deref(),
            Some("0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b")
        );
        assert_eq!(req.claimant_id(), Some("0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b"));

        let mut absent = request(json!({"claimantId": null}));
        assert_eq!(absent.normalize_claimant_id(), Ok(None));
    }

    #[test]
    fn test_normalize_claimant_id_rejects_non_uuid() {
        let mut req = request(json!({"claimantId": "not-a-uuid"}));
        assert_eq!(
            req.normalize_claimant_id(),
            Err(ValidationError::InvalidClaimantId("not-a-uuid".to_string()))
        );

        let mut req = request(json!({"claimantId": 42}));
        assert!(matches!(
            req.normalize_claimant_id(),
            Err(ValidationError::InvalidClaimantId(_))
        ));
    }

    #[test]
    fn test_response_adds_id_and_keeps_payload() {
        let payload = request(json!({"claimStartDate": "2024-01-01", "dateOfClaim": "2024-01-01"}));
        let record =
            ClaimCircumstances::new(payload.clone(), "c1".to_string(), Source::Citizen).unwrap();

        let response = CircumstancesResponse::from_record(&record);
        assert_eq!(response.id(), Some(record.id.to_string().as_str()));
        assert_eq!(response.payload(), payload);
        assert_eq!(response.get(CLAIM_START_DATE), Some(&json!("2024-01-01")));
    }
}
