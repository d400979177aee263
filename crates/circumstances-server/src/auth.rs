//! Role-based authorization with JWT bearer tokens.
//!
//! Every handler calls [`Authorizer::authorize`] with the [`Policy`] for its
//! operation before doing any work. Tokens carry the caller's roles.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization error
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on the request
    #[error("Missing bearer token")]
    MissingToken,

    /// Token expired
    #[error("Token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid token")]
    InvalidToken,

    /// Authenticated, but no role permits the operation
    #[error("Insufficient role for this operation")]
    Forbidden,
}

/// Caller roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Work coach
    Wc,
    /// Senior claims assessor
    Sca,
    /// Claims case manager
    Ccm,
    /// Claims case assistant
    Cca,
    /// The claimant
    Citizen,
}

impl Role {
    /// Role tag as carried in tokens
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Wc => "WC",
            Role::Sca => "SCA",
            Role::Ccm => "CCM",
            Role::Cca => "CCA",
            Role::Citizen => "CITIZEN",
        }
    }

    /// Parse a role tag; unknown tags yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WC" => Some(Role::Wc),
            "SCA" => Some(Role::Sca),
            "CCM" => Some(Role::Ccm),
            "CCA" => Some(Role::Cca),
            "CITIZEN" => Some(Role::Citizen),
            _ => None,
        }
    }
}

/// Which roles may perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Any recognized role
    AnyRole,
    /// At least one of the listed roles
    AnyOf(&'static [Role]),
    /// Authenticated, holding none of the listed roles
    NoneOf(&'static [Role]),
}

impl Policy {
    /// Read a record (by id or claimant)
    pub const READ: Policy = Policy::AnyRole;
    /// Create a record
    pub const CREATE: Policy = Policy::NoneOf(&[Role::Wc, Role::Sca]);
    /// Update a record
    pub const UPDATE: Policy = Policy::AnyOf(&[Role::Ccm, Role::Wc, Role::Cca]);
    /// Delete a record
    pub const DELETE: Policy = Policy::AnyOf(&[Role::Wc]);

    /// Check a caller's roles against this policy
    pub fn permits(&self, roles: &[Role]) -> bool {
        match self {
            Policy::AnyRole => !roles.is_empty(),
            Policy::AnyOf(allowed) => roles.iter().any(|r| allowed.contains(r)),
            Policy::NoneOf(denied) => !roles.iter().any(|r| denied.contains(r)),
        }
    }
}

/// JWT claims for caller tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Caller identifier
    pub sub: String,

    /// Role tags
    #[serde(default)]
    pub roles: Vec<String>,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

impl AuthClaims {
    /// Recognized roles in this token
    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().filter_map(|r| Role::parse(r)).collect()
    }
}

/// Checks caller tokens
///
/// Tokens are minted by the identity provider sharing the HS256 secret; this
/// service only verifies them.
pub struct Authorizer {
    decoding_key: DecodingKey,
    enabled: bool,
}

impl Authorizer {
    /// Create an authorizer verifying tokens signed with `jwt_secret`
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            enabled: true,
        }
    }

    /// An authorizer that lets every request through
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new("")
        }
    }

    /// Whether checks are enforced
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Validate a token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let validation = Validation::default();
        let token_data = decode::<AuthClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// Check the request's bearer token against `policy`
    ///
    /// Returns the caller's claims, or `None` when checks are disabled.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        policy: Policy,
    ) -> Result<Option<AuthClaims>, AuthError> {
        if !self.enabled {
            return Ok(None);
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.validate_token(token)?;
        if !policy.permits(&claims.roles()) {
            return Err(AuthError::Forbidden);
        }

        Ok(Some(claims))
    }
}
