//! Source module - the actor type behind a submission

use serde::{Deserialize, Serialize};

/// Actor type that submitted a circumstances record
///
/// Every write path in the service currently records [`Source::Citizen`];
/// the other variants exist so stored rows written by staff tooling parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The claimant themselves
    Citizen,

    /// A work coach acting on the claimant's behalf
    Agent,
}

impl Source {
    /// Get the source name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Citizen => "citizen",
            Source::Agent => "agent",
        }
    }

    /// Parse a source from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "citizen" => Some(Source::Citizen),
            "agent" => Some(Source::Agent),
            _ => None,
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source: {}", s))
    }
}
