use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Storage-assigned key used by the HTTP routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Applicant identification document number, unique across all requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Magical affinity declared by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affinity {
    Darkness,
    Light,
    Fire,
    Water,
    Wind,
    Earth,
}

/// Lifecycle of an admission request. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(ValidationError::UnknownStatus(raw.to_string())),
        }
    }
}

/// Grimoire cover classification; more leaves means a rarer book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CloverCategory {
    OneLeafClover,
    TwoLeafClover,
    ThreeLeafClover,
    FourLeafClover,
    FiveLeafClover,
}

impl CloverCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::OneLeafClover,
            Self::TwoLeafClover,
            Self::ThreeLeafClover,
            Self::FourLeafClover,
            Self::FiveLeafClover,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            CloverCategory::OneLeafClover => "one-leaf clover",
            CloverCategory::TwoLeafClover => "two-leaf clover",
            CloverCategory::ThreeLeafClover => "three-leaf clover",
            CloverCategory::FourLeafClover => "four-leaf clover",
            CloverCategory::FiveLeafClover => "five-leaf clover",
        }
    }
}

impl fmt::Display for CloverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inbound payload for a new admission request, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestForm {
    pub identity: String,
    pub given_name: String,
    pub family_name: String,
    pub age: i64,
    pub affinity: Affinity,
}

/// Partial update payload; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPatch {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub affinity: Option<Affinity>,
}

/// Validated request fields ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub identity: Identity,
    pub given_name: String,
    pub family_name: String,
    pub age: u8,
    pub affinity: Affinity,
}

/// Validated subset of a [`RequestPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestChanges {
    pub identity: Option<Identity>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub age: Option<u8>,
    pub affinity: Option<Affinity>,
}

/// Stored admission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub identity: Identity,
    pub given_name: String,
    pub family_name: String,
    pub age: u8,
    pub affinity: Affinity,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl Request {
    pub fn from_draft(id: RequestId, draft: RequestDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            identity: draft.identity,
            given_name: draft.given_name,
            family_name: draft.family_name,
            age: draft.age,
            affinity: draft.affinity,
            status: RequestStatus::Pending,
            created_at,
        }
    }

    /// Overwrite the descriptive fields carried by `changes`. Identity and status are untouched.
    pub fn apply(&mut self, changes: RequestChanges) {
        if let Some(given_name) = changes.given_name {
            self.given_name = given_name;
        }
        if let Some(family_name) = changes.family_name {
            self.family_name = family_name;
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
        if let Some(affinity) = changes.affinity {
            self.affinity = affinity;
        }
    }
}

/// Grimoire granted to an approved request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub request_identity: Identity,
    pub category: CloverCategory,
    pub rarity_weight: f64,
    pub assigned_at: DateTime<Utc>,
}

/// Request fields merged with the grimoire they were awarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentView {
    pub request_id: RequestId,
    pub identity: Identity,
    pub given_name: String,
    pub family_name: String,
    pub age: u8,
    pub affinity: Affinity,
    pub category: CloverCategory,
    pub rarity_weight: f64,
    pub assigned_at: DateTime<Utc>,
}

impl AssignmentView {
    pub fn join(request: &Request, assignment: &Assignment) -> Self {
        Self {
            request_id: request.id,
            identity: request.identity.clone(),
            given_name: request.given_name.clone(),
            family_name: request.family_name.clone(),
            age: request.age,
            affinity: request.affinity,
            category: assignment.category,
            rarity_weight: assignment.rarity_weight,
            assigned_at: assignment.assigned_at,
        }
    }
}

/// Result of a status transition; `category` is set only for approvals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub request: Request,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CloverCategory>,
}
