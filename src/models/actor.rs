//! The caller of a mutating engine operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Access level of a user, as issued by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Admin,
    User,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller. Session issuance lives outside the engine; the
/// routing layer builds this from whatever credential it validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub id: Uuid,
    pub access_level: AccessLevel,
}

impl Actor {
    pub fn new(id: Uuid, access_level: AccessLevel) -> Self {
        Self { id, access_level }
    }

    /// Whether this actor's level appears in `allowed`.
    pub fn has_any_level(&self, allowed: &[AccessLevel]) -> bool {
        allowed.contains(&self.access_level)
    }
}
